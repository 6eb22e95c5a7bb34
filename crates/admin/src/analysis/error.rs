//! Error types for the analysis client.

use thiserror::Error;

/// Errors that can occur when requesting a narrative analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The completion endpoint answered with a non-success status.
    #[error("analysis API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Failed to build the request or parse the response.
    #[error("parse error: {0}")]
    Parse(String),

    /// A prompt template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}
