//! Prompt rendering for the narrative analysis.

use askama::Template;
use kennel_core::BusinessMetrics;

use super::error::AnalysisError;

/// One area the advisor is asked to cover.
pub struct Dimension {
    pub name: &'static str,
    pub focus: &'static str,
}

pub const DIMENSIONS: [Dimension; 5] = [
    Dimension {
        name: "Finance",
        focus: "profitability, cash flow by month and where the money goes",
    },
    Dimension {
        name: "Health",
        focus: "record keeping, vaccinations and dogs overdue for a checkup",
    },
    Dimension {
        name: "Breeding",
        focus: "litter frequency, litter sizes and how many dams carry the program",
    },
    Dimension {
        name: "Inventory",
        focus: "the mix of dogs by status, sex and breed",
    },
    Dimension {
        name: "Operations",
        focus: "growth tracking, QR codes and profile photos",
    },
];

#[derive(Template)]
#[template(path = "analysis/system_prompt.txt")]
struct SystemPrompt<'a> {
    dimensions: &'a [Dimension],
}

#[derive(Template)]
#[template(path = "analysis/user_prompt.txt")]
struct UserPrompt<'a> {
    generated_on: String,
    metrics_json: &'a str,
}

/// Both messages of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl RenderedPrompt {
    /// Render the advisor instructions and the user message embedding
    /// `metrics` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be serialized or a template
    /// fails to render.
    pub fn render(metrics: &BusinessMetrics) -> Result<Self, AnalysisError> {
        let metrics_json = serde_json::to_string_pretty(metrics)
            .map_err(|e| AnalysisError::Parse(format!("Failed to serialize metrics: {e}")))?;

        let system = SystemPrompt {
            dimensions: &DIMENSIONS,
        }
        .render()?;
        let user = UserPrompt {
            generated_on: metrics.generated_on.to_string(),
            metrics_json: &metrics_json,
        }
        .render()?;

        Ok(Self { system, user })
    }
}
