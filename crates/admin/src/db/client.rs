//! HTTP client for the hosted data store's REST API.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::RepositoryError;
use crate::config::DataStoreConfig;

const REST_PATH: &str = "rest/v1/";
const PREFER: &str = "Prefer";
pub(crate) const RETURN_REPRESENTATION: &str = "return=representation";
pub(crate) const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Hosted data store client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct DataClient {
    inner: Arc<DataClientInner>,
}

struct DataClientInner {
    client: reqwest::Client,
    rest_url: Url,
}

impl std::fmt::Debug for DataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataClient")
            .field("rest_url", &self.inner.rest_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DataClient {
    /// Create a new data store client.
    ///
    /// # Errors
    ///
    /// Returns error if the key cannot be sent as a header, the URL cannot
    /// be extended, or the HTTP client fails to build.
    pub fn new(config: &DataStoreConfig) -> Result<Self, RepositoryError> {
        let key = config.api_key.expose_secret();
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| RepositoryError::Parse(format!("Invalid data store key: {e}")))
        };

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header(key)?);
        headers.insert(AUTHORIZATION, header(&format!("Bearer {key}"))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(DataClientInner {
                client,
                rest_url: rest_base(&config.url)?,
            }),
        })
    }

    /// Cheap round trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying read.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        let pairs = [
            ("select".to_string(), "id".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        self.select::<serde_json::Value>("dogs", &pairs)
            .await
            .map(|_| ())
    }

    #[instrument(skip_all, fields(table = %table))]
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        pairs: &[(String, String)],
    ) -> Result<Vec<T>, RepositoryError> {
        let url = self.table_url(table, pairs)?;
        Self::send(self.inner.client.get(url)).await
    }

    #[instrument(skip_all, fields(table = %table))]
    pub(crate) async fn insert<B, T>(
        &self,
        table: &str,
        pairs: &[(String, String)],
        body: &B,
        prefer: &str,
    ) -> Result<Vec<T>, RepositoryError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, pairs)?;
        let request = self
            .inner
            .client
            .post(url)
            .header(PREFER, prefer)
            .json(body);
        Self::send(request).await
    }

    #[instrument(skip_all, fields(table = %table))]
    pub(crate) async fn update<B, T>(
        &self,
        table: &str,
        pairs: &[(String, String)],
        body: &B,
    ) -> Result<Vec<T>, RepositoryError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, pairs)?;
        let request = self
            .inner
            .client
            .patch(url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body);
        Self::send(request).await
    }

    #[instrument(skip_all, fields(table = %table))]
    pub(crate) async fn delete(
        &self,
        table: &str,
        pairs: &[(String, String)],
    ) -> Result<Vec<serde_json::Value>, RepositoryError> {
        let url = self.table_url(table, pairs)?;
        let request = self
            .inner
            .client
            .delete(url)
            .header(PREFER, RETURN_REPRESENTATION);
        Self::send(request).await
    }

    fn table_url(&self, table: &str, pairs: &[(String, String)]) -> Result<Url, RepositoryError> {
        let mut url = self
            .inner
            .rest_url
            .join(table)
            .map_err(|e| RepositoryError::Parse(format!("Invalid table name {table}: {e}")))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RepositoryError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body)
                .map_err(|e| RepositoryError::Parse(format!("Failed to parse response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Data store request failed");
        if status == StatusCode::UNAUTHORIZED {
            return Err(RepositoryError::Unauthorized(body));
        }
        Err(RepositoryError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// `https://x.example.co` and `https://x.example.co/` both become
/// `https://x.example.co/rest/v1/`.
fn rest_base(base: &Url) -> Result<Url, RepositoryError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(REST_PATH)
        .map_err(|e| RepositoryError::Parse(format!("Invalid data store URL: {e}")))
}
