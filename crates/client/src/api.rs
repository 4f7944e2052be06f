//! HTTP transport for the chart API.
//!
//! [`ChartApi`] is the seam the cache reconciler talks to; [`HttpChartApi`]
//! implements it over `reqwest` against a running `seatplan-api`.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use seatplan_core::chart::{Chart, ChartView};
use seatplan_core::layout::{DesiredLayout, LayoutRequest, LayoutUpdateResponse, TransactionSummary};
use seatplan_core::types::ChartId;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from talking to the chart API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network or decoding failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// `body` is the parsed error body (`Null` when it was not JSON); layout
    /// failures carry `transaction` and `chart` in it.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        body: serde_json::Value,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request(err) => err.status().map(|s| s.as_u16()),
            ClientError::Api { status, .. } => Some(*status),
        }
    }

    /// Machine-readable error code from the response body, e.g. `CAPACITY_ERROR`.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code.as_str()),
            ClientError::Request(_) => None,
        }
    }

    /// Counts of what committed before a layout update failed.
    pub fn transaction(&self) -> Option<TransactionSummary> {
        match self {
            ClientError::Api { body, .. } => {
                serde_json::from_value(body.get("transaction")?.clone()).ok()
            }
            ClientError::Request(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateChartBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameChartBody<'a> {
    name: &'a str,
}

/// Identity of a chart the server deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedChart {
    pub user_id: i64,
    pub chart_id: ChartId,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Remote chart operations used by [`crate::ChartClient`].
pub trait ChartApi: Send + Sync {
    fn list_charts(&self) -> impl Future<Output = Result<Vec<Chart>, ClientError>> + Send;

    fn get_chart(
        &self,
        chart_id: ChartId,
    ) -> impl Future<Output = Result<ChartView, ClientError>> + Send;

    fn create_chart(
        &self,
        name: &str,
        metadata: Option<&serde_json::Value>,
    ) -> impl Future<Output = Result<Chart, ClientError>> + Send;

    fn rename_chart(
        &self,
        chart_id: ChartId,
        name: &str,
    ) -> impl Future<Output = Result<Chart, ClientError>> + Send;

    fn delete_chart(
        &self,
        chart_id: ChartId,
    ) -> impl Future<Output = Result<DeletedChart, ClientError>> + Send;

    fn update_layout(
        &self,
        chart_id: ChartId,
        layout: &DesiredLayout,
    ) -> impl Future<Output = Result<LayoutUpdateResponse, ClientError>> + Send;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// HTTP client for the chart API.
///
/// `api_url` is the versioned prefix, e.g. `http://localhost:3000/api/v1`.
pub struct HttpChartApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl HttpChartApi {
    /// Create a new client with its own connection pool.
    pub fn new(api_url: String, token: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    /// Create a client sharing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Replace the bearer token, e.g. after a refresh.
    pub fn set_token(&mut self, token: String) {
        self.token = token;
    }

    fn charts_url(&self) -> String {
        format!("{}/charts", self.api_url)
    }

    fn chart_url(&self, chart_id: ChartId) -> String {
        format!("{}/charts/{}", self.api_url, chart_id)
    }

    // ---- private helpers ----

    /// Turn a non-success response into [`ClientError::Api`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let body: serde_json::Value = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        let code = body["code"].as_str().unwrap_or("UNKNOWN").to_string();
        let message = body["error"].as_str().map(str::to_string).unwrap_or(text);

        tracing::debug!(status = status.as_u16(), code = %code, "Chart API request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
            body,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Parse a `{ "data": T }` envelope.
    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let envelope: DataEnvelope<T> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }
}

impl ChartApi for HttpChartApi {
    async fn list_charts(&self) -> Result<Vec<Chart>, ClientError> {
        let response = self
            .client
            .get(self.charts_url())
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse_data(response).await
    }

    async fn get_chart(&self, chart_id: ChartId) -> Result<ChartView, ClientError> {
        let response = self
            .client
            .get(self.chart_url(chart_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse_data(response).await
    }

    async fn create_chart(
        &self,
        name: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Chart, ClientError> {
        let response = self
            .client
            .post(self.charts_url())
            .bearer_auth(&self.token)
            .json(&CreateChartBody { name, metadata })
            .send()
            .await?;

        Self::parse_data(response).await
    }

    async fn rename_chart(&self, chart_id: ChartId, name: &str) -> Result<Chart, ClientError> {
        let response = self
            .client
            .patch(self.chart_url(chart_id))
            .bearer_auth(&self.token)
            .json(&RenameChartBody { name })
            .send()
            .await?;

        Self::parse_data(response).await
    }

    async fn delete_chart(&self, chart_id: ChartId) -> Result<DeletedChart, ClientError> {
        let response = self
            .client
            .delete(self.chart_url(chart_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse_data(response).await
    }

    async fn update_layout(
        &self,
        chart_id: ChartId,
        layout: &DesiredLayout,
    ) -> Result<LayoutUpdateResponse, ClientError> {
        let body = LayoutRequest {
            chart_id: Some(chart_id),
            layout: layout.clone(),
        };
        let response = self
            .client
            .patch(format!("{}/layout", self.chart_url(chart_id)))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
