//! Payment endpoints

use crate::error::Result;
use crate::http::{ApiRequest, AuthenticatedHttpClient};
use crate::types::JsonValue;
use serde_json::json;
use std::sync::Arc;

/// Payments API
#[derive(Debug, Clone)]
pub struct PaymentsApi {
    client: Arc<AuthenticatedHttpClient>,
}

impl PaymentsApi {
    /// Create over a shared client
    pub fn new(client: Arc<AuthenticatedHttpClient>) -> Self {
        Self { client }
    }

    /// Start a payment
    pub async fn create(&self, payment: &JsonValue) -> Result<JsonValue> {
        let request = ApiRequest::post("/api/payments/create/").json(payment)?;
        self.client.request_json(request).await
    }

    /// Status of a payment
    pub async fn status(&self, payment_id: &str) -> Result<JsonValue> {
        let request = ApiRequest::get("/api/payments/status/").query("payment_id", payment_id);
        self.client.request_json(request).await
    }

    /// Complete a payment against the sandbox provider
    pub async fn simulate(&self, payment_id: &str) -> Result<JsonValue> {
        let request = ApiRequest::post("/api/payments/simulate/")
            .json(&json!({ "payment_id": payment_id }))?;
        self.client.request_json(request).await
    }
}
