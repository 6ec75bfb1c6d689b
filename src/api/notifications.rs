//! Notification endpoints

use crate::error::Result;
use crate::http::{ApiRequest, AuthenticatedHttpClient};
use crate::types::JsonValue;
use std::fmt::Display;
use std::sync::Arc;

const BASE: &str = "/api/notifications";

/// Notifications API
#[derive(Debug, Clone)]
pub struct NotificationsApi {
    client: Arc<AuthenticatedHttpClient>,
}

impl NotificationsApi {
    /// Create over a shared client
    pub fn new(client: Arc<AuthenticatedHttpClient>) -> Self {
        Self { client }
    }

    /// Notifications of the current user
    pub async fn list(&self) -> Result<JsonValue> {
        self.client.get_json(&format!("{BASE}/")).await
    }

    /// A single notification
    pub async fn get(&self, id: impl Display) -> Result<JsonValue> {
        self.client.get_json(&format!("{BASE}/{id}/")).await
    }

    /// Mark one notification read
    pub async fn mark_read(&self, id: impl Display) -> Result<JsonValue> {
        self.client
            .request_json(ApiRequest::post(format!("{BASE}/{id}/mark-read/")))
            .await
    }

    /// Mark every notification read
    pub async fn mark_all_read(&self) -> Result<JsonValue> {
        self.client
            .request_json(ApiRequest::post(format!("{BASE}/mark-all-read/")))
            .await
    }

    /// Create a notification
    pub async fn create(&self, notification: &JsonValue) -> Result<JsonValue> {
        let request = ApiRequest::post(format!("{BASE}/create/")).json(notification)?;
        self.client.request_json(request).await
    }

    /// Replace a notification
    pub async fn update(&self, id: impl Display, notification: &JsonValue) -> Result<JsonValue> {
        let request = ApiRequest::put(format!("{BASE}/{id}/")).json(notification)?;
        self.client.request_json(request).await
    }

    /// Delete a notification
    pub async fn delete(&self, id: impl Display) -> Result<()> {
        self.client.delete(&format!("{BASE}/{id}/")).await?;
        Ok(())
    }

    /// Notification templates
    pub async fn templates(&self) -> Result<JsonValue> {
        self.client.get_json(&format!("{BASE}/templates/")).await
    }

    /// Create a template
    pub async fn create_template(&self, template: &JsonValue) -> Result<JsonValue> {
        let request = ApiRequest::post(format!("{BASE}/templates/")).json(template)?;
        self.client.request_json(request).await
    }

    /// Replace a template
    pub async fn update_template(
        &self,
        id: impl Display,
        template: &JsonValue,
    ) -> Result<JsonValue> {
        let request = ApiRequest::put(format!("{BASE}/templates/{id}/")).json(template)?;
        self.client.request_json(request).await
    }

    /// Delete a template
    pub async fn delete_template(&self, id: impl Display) -> Result<()> {
        self.client
            .delete(&format!("{BASE}/templates/{id}/"))
            .await?;
        Ok(())
    }
}
