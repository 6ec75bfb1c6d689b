//! Education catalogue and per-user study records

use super::models::Collection;
use crate::error::Result;
use crate::http::{ApiRequest, AuthenticatedHttpClient};
use crate::types::JsonValue;
use std::fmt::Display;
use std::sync::Arc;

const BASE: &str = "/api/education";

/// Page size requested for the university catalogue
const UNIVERSITY_LIMIT: &str = "1000";

/// Education API
#[derive(Debug, Clone)]
pub struct EducationApi {
    client: Arc<AuthenticatedHttpClient>,
}

impl EducationApi {
    /// Create over a shared client
    pub fn new(client: Arc<AuthenticatedHttpClient>) -> Self {
        Self { client }
    }

    // ========================================================================
    // Catalogue
    // ========================================================================

    /// Universities matching the filters; the whole catalogue in one page
    pub async fn universities(&self, filters: &[(&str, &str)]) -> Result<JsonValue> {
        let request = ApiRequest::get(format!("{BASE}/universities/"))
            .queries(filters.iter().copied().filter(|(k, _)| *k != "limit"))
            .query("limit", UNIVERSITY_LIMIT);
        self.client.request_json(request).await
    }

    /// A single university
    pub async fn university(&self, id: impl Display) -> Result<JsonValue> {
        self.get(format!("{BASE}/universities/{id}/")).await
    }

    /// Majors matching the filters
    pub async fn majors(&self, filters: &[(&str, &str)]) -> Result<JsonValue> {
        self.get_filtered(format!("{BASE}/majors/"), filters).await
    }

    /// Courses matching the filters
    pub async fn courses(&self, filters: &[(&str, &str)]) -> Result<JsonValue> {
        self.get_filtered(format!("{BASE}/courses/"), filters).await
    }

    /// A single course
    pub async fn course(&self, id: impl Display) -> Result<JsonValue> {
        self.get(format!("{BASE}/courses/{id}/")).await
    }

    // ========================================================================
    // User records
    // ========================================================================

    /// All records of a collection owned by the current user
    pub async fn list(&self, collection: Collection) -> Result<JsonValue> {
        self.get(format!("{BASE}/{collection}/")).await
    }

    /// Create a record
    pub async fn create(&self, collection: Collection, record: &JsonValue) -> Result<JsonValue> {
        let request = ApiRequest::post(format!("{BASE}/{collection}/")).json(record)?;
        self.client.request_json(request).await
    }

    /// Replace a record
    pub async fn update(
        &self,
        collection: Collection,
        id: impl Display,
        record: &JsonValue,
    ) -> Result<JsonValue> {
        let request = ApiRequest::put(format!("{BASE}/{collection}/{id}/")).json(record)?;
        self.client.request_json(request).await
    }

    /// Delete a record
    pub async fn delete(&self, collection: Collection, id: impl Display) -> Result<()> {
        self.client
            .delete(&format!("{BASE}/{collection}/{id}/"))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Achievements and recommendations
    // ========================================================================

    /// All achievements
    pub async fn achievements(&self) -> Result<JsonValue> {
        self.get(format!("{BASE}/achievements/")).await
    }

    /// Achievements earned by the current user
    pub async fn user_achievements(&self) -> Result<JsonValue> {
        self.get(format!("{BASE}/user-achievements/")).await
    }

    /// Stored AI recommendations
    pub async fn ai_recommendations(&self) -> Result<JsonValue> {
        self.get(format!("{BASE}/ai-recommendations/")).await
    }

    /// Ask the backend to generate fresh recommendations
    pub async fn generate_ai_recommendations(&self) -> Result<JsonValue> {
        self.client
            .request_json(ApiRequest::post(format!("{BASE}/generate-ai-recommendations/")))
            .await
    }

    /// Update a recommendation (e.g. mark it accepted)
    pub async fn update_ai_recommendation(
        &self,
        id: impl Display,
        changes: &JsonValue,
    ) -> Result<JsonValue> {
        let request = ApiRequest::put(format!("{BASE}/ai-recommendations/{id}/")).json(changes)?;
        self.client.request_json(request).await
    }

    /// Dashboard counters for the current user
    pub async fn dashboard_stats(&self) -> Result<JsonValue> {
        self.get(format!("{BASE}/dashboard/stats/")).await
    }

    async fn get(&self, path: String) -> Result<JsonValue> {
        self.client.request_json(ApiRequest::get(path)).await
    }

    async fn get_filtered(&self, path: String, filters: &[(&str, &str)]) -> Result<JsonValue> {
        let request = ApiRequest::get(path).queries(filters.iter().copied());
        self.client.request_json(request).await
    }
}
