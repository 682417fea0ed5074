//! Request and response bodies for the results backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::listing::ListingRecord;

/// Agent name reported for the extraction stage.
pub const CRAWLER_AGENT: &str = "crawler-agent";

/// Agent name reported for the cleaning stage.
pub const CLEANER_AGENT: &str = "cleaner-agent";

/// Status string for a finished, successful run.
pub const STATUS_SUCCESS: &str = "Success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_name: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl AgentStatus {
    /// A completed, successful agent run.
    pub fn succeeded(
        agent_name: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            status: STATUS_SUCCESS.to_string(),
            start_time,
            end_time: Some(end_time),
        }
    }
}

/// Body of `POST /scraping-results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResultCreate {
    pub source_url: String,
    pub listing_type: String,
    pub data: Value,
    pub progress: u8,
    pub status: String,
    pub scraped_at: DateTime<Utc>,
    pub target_id: String,
    pub agent_status: Vec<AgentStatus>,
}

impl ScrapingResultCreate {
    /// One finished result per canonical listing.
    pub fn from_listing(
        record: &ListingRecord,
        source_url: impl Into<String>,
        target_id: impl Into<String>,
        scraped_at: DateTime<Utc>,
        agent_status: Vec<AgentStatus>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            listing_type: record
                .listing_type
                .map_or_else(|| "unknown".to_string(), |t| t.to_string()),
            data: record.to_value(),
            progress: 100,
            status: STATUS_SUCCESS.to_string(),
            scraped_at,
            target_id: target_id.into(),
            agent_status,
        }
    }
}

/// Body of `PUT /scraping-results`. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResultUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ScrapingResultUpdate {
    pub fn new(id: impl Into<String>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            source_url: None,
            listing_type: None,
            data: None,
            progress: None,
            status: None,
            scraped_at,
            last_updated: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>, progress: u8) -> Self {
        self.status = Some(status.into());
        self.progress = Some(progress);
        self
    }
}

/// Body of `DELETE /scraping-results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapingResultDelete {
    pub id: String,
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub data: LoginData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::normalize_record;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_create_payload_from_listing() {
        let record = normalize_record(&json!({
            "address": "Calle 5, Merida", "price": 1500000, "bedrooms": 2, "bathrooms": 1,
            "listing_type": "rent", "property_type": "house", "description": "Casa",
            "image_link": "https://img.example.com/m.jpg"
        }))
        .unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 0).unwrap();

        let payload = ScrapingResultCreate::from_listing(
            &record,
            "https://www.casasyterrenos.com/",
            "target-1",
            end,
            vec![AgentStatus::succeeded(CRAWLER_AGENT, start, end)],
        );
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["listing_type"], "rent");
        assert_eq!(value["progress"], 100);
        assert_eq!(value["status"], "Success");
        assert_eq!(value["data"]["address"], "Calle 5, Merida");
        assert_eq!(value["agent_status"][0]["agent_name"], "crawler-agent");
        assert_eq!(value["scraped_at"], "2024-05-01T12:03:00Z");
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let update = ScrapingResultUpdate::new("r-1", at).with_status("Success", 100);
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value["id"], "r-1");
        assert_eq!(value["progress"], 100);
        assert!(value.get("data").is_none());
        assert!(value.get("last_updated").is_some());
    }

    #[test]
    fn test_login_response_token() {
        let response: LoginResponse = serde_json::from_value(json!({
            "status": 200, "message": "Login successful",
            "data": {"token": "eyJ...", "user": {"id": "u"}}
        }))
        .unwrap();
        assert_eq!(response.data.token, "eyJ...");
    }
}
