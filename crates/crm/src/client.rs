//! CRM API client: one method per logical operation.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Query, ReqwestTransport};
use crate::{Credentials, Entity, Error, Result};

/// Shown in place of smart-link 404s.
pub const SMART_LINKS_UNAVAILABLE: &str =
    "Smart link endpoints are not available in the CRM API yet";

/// Workaround offered alongside [`SMART_LINKS_UNAVAILABLE`].
pub const SMART_LINKS_SUGGESTION: &str =
    "Create and manage smart links manually in the CRM dashboard until the API supports them";

/// Campaign delivery state, toggled by pause/resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatus {
    Active,
    Paused,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" | "resume" | "resumed" => Ok(Self::Active),
            "paused" | "pause" => Ok(Self::Paused),
            other => Err(format!("unknown campaign status '{other}' (expected active or paused)")),
        }
    }
}

/// Authenticated client for the CRM REST API.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct CrmClient {
    transport: Arc<dyn HttpTransport>,
}

impl CrmClient {
    pub fn new(transport: impl HttpTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Client over reqwest with the given per-request timeout.
    pub fn connect(credentials: &Credentials, timeout: Duration) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new(credentials, timeout)?))
    }

    // --- Contacts ---

    pub async fn list_contacts(&self, query: Query) -> Result<Value> {
        self.get(Entity::Contact, "", query).await
    }

    pub async fn get_contact(&self, id: u64) -> Result<Value> {
        self.get(Entity::Contact, &format!("/{id}"), Vec::new()).await
    }

    pub async fn create_contact(&self, body: Value) -> Result<Value> {
        self.post(Entity::Contact, "", body).await
    }

    pub async fn update_contact(&self, id: u64, body: Value) -> Result<Value> {
        self.put(Entity::Contact, &format!("/{id}"), body).await
    }

    pub async fn delete_contact(&self, id: u64) -> Result<Value> {
        self.delete(Entity::Contact, &format!("/{id}")).await
    }

    /// `term` goes first in the query string, followed by any filters.
    pub async fn search_contacts(&self, term: &str, filters: Query) -> Result<Value> {
        let mut query = vec![("search".to_string(), term.to_string())];
        query.extend(filters);
        self.get(Entity::Contact, "", query).await
    }

    // --- Tags ---

    pub async fn list_tags(&self, query: Query) -> Result<Value> {
        self.get(Entity::Tag, "", query).await
    }

    pub async fn create_tag(&self, body: Value) -> Result<Value> {
        self.post(Entity::Tag, "", body).await
    }

    pub async fn update_tag(&self, id: u64, body: Value) -> Result<Value> {
        self.put(Entity::Tag, &format!("/{id}"), body).await
    }

    pub async fn delete_tag(&self, id: u64) -> Result<Value> {
        self.delete(Entity::Tag, &format!("/{id}")).await
    }

    pub async fn attach_tags(&self, contact_id: u64, tag_ids: &[u64]) -> Result<Value> {
        let body = json!({ "tagIds": tag_ids });
        self.post(Entity::Contact, &format!("/{contact_id}/tags"), body).await
    }

    // --- Lists ---

    pub async fn list_lists(&self, query: Query) -> Result<Value> {
        self.get(Entity::List, "", query).await
    }

    pub async fn create_list(&self, body: Value) -> Result<Value> {
        self.post(Entity::List, "", body).await
    }

    pub async fn update_list(&self, id: u64, body: Value) -> Result<Value> {
        self.put(Entity::List, &format!("/{id}"), body).await
    }

    pub async fn delete_list(&self, id: u64) -> Result<Value> {
        self.delete(Entity::List, &format!("/{id}")).await
    }

    pub async fn attach_lists(&self, contact_id: u64, list_ids: &[u64]) -> Result<Value> {
        let body = json!({ "listIds": list_ids });
        self.post(Entity::Contact, &format!("/{contact_id}/lists"), body).await
    }

    // --- Campaigns ---

    pub async fn list_campaigns(&self, query: Query) -> Result<Value> {
        self.get(Entity::Campaign, "", query).await
    }

    pub async fn create_campaign(&self, body: Value) -> Result<Value> {
        self.post(Entity::Campaign, "", body).await
    }

    pub async fn update_campaign(&self, id: u64, body: Value) -> Result<Value> {
        self.put(Entity::Campaign, &format!("/{id}"), body).await
    }

    /// Pause or resume by updating the campaign's status field.
    pub async fn set_campaign_status(&self, id: u64, status: CampaignStatus) -> Result<Value> {
        let body = json!({ "status": status.as_str() });
        self.put(Entity::Campaign, &format!("/{id}"), body).await
    }

    // --- Templates, automations, webhooks ---

    pub async fn list_templates(&self, query: Query) -> Result<Value> {
        self.get(Entity::Template, "", query).await
    }

    pub async fn create_template(&self, body: Value) -> Result<Value> {
        self.post(Entity::Template, "", body).await
    }

    pub async fn list_automations(&self, query: Query) -> Result<Value> {
        self.get(Entity::Automation, "", query).await
    }

    pub async fn create_automation(&self, body: Value) -> Result<Value> {
        self.post(Entity::Automation, "", body).await
    }

    pub async fn list_webhooks(&self, query: Query) -> Result<Value> {
        self.get(Entity::Webhook, "", query).await
    }

    pub async fn create_webhook(&self, body: Value) -> Result<Value> {
        self.post(Entity::Webhook, "", body).await
    }

    // --- Smart links ---

    pub async fn list_smart_links(&self, query: Query) -> Result<Value> {
        self.get(Entity::SmartLink, "", query).await
    }

    pub async fn get_smart_link(&self, id: u64) -> Result<Value> {
        self.get(Entity::SmartLink, &format!("/{id}"), Vec::new()).await
    }

    pub async fn create_smart_link(&self, body: Value) -> Result<Value> {
        self.post(Entity::SmartLink, "", body).await
    }

    pub async fn update_smart_link(&self, id: u64, body: Value) -> Result<Value> {
        self.put(Entity::SmartLink, &format!("/{id}"), body).await
    }

    pub async fn delete_smart_link(&self, id: u64) -> Result<Value> {
        self.delete(Entity::SmartLink, &format!("/{id}")).await
    }

    pub async fn generate_shortcode(&self, body: Value) -> Result<Value> {
        self.post(Entity::SmartLink, "/generate-shortcode", body).await
    }

    pub async fn validate_url(&self, body: Value) -> Result<Value> {
        self.post(Entity::SmartLink, "/validate-url", body).await
    }

    // --- Reports ---

    pub async fn report_stats(&self, query: Query) -> Result<Value> {
        self.get(Entity::Report, "/stats", query).await
    }

    pub async fn custom_fields(&self, query: Query) -> Result<Value> {
        self.get(Entity::Report, "/custom-fields", query).await
    }

    // --- Internal methods ---

    async fn get(&self, entity: Entity, suffix: &str, query: Query) -> Result<Value> {
        self.execute(entity, Method::GET, suffix, query, None).await
    }

    async fn post(&self, entity: Entity, suffix: &str, body: Value) -> Result<Value> {
        self.execute(entity, Method::POST, suffix, Vec::new(), Some(body)).await
    }

    async fn put(&self, entity: Entity, suffix: &str, body: Value) -> Result<Value> {
        self.execute(entity, Method::PUT, suffix, Vec::new(), Some(body)).await
    }

    async fn delete(&self, entity: Entity, suffix: &str) -> Result<Value> {
        self.execute(entity, Method::DELETE, suffix, Vec::new(), None).await
    }

    /// Single path every operation goes through.
    async fn execute(
        &self,
        entity: Entity,
        method: Method,
        suffix: &str,
        query: Query,
        body: Option<Value>,
    ) -> Result<Value> {
        let path = entity.path(suffix);
        debug!(%method, %path, "sending CRM request");

        let request = ApiRequest {
            method: method.clone(),
            path: path.clone(),
            query,
            body,
        };
        let outcome = match self.transport.send(request).await {
            Ok(response) => normalize(response),
            Err(e) => Err(e),
        };

        match outcome {
            Err(Error::Api { status: 404, .. }) if entity.degrades_on_not_found() => {
                warn!(%method, %path, "smart link endpoint not available, returning workaround");
                Ok(smart_links_unavailable())
            }
            Err(e) => {
                warn!(%method, %path, error = %e, "CRM request failed");
                Err(e)
            }
            Ok(value) => {
                debug!(%method, %path, "CRM request succeeded");
                Ok(value)
            }
        }
    }
}

/// Map a raw response to the payload or the normalized error.
///
/// 2xx bodies are returned as parsed; bodies that are not JSON come back as
/// a string and an empty body as `null`. For other statuses the body's
/// `message` field wins over the generic status text.
pub fn normalize(response: ApiResponse) -> Result<Value> {
    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)));
    }

    let status = response.status;
    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| format!("request failed with status code {status}"));

    Err(Error::Api { status, message })
}

fn smart_links_unavailable() -> Value {
    json!({
        "success": false,
        "message": SMART_LINKS_UNAVAILABLE,
        "suggestion": SMART_LINKS_SUGGESTION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTransport;

    fn client(mock: &MockTransport) -> CrmClient {
        CrmClient::new(mock.clone())
    }

    #[test]
    fn normalize_passes_body_through() {
        let body = r#"{"data":[{"id":1,"name":"vip"}],"meta":{"total":1}}"#;
        let value = normalize(ApiResponse::new(200, body)).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(body).unwrap());
    }

    #[test]
    fn normalize_empty_body_is_null() {
        assert_eq!(normalize(ApiResponse::new(204, "")).unwrap(), Value::Null);
    }

    #[test]
    fn normalize_non_json_success_is_string() {
        let value = normalize(ApiResponse::new(200, "OK")).unwrap();
        assert_eq!(value, Value::String("OK".into()));
    }

    #[test]
    fn normalize_prefers_body_message() {
        let err = normalize(ApiResponse::new(422, r#"{"message":"email taken"}"#)).unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), "CRM API error: email taken");
    }

    #[test]
    fn normalize_falls_back_to_status_text() {
        let err = normalize(ApiResponse::new(500, "<html>oops</html>")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CRM API error: request failed with status code 500"
        );

        let err = normalize(ApiResponse::new(400, r#"{"message":42}"#)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CRM API error: request failed with status code 400"
        );
    }

    #[test]
    fn campaign_status_parse() {
        assert_eq!("paused".parse::<CampaignStatus>(), Ok(CampaignStatus::Paused));
        assert_eq!("resume".parse::<CampaignStatus>(), Ok(CampaignStatus::Active));
        assert!("archived".parse::<CampaignStatus>().is_err());
    }

    #[tokio::test]
    async fn get_contact_builds_path() {
        let mock = MockTransport::new().respond_with(200, json!({"id": 7}));
        let value = client(&mock).get_contact(7).await.unwrap();

        assert_eq!(value, json!({"id": 7}));
        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/subscribers/7");
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn search_puts_term_first() {
        let mock = MockTransport::new();
        client(&mock)
            .search_contacts("ann", vec![("status".into(), "active".into())])
            .await
            .unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(
            request.query,
            vec![
                ("search".to_string(), "ann".to_string()),
                ("status".to_string(), "active".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn attach_tags_posts_ids() {
        let mock = MockTransport::new();
        client(&mock).attach_tags(5, &[1, 2]).await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/subscribers/5/tags");
        assert_eq!(request.body, Some(json!({"tagIds": [1, 2]})));
    }

    #[tokio::test]
    async fn set_campaign_status_puts_status() {
        let mock = MockTransport::new();
        client(&mock)
            .set_campaign_status(9, CampaignStatus::Paused)
            .await
            .unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/campaigns/9");
        assert_eq!(request.body, Some(json!({"status": "paused"})));
    }

    #[tokio::test]
    async fn smart_link_404_degrades() {
        let mock = MockTransport::new().respond_with(404, json!({"message": "Not Found"}));
        let value = client(&mock).get_smart_link(3).await.unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["message"], json!(SMART_LINKS_UNAVAILABLE));
        assert_eq!(value["suggestion"], json!(SMART_LINKS_SUGGESTION));
    }

    #[tokio::test]
    async fn smart_link_other_errors_surface() {
        let mock = MockTransport::new().respond_with(500, json!({"message": "boom"}));
        let err = client(&mock).list_smart_links(Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "CRM API error: boom");
    }

    #[tokio::test]
    async fn tag_404_is_an_error() {
        let mock = MockTransport::new().respond_with(404, json!({"message": "Tag not found"}));
        let err = client(&mock).delete_tag(3).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "CRM API error: Tag not found");
    }

    #[tokio::test]
    async fn contact_404_under_subscribers_path_is_an_error() {
        // Attaching tags hits /subscribers, so the smart-link exception must not apply.
        let mock = MockTransport::new().respond_with(404, json!({"message": "no such subscriber"}));
        let err = client(&mock).attach_tags(1, &[2]).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn transport_failure_is_normalized() {
        let mock = MockTransport::new().fail_with("connection refused");
        let err = client(&mock).list_tags(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.to_string(), "CRM API error: connection refused");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn smart_link_transport_failure_is_not_degraded() {
        let mock = MockTransport::new().fail_with("dns error");
        let err = client(&mock).list_smart_links(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
