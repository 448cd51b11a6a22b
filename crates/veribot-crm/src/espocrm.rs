use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::adapter::CrmAdapter;
use crate::error::{CrmError, Result};
use crate::notes::summary_to_html;
use crate::types::{ContactPayload, ConversationSummary};

/// EspoCRM `Lead` entity sync, authenticated via the `X-Api-Key` header
/// EspoCRM's REST API expects.
pub struct EspoCrmAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EspoCrmAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), api_key: api_key.into() }
    }

    async fn find_lead(&self, email: Option<&str>, phone: Option<&str>) -> Result<Option<String>> {
        let (attribute, value) = match (email, phone) {
            (Some(email), _) => ("emailAddress", email),
            (None, Some(phone)) => ("phoneNumber", phone),
            (None, None) => return Ok(None),
        };
        let url = format!("{}/api/v1/Lead", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("where[0][type]", "equals"),
                ("where[0][attribute]", attribute),
                ("where[0][value]", value),
                ("maxSize", "1"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(CrmError::Api { platform: "EspoCRM", status, message });
        }
        let body: SearchResponse = resp.json().await?;
        Ok(body.list.into_iter().next().map(|l| l.id))
    }
}

#[async_trait]
impl CrmAdapter for EspoCrmAdapter {
    fn platform_name(&self) -> &'static str {
        "EspoCRM"
    }

    async fn sync_lead(&self, name: &str, email: Option<&str>, phone: Option<&str>) -> Result<()> {
        if email.is_none() && phone.is_none() {
            warn!("EspoCRM: cannot sync lead without email or phone");
            return Ok(());
        }

        let mut parts = name.splitn(2, ' ');
        let first_name = parts.next().unwrap_or_default();
        let last_name = parts.next().unwrap_or("Unknown");

        let mut payload = serde_json::json!({ "firstName": first_name, "lastName": last_name });
        if let Some(email) = email {
            payload["emailAddress"] = serde_json::json!(email);
        }
        if let Some(phone) = phone {
            payload["phoneNumber"] = serde_json::json!(phone);
        }

        let existing = self.find_lead(email, phone).await?;
        let (method_is_patch, url) = match &existing {
            Some(id) => (true, format!("{}/api/v1/Lead/{}", self.base_url, id)),
            None => (false, format!("{}/api/v1/Lead", self.base_url)),
        };

        let request = if method_is_patch {
            self.client.patch(&url)
        } else {
            self.client.post(&url)
        };
        let resp = request.header("X-Api-Key", &self.api_key).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(CrmError::Api { platform: "EspoCRM", status, message });
        }
        info!(updated = method_is_patch, "EspoCRM: lead synced");
        Ok(())
    }

    async fn sync_contact(&self, contact: &ContactPayload) -> Result<()> {
        let name = contact.name.clone().unwrap_or_default();
        self.sync_lead(&name, contact.email.as_deref(), contact.phone.as_deref()).await
    }

    async fn update_lead_summary(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        summary: &ConversationSummary,
    ) -> Result<()> {
        let Some(lead_id) = self.find_lead(email, phone).await? else {
            warn!("EspoCRM: could not find lead to attach summary");
            return Ok(());
        };
        let url = format!("{}/api/v1/Lead/{}", self.base_url, lead_id);
        let payload = serde_json::json!({ "description": summary_to_html(summary) });
        let resp = self.client.patch(&url).header("X-Api-Key", &self.api_key).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(CrmError::Api { platform: "EspoCRM", status, message });
        }
        info!(lead_id, "EspoCRM: summary attached to lead");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    list: Vec<LeadRecord>,
}

#[derive(Debug, Deserialize)]
struct LeadRecord {
    id: String,
}
