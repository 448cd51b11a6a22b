use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::adapter::CrmAdapter;
use crate::error::{CrmError, Result};
use crate::notes::summary_to_html;
use crate::types::{ContactPayload, ConversationSummary};

/// HubSpot `contacts`/`notes` sync via the CRM v3 API.
pub struct HubSpotAdapter {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl HubSpotAdapter {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: "https://api.hubapi.com".to_string(), access_token: access_token.into() }
    }

    async fn search_contact(&self, email: Option<&str>, phone: Option<&str>) -> Result<Option<String>> {
        let mut filter_groups = Vec::new();
        if let Some(email) = email {
            filter_groups.push(serde_json::json!({
                "filters": [{ "propertyName": "email", "operator": "EQ", "value": email }]
            }));
        }
        if let Some(phone) = phone {
            filter_groups.push(serde_json::json!({
                "filters": [{ "propertyName": "phone", "operator": "EQ", "value": phone }]
            }));
        }
        if filter_groups.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/crm/v3/objects/contacts/search", self.base_url);
        let payload = serde_json::json!({
            "filterGroups": filter_groups,
            "properties": ["id", "email", "firstname", "lastname"],
            "limit": 1,
        });
        let resp = self.client.post(&url).bearer_auth(&self.access_token).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            warn!(status, message, "HubSpot search error");
            return Ok(None);
        }
        let body: SearchResponse = resp.json().await?;
        Ok(body.results.into_iter().next().map(|r| r.id))
    }
}

#[async_trait]
impl CrmAdapter for HubSpotAdapter {
    fn platform_name(&self) -> &'static str {
        "HubSpot"
    }

    async fn sync_lead(&self, name: &str, email: Option<&str>, phone: Option<&str>) -> Result<()> {
        if email.is_none() && phone.is_none() {
            warn!("HubSpot: cannot sync lead without email or phone");
            return Ok(());
        }

        let existing_id = self.search_contact(email, phone).await?;

        let mut properties = serde_json::Map::new();
        if let Some(email) = email {
            properties.insert("email".to_string(), serde_json::json!(email));
        }
        if let Some(phone) = phone {
            properties.insert("phone".to_string(), serde_json::json!(phone));
        }
        if !name.is_empty() {
            let mut parts = name.splitn(2, ' ');
            properties.insert("firstname".to_string(), serde_json::json!(parts.next().unwrap_or_default()));
            properties.insert("lastname".to_string(), serde_json::json!(parts.next().unwrap_or("Unknown")));
        }

        let payload = serde_json::json!({ "properties": properties });
        match existing_id {
            Some(id) => {
                let url = format!("{}/crm/v3/objects/contacts/{}", self.base_url, id);
                let resp = self.client.patch(&url).bearer_auth(&self.access_token).json(&payload).send().await?;
                if !resp.status().is_success() {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    return Err(CrmError::Api { platform: "HubSpot", status, message });
                }
                info!(contact_id = %id, "HubSpot: updated contact");
            }
            None => {
                let url = format!("{}/crm/v3/objects/contacts", self.base_url);
                let resp = self.client.post(&url).bearer_auth(&self.access_token).json(&payload).send().await?;
                if resp.status().as_u16() != 201 {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    return Err(CrmError::Api { platform: "HubSpot", status, message });
                }
                info!("HubSpot: created new contact");
            }
        }
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
        let Some(contact_id) = self.search_contact(email, phone).await? else {
            warn!("HubSpot: could not find contact to attach summary");
            return Ok(());
        };

        let note_body = summary_to_html(summary);
        let ts_ms: i64 = summary
            .conversation_end
            .as_deref()
            .and_then(|t| chrono::NaiveDateTime::parse_from_str(t, "%d/%m/%Y %H:%M").ok())
            .map(|naive| naive.and_utc().timestamp_millis())
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        let url = format!("{}/crm/v3/objects/notes", self.base_url);
        let payload = serde_json::json!({
            "properties": { "hs_note_body": note_body, "hs_timestamp": ts_ms.to_string() },
            "associations": [{
                "to": { "id": contact_id },
                "types": [{ "associationCategory": "HUBSPOT_DEFINED", "associationTypeId": 202 }]
            }]
        });
        let resp = self.client.post(&url).bearer_auth(&self.access_token).json(&payload).send().await?;
        if resp.status().as_u16() != 201 {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(CrmError::Api { platform: "HubSpot", status, message });
        }
        info!(contact_id = %contact_id, "HubSpot: added summary note to contact");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ContactRecord>,
}

#[derive(Debug, Deserialize)]
struct ContactRecord {
    id: String,
}
