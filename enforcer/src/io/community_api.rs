//! Blocking HTTP client for the community platform's admin API.
//!
//! One client backs all three external seams: the member directory, direct
//! messages and account deactivation. No retries are attempted; a failed call
//! surfaces to the caller.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::types::Member;
use crate::io::directory::MemberDirectory;
use crate::io::messenger::{Deactivator, MessageOutcome, Messenger};

#[derive(Debug, Clone)]
pub struct CommunityApiConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct CommunityApi {
    client: Client,
    base_url: String,
    token: String,
}

/// Member as returned by the API.
#[derive(Debug, Clone, Deserialize)]
struct ApiMember {
    id: Value,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberPage {
    #[serde(default)]
    records: Vec<ApiMember>,
}

#[derive(Debug, Serialize)]
struct DirectMessageRequest<'a> {
    recipient_id: &'a str,
    body: &'a str,
}

impl ApiMember {
    fn into_member(self) -> Result<Member> {
        let id = match self.id {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            other => return Err(anyhow!("unexpected member id {other}")),
        };
        let has_photo = self
            .avatar_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        Ok(Member {
            id,
            email: self.email,
            name: self.name,
            has_photo,
        })
    }
}

impl CommunityApi {
    pub fn new(config: CommunityApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .with_context(|| format!("{what}: request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("{what}: HTTP {status}: {}", body.trim()));
        }
        Ok(response)
    }
}

impl MemberDirectory for CommunityApi {
    #[instrument(skip(self))]
    fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<Member>> {
        let request = self
            .client
            .get(self.url("/members"))
            .query(&[("page", page), ("per_page", per_page)]);
        let page_body: MemberPage = self
            .send(request, "list members")?
            .json()
            .context("decode member page")?;
        debug!(count = page_body.records.len(), "member page decoded");
        page_body
            .records
            .into_iter()
            .map(ApiMember::into_member)
            .collect()
    }

    #[instrument(skip(self))]
    fn fetch_member(&self, id: &str) -> Result<Member> {
        let request = self.client.get(self.url(&format!("/members/{id}")));
        let member: ApiMember = self
            .send(request, "fetch member")?
            .json()
            .with_context(|| format!("decode member {id}"))?;
        member.into_member()
    }
}

impl Messenger for CommunityApi {
    #[instrument(skip(self, body))]
    fn send_direct_message(&self, member_id: &str, body: &str) -> MessageOutcome {
        let request = self
            .client
            .post(self.url("/direct_messages"))
            .json(&DirectMessageRequest {
                recipient_id: member_id,
                body,
            });
        match self.send(request, "send direct message") {
            Ok(_) => MessageOutcome::delivered(),
            Err(err) => MessageOutcome::failed(format!("{err:#}")),
        }
    }
}

impl Deactivator for CommunityApi {
    #[instrument(skip(self))]
    fn deactivate(&self, member_id: &str) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("/members/{member_id}/deactivate")));
        self.send(request, "deactivate member")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Member {
        let api: ApiMember = serde_json::from_str(json).expect("json");
        api.into_member().expect("member")
    }

    #[test]
    fn numeric_ids_become_strings() {
        let member = parse(
            r#"{"id": 1234, "email": "a@example.com", "name": "A", "avatar_url": "a.png"}"#,
        );
        assert_eq!(member.id, "1234");
        assert!(member.has_photo);
    }

    #[test]
    fn missing_or_blank_avatar_means_no_photo() {
        let missing = parse(r#"{"id": "m1", "email": "a@example.com", "name": "A"}"#);
        let null =
            parse(r#"{"id": "m2", "email": "b@example.com", "name": "B", "avatar_url": null}"#);
        let blank =
            parse(r#"{"id": "m3", "email": "c@example.com", "name": "C", "avatar_url": "  "}"#);
        assert!(!missing.has_photo);
        assert!(!null.has_photo);
        assert!(!blank.has_photo);
    }

    #[test]
    fn object_id_is_rejected() {
        let api: ApiMember = serde_json::from_str(r#"{"id": {"x": 1}}"#).expect("json");
        assert!(api.into_member().is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = CommunityApi::new(CommunityApiConfig {
            base_url: "https://community.example.com/api/v1/".to_string(),
            token: "t".to_string(),
            timeout: Duration::from_secs(1),
        })
        .expect("client");
        assert_eq!(api.url("/members"), "https://community.example.com/api/v1/members");
    }
}
