// Direct API access for setup and teardown
//
// Suites establish deterministic preconditions by calling the application's
// JSON endpoints directly, authenticated with the cookies of a persisted
// session. Records created this way belong to the application; suites delete
// them explicitly so reruns start from a clean slate.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use playwright_rs::protocol::{Cookie, StorageState};
use reqwest::cookie::Jar;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::HarnessConfig;
use crate::credentials::Role;
use crate::error::{Error, Result};
use crate::state_store::SessionStore;

/// HTTP client carrying one session's cookies.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Client sending the unexpired cookies of `state`.
    ///
    /// Cookies go into a jar, so each request only carries the cookies whose
    /// domain, path and `Secure` flag match that request's URL.
    pub fn from_state(base_url: &Url, state: &StorageState) -> Result<Self> {
        let jar = cookie_jar(&state.cookies, unix_now())?;
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .build()?;
        Ok(Self {
            base_url: base_url.clone(),
            http,
        })
    }

    /// Client for the persisted session of `role`.
    pub async fn for_role(config: &HarnessConfig, store: &SessionStore, role: Role) -> Result<Self> {
        let state = store.load(role).await?;
        Self::from_state(&config.base_url, &state)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("cannot join API path '{}': {}", path, e)))
    }

    async fn send(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Result<Response> {
        let url = self.url(path)?;
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "api call");
        if status.is_success() {
            return Ok(response);
        }
        let body = error_body(response.text().await);
        Err(Error::Http {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.send(Method::GET, path, None).await?.json().await?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        Ok(self.send(Method::POST, path, Some(body)).await?.json().await?)
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.send(Method::POST, path, None).await?.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// The signed-in user.
    pub async fn me(&self) -> Result<Me> {
        self.get_json("/api/v1/me").await
    }

    pub fn connections(&self) -> Connections<'_> {
        Connections { api: self }
    }

    pub fn members<'a>(&'a self, project_id: &'a str) -> Members<'a> {
        Members {
            api: self,
            project_id,
        }
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Loads storage-state cookies into a jar as if each had been set by its own
/// origin.
///
/// A domain with a leading dot is a domain cookie and also applies to
/// subdomains; any other domain is host-only. Cookies that expired before
/// `now` (seconds since the epoch) are dropped; `-1` marks a session cookie.
fn cookie_jar(cookies: &[Cookie], now: f64) -> Result<Jar> {
    let jar = Jar::default();
    for cookie in cookies {
        if cookie.expires >= 0.0 && cookie.expires <= now {
            tracing::debug!(name = %cookie.name, domain = %cookie.domain, "skipping expired cookie");
            continue;
        }
        let host = cookie.domain.trim_start_matches('.');
        let path = if cookie.path.is_empty() { "/" } else { cookie.path.as_str() };
        let scheme = if cookie.secure { "https" } else { "http" };
        let origin = Url::parse(&format!("{}://{}{}", scheme, host, path)).map_err(|e| {
            Error::Config(format!(
                "cookie '{}' has an unusable domain '{}': {}",
                cookie.name, cookie.domain, e
            ))
        })?;
        jar.add_cookie_str(&set_cookie(cookie, path), &origin);
    }
    Ok(jar)
}

/// `Set-Cookie` value reproducing the scope of `cookie`.
fn set_cookie(cookie: &Cookie, path: &str) -> String {
    let mut value = format!("{}={}; Path={}", cookie.name, cookie.value, path);
    if let Some(domain) = cookie.domain.strip_prefix('.') {
        value.push_str(&format!("; Domain={}", domain));
    }
    if cookie.secure {
        value.push_str("; Secure");
    }
    if cookie.http_only {
        value.push_str("; HttpOnly");
    }
    value
}

/// Body text for an error response, keeping read failures visible.
fn error_body<E: fmt::Display>(read: std::result::Result<String, E>) -> String {
    read.unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Me {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub status: ConnectionStatus,
}

impl Connection {
    pub fn involves(&self, user_id: &str) -> bool {
        self.requester_id == user_id || self.recipient_id == user_id
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionList {
    connections: Vec<Connection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionRequest<'a> {
    recipient_id: &'a str,
}

/// `/api/v1/connections` as seen by one session.
pub struct Connections<'a> {
    api: &'a ApiClient,
}

impl Connections<'_> {
    pub async fn list(&self) -> Result<Vec<Connection>> {
        let list: ConnectionList = self.api.get_json("/api/v1/connections").await?;
        Ok(list.connections)
    }

    pub async fn send(&self, recipient_id: &str) -> Result<Connection> {
        self.api
            .post_json("/api/v1/connections", &ConnectionRequest { recipient_id })
            .await
    }

    pub async fn accept(&self, id: &str) -> Result<Connection> {
        self.api
            .post_empty(&format!("/api/v1/connections/{}/accept", id))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.api
            .delete(&format!("/api/v1/connections/{}", id))
            .await
    }

    pub async fn with_status(&self, status: ConnectionStatus) -> Result<Vec<Connection>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|c| c.status == status)
            .collect())
    }

    /// Requests awaiting a decision, in either direction.
    pub async fn pending_count(&self) -> Result<usize> {
        Ok(self.with_status(ConnectionStatus::Pending).await?.len())
    }

    /// Deletes every pending or accepted connection involving `user_id`.
    ///
    /// Returns how many records were removed; on an already-clean slate this
    /// is zero and not an error. A record that disappears between listing and
    /// deleting (404) counts as already removed.
    pub async fn cleanup(&self, user_id: &str) -> Result<usize> {
        let mut removed = 0;
        for connection in self.list().await?.into_iter().filter(|c| c.involves(user_id)) {
            match self.remove(&connection.id).await {
                Ok(()) => removed += 1,
                Err(Error::Http { status: 404, .. }) => {}
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(user_id, removed, "cleaned up connections");
        Ok(removed)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
struct MemberList {
    members: Vec<Member>,
}

/// `/api/v1/projects/{id}/members`.
pub struct Members<'a> {
    api: &'a ApiClient,
    project_id: &'a str,
}

impl Members<'_> {
    pub async fn list(&self) -> Result<Vec<Member>> {
        let list: MemberList = self
            .api
            .get_json(&format!("/api/v1/projects/{}/members", self.project_id))
            .await?;
        Ok(list.members)
    }

    pub async fn remove(&self, member_id: &str) -> Result<()> {
        self.api
            .delete(&format!(
                "/api/v1/projects/{}/members/{}",
                self.project_id, member_id
            ))
            .await
    }
}
