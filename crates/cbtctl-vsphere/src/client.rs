//! vSphere REST API HTTP client with session-based authentication.
//!
//! Talks to vCenter / ESXi via `https://{host}/api/...`. Owns the session
//! lifecycle and funnels every call through one request helper so the
//! session header, status mapping, and body parsing live in a single place.

use crate::error::{VsphereError, VsphereErrorKind, VsphereResult};
use crate::types::VsphereConfig;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// vSphere REST API client.
pub struct VsphereClient {
    http: Client,
    base_url: String,
    session_id: Option<String>,
    config: VsphereConfig,
}

impl VsphereClient {
    /// Build a new client from config (does NOT create a session yet).
    pub fn new(config: &VsphereConfig) -> VsphereResult<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VsphereError::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: format!("https://{}:{}", config.host, config.port),
            session_id: None,
            config: config.clone(),
        })
    }

    /// Whether we have an active session.
    pub fn is_connected(&self) -> bool {
        self.session_id.is_some()
    }

    /// Current session ID (if any).
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    // ── Session management ──────────────────────────────────────────

    /// Create a new API session (POST /api/session).
    ///
    /// The session ID comes back as a bare JSON string and is attached to
    /// every subsequent request via the `vmware-api-session-id` header.
    pub async fn login(&mut self) -> VsphereResult<String> {
        let url = format!("{}/api/session", self.base_url);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(VsphereError::auth("Invalid credentials")),
            s if s.is_success() => {
                let session_id: String = resp.json().await.map_err(|e| {
                    VsphereError::parse(format!("Failed to parse session response: {e}"))
                })?;
                self.session_id = Some(session_id.clone());
                Ok(session_id)
            }
            s => {
                let body = resp.text().await.unwrap_or_default();
                Err(VsphereError::api(s.as_u16(), format!("Login failed: {body}")))
            }
        }
    }

    /// Delete the current session (DELETE /api/session). Best-effort.
    pub async fn logout(&mut self) {
        if let Some(sid) = self.session_id.take() {
            let url = format!("{}/api/session", self.base_url);
            let _ = self
                .http
                .delete(&url)
                .header("vmware-api-session-id", sid)
                .send()
                .await;
        }
    }

    /// Check if the session is still valid (GET /api/session).
    pub async fn check_session(&self) -> VsphereResult<bool> {
        let resp = self.send(Method::GET, "/api/session", None, None::<&()>).await;
        match resp {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind, VsphereErrorKind::AuthenticationError) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ── Typed verbs ─────────────────────────────────────────────────

    /// GET a JSON document.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> VsphereResult<T> {
        let resp = self.send(Method::GET, path, None, None::<&()>).await?;
        Self::parse_body(resp).await
    }

    /// GET a JSON document with query params.
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> VsphereResult<T> {
        let resp = self.send(Method::GET, path, Some(params), None::<&()>).await?;
        Self::parse_body(resp).await
    }

    /// POST a JSON body, parse the JSON reply.
    pub async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> VsphereResult<T> {
        let resp = self.send(Method::POST, path, None, Some(body)).await?;
        Self::parse_body(resp).await
    }

    /// PATCH a JSON body, discard the reply.
    pub async fn patch<B: serde::Serialize>(&self, path: &str, body: &B) -> VsphereResult<()> {
        self.send(Method::PATCH, path, None, Some(body)).await?;
        Ok(())
    }

    /// DELETE, discard the reply.
    pub async fn delete(&self, path: &str) -> VsphereResult<()> {
        self.send(Method::DELETE, path, None, None::<&()>).await?;
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────

    async fn send<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        params: Option<&[(String, String)]>,
        body: Option<&B>,
    ) -> VsphereResult<Response> {
        let sid = self
            .session_id
            .as_deref()
            .ok_or_else(|| VsphereError::auth("Not logged in — no active session"))?;

        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("vmware-api-session-id", sid);
        if let Some(params) = params {
            let borrowed: Vec<(&str, &str)> =
                params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            req = req.query(&borrowed);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED => {
                VsphereError::auth(format!("Session expired or invalid: {body}"))
            }
            StatusCode::FORBIDDEN => VsphereError::new(
                VsphereErrorKind::AccessDenied,
                format!("Access denied: {body}"),
            ),
            StatusCode::NOT_FOUND => {
                VsphereError::not_found(format!("Resource not found: {body}"))
            }
            s => VsphereError::api(s.as_u16(), format!("API error {}: {body}", s.as_u16())),
        })
    }

    async fn parse_body<T: DeserializeOwned>(resp: Response) -> VsphereResult<T> {
        let text = resp
            .text()
            .await
            .map_err(|e| VsphereError::parse(format!("Failed to read response body: {e}")))?;

        // Some vSphere endpoints return an empty body on success
        let text = if text.is_empty() { "null".to_string() } else { text };

        serde_json::from_str(&text).map_err(|e| {
            VsphereError::parse(format!(
                "JSON parse error: {e} — body: {}",
                truncate_on_char_boundary(&text, 500)
            ))
        })
    }
}

/// Clamp a body excerpt for error messages without splitting a multi-byte
/// UTF-8 character.
fn truncate_on_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_pass_through_untruncated() {
        assert_eq!(truncate_on_char_boundary("plain ascii", 500), "plain ascii");
    }

    #[test]
    fn ascii_bodies_cut_at_the_limit() {
        let body = "x".repeat(600);
        assert_eq!(truncate_on_char_boundary(&body, 500).len(), 500);
    }

    #[test]
    fn multibyte_bodies_never_split_a_character() {
        // é is two bytes; with 499 ASCII bytes first, byte 500 lands
        // mid-character and must back off to byte 499.
        let body = format!("{}ééééé", "x".repeat(499));
        let cut = truncate_on_char_boundary(&body, 500);
        assert_eq!(cut.len(), 499);
        assert!(cut.chars().all(|c| c == 'x'));

        // All-multibyte body, limit inside a character
        let umlauts = "ü".repeat(300);
        let cut = truncate_on_char_boundary(&umlauts, 499);
        assert_eq!(cut.len(), 498);
        assert!(cut.chars().all(|c| c == 'ü'));
    }
}
