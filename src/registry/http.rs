//! registry::http
//!
//! Docker Registry HTTP API v2 client.
//!
//! # Protocol
//!
//! - `GET /v2/` with HTTP Basic credentials opens the session. A `200` means
//!   the registry accepts Basic auth directly.
//! - A `401` carrying `WWW-Authenticate: Bearer realm=...,service=...` switches
//!   to token auth: the credentials are exchanged at `realm` for a bearer
//!   token, scoped `repository:{repo}:pull` when listing tags.
//! - `GET /v2/{repo}/tags/list` returns `{"name": ..., "tags": [...]}`;
//!   further pages are announced with `Link: <...>; rel="next"`.
//! - A `404` on tag listing means the repository has no tags.
//!
//! # Example
//!
//! ```ignore
//! use kubedeploy::registry::{HttpRegistry, Registry};
//!
//! let registry = HttpRegistry::new();
//! let session = registry.authenticate("registry.example.com", &creds).await?;
//! let tags = session.list_tags("myservice").await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK, USER_AGENT, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::traits::{Registry, RegistryError, RegistrySession};
use crate::credentials::Credentials;

/// User-Agent header value for registry requests.
const USER_AGENT_VALUE: &str = "kubedeploy";

/// Registry client speaking the v2 HTTP API.
///
/// By default sessions target `https://{domain}`. [`with_base_url`] points
/// every domain at a fixed base instead, for local registries and tests.
///
/// [`with_base_url`]: HttpRegistry::with_base_url
#[derive(Debug, Clone, Default)]
pub struct HttpRegistry {
    client: Client,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpRegistry {
    /// Create a registry client targeting `https://{domain}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every request to `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Bound each request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn base_for(&self, domain: &str) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}", domain),
        }
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn authenticate(
        &self,
        domain: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn RegistrySession>, RegistryError> {
        let base = self.base_for(domain);
        let transport = Transport {
            client: self.client.clone(),
            domain: domain.to_string(),
            timeout: self.timeout,
        };

        debug!(domain, base = %base, "opening registry session");
        let request = transport
            .get(&format!("{}/v2/", base))
            .basic_auth(&credentials.username, Some(&credentials.password));
        let response = transport.send(request).await?;
        let status = response.status();

        let auth = if status.is_success() {
            SessionAuth::Basic(credentials.clone())
        } else if status == StatusCode::UNAUTHORIZED {
            let challenge = bearer_challenge(&response).ok_or_else(|| {
                transport.auth_failed("credentials rejected (HTTP 401)".to_string())
            })?;
            debug!(domain, realm = %challenge.realm, "registry requested token auth");
            // An unscoped exchange verifies the credentials up front
            transport.fetch_token(&challenge, None, credentials).await?;
            SessionAuth::Bearer {
                challenge,
                credentials: credentials.clone(),
            }
        } else {
            return Err(transport.status_error(status));
        };

        Ok(Box::new(HttpSession {
            transport,
            base,
            auth,
        }))
    }
}

/// Per-session request plumbing.
#[derive(Debug, Clone)]
struct Transport {
    client: Client,
    domain: String,
    timeout: Option<Duration>,
}

impl Transport {
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url).header(USER_AGENT, USER_AGENT_VALUE);
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RegistryError> {
        request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                e.to_string()
            };
            self.unavailable(message)
        })
    }

    fn unavailable(&self, message: String) -> RegistryError {
        RegistryError::Unavailable {
            domain: self.domain.clone(),
            message,
        }
    }

    fn auth_failed(&self, message: String) -> RegistryError {
        RegistryError::Auth {
            domain: self.domain.clone(),
            message,
        }
    }

    fn status_error(&self, status: StatusCode) -> RegistryError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.auth_failed(format!("HTTP {}", status))
            }
            _ => self.unavailable(format!("unexpected HTTP {}", status)),
        }
    }

    /// Exchange credentials for a bearer token at the challenge realm.
    async fn fetch_token(
        &self,
        challenge: &BearerChallenge,
        scope: Option<&str>,
        credentials: &Credentials,
    ) -> Result<String, RegistryError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(service) = challenge.service.as_deref() {
            query.push(("service", service));
        }
        if let Some(scope) = scope {
            query.push(("scope", scope));
        }

        let request = self
            .get(&challenge.realm)
            .query(&query)
            .basic_auth(&credentials.username, Some(&credentials.password));
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("invalid token response: {}", e)))?;
        body.token
            .or(body.access_token)
            .ok_or_else(|| self.unavailable("token response carries no token".to_string()))
    }
}

/// How requests in a session are authorized.
#[derive(Debug)]
enum SessionAuth {
    Basic(Credentials),
    Bearer {
        challenge: BearerChallenge,
        credentials: Credentials,
    },
}

/// An open v2 session.
#[derive(Debug)]
struct HttpSession {
    transport: Transport,
    base: String,
    auth: SessionAuth,
}

#[async_trait]
impl RegistrySession for HttpSession {
    async fn list_tags(&self, repository: &str) -> Result<HashSet<String>, RegistryError> {
        let token = match &self.auth {
            SessionAuth::Bearer {
                challenge,
                credentials,
            } => {
                let scope = format!("repository:{}:pull", repository);
                Some(
                    self.transport
                        .fetch_token(challenge, Some(&scope), credentials)
                        .await?,
                )
            }
            SessionAuth::Basic(_) => None,
        };

        let mut tags = HashSet::new();
        let mut next = Some(format!("{}/v2/{}/tags/list", self.base, repository));

        while let Some(url) = next.take() {
            debug!(domain = %self.transport.domain, url = %url, "listing tags");
            let request = match (&self.auth, &token) {
                (_, Some(token)) => self.transport.get(&url).bearer_auth(token),
                (SessionAuth::Basic(creds), None) => self
                    .transport
                    .get(&url)
                    .basic_auth(&creds.username, Some(&creds.password)),
                (SessionAuth::Bearer { .. }, None) => self.transport.get(&url),
            };

            let response = self.transport.send(request).await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(repository, "repository has no tags");
                break;
            }
            if !status.is_success() {
                return Err(self.transport.status_error(status));
            }

            next = next_link(response.headers()).map(|link| resolve_link(&self.base, &link));
            let page: TagList = response.json().await.map_err(|e| {
                self.transport
                    .unavailable(format!("invalid tag list for '{}': {}", repository, e))
            })?;
            tags.extend(page.tags.unwrap_or_default());
        }

        debug!(repository, count = tags.len(), "listed tags");
        Ok(tags)
    }
}

/// Body of `GET /v2/{repo}/tags/list`. `tags` may be `null`.
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Body of a token service response.
#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parameters of a `Bearer` authentication challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
}

fn bearer_challenge(response: &Response) -> Option<BearerChallenge> {
    let header = response.headers().get(WWW_AUTHENTICATE)?.to_str().ok()?;
    parse_bearer_challenge(header)
}

/// Parse `Bearer realm="...",service="..."`.
fn parse_bearer_challenge(header: &str) -> Option<BearerChallenge> {
    let (scheme, params) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let params = parse_auth_params(params);
    Some(BearerChallenge {
        realm: params.get("realm")?.clone(),
        service: params.get("service").cloned(),
    })
}

/// Parse comma-separated `key=value` / `key="value"` pairs. Keys are lowercased.
fn parse_auth_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some((key, after)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().to_ascii_lowercase();
        let after = after.trim_start();

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim_end(), &after[end..]),
                None => (after.trim_end(), ""),
            }
        };

        params.insert(key, value.to_string());
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    params
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params.split(';').any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(target.to_string())
    })
}

/// Registries usually send path-only links; anchor them at the session base.
fn resolve_link(base: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{}{}", base, link)
    } else {
        format!("{}/{}", base, link)
    }
}
