// Backend HTTP client
//
// Wraps `reqwest::Client` with backend-specific URL construction, bearer
// auth, error-body parsing, and an in-memory TTL response cache. The two
// list endpoints and the object endpoint all flow through the same cache
// so a hard refresh has a single, obvious bypass point.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{CollectionDoc, GameDoc, ObjectResource, ServerErrorBody};

/// Cache keys for the two list endpoints.
const LIBRARY_CACHE_KEY: &str = "library";
const COLLECTIONS_CACHE_KEY: &str = "collections";

/// Configuration for a [`BackendClient`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend root URL (e.g. `https://drop.example.com`).
    pub base_url: Url,
    /// Client session token, sent as a bearer Authorization header.
    pub token: SecretString,
    /// TLS / timeout / user-agent settings.
    pub transport: TransportConfig,
    /// How long cached list responses stay fresh.
    pub list_cache_ttl: Duration,
    /// How long cached objects (icons etc.) stay fresh.
    pub object_cache_ttl: Duration,
}

impl BackendConfig {
    pub fn new(base_url: Url, token: SecretString) -> Self {
        Self {
            base_url,
            token,
            transport: TransportConfig::default(),
            list_cache_ttl: Duration::from_secs(60),
            object_cache_ttl: Duration::from_secs(60 * 60 * 24),
        }
    }
}

/// A cached response body with its insertion time.
struct CacheSlot {
    stored: Instant,
    content_type: String,
    body: Bytes,
}

impl CacheSlot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored.elapsed() < ttl
    }
}

/// HTTP client for the backend's client API.
///
/// Cheap to share behind an `Arc`; all interior state is the response
/// cache, guarded by a plain mutex (held only for map operations, never
/// across awaits).
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
    cache: Mutex<HashMap<String, CacheSlot>>,
}

impl BackendClient {
    /// Create a new client from a [`BackendConfig`].
    pub fn new(config: BackendConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self {
            http,
            config,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (tests).
    pub fn with_client(http: reqwest::Client, config: BackendConfig) -> Self {
        Self {
            http,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// WebSocket URL for the live event feed, derived from the base URL.
    pub fn events_url(&self) -> Result<Url, Error> {
        let mut url = self.api_url(&["api", "v1", "client", "events"])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect("cannot derive ws scheme".into()))?;
        Ok(url)
    }

    /// Drop a cached response so the next fetch hits the network.
    pub fn invalidate(&self, key: &str) {
        self.cache
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
    }

    // ── Fetch operations ─────────────────────────────────────────────

    /// Fetch the primary game library.
    ///
    /// Served from the response cache while fresh; `hard_refresh` bypasses
    /// the cache and overwrites it with the new response.
    pub async fn fetch_library(&self, hard_refresh: bool) -> Result<Vec<GameDoc>, Error> {
        self.fetch_list(
            LIBRARY_CACHE_KEY,
            &["api", "v1", "client", "user", "library"],
            hard_refresh,
        )
        .await
    }

    /// Fetch all named collections (with embedded game entries).
    pub async fn fetch_collections(&self, hard_refresh: bool) -> Result<Vec<CollectionDoc>, Error> {
        self.fetch_list(
            COLLECTIONS_CACHE_KEY,
            &["api", "v1", "client", "collection"],
            hard_refresh,
        )
        .await
    }

    /// Resolve an opaque object id (icon, banner) to its bytes.
    ///
    /// Serves a fresh cached copy when available. On transport failure the
    /// cached copy is served even when expired — a stale icon beats none.
    pub async fn fetch_object(&self, object_id: &str) -> Result<ObjectResource, Error> {
        let ttl = self.config.object_cache_ttl;
        if let Some(cached) = self.cached(object_id, ttl) {
            return Ok(cached);
        }

        let url = self.api_url(&["api", "v1", "client", "object", object_id])?;
        debug!(%url, object_id, "fetching object");

        let response = match self.authorized_get(url).await {
            Ok(r) => r,
            Err(e) => {
                // Expired cache as offline fallback.
                if let Some(stale) = self.cached(object_id, Duration::MAX) {
                    debug!(object_id, error = %e, "object fetch failed, serving stale cache");
                    return Ok(stale);
                }
                return Err(e);
            }
        };

        let response = Self::check_status(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = response.bytes().await?;

        self.store(object_id, &content_type, bytes.clone());

        Ok(ObjectResource {
            content_type,
            bytes,
        })
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        cache_key: &str,
        segments: &[&str],
        hard_refresh: bool,
    ) -> Result<Vec<T>, Error> {
        if !hard_refresh {
            if let Some(slot) = self.cached(cache_key, self.config.list_cache_ttl) {
                debug!(cache_key, "serving list from response cache");
                return Self::decode_json(&slot.bytes);
            }
        }

        let url = self.api_url(segments)?;
        debug!(%url, cache_key, hard_refresh, "fetching list");

        let response = self.authorized_get(url).await?;
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;

        let parsed = Self::decode_json(&body)?;
        self.store(cache_key, "application/json", body);
        Ok(parsed)
    }

    fn decode_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, Error> {
        serde_json::from_slice(body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }

    async fn authorized_get(&self, url: Url) -> Result<reqwest::Response, Error> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.config.token.expose_secret())
            .send()
            .await?;
        Ok(response)
    }

    /// Turn non-2xx responses into typed errors, parsing the backend's
    /// error body when it sends one.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(
                response.url().path().to_owned(),
            ));
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = match serde_json::from_slice::<ServerErrorBody>(&body) {
            Ok(err) => err.status_message,
            Err(_) => {
                warn!(status = status.as_u16(), "unparseable error body from server");
                "Invalid response from server.".to_owned()
            }
        };

        Err(Error::Server {
            status: status.as_u16(),
            message,
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn cached(&self, key: &str, ttl: Duration) -> Option<ObjectResource> {
        let cache = self.cache.lock().expect("cache mutex poisoned");
        let slot = cache.get(key)?;
        slot.is_fresh(ttl).then(|| ObjectResource {
            content_type: slot.content_type.clone(),
            bytes: slot.body.clone(),
        })
    }

    fn store(&self, key: &str, content_type: &str, body: Bytes) {
        self.cache.lock().expect("cache mutex poisoned").insert(
            key.to_owned(),
            CacheSlot {
                stored: Instant::now(),
                content_type: content_type.to_owned(),
                body,
            },
        );
    }
}
