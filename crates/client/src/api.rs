//! HTTP chokepoint for every call to the marketplace API.
//!
//! [`ApiClient`] attaches the session's bearer token (unless a request is
//! marked public), decodes JSON responses and turns every failure into an
//! [`ApiError`]. It reads the [`SessionStore`] but never writes to it: a
//! 401 is reported, not acted on.
//!
//! Endpoints are addressed by path segments, not strings. Each segment is
//! percent-encoded on its own, so an id can never add, drop or escape a
//! path component.

use std::sync::Arc;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

/// Header carrying the per-action idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Attach the session token, if there is one. Defaults to `true`.
    pub requires_auth: bool,
    /// Sent as `Idempotency-Key` when present.
    pub idempotency_key: Option<Uuid>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            requires_auth: true,
            idempotency_key: None,
        }
    }
}

impl RequestOptions {
    /// Options for an endpoint that needs no credentials.
    #[must_use]
    pub const fn public() -> Self {
        Self {
            requires_auth: false,
            idempotency_key: None,
        }
    }

    /// Attach an idempotency key.
    #[must_use]
    pub const fn with_idempotency_key(mut self, key: Uuid) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Typed JSON client for the marketplace API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_url` reading credentials from `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    /// The session this client reads credentials from.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// `GET` the endpoint at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or an
    /// undecodable body, and [`ApiError::Validation`] without sending
    /// anything if a segment is empty, `.` or `..`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &[&str],
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, None::<&()>, options).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body), options).await
    }

    /// `POST` without a body (command endpoints).
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &[&str],
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, None::<&()>, options).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, Some(body), options).await
    }

    /// `PATCH` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, Some(body), options).await
    }

    /// `DELETE`. Use `T = ()` for endpoints that return no body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &[&str],
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None::<&()>, options).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint_url(&self.inner.base_url, segments)
    }

    #[instrument(skip(self, method, body, options), fields(method = %method, auth = options.requires_auth))]
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.inner.http.request(method, url);

        if options.requires_auth {
            if let Some(token) = self.inner.session.token() {
                request = request.bearer_auth(token.expose_secret());
            } else {
                debug!("no session token; sending without credentials");
            }
        }
        if let Some(key) = options.idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key.to_string());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, "request did not complete");
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &bytes);
            warn!(status = status.as_u16(), message = %err.message(), "request failed");
            return Err(err);
        }

        debug!(status = status.as_u16(), "request succeeded");
        decode(&bytes)
    }
}

/// `base` with `segments` appended, each percent-encoded as one component.
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(ApiError::Validation(format!(
            "{bad:?} is not a valid identifier"
        )));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// An empty body decodes as JSON `null`, so `()` and `Option<T>` accept 204s.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_require_auth() {
        let options = RequestOptions::default();
        assert!(options.requires_auth);
        assert!(options.idempotency_key.is_none());
        assert!(!RequestOptions::public().requires_auth);
    }

    fn base() -> Url {
        Url::parse("http://localhost:3000/api/").unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint_url(&base(), &["orders", "o1", "accept"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/orders/o1/accept");

        let bare = Url::parse("http://localhost:3000").unwrap();
        let url = endpoint_url(&bare, &["products"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/products");
    }

    #[test]
    fn test_endpoint_encodes_each_segment() {
        let url = endpoint_url(&base(), &["orders", "../products/p1", "accept"]).unwrap();
        assert_eq!(url.path(), "/api/orders/..%2Fproducts%2Fp1/accept");

        let url = endpoint_url(&base(), &["orders", "o1?x=1#frag"]).unwrap();
        assert_eq!(url.path(), "/api/orders/o1%3Fx=1%23frag");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        for bad in ["", ".", ".."] {
            let err = endpoint_url(&base(), &["orders", bad]).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_decode_empty_body() {
        decode::<()>(b"").unwrap();
        assert_eq!(decode::<Option<u32>>(b"  ").unwrap(), None);
        assert_eq!(decode::<Vec<u32>>(b"[1,2]").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_decode_mismatch() {
        let err = decode::<Vec<u32>>(br#"{"not":"a list"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
