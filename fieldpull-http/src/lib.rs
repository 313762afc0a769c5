//! Cookie-bearing HTTP session for admin-UI scraping.
//!
//! - One [`HttpSession`] per export run: a single `reqwest` client with a
//!   persistent cookie store, so the login cookie survives every later call
//! - Optional trust anchor (extra root certificate) attached once at
//!   construction for self-signed staging hosts
//! - `Origin` and `Referer` headers set on every request, mirroring what the
//!   target admin UI expects from a browser
//! - Structured `tracing` events for request start and response; secret form
//!   fields are redacted before logging
//!
//! Transport failures are fatal by design: every error aborts the run and
//! there is no retry loop. The pipeline upstream treats the session as a
//! strictly sequential chain of calls.

use std::time::Duration;

use reqwest::header::{HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, Method, StatusCode, Url};
use thiserror::Error;

pub use reqwest::Certificate;

/// Form field names whose values must never reach the logs.
const SECRET_FIELDS: [&str; 4] = ["pwd", "password", "secret", "pass"];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("session build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
}

/// One received page: status plus the raw body text.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: StatusCode,
    pub text: String,
}

impl PageResponse {
    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }
}

/// A single authenticated browsing session against one origin.
///
/// ```no_run
/// # async fn demo() -> Result<(), fieldpull_http::SessionError> {
/// let session = fieldpull_http::HttpSession::new("http://staging.example.org")?
///     .with_referer("/wp-login.php")?;
/// let page = session.get("/wp-admin/plugins.php").await?;
/// assert!(page.ok());
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct HttpSession {
    origin: Url,
    referer: Option<HeaderValue>,
    inner: Client,
}

impl HttpSession {
    /// Construct a session anchored to an origin like `http://host`.
    pub fn new(origin: &str) -> Result<Self, SessionError> {
        Self::with_trust_anchor(origin, None)
    }

    /// Construct a session with an optional extra root certificate.
    ///
    /// The certificate is attached to the underlying client exactly once;
    /// there is no way to swap it mid-run.
    pub fn with_trust_anchor(
        origin: &str,
        trust_anchor: Option<Certificate>,
    ) -> Result<Self, SessionError> {
        let origin = Url::parse(origin).map_err(|e| SessionError::Url(e.to_string()))?;
        let mut builder = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::limited(5));
        if let Some(cert) = trust_anchor {
            builder = builder.add_root_certificate(cert);
        }
        let inner = builder.build().map_err(|e| SessionError::Build(e.to_string()))?;
        Ok(Self {
            origin,
            referer: None,
            inner,
        })
    }

    /// Fix the `Referer` header for every request of this session.
    ///
    /// The admin UI treats the login page as the referrer for all follow-up
    /// navigation, so the pipeline sets this once to the login path.
    pub fn with_referer(mut self, path: &str) -> Result<Self, SessionError> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| SessionError::Url(e.to_string()))?;
        let value = HeaderValue::from_str(url.as_str())
            .map_err(|e| SessionError::Build(e.to_string()))?;
        self.referer = Some(value);
        Ok(self)
    }

    /// The origin this session is anchored to, e.g. `http://host`.
    pub fn origin(&self) -> String {
        self.origin.origin().ascii_serialization()
    }

    /// GET a path (query string allowed) and return the page text.
    pub async fn get(&self, path: &str) -> Result<PageResponse, SessionError> {
        self.send(Method::GET, path, Body::None).await
    }

    /// POST form fields, url-encoded by the client.
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<PageResponse, SessionError> {
        self.send(Method::POST, path, Body::Fields(fields)).await
    }

    /// POST a pre-encoded `application/x-www-form-urlencoded` body.
    ///
    /// Used when the caller has to control the wire bytes exactly, e.g. for
    /// repeated array-style fields the target parses positionally.
    pub async fn post_encoded(&self, path: &str, body: String) -> Result<PageResponse, SessionError> {
        self.send(Method::POST, path, Body::Encoded(body)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Body<'_>,
    ) -> Result<PageResponse, SessionError> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| SessionError::Url(e.to_string()))?;

        let origin_value = HeaderValue::from_str(&self.origin())
            .map_err(|e| SessionError::Build(e.to_string()))?;
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .header(ORIGIN, origin_value);
        if let Some(referer) = &self.referer {
            rb = rb.header(REFERER, referer.clone());
        }

        match &body {
            Body::None => {}
            Body::Fields(fields) => {
                rb = rb.form(fields);
            }
            Body::Encoded(encoded) => {
                rb = rb
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(encoded.clone());
            }
        }

        tracing::debug!(
            method = %method,
            host_path = %format!("{}{}", url.domain().unwrap_or("-"), url.path()),
            fields = ?body.redacted_fields(),
            has_body = body.present(),
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        tracing::debug!(
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len = text.len(),
            "http.response"
        );

        Ok(PageResponse { status, text })
    }
}

enum Body<'a> {
    None,
    Fields(&'a [(&'a str, &'a str)]),
    Encoded(String),
}

impl Body<'_> {
    fn present(&self) -> bool {
        !matches!(self, Body::None)
    }

    /// Field names with secret values blanked, for safe request logging.
    /// Pre-encoded bodies are logged by length only, since they may carry a
    /// nonce the caller does not want replayed from a log file.
    fn redacted_fields(&self) -> Vec<(String, String)> {
        match self {
            Body::None => Vec::new(),
            Body::Fields(fields) => fields
                .iter()
                .map(|(k, v)| {
                    let secret = SECRET_FIELDS.iter().any(|s| k.eq_ignore_ascii_case(s));
                    (
                        (*k).to_string(),
                        if secret {
                            "<redacted>".to_string()
                        } else {
                            (*v).to_string()
                        },
                    )
                })
                .collect(),
            Body::Encoded(encoded) => vec![("encoded".into(), format!("{} bytes", encoded.len()))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_fields_are_redacted() {
        let body = Body::Fields(&[("log", "admin"), ("pwd", "hunter2")]);
        let logged = body.redacted_fields();
        assert_eq!(logged[0], ("log".to_string(), "admin".to_string()));
        assert_eq!(logged[1], ("pwd".to_string(), "<redacted>".to_string()));
    }

    #[test]
    fn encoded_bodies_log_length_only() {
        let body = Body::Encoded("nonce=abc123&keys=1+2".to_string());
        let logged = body.redacted_fields();
        assert_eq!(logged.len(), 1);
        assert!(!format!("{logged:?}").contains("abc123"));
    }

    #[test]
    fn origin_serialization_has_no_trailing_slash() {
        let session = HttpSession::new("http://staging.example.org").unwrap();
        assert_eq!(session.origin(), "http://staging.example.org");
    }
}
