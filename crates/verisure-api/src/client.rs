// Verisure API HTTP client
//
// Owns the session state (active endpoint, cookie jar, installation id)
// and the request plumbing shared by the session and resource modules:
// cancellation, status validation, and body decoding. The operations
// themselves are inherent methods in `session.rs` and `resources.rs`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use url::Url;

use crate::endpoints::{EndpointSet, route};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Client for one Verisure account session.
///
/// Starts unauthenticated. [`login`](Self::login) fixes the active endpoint
/// and resolves the installation id; resource calls then target
/// `{endpoint}/installation/{giid}/...` with the session cookie replayed
/// from the jar.
///
/// No local precondition checks are made: calling a resource operation
/// before `login` (or after `logout`) sends the request anyway and the
/// server's rejection comes back as [`Error::Status`]. Not safe for
/// concurrent use without external synchronization.
pub struct VerisureClient {
    http: reqwest::Client,
    endpoints: EndpointSet,
    cookie_jar: Arc<Jar>,
    timeout: Duration,
    pub(crate) base_url: Option<Url>,
    pub(crate) giid: Option<String>,
}

impl VerisureClient {
    /// Create an unauthenticated client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the session lives in a cookie).
    pub fn new(endpoints: EndpointSet, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));
        let http = config.build_client()?;
        Ok(Self {
            http,
            endpoints,
            cookie_jar,
            timeout: config.timeout,
            base_url: None,
            giid: None,
        })
    }

    /// Create a client that already knows its installation id, e.g. one
    /// cached from a previous run. Installation discovery is skipped, but
    /// the server still requires a session cookie before it answers.
    pub fn with_giid(
        endpoints: EndpointSet,
        transport: &TransportConfig,
        giid: impl Into<String>,
    ) -> Result<Self, Error> {
        let mut client = Self::new(endpoints, transport)?;
        client.giid = Some(giid.into());
        Ok(client)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// `cookie_jar` must be the jar installed as `http`'s cookie provider,
    /// otherwise [`cookie_header`](Self::cookie_header) reports nothing.
    /// `timeout` should match the one `http` was built with; it is what
    /// [`Error::Timeout`] reports.
    pub fn with_client(
        http: reqwest::Client,
        cookie_jar: Arc<Jar>,
        endpoints: EndpointSet,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            cookie_jar,
            timeout,
            base_url: None,
            giid: None,
        }
    }

    /// The endpoint fixed by the last successful login, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The installation id, if resolved or supplied.
    pub fn giid(&self) -> Option<&str> {
        self.giid.as_deref()
    }

    /// The candidate endpoints this client fails over between.
    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// Whether an endpoint is fixed and an installation id is known.
    ///
    /// Informational only: logout does not reset it and the server may
    /// have expired the session anyway.
    pub fn is_authenticated(&self) -> bool {
        self.base_url.is_some() && self.giid.is_some()
    }

    /// The `Cookie` header the jar would send to the active endpoint.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookie_jar.cookies(self.active_base())?;
        cookies.to_str().ok().map(String::from)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// The endpoint resource calls go to. Before login this is the
    /// primary candidate so the request still reaches a server.
    pub(crate) fn active_base(&self) -> &Url {
        self.base_url
            .as_ref()
            .unwrap_or_else(|| self.endpoints.primary())
    }

    /// `{endpoint}/installation/{giid}/{path}`
    pub(crate) fn installation_url(&self, path: &str) -> Result<Url, Error> {
        let giid = self.giid.as_deref().unwrap_or_default();
        route(self.active_base(), &format!("installation/{giid}/{path}"))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request, racing it against `cancel`, and require HTTP 200.
    ///
    /// A token that is already cancelled short-circuits before anything
    /// is written to the network.
    pub(crate) async fn send(
        &self,
        cancel: &CancellationToken,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let resp = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = request.send() => result.map_err(|e| self.transport_error(e))?,
        };

        let status = resp.status();
        trace!(operation, %status, "response received");

        if status != StatusCode::OK {
            return Err(Error::Status {
                operation,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        Ok(resp)
    }

    /// Read the full response body, still honouring `cancel`.
    pub(crate) async fn text(
        &self,
        cancel: &CancellationToken,
        resp: reqwest::Response,
    ) -> Result<String, Error> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = resp.text() => result.map_err(|e| self.transport_error(e)),
        }
    }

    /// Read and decode a JSON body.
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let body = self.text(cancel, resp).await?;
        decode(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Decode a JSON body, keeping a preview of it in the error.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
