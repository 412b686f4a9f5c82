// Session establishment
//
// Credentials become a session in two steps: HTTP Basic authentication
// against each candidate endpoint in turn, then an installation search on
// the endpoint that accepted. The server answers the first step with a
// session cookie; the jar replays it on the second.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::client::{VerisureClient, decode};
use crate::endpoints::route;
use crate::error::Error;

/// Prefix the API expects in front of the account name in Basic auth.
const AUTH_IDENTITY_PREFIX: &str = "CPE/";

impl VerisureClient {
    /// Log in and resolve the account's installation id.
    ///
    /// Candidate endpoints are tried in order; the first to accept the
    /// credentials is used for the installation search and every later
    /// call. If every endpoint rejects, the last error is returned.
    ///
    /// The active endpoint and giid are only stored once both steps have
    /// succeeded, so a failed login leaves the previous session fields
    /// untouched.
    pub async fn login(
        &mut self,
        cancel: &CancellationToken,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        let endpoint = self.authenticate_any(cancel, username, password).await?;
        let giid = self
            .resolve_installation(cancel, &endpoint, username)
            .await?;

        debug!(%endpoint, giid = %giid, "session established");
        self.base_url = Some(endpoint);
        self.giid = Some(giid);
        Ok(())
    }

    /// Walk the endpoint list until one accepts the credentials.
    async fn authenticate_any(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &SecretString,
    ) -> Result<Url, Error> {
        let mut last_err = Error::NoEndpoints;

        for endpoint in self.endpoints().iter() {
            match self.authenticate(cancel, endpoint, username, password).await {
                Ok(()) => return Ok(endpoint.clone()),
                // Failing over would only hit the same cancelled token.
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!(%endpoint, error = %e, "endpoint rejected login");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    /// Authenticate against a single endpoint.
    ///
    /// `POST {endpoint}/cookie` with Basic auth `CPE/{username}:{password}`.
    /// Only HTTP 200 counts as success; the response sets the session cookie.
    pub async fn authenticate(
        &self,
        cancel: &CancellationToken,
        endpoint: &Url,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        let url = route(endpoint, "cookie")?;
        debug!("logging in at {}", url);

        let request = self.http().post(url).basic_auth(
            format!("{AUTH_IDENTITY_PREFIX}{username}"),
            Some(password.expose_secret()),
        );
        self.send(cancel, "login", request).await?;

        debug!("login successful");
        Ok(())
    }

    /// Find the account's first installation and return its giid.
    ///
    /// `GET {endpoint}/installation/search?email={username}`. Relies on the
    /// session cookie from [`authenticate`](Self::authenticate).
    pub async fn resolve_installation(
        &self,
        cancel: &CancellationToken,
        endpoint: &Url,
        username: &str,
    ) -> Result<String, Error> {
        let mut url = route(endpoint, "installation/search")?;
        url.query_pairs_mut().append_pair("email", username);
        debug!("searching installations at {}", url);

        let resp = self
            .send(cancel, "installations", self.http().get(url))
            .await?;
        let body = self.text(cancel, resp).await?;
        extract_giid(&body)
    }
}

/// Pull `giid` out of the first installation record.
///
/// Records are left as untyped JSON values; only the one field is checked,
/// and a record that is not an object simply has no `giid`.
pub(crate) fn extract_giid(body: &str) -> Result<String, Error> {
    let records: Vec<Value> = decode(body)?;
    let first = records.first().ok_or(Error::NoInstallations)?;
    first
        .get("giid")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(Error::MissingGiid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_record_wins() {
        let body = r#"[{"giid": "ABC123", "other": 1}, {"giid": "ZZZ999"}]"#;
        assert_eq!(extract_giid(body).unwrap(), "ABC123");
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let body = r#"[{"giid": "42", "alias": "Home", "routingGroup": {"id": 7}, "roles": []}]"#;
        assert_eq!(extract_giid(body).unwrap(), "42");
    }

    #[test]
    fn empty_list_is_no_installations() {
        assert!(matches!(extract_giid("[]"), Err(Error::NoInstallations)));
    }

    #[test]
    fn missing_giid_key() {
        assert!(matches!(
            extract_giid(r#"[{"other": 1}]"#),
            Err(Error::MissingGiid)
        ));
    }

    #[test]
    fn non_string_giid_is_missing() {
        assert!(matches!(
            extract_giid(r#"[{"giid": 12345}]"#),
            Err(Error::MissingGiid)
        ));
        assert!(matches!(
            extract_giid(r#"[{"giid": null}]"#),
            Err(Error::MissingGiid)
        ));
    }

    #[test]
    fn null_first_record_is_missing_giid() {
        assert!(matches!(extract_giid("[null]"), Err(Error::MissingGiid)));
        assert!(matches!(
            extract_giid(r#"["ABC123"]"#),
            Err(Error::MissingGiid)
        ));
    }

    #[test]
    fn non_object_later_records_are_ignored() {
        let body = r#"[{"giid": "A"}, null, 7, "x"]"#;
        assert_eq!(extract_giid(body).unwrap(), "A");
    }

    #[test]
    fn non_array_body_is_decode_error() {
        assert!(matches!(
            extract_giid(r#"{"giid": "ABC"}"#),
            Err(Error::Deserialization { .. })
        ));
        assert!(matches!(
            extract_giid("<html>"),
            Err(Error::Deserialization { .. })
        ));
    }
}
