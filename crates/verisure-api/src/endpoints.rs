// Candidate API endpoints
//
// The vendor serves the same API from geographic replicas. Login walks
// them in order and sticks with the first that accepts the credentials.

use std::sync::Arc;

use url::Url;

use crate::error::Error;

/// Production replicas, primary first.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://e-api01.verisure.com/xbn/2",
    "https://e-api02.verisure.com/xbn/2",
];

/// Ordered, immutable list of equivalent base URLs.
///
/// Cheap to clone and safe to share between clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    urls: Arc<[Url]>,
}

impl EndpointSet {
    /// Build a set from already-parsed URLs. Order is preserved.
    pub fn new(urls: Vec<Url>) -> Result<Self, Error> {
        if urls.is_empty() {
            return Err(Error::NoEndpoints);
        }
        Ok(Self { urls: urls.into() })
    }

    /// Parse each string as a URL, preserving order.
    pub fn parse<I, S>(urls: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(|u| Url::parse(u.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(urls)
    }

    /// The first candidate.
    pub fn primary(&self) -> &Url {
        // `new` rejects empty sets
        &self.urls[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.urls.iter()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always `false`: [`new`](Self::new) rejects empty sets, so every
    /// `EndpointSet` has a [`primary`](Self::primary).
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl Default for EndpointSet {
    fn default() -> Self {
        Self::parse(DEFAULT_ENDPOINTS).expect("built-in endpoint URLs are valid")
    }
}

/// Join a relative route onto a base URL without dropping the base's
/// last path segment (`Url::join` would replace `/xbn/2` with `/xbn/cookie`).
pub(crate) fn route(base: &Url, path: &str) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}
