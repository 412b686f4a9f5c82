// verisure-api: Async Rust client for the Verisure home-security cloud API
//
// Session establishment (endpoint failover, cookie session, installation
// discovery) lives in `session`; authenticated reads and writes live in
// `resources`. Both are inherent methods on `VerisureClient`.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod resources;
pub mod session;
pub mod transport;

pub use client::VerisureClient;
pub use endpoints::{DEFAULT_ENDPOINTS, EndpointSet};
pub use error::Error;
pub use models::{Overview, SmartPlugState};
pub use transport::{TlsMode, TransportConfig};

pub use tokio_util::sync::CancellationToken;
