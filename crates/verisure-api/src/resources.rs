// Installation resources
//
// Authenticated reads and writes against the session's endpoint and
// installation id, plus session teardown.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::VerisureClient;
use crate::endpoints::route;
use crate::error::Error;
use crate::models::{Overview, SmartPlugState};

impl VerisureClient {
    /// Fetch the installation state snapshot.
    ///
    /// `GET {endpoint}/installation/{giid}/overview`
    pub async fn overview(&self, cancel: &CancellationToken) -> Result<Overview, Error> {
        let url = self.installation_url("overview")?;
        debug!("GET {}", url);

        let resp = self.send(cancel, "overview", self.http().get(url)).await?;
        self.json(cancel, resp).await
    }

    /// Switch smart plugs on or off.
    ///
    /// `POST {endpoint}/installation/{giid}/smartplug/state` with the updates
    /// as a JSON array, in the order given. The body is encoded before
    /// anything is sent.
    pub async fn update_smartplug(
        &self,
        cancel: &CancellationToken,
        updates: &[SmartPlugState],
    ) -> Result<(), Error> {
        let body = serde_json::to_vec(updates).map_err(Error::Serialization)?;
        let url = self.installation_url("smartplug/state")?;
        debug!(count = updates.len(), "POST {}", url);

        self.send(cancel, "smartplug", self.http().post(url).body(body))
            .await?;
        Ok(())
    }

    /// End the server-side session.
    ///
    /// `DELETE {endpoint}/cookie`. Local state (endpoint, giid, cookies) is
    /// kept; further authenticated calls are expected to be rejected by
    /// the server.
    pub async fn logout(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let url = route(self.active_base(), "cookie")?;
        debug!("logging out at {}", url);

        self.send(cancel, "logout", self.http().delete(url)).await?;

        debug!("logout complete");
        Ok(())
    }
}
