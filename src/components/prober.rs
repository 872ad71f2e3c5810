use crate::{
    configs::{GlobalConfig, HttpParameters},
    error::AppResult,
};

/// Verifying HTTPS round trip used to confirm the installed trust store works.
///
/// Always verifies certificates, whatever mode the download ran in. Any
/// response counts as success, the status code is not inspected.
#[derive(Clone, Debug)]
pub struct ConnectivityProbe {
    url: String,
    parameters: HttpParameters,
}

impl ConnectivityProbe {
    pub fn new(config: &GlobalConfig) -> Self {
        Self {
            url: config.probe_url.clone(),
            parameters: config.probe_parameters(),
        }
    }

    pub fn parameters(&self) -> &HttpParameters {
        &self.parameters
    }

    pub async fn probe(&self) -> AppResult<()> {
        let client = self.parameters().build_client()?;
        let response = client.get(&self.url).send().await?;
        trace!("{} answered {}", self.url, response.status());
        Ok(())
    }

    /// Runs the probe and logs the outcome; failure is never fatal.
    pub async fn report(&self) -> bool {
        match self.probe().await {
            Ok(()) => {
                info!("SSL connection test passed!");
                true
            }
            Err(e) => {
                warn!("SSL connection test failed: {}", e.report());
                false
            }
        }
    }
}
