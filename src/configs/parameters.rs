use crate::error::AppResult;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpParameters {
    /// Bound on the whole request, body transfer included.
    pub timeout: Duration,

    pub insecure_skip_verify: bool,
}

impl HttpParameters {
    pub fn build_client(&self) -> AppResult<Client> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout);

        if self.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}
