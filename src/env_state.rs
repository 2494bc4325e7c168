//! # Network environment
//!
//! [`DesipointEnv`] is the shared state of the HTTP collaborators: one [`reqwest::Client`]
//! and the [`tokio`] runtime its requests are driven on. The rest of the crate is
//! synchronous, so every request is run to completion with
//! [`DesipointEnv::block_on`] and results are consumed in the order they were requested.
//!
//! ```text
//! DesipointEnv
//! ├── http_client (reqwest::Client, connection pool + timeout)
//! └── runtime     (tokio current-thread runtime, shared)
//! ```
//!
//! The object is cheap to clone: clones share the connection pool and the runtime.
use std::{future::Future, sync::Arc, time::Duration};

use reqwest::Client;
use tokio::runtime::{Builder, Runtime};

use crate::desipoint_errors::DesipointError;

/// Per-request timeout of the HTTP client.
const HTTP_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct DesipointEnv {
    pub http_client: Client,
    runtime: Arc<Runtime>,
}

impl DesipointEnv {
    /// Create the HTTP client and its runtime.
    ///
    /// Return
    /// ------
    /// * the environment, or an error if the runtime or the TLS backend cannot be initialized
    pub fn new() -> Result<Self, DesipointError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
            .build()?;

        Ok(DesipointEnv {
            http_client,
            runtime: Arc::new(runtime),
        })
    }

    /// Drive `future` to completion on the shared runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

#[cfg(test)]
mod env_state_test {
    use super::*;

    #[test]
    fn test_block_on() {
        let env = DesipointEnv::new().unwrap();
        let clone = env.clone();
        assert_eq!(clone.block_on(async { 40 + 2 }), 42);
        assert_eq!(env.block_on(async { "ok" }), "ok");
    }
}
