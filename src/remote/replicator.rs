//! Telemetry from the replicator's SQL query endpoint.
//!
//! The endpoint takes a `namespace`, an output `format` and an `sql` statement as query
//! parameters, authenticates with HTTP basic auth and answers with a CSV table whose header
//! is the selected column list.
use camino::Utf8Path;
use hifitime::Epoch;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{
    desipoint_errors::DesipointError,
    env_state::DesipointEnv,
    telemetry::{csv_reader::parse_telemetry_csv, TelemetrySample, TelemetrySource},
    time::display_timestamp,
};

const TELEMETRY_COLUMNS: &str = "time_recorded,mount_el,mount_az";
const TELEMETRY_TABLE: &str = "telemetry.tcs_info";

/// Basic-auth credentials, stored as `{"usr": "...", "pass": "..."}`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub usr: String,
    pub pass: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("usr", &self.usr)
            .field("pass", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn load(path: &Utf8Path) -> Result<Self, DesipointError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// `SELECT` of the mount position over `[start, end)`, oldest first.
pub fn range_query(start: Epoch, end: Epoch) -> String {
    format!(
        "select {TELEMETRY_COLUMNS} from {TELEMETRY_TABLE} \
         where time_recorded >= TIMESTAMP '{}' AND time_recorded < TIMESTAMP '{}' \
         order by time_recorded asc",
        display_timestamp(start),
        display_timestamp(end)
    )
}

/// `SELECT` of the last mount position strictly before `instant`.
pub fn latest_before_query(instant: Epoch) -> String {
    format!(
        "select {TELEMETRY_COLUMNS} from {TELEMETRY_TABLE} \
         where time_recorded < TIMESTAMP '{}' \
         order by time_recorded desc limit 1",
        display_timestamp(instant)
    )
}

#[derive(Debug, Clone)]
pub struct TelemetryReplicator {
    env: DesipointEnv,
    query_url: String,
    credentials: Credentials,
}

impl TelemetryReplicator {
    pub fn new(env: DesipointEnv, query_url: &str, credentials: Credentials) -> Self {
        TelemetryReplicator {
            env,
            query_url: query_url.to_string(),
            credentials,
        }
    }

    /// Run one SQL statement and parse the CSV answer.
    fn query(&self, sql: &str) -> Result<Vec<TelemetrySample>, DesipointError> {
        debug!("Telemetry query: {sql}");
        let body = self.env.block_on(async {
            let response = self
                .env
                .http_client
                .get(&self.query_url)
                .query(&[("namespace", "telemetry"), ("format", "csv"), ("sql", sql)])
                .basic_auth(&self.credentials.usr, Some(&self.credentials.pass))
                .send()
                .await
                .map_err(|err| DesipointError::TelemetryUnavailable(err.to_string()))?;

            match response.status() {
                StatusCode::UNAUTHORIZED => {
                    Err(DesipointError::Unauthorized(self.query_url.clone()))
                }
                status if !status.is_success() => Err(DesipointError::TelemetryUnavailable(
                    format!("{} answered HTTP {status}", self.query_url),
                )),
                _ => response
                    .text()
                    .await
                    .map_err(|err| DesipointError::TelemetryUnavailable(err.to_string())),
            }
        })?;

        parse_telemetry_csv(body.as_bytes())
    }
}

impl TelemetrySource for TelemetryReplicator {
    fn fetch_telemetry_range(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<TelemetrySample>, DesipointError> {
        self.query(&range_query(start, end))
    }

    fn fetch_latest_before(
        &self,
        instant: Epoch,
    ) -> Result<Option<TelemetrySample>, DesipointError> {
        Ok(self.query(&latest_before_query(instant))?.pop())
    }
}
