//! # HTTP data services
//!
//! Network implementations of the retrieval seams, available with the `download` feature:
//!
//! ```text
//! remote
//! ├── archive     (AllSkyArchive: ImageSource over the camera image archive)
//! └── replicator  (TelemetryReplicator: TelemetrySource over the telemetry SQL endpoint)
//! ```
pub mod archive;
pub mod replicator;

pub use archive::AllSkyArchive;
pub use replicator::{Credentials, TelemetryReplicator};
