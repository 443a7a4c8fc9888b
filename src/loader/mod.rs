//! Loader Module
//!
//! Acquires agentlets from the network:
//! - Source fetching with timeout
//! - Script host handshake
//! - Retry with linear backoff

pub mod fetch;
pub mod host;
pub mod remote;

pub use fetch::{HttpFetcher, SourceFetcher, StaticFetcher};
pub use host::{ExportFactory, ExportTable, ScriptHost};
pub use remote::{LoadOptions, RemoteLoader};
