//! Lightweight reconnaissance engine: TCP connect port probing and subdomain
//! discovery over DNS, with optional passive sources.
//!
//! The binary in `main.rs` is a thin consumer of this library.

pub mod core;
pub mod logging;

pub use crate::core::cancel::CancelToken;
pub use crate::core::error::{ErrorKind, ReconError};
pub use crate::core::models::{
    DnsRecords, EnumOptions, PortState, ScanOptions, ScanResult, SubdomainResult, SubdomainStatus,
};
