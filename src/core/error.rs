// src/core/error.rs

use std::error::Error as StdError;

use strum::Display;
use thiserror::Error;

/// Boxed lower-level cause carried by a `ReconError`.
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// The category of a `ReconError`.
///
/// Callers branch on the kind (for example to tell a resolver timeout from a
/// missing record) without downcasting the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Name resolution failed (NXDOMAIN, no records, malformed answer).
    #[strum(serialize = "DNS")]
    Dns,
    /// A passive source query failed.
    #[strum(serialize = "API")]
    Api,
    /// Transport failure below the resolver or dialer.
    #[strum(serialize = "NETWORK")]
    Network,
    /// A probe exceeded its deadline.
    #[strum(serialize = "TIMEOUT")]
    Timeout,
    /// Bad input detected before any probing started.
    #[strum(serialize = "CONFIG")]
    Config,
    /// The results could not be written or read back.
    #[strum(serialize = "EXPORT")]
    Export,
}

/// Error value produced by the reconnaissance engine.
///
/// Errors are collected and handed back to the caller, never raised
/// mid-stream. The optional cause is exposed through `Error::source`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ReconError {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<Cause>,
}

impl ReconError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, cause: Option<Cause>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message, None)
    }

    pub fn dns(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Dns, message, Some(cause.into()))
    }

    pub fn api(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Api, message, Some(cause.into()))
    }

    pub fn network(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Network, message, Some(cause.into()))
    }

    pub fn timeout(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Timeout, message, Some(cause.into()))
    }

    pub fn export(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::new(ErrorKind::Export, message, Some(cause.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Renders the message followed by every cause in the chain,
    /// e.g. `Shodan query failed: HTTP status 401: Unauthorized`.
    pub fn detail(&self) -> String {
        let mut rendered = self.message.clone();
        let mut source = self.source();
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}
