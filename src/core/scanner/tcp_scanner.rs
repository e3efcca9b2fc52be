// src/core/scanner/tcp_scanner.rs

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::core::cancel::CancelToken;
use crate::core::error::ReconError;
use crate::core::knowledge_base::{ServiceTable, UNKNOWN_SERVICE};
use crate::core::models::{PortState, ScanOptions, ScanResult};
use crate::core::runner;

/// TCP connect scanner over a fixed port list.
#[derive(Debug, Clone)]
pub struct PortScanner {
    options: ScanOptions,
    services: ServiceTable,
}

impl PortScanner {
    /// Validates `options` and builds the scanner. Fails with a config error
    /// when there is nothing to scan.
    pub fn new(options: ScanOptions) -> Result<Self, ReconError> {
        options.validate()?;
        Ok(Self {
            options,
            services: ServiceTable::default(),
        })
    }

    /// Replaces the port to service label table.
    pub fn with_services(mut self, services: ServiceTable) -> Self {
        self.services = services;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Starts probing every configured port and returns the result stream.
    ///
    /// Exactly one `ScanResult` is emitted per admitted port. The stream closes
    /// once all admitted probes have finished.
    pub fn start(&self, cancel: &CancelToken) -> mpsc::Receiver<ScanResult> {
        let ScanOptions {
            target,
            ports,
            timeout: connect_timeout,
            concurrency,
        } = self.options.clone();

        info!(
            host = %target,
            ports = ports.len(),
            concurrency,
            timeout_ms = connect_timeout.as_millis() as u64,
            "Starting port scan."
        );

        let services = self.services;
        let probe_cancel = cancel.clone();
        runner::run(ports, concurrency, cancel.clone(), move |port| {
            let target = target.clone();
            let cancel = probe_cancel.clone();
            async move { Some(probe(&target, port, connect_timeout, &cancel, services).await) }
        })
    }
}

/// Attempts one TCP connection to `target:port`.
///
/// # Arguments
///
/// * `target` - Hostname or IP address to connect to.
/// * `port` - The port being probed.
/// * `connect_timeout` - Upper bound for the connect attempt.
/// * `cancel` - Aborts the attempt as soon as it fires.
/// * `services` - Table used to label open ports.
///
/// # Returns
///
/// `Open` with the service label on success. Every failure (refused,
/// unreachable, timeout, cancellation) is `Closed` with an unknown service.
/// The connection is dropped right away, nothing is sent.
pub async fn probe(
    target: &str,
    port: u16,
    connect_timeout: Duration,
    cancel: &CancelToken,
    services: ServiceTable,
) -> ScanResult {
    let attempt = timeout(connect_timeout, TcpStream::connect((target, port)));

    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            trace!(port, "Probe aborted by cancellation.");
            false
        }
        outcome = attempt => match outcome {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                trace!(port, error = %e, "Connect failed.");
                false
            }
            Err(_) => {
                trace!(port, "Connect timed out.");
                false
            }
        },
    };

    if connected {
        let service = services.label(port);
        debug!(host = target, port, service, "Port open.");
        ScanResult {
            port,
            state: PortState::Open,
            service: service.to_string(),
        }
    } else {
        ScanResult {
            port,
            state: PortState::Closed,
            service: UNKNOWN_SERVICE.to_string(),
        }
    }
}
