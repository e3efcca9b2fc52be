// src/app.rs

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use color_eyre::eyre::Result;
use tokio::task::JoinHandle;
use tracing::warn;

use vanguard_recon::core::export::ExportReport;
use vanguard_recon::core::knowledge_base::COMMON_PORTS;
use vanguard_recon::core::scanner::subdomain_scanner::SubdomainEnumerator;
use vanguard_recon::core::scanner::tcp_scanner::PortScanner;
use vanguard_recon::core::scanner::{run_enumeration, run_port_scan};
use vanguard_recon::core::targets::{load_wordlist, parse_port_range};
use vanguard_recon::{CancelToken, EnumOptions, ReconError, ScanOptions};

use crate::cli::Commands;
use crate::ui::ResultPrinter;

/// Cancellation for one run: fires on the overall deadline or on Ctrl-C.
struct RunGuard {
    cancel: CancelToken,
    deadline: JoinHandle<()>,
    interrupt: JoinHandle<()>,
}

impl RunGuard {
    fn start(deadline: Duration) -> Self {
        let cancel = CancelToken::new();
        let deadline = cancel.cancel_after(deadline);
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, waiting for in-flight probes to finish.");
                    cancel.cancel();
                }
            })
        };
        Self { cancel, deadline, interrupt }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.deadline.abort();
        self.interrupt.abort();
    }
}

pub struct App {
    printer: ResultPrinter,
}

impl App {
    pub fn new(verbosity: u8) -> Self {
        let color = std::io::stdout().is_terminal();
        Self {
            printer: ResultPrinter::new(verbosity > 0, color),
        }
    }

    /// Runs one subcommand to completion.
    ///
    /// Only setup problems come back as `Err`. Failures met while probing are
    /// printed under the error section and the run still succeeds.
    pub async fn run(&self, command: Commands) -> Result<()> {
        let errors = match command {
            Commands::Scan {
                target,
                ports,
                timeout_ms,
                concurrency,
                deadline_secs,
                show_closed,
                output,
            } => {
                let ports = parse_port_range(&ports, COMMON_PORTS)?;
                let mut options = ScanOptions::new(target, ports);
                options.timeout = Duration::from_millis(timeout_ms);
                options.concurrency = concurrency;
                let scan = ScanRun {
                    options,
                    show_closed,
                    output,
                };
                self.run_scan(scan, Duration::from_secs(deadline_secs)).await?
            }
            Commands::Enum {
                domain,
                recursive,
                depth,
                concurrency,
                use_apis,
                shodan_key,
                virustotal_key,
                include_inactive,
                wordlist,
                dns_timeout_ms,
                deadline_secs,
                output,
            } => {
                let options = EnumOptions {
                    domain,
                    recursive,
                    max_depth: depth,
                    concurrency,
                    shodan_key,
                    virustotal_key,
                    use_apis,
                    include_inactive,
                    dns_timeout: Duration::from_millis(dns_timeout_ms),
                };
                self.run_enum(options, wordlist, output, Duration::from_secs(deadline_secs))
                    .await?
            }
        };

        self.printer.print_errors(&errors);
        Ok(())
    }

    async fn run_scan(&self, scan: ScanRun, deadline: Duration) -> Result<Vec<ReconError>> {
        let scanner = PortScanner::new(scan.options)?;
        let options = scanner.options();
        let guard = RunGuard::start(deadline);
        let started_at = Utc::now();
        let clock = Instant::now();

        self.printer.print_header(&format!("Port Scan: {}", options.target));

        let report = run_port_scan(&scanner, &guard.cancel, |result| {
            if result.is_open() || scan.show_closed {
                self.printer.print_port(result);
            }
        })
        .await;

        self.printer.print_summary(
            &[
                ("Target", options.target.clone()),
                ("Ports Probed", report.results.len().to_string()),
                ("Open Ports", report.open_ports().count().to_string()),
            ],
            clock.elapsed(),
        );

        let mut errors = Vec::new();
        if let Some(path) = scan.output {
            let export = ExportReport::new(&options.target, started_at).with_ports(report.results);
            export_to(&export, &path, &mut errors);
        }
        Ok(errors)
    }

    async fn run_enum(
        &self,
        options: EnumOptions,
        wordlist: Option<PathBuf>,
        output: Option<PathBuf>,
        deadline: Duration,
    ) -> Result<Vec<ReconError>> {
        let (mut enumerator, mut errors) = SubdomainEnumerator::new(options)?;
        if let Some(path) = wordlist {
            enumerator = enumerator.with_wordlist(load_wordlist(&path)?);
        }
        let domain = enumerator.options().domain.clone();
        let guard = RunGuard::start(deadline);
        let started_at = Utc::now();
        let clock = Instant::now();

        self.printer.print_header(&format!("Subdomain Enumeration: {domain}"));

        let report = run_enumeration(&enumerator, &guard.cancel, |result| {
            self.printer.print_subdomain(result);
        })
        .await;

        if !report.dns_records.is_empty() {
            self.printer.print_header("DNS Records");
            for (record_type, values) in &report.dns_records {
                self.printer.print_dns_record(record_type, values);
            }
        }

        self.printer.print_summary(
            &[
                ("Domain", domain.clone()),
                ("Total Subdomains", report.subdomains.len().to_string()),
                ("Active Subdomains", report.active_count().to_string()),
            ],
            clock.elapsed(),
        );

        if let Some(path) = output {
            let export = ExportReport::new(&domain, started_at)
                .with_subdomains(&report.subdomains)
                .with_dns_records(report.dns_records.clone());
            export_to(&export, &path, &mut errors);
        }

        errors.extend(report.errors);
        Ok(errors)
    }
}

struct ScanRun {
    options: ScanOptions,
    show_closed: bool,
    output: Option<PathBuf>,
}

/// A failed export is reported with the other run errors instead of
/// discarding results that were already printed.
fn export_to(report: &ExportReport, path: &Path, errors: &mut Vec<ReconError>) {
    if let Err(e) = report.write_to(path) {
        errors.push(e);
    }
}
