// src/ui/printer.rs

use std::time::Duration;

use chrono::Local;
use crossterm::style::{Color, Stylize};
use vanguard_recon::core::models::{PortState, ScanResult, SubdomainResult, SubdomainStatus};
use vanguard_recon::ReconError;

/// Writes streaming results to stdout with optional ANSI colors.
///
/// Every `format_*` method returns the line instead of printing it, so the
/// layout can be checked without capturing stdout.
pub struct ResultPrinter {
    show_timestamp: bool,
    color: bool,
}

impl ResultPrinter {
    pub fn new(show_timestamp: bool, color: bool) -> Self {
        Self { show_timestamp, color }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn timestamp(&self) -> String {
        if self.show_timestamp {
            format!("{} ", Local::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n{}", self.bold(&format!("=== {text} ==="), Color::Cyan))
    }

    pub fn format_subdomain(&self, result: &SubdomainResult) -> String {
        let status_color = match result.status {
            SubdomainStatus::Active => Color::Green,
            SubdomainStatus::Inactive => Color::Red,
        };
        let ips = if result.ips.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.paint(&result.ips.join(", "), Color::Yellow))
        };
        format!(
            "{}[{}] {}{}",
            self.paint(&self.timestamp(), Color::Blue),
            self.paint(&result.status.to_string(), status_color),
            self.paint(&result.subdomain, Color::Blue),
            ips
        )
    }

    pub fn format_port(&self, result: &ScanResult) -> String {
        let state_color = match result.state {
            PortState::Open => Color::Green,
            PortState::Closed => Color::Red,
        };
        format!(
            "{}{:>5}/tcp  {:<6}  {}",
            self.paint(&self.timestamp(), Color::Blue),
            result.port,
            self.paint(&result.state.to_string(), state_color),
            result.service
        )
    }

    pub fn format_dns_record(&self, record_type: &str, values: &[String]) -> Option<String> {
        if values.is_empty() {
            return None;
        }
        Some(format!(
            "{} {}",
            self.paint(&format!("{record_type} Records:"), Color::Magenta),
            values.join(", ")
        ))
    }

    pub fn format_error(&self, error: &ReconError) -> String {
        format!(
            "{} {}",
            self.bold(&format!("[{}]", error.kind()), Color::Red),
            error.detail()
        )
    }

    pub fn print_header(&self, text: &str) {
        println!("{}", self.format_header(text));
    }

    pub fn print_subdomain(&self, result: &SubdomainResult) {
        println!("{}", self.format_subdomain(result));
    }

    pub fn print_port(&self, result: &ScanResult) {
        println!("{}", self.format_port(result));
    }

    pub fn print_dns_record(&self, record_type: &str, values: &[String]) {
        if let Some(line) = self.format_dns_record(record_type, values) {
            println!("{line}");
        }
    }

    pub fn print_errors(&self, errors: &[ReconError]) {
        if errors.is_empty() {
            return;
        }
        self.print_header("Errors Occurred");
        for error in errors {
            println!("{}", self.format_error(error));
        }
    }

    /// Prints the closing summary as label/value pairs.
    pub fn print_summary(&self, rows: &[(&str, String)], duration: Duration) {
        self.print_header("Scan Summary");
        println!();
        for (label, value) in rows {
            println!("{} {}", self.paint(&format!("{label}:"), Color::Yellow), value);
        }
        println!(
            "{} {:.2?}\n",
            self.paint("Scan Duration:", Color::Yellow),
            duration
        );
    }
}
