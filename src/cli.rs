// src/cli.rs

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vanguard-recon")]
#[command(version, about = "TCP port scanning and subdomain discovery.")]
pub struct CommandLine {
    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe TCP ports on a host with connect scans
    #[command(alias = "s")]
    Scan {
        /// Hostname or IP address to scan
        target: String,
        /// Ports to probe, e.g. "22,80,8000-8100" (default: common ports)
        #[arg(short, long, default_value = "")]
        ports: String,
        /// Connect timeout per port, in milliseconds
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
        /// Maximum number of probes in flight
        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,
        /// Stop admitting new probes after this many seconds
        #[arg(long, default_value_t = 300)]
        deadline_secs: u64,
        /// Print closed ports as well
        #[arg(long)]
        show_closed: bool,
        /// Write the results as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Discover subdomains of a domain
    #[command(alias = "e")]
    Enum {
        /// Base domain, e.g. example.com
        domain: String,
        /// Use discovered subdomains as new base domains
        #[arg(short, long)]
        recursive: bool,
        /// Maximum recursion depth
        #[arg(short, long, default_value_t = 1)]
        depth: usize,
        /// Maximum number of lookups in flight
        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,
        /// Query Shodan and VirusTotal for known subdomains
        #[arg(long)]
        use_apis: bool,
        #[arg(long, env = "SHODAN_API_KEY", hide_env_values = true)]
        shodan_key: Option<String>,
        #[arg(long = "vt-key", env = "VIRUSTOTAL_API_KEY", hide_env_values = true)]
        virustotal_key: Option<String>,
        /// Also report candidates that did not resolve
        #[arg(long)]
        include_inactive: bool,
        /// Prefix list to use instead of the built-in one, one entry per line
        #[arg(short, long)]
        wordlist: Option<PathBuf>,
        /// Timeout per DNS lookup, in milliseconds
        #[arg(long, default_value_t = 3000)]
        dns_timeout_ms: u64,
        /// Stop admitting new lookups after this many seconds
        #[arg(long, default_value_t = 300)]
        deadline_secs: u64,
        /// Write the results as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
