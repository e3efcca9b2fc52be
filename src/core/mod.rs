// src/core/mod.rs

// The `mod.rs` file acts as the root of the `core` module, exposing the
// reconnaissance engine and its data model to the rest of the crate.

/// Data structures shared by the scanners: options, results, record maps.
pub mod models;

/// The tagged error type returned by every fallible engine operation.
pub mod error;

/// Static lookup tables: common ports, service labels, subdomain wordlist.
pub mod knowledge_base;

/// Candidate generation: port specifications and subdomain names.
pub mod targets;

/// Cancellation signal shared by the runner and the probes.
pub mod cancel;

/// Bounded-concurrency runner that fans probes out and streams results back.
pub mod runner;

/// Probe executors (TCP, DNS, passive sources) and the full-run orchestration.
pub mod scanner;

/// JSON export of a run.
pub mod export;
