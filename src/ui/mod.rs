// src/ui/mod.rs

// Console rendering for the command-line front end. Results are written to
// stdout as they stream in; diagnostics go through `tracing` instead.

pub mod printer;

pub use printer::ResultPrinter;
