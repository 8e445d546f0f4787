//! Corpus-driven message synthesis library.
//!
//! This crate ingests a line-oriented social-media corpus (three-line
//! records: timestamp, author URL, message text), learns its statistical
//! structure and generates new, statistically plausible messages:
//! - Fault-tolerant concurrent block parsing over a bounded worker pool
//! - A first-order Markov model over word pairs, with pruning and
//!   aggregate statistics
//! - Inverse-CDF event sampling backed by an order-statistics tree
//! - Snapshot persistence so a learned model survives process runs
//!
//! Learning and generation are driven through `automaton::trainer` and
//! `automaton::word_sampler`; everything below them is building blocks.

/// Learning and generation drivers, the word transition matrix and the
/// accumulators behind them.
pub mod automaton;

/// Crate-wide error taxonomy.
pub mod error;

/// Path helpers for model files.
pub mod io;

/// Corpus block scanning and concurrent record parsing.
pub mod parsing;

/// Weighted discrete-event sampling.
pub mod statistics;

/// Generic data structures (order-statistics tree).
pub mod structs;
