//! Core library for the `volley` load tester.
//!
//! The [`engine`] drives a [`profile::LoadProfile`] against a
//! [`pipeline::TestPlan`]: it keeps the target number of workers alive,
//! runs every step through the request pipeline, and aggregates what
//! happened into per-endpoint [`metrics`]. The `volley` binary wires the
//! engine to a reqwest-backed executor, test-plan files and the CLI.
pub mod args;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod shutdown;
pub mod sinks;

mod app;
mod shutdown_handlers;
mod system;

#[cfg(test)]
mod test_support;
