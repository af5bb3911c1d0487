//! The CLI run: wires the HTTP executor, sinks and engine together, then
//! prints and optionally exports what the run produced.
mod export;
mod runner;
mod summary;


pub(crate) use runner::run_local;
