//! Command-line harness for the CDA import engine.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod state;
