//! CLI module graph.

pub mod command;
pub mod config;
pub mod history;
pub mod import;
pub mod ledger;
pub mod output;
pub mod paths;
pub mod positions;
pub mod run;
pub mod stats;
