//! Driving-side adapters.

pub mod cli;
