pub mod analyzer;
pub mod extract;
pub mod git;
pub mod runner;
pub mod settings;
pub mod snapshot;
pub mod timeseries;
