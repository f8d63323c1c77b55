pub mod cli;
pub mod config;
pub mod discover;
pub mod env;
pub mod error;
pub mod exec;
pub mod formats;
pub mod matrix;
pub mod report;
pub mod runner;

pub use error::RunnerError;
