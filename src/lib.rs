pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod output;
pub mod provider;
pub mod repl;
pub mod report;
