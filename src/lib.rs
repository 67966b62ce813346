pub mod browse;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod indexer;
pub mod logging;
pub mod persist;
pub mod scanner;
pub mod session;
