pub mod baseline;
pub mod cli;
pub mod complexity;
pub mod config;
pub mod detect;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod query;
pub mod types;
