pub mod aggregate;
pub mod analyze;
pub mod cache;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod distribution;
pub mod error;
pub mod github;
pub mod help_wanted;
pub mod labels;
pub mod logging;
pub mod model;
pub mod output;
pub mod stats;
pub mod store;
