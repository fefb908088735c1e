pub mod batch;
pub mod cli;
pub mod config;
pub mod models;
pub mod report;
pub mod scorer;
pub mod search;
pub mod sink;
pub mod site_parser;
