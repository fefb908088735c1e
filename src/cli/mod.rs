pub mod cli;
mod run;
mod run_batch_search;
mod run_parse_site;

pub use cli::MenuAction;
