pub mod archive;
pub mod args;
pub mod config;
pub mod counter;
pub mod filename;
pub mod mirror;
pub mod processor;
pub mod report;
pub mod scan;
