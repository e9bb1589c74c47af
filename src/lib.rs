//! feedcat: marketplace feed ingestion
//!
//! Resolves the flat category table of a feed into full ancestor paths,
//! classifies offers by their leaf category and assembles export records.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
