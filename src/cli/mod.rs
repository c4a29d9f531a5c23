//! Command-line front end: argument parsing and interactive prompts.

pub mod args;
pub mod prompt;
