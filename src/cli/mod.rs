//! Command-line interface

pub mod args;
pub mod fields;
pub mod filters;
pub mod helpers;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod run;
pub mod updates;

pub use args::Cli;
pub use prompt::{LinePrompt, Prompt, TerminalPrompt};
pub use run::{execute, run, Session};
pub use updates::UpdateSet;
