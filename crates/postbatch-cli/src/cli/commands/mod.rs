//! CLI command handlers, one file per command.

mod completions;
mod preview;
mod run;
mod status;

pub use completions::run_completions;
pub use preview::run_preview;
pub use run::{run_batch, RunRequest};
pub use status::run_status;
