//! agent 固有のアダプター

pub mod cli_approval;
pub mod sh_runner;

pub use cli_approval::CliApproval;
pub use sh_runner::ShRunner;
