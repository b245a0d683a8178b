//! CLI subcommand implementations.

pub mod export;
pub mod info;

pub use export::CmdExport;
pub use info::CmdInfo;
