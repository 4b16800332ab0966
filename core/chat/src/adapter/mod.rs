//! chat 固有のアダプター

pub mod menu;

pub use menu::CliModelMenu;
