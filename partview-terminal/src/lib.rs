/// Terminal front end for browsing STL part trees
///
/// The [`controller::Controller`] owns the part list and renderers and is
/// driven either by the interactive [`TerminalApp`] or by [`app::snapshot`].
pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod presenter;
pub mod tree_view;

pub use app::TerminalApp;
pub use cli::Cli;
pub use config::Config;
pub use controller::{Controller, OpenError};
