//! Settings come from a TOML file chosen by build profile or `--settings`,
//! overlaid by `JWT_PAIR__*` environment variables.
//! See `bin/settings_demo.rs` for a binary that prints what gets loaded.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
