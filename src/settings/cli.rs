use super::Parser;

/// Issues and rotates access/refresh token pairs over HTTP.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Settings file; defaults to settings/dev.toml (debug) or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,
}
