use super::Parser;

/// Friend-request relationship service.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Settings file, without extension; defaults to `settings/dev` or `settings/release`.
    #[arg(long)]
    pub settings: Option<String>,
}
