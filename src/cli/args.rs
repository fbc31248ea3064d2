//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bank::BankCommands, campaign::CampaignCommands, completions::CompletionsArgs,
    config::ConfigCommands, init::InitArgs, language::LanguageCommands, status::StatusArgs,
    translation::TranslationCommands, withdrawal::WithdrawalCommands,
};

#[derive(Parser)]
#[command(name = "cfadmin")]
#[command(author, version, about = "Crowdfunding admin console")]
#[command(long_about = "Moderate campaigns and payouts and manage reference data from the terminal.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .cfadmin/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cfadmin project
    Init(InitArgs),

    /// Campaign moderation
    #[command(subcommand)]
    Campaign(CampaignCommands),

    /// Payout request review
    #[command(subcommand)]
    Withdrawal(WithdrawalCommands),

    /// Bank reference data
    #[command(subcommand)]
    Bank(BankCommands),

    /// Supported languages
    #[command(subcommand)]
    Language(LanguageCommands),

    /// UI string translations
    #[command(subcommand)]
    Translation(TranslationCommands),

    /// Moderation dashboard
    Status(StatusArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `Auto` against the configured default, then `fallback`
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(
            OutputFormat::Json.resolve(Some("md"), OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("md"), OutputFormat::Tsv),
            OutputFormat::Md
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("bogus"), OutputFormat::Yaml),
            OutputFormat::Yaml
        );
        assert_eq!(OutputFormat::Auto.resolve(None, OutputFormat::Tsv), OutputFormat::Tsv);
    }
}
