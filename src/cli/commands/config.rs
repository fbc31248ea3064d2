//! `cfadmin config` command - Show the effective configuration

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values (defaults, files and environment merged)
    Show,

    /// Show paths to configuration files
    Path,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global).ok();
    let config = Config::load_for(project.as_ref());

    match cmd {
        ConfigCommands::Show => {
            let reviewer = config.reviewer();
            let effective = serde_json::json!({
                "reviewer": reviewer,
                "page_limit": config.page_limit(),
                "pagination": config.pagination().to_string(),
                "default_format": config.default_format.clone().unwrap_or_else(|| "auto".into()),
            });
            match global.format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&effective).into_diagnostic()?;
                    println!("{}", json);
                }
                _ => {
                    let yaml = serde_yml::to_string(&effective).into_diagnostic()?;
                    print!("{}", yaml);
                }
            }
        }
        ConfigCommands::Path => {
            match Config::global_config_path() {
                Some(path) => {
                    let marker = if path.exists() { "" } else { " (not created)" };
                    println!(
                        "{}: {}{}",
                        style("Global").bold(),
                        path.display(),
                        style(marker).dim()
                    );
                }
                None => println!("{}: {}", style("Global").bold(), style("unavailable").dim()),
            }
            match &project {
                Some(project) => println!(
                    "{}: {}",
                    style("Project").bold(),
                    project.config_path().display()
                ),
                None => println!(
                    "{}: {}",
                    style("Project").bold(),
                    style("not in a cfadmin project").dim()
                ),
            }
        }
    }
    Ok(())
}
