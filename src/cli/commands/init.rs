//! `cfadmin init` command - Initialize a new cfadmin project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Project, ProjectError, COLLECTIONS, PROJECT_DIR};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Reinitialize even if .cfadmin/ already exists (data files are emptied)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            println!(
                "{} Initialized cfadmin project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(&project);
            println!();
            println!("Next steps:");
            println!(
                "  {} Load campaigns exported from the backend",
                style("cfadmin campaign import <file.json>").yellow()
            );
            println!(
                "  {} Review what is waiting",
                style("cfadmin campaign list --status pending_approval").yellow()
            );
            println!("  {} See the dashboard", style("cfadmin status").yellow());
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} cfadmin project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("cfadmin init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(project: &Project) {
    let root = project.root();
    let mut entries = vec![
        format!("{}/", PROJECT_DIR),
        format!("{}/config.yaml", PROJECT_DIR),
        "data/".to_string(),
    ];
    entries.extend(COLLECTIONS.iter().map(|c| format!("data/{}.json", c)));

    for entry in entries {
        if root.join(Path::new(&entry)).exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
