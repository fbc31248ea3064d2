//! `cfadmin language` command - Supported languages

use clap::Subcommand;
use console::style;
use miette::Result;
use serde_json::json;

use crate::cli::commands::common::{
    load_view, print_done, print_list, resolve_id, rows_for, run_delete, visible_columns,
    ListOutput, PageArgs,
};
use crate::cli::helpers::open_project;
use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::cli::GlobalOpts;
use crate::core::{Config, DataSource, JsonStore, Project};
use crate::entities::{Language, LanguageColumn, LanguageFilters};
use crate::pipeline::ColumnSort;

#[derive(Subcommand, Debug)]
pub enum LanguageCommands {
    /// List languages
    List(ListArgs),

    /// Add a language
    New(NewArgs),

    /// Make a language the default (the previous default is cleared)
    SetDefault(IdArgs),

    /// Activate a language
    Activate(IdArgs),

    /// Deactivate a language
    Deactivate(IdArgs),

    /// Delete a language
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only active languages
    #[arg(long)]
    pub active: bool,

    /// Click a column header; repeat to toggle (name starts active, ascending)
    #[arg(long, value_enum)]
    pub sort: Vec<LanguageColumn>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Display name, e.g. "Yorùbá"
    #[arg(long, short = 'n')]
    pub name: String,

    /// Language code: `xx` or `xx-YY`
    #[arg(long, short = 'c')]
    pub code: String,

    /// Country
    #[arg(long)]
    pub country: Option<String>,

    /// Written right to left
    #[arg(long)]
    pub rtl: bool,

    /// Create the language inactive
    #[arg(long)]
    pub inactive: bool,

    /// Make it the default language
    #[arg(long)]
    pub default: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Language ID or code
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Language ID or code
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 20),
    ColumnDef::new("code", "CODE", 6),
    ColumnDef::new("country", "COUNTRY", 16),
    ColumnDef::new("active", "ACTIVE", 6),
    ColumnDef::new("default", "DEFAULT", 7),
    ColumnDef::new("rtl", "RTL", 4),
];

const DEFAULT_COLUMNS: &[&str] = &["id", "name", "code", "country", "active", "default"];

/// Run a language subcommand
pub fn run(cmd: LanguageCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LanguageCommands::List(args) => run_list(args, global),
        LanguageCommands::New(args) => run_new(args, global),
        LanguageCommands::SetDefault(args) => run_set_default(args, global),
        LanguageCommands::Activate(args) => run_set_active(args, true, global),
        LanguageCommands::Deactivate(args) => run_set_active(args, false, global),
        LanguageCommands::Delete(args) => run_delete_cmd(args, global),
    }
}

fn open_store(global: &GlobalOpts) -> Result<(Project, JsonStore<Language>)> {
    let project = open_project(global)?;
    let store = project
        .store::<Language>()
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((project, store))
}

/// Resolve an id or a language code
pub fn resolve_language(store: &JsonStore<Language>, input: &str) -> Result<Language> {
    if let Some(language) = store.records().iter().find(|l| l.code == input) {
        return Ok(language.clone());
    }
    let id = resolve_id(store.records(), input)?;
    store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))
}

fn to_row(l: &Language) -> TableRow {
    TableRow::new(&l.id)
        .cell("id", CellValue::Id(l.id.clone()))
        .cell("name", CellValue::Text(l.name.clone()))
        .cell("code", CellValue::Text(l.code.clone()))
        .cell(
            "country",
            l.country
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("active", CellValue::Flag(l.is_active))
        .cell("default", CellValue::Flag(l.is_default))
        .cell("rtl", CellValue::Flag(l.is_rtl))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let mut sort = ColumnSort::default();
    for column in &args.sort {
        sort.click(*column);
    }
    let filters = LanguageFilters {
        active_only: args.active,
        sort,
    };

    let view = load_view(&store, filters, &args.page, &config)?;
    let out = ListOutput {
        columns: COLUMNS,
        visible: visible_columns(&args.page.columns, COLUMNS, DEFAULT_COLUMNS)?,
        entity: "language",
        plural: "languages",
    };
    print_list(
        rows_for(&view, &args.page),
        &view.summary(),
        &args.page,
        &out,
        global,
        &config,
        to_row,
    )
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store) = open_store(global)?;

    let code = args.code.trim();
    if store.records().iter().any(|l| l.code == code) {
        return Err(miette::miette!("A language with code '{}' already exists", code));
    }

    let mut payload = json!({
        "name": args.name.trim(),
        "code": code,
        "is_active": !args.inactive,
        "is_default": args.default,
        "is_rtl": args.rtl,
    });
    if let Some(country) = args.country {
        payload["country"] = json!(country);
    }

    let language = store
        .create(payload)
        .map_err(|e| miette::miette!("{}", e))?;
    print_done(
        global,
        format!(
            "Created language {} ({})",
            style(&language.name).yellow(),
            style(&language.code).cyan()
        ),
    );
    Ok(())
}

fn run_set_default(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store) = open_store(global)?;
    let target = resolve_language(&store, &args.id)?;
    if !target.is_active {
        return Err(miette::miette!(
            "Language '{}' is inactive; activate it before making it the default",
            target.code
        ));
    }

    let updated = store
        .update(&target.id, json!({"is_default": true}))
        .map_err(|e| miette::miette!("{}", e))?;
    print_done(
        global,
        format!("{} is now the default language", style(&updated.name).yellow()),
    );
    Ok(())
}

fn run_set_active(args: IdArgs, active: bool, global: &GlobalOpts) -> Result<()> {
    let (_, mut store) = open_store(global)?;
    let target = resolve_language(&store, &args.id)?;
    if !active && target.is_default {
        return Err(miette::miette!(
            "Cannot deactivate the default language '{}'",
            target.code
        ));
    }

    let updated = store
        .update(&target.id, json!({"is_active": active}))
        .map_err(|e| miette::miette!("{}", e))?;
    let state = if active { "activated" } else { "deactivated" };
    print_done(
        global,
        format!("{} {}", style(&updated.name).yellow(), state),
    );
    Ok(())
}

fn run_delete_cmd(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store) = open_store(global)?;
    let target = resolve_language(&store, &args.id)?;
    if target.is_default {
        return Err(miette::miette!(
            "Cannot delete the default language '{}'; set another default first",
            target.code
        ));
    }

    if let Some(removed) = run_delete(&mut store, target, args.yes)? {
        print_done(global, format!("Deleted language {}", style(&removed.code).cyan()));
    }
    Ok(())
}
