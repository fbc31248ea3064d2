//! `cfadmin bank` command - Bank reference data

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::Result;
use serde_json::json;

use crate::cli::commands::common::{
    load_view, print_done, print_list, print_record, resolve_id, rows_for, run_delete,
    visible_columns, ListOutput, PageArgs,
};
use crate::cli::helpers::open_project;
use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::cli::GlobalOpts;
use crate::core::{Config, DataSource, JsonStore, Project};
use crate::entities::{Bank, BankColumn, BankFilters};
use crate::pipeline::ColumnSort;

#[derive(Subcommand, Debug)]
pub enum BankCommands {
    /// List banks
    List(ListArgs),

    /// Show a bank
    Show(ShowArgs),

    /// Add a bank
    New(NewArgs),

    /// Delete a bank
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by country (exact match)
    #[arg(long)]
    pub country: Option<String>,

    /// Only active banks
    #[arg(long)]
    pub active: bool,

    /// Click a column header; repeat to toggle (name starts active, ascending)
    #[arg(long, value_enum)]
    pub sort: Vec<BankColumn>,

    #[command(flatten)]
    pub page: PageArgs,
}

impl ListArgs {
    fn filters(&self) -> BankFilters {
        let mut sort = ColumnSort::default();
        for column in &self.sort {
            sort.click(*column);
        }
        BankFilters {
            country: self.country.clone(),
            active_only: self.active,
            sort,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Bank ID (a unique prefix is enough)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Bank name (required)
    #[arg(long, short = 'n')]
    pub name: String,

    /// Sort or routing code
    #[arg(long)]
    pub code: Option<String>,

    /// Country code
    #[arg(long)]
    pub country: Option<String>,

    /// Create the bank inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Bank ID (a unique prefix is enough)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("code", "CODE", 10),
    ColumnDef::new("country", "COUNTRY", 8),
    ColumnDef::new("active", "ACTIVE", 6),
    ColumnDef::new("created", "CREATED", 10),
];

const DEFAULT_COLUMNS: &[&str] = &["id", "name", "code", "country", "active"];

/// Run a bank subcommand
pub fn run(cmd: BankCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BankCommands::List(args) => run_list(args, global),
        BankCommands::Show(args) => {
            let (_, store) = open_store(global)?;
            let id = resolve_id(store.records(), &args.id)?;
            let bank = store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))?;
            print_record(&bank, global)
        }
        BankCommands::New(args) => run_new(args, global),
        BankCommands::Delete(args) => {
            let (_, mut store) = open_store(global)?;
            let id = resolve_id(store.records(), &args.id)?;
            let target = store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))?;
            if let Some(removed) = run_delete(&mut store, target, args.yes)? {
                print_done(global, format!("Deleted bank {}", style(&removed.name).yellow()));
            }
            Ok(())
        }
    }
}

fn open_store(global: &GlobalOpts) -> Result<(Project, JsonStore<Bank>)> {
    let project = open_project(global)?;
    let store = project
        .store::<Bank>()
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((project, store))
}

fn to_row(b: &Bank) -> TableRow {
    TableRow::new(&b.id)
        .cell("id", CellValue::Id(b.id.clone()))
        .cell("name", CellValue::Text(b.name.clone()))
        .cell(
            "code",
            b.code.clone().map(CellValue::Text).unwrap_or(CellValue::Empty),
        )
        .cell(
            "country",
            b.country
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("active", CellValue::Flag(b.is_active))
        .cell("created", CellValue::Date(b.created()))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let view = load_view(&store, args.filters(), &args.page, &config)?;
    let out = ListOutput {
        columns: COLUMNS,
        visible: visible_columns(&args.page.columns, COLUMNS, DEFAULT_COLUMNS)?,
        entity: "bank",
        plural: "banks",
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

    let mut payload = json!({
        "name": args.name.trim(),
        "is_active": !args.inactive,
        "createdAt": Utc::now().to_rfc3339(),
    });
    if let Some(code) = args.code {
        payload["code"] = json!(code);
    }
    if let Some(country) = args.country {
        payload["country"] = json!(country.to_uppercase());
    }

    let bank = store
        .create(payload)
        .map_err(|e| miette::miette!("{}", e))?;
    print_done(
        global,
        format!(
            "Created bank {} {}",
            style(&bank.id).cyan(),
            style(&bank.name).yellow()
        ),
    );
    Ok(())
}
