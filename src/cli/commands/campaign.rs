//! `cfadmin campaign` command - Campaign moderation

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::common::{
    load_view, print_done, print_list, print_record, resolve_id, rows_for, run_action,
    run_delete, run_review, visible_columns, write_export, ListOutput, PageArgs, ReviewArgs,
};
use crate::cli::helpers::{format_amount, open_project};
use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::value::parse_timestamp;
use crate::core::{
    Config, DataSource, Dialog, ExportFormat, JsonStore, Project, ReviewAction, ReviewRequest,
    Reviewable,
};
use crate::entities::{Campaign, CampaignFilters, CampaignSort, CampaignStatus};
use crate::json::parse_document;
use crate::pipeline::{AmountRange, DateRange, Direction};

#[derive(Subcommand, Debug)]
pub enum CampaignCommands {
    /// List campaigns with filtering
    List(ListArgs),

    /// Show a campaign's details and moderation history
    Show(ShowArgs),

    /// Approve a pending campaign
    Approve(ReviewArgs),

    /// Reject a pending campaign (a reason is required)
    Reject(ReviewArgs),

    /// Publish an approved campaign
    Publish(ActionArgs),

    /// Pause an active campaign
    Pause(ActionArgs),

    /// Resume a paused campaign
    Resume(ActionArgs),

    /// Mark an active or paused campaign as completed
    Complete(ActionArgs),

    /// Feature a campaign on the home page
    Feature(ActionArgs),

    /// Remove a campaign from the featured list
    Unfeature(ActionArgs),

    /// Delete a campaign
    Delete(DeleteArgs),

    /// Import campaigns from a JSON file (array or {"data": [...]})
    Import(ImportArgs),

    /// Export every campaign
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<CampaignStatus>,

    /// Filter by category (exact match)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only campaigns created within this window: 7days, 30days, 90days, all
    #[arg(long, default_value = "all")]
    pub date_range: DateRange,

    /// Goal bucket: small (< 10,000), medium (< 50,000), large, all
    #[arg(long, default_value = "all")]
    pub amount_range: AmountRange,

    /// Only featured campaigns
    #[arg(long)]
    pub featured: bool,

    /// Sort key: newest, oldest, goal_high, goal_low, raised_high, progress_high, end_date
    #[arg(long, default_value = "newest")]
    pub sort: CampaignSort,

    /// Override the sort key's natural direction (asc, desc)
    #[arg(long)]
    pub direction: Option<Direction>,

    #[command(flatten)]
    pub page: PageArgs,
}

impl ListArgs {
    fn filters(&self) -> CampaignFilters {
        CampaignFilters {
            category: self.category.clone(),
            statuses: self.status.clone(),
            date_range: self.date_range,
            amount_range: self.amount_range,
            featured_only: self.featured,
            sort_by: self.sort,
            direction: self.direction,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Campaign ID (a unique prefix is enough)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ActionArgs {
    /// Campaign ID (a unique prefix is enough)
    pub id: String,

    /// Notes recorded with the action
    #[arg(long)]
    pub notes: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Campaign ID (a unique prefix is enough)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// JSON file to import
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Encoding of the export
    #[arg(long = "as", value_enum, default_value_t = ExportFormat::Json)]
    pub export_as: ExportFormat,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("title", "TITLE", 32),
    ColumnDef::new("category", "CATEGORY", 14),
    ColumnDef::new("status", "STATUS", 17),
    ColumnDef::new("goal", "GOAL", 14),
    ColumnDef::new("raised", "RAISED", 14),
    ColumnDef::new("progress", "PROGRESS", 8),
    ColumnDef::new("featured", "FEATURED", 8),
    ColumnDef::new("creator", "CREATOR", 18),
    ColumnDef::new("created", "CREATED", 10),
    ColumnDef::new("ends", "ENDS", 10),
];

const DEFAULT_COLUMNS: &[&str] = &["id", "title", "status", "goal", "progress", "created"];

/// Run a campaign subcommand
pub fn run(cmd: CampaignCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CampaignCommands::List(args) => run_list(args, global),
        CampaignCommands::Show(args) => run_show(args, global),
        CampaignCommands::Approve(args) => run_decision(args, false, global),
        CampaignCommands::Reject(args) => run_decision(args, true, global),
        CampaignCommands::Publish(args) => run_lifecycle(args, ReviewAction::Publish, global),
        CampaignCommands::Pause(args) => run_lifecycle(args, ReviewAction::Pause, global),
        CampaignCommands::Resume(args) => run_lifecycle(args, ReviewAction::Resume, global),
        CampaignCommands::Complete(args) => run_lifecycle(args, ReviewAction::Complete, global),
        CampaignCommands::Feature(args) => run_lifecycle(args, ReviewAction::Feature, global),
        CampaignCommands::Unfeature(args) => run_lifecycle(args, ReviewAction::Unfeature, global),
        CampaignCommands::Delete(args) => run_delete_cmd(args, global),
        CampaignCommands::Import(args) => run_import(args, global),
        CampaignCommands::Export(args) => run_export(args, global),
    }
}

fn open_store(global: &GlobalOpts) -> Result<(Project, JsonStore<Campaign>)> {
    let project = open_project(global)?;
    let store = project
        .store::<Campaign>()
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((project, store))
}

fn to_row(c: &Campaign) -> TableRow {
    TableRow::new(&c.id)
        .cell("id", CellValue::Id(c.id.clone()))
        .cell("title", CellValue::Text(c.title.clone()))
        .cell(
            "category",
            c.category
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("status", CellValue::Status(c.status.to_string()))
        .cell("goal", CellValue::Amount(c.goal()))
        .cell("raised", CellValue::Amount(c.raised()))
        .cell("progress", CellValue::Progress(c.progress()))
        .cell("featured", CellValue::Flag(c.featured))
        .cell(
            "creator",
            c.creator_name
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("created", CellValue::Date(c.created()))
        .cell("ends", CellValue::Date(parse_timestamp(c.end_date.as_deref())))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let view = load_view(&store, args.filters(), &args.page, &config)?;
    let out = ListOutput {
        columns: COLUMNS,
        visible: visible_columns(&args.page.columns, COLUMNS, DEFAULT_COLUMNS)?,
        entity: "campaign",
        plural: "campaigns",
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

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (_, store) = open_store(global)?;
    let id = resolve_id(store.records(), &args.id)?;
    let campaign = store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))?;

    if global.format != OutputFormat::Auto {
        return print_record(&campaign, global);
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&campaign.id).cyan());
    println!("{}: {}", style("Title").bold(), style(&campaign.title).yellow());
    if let Some(subtitle) = &campaign.subtitle {
        println!("{}: {}", style("Subtitle").bold(), subtitle);
    }
    if let Some(category) = &campaign.category {
        println!("{}: {}", style("Category").bold(), category);
    }
    println!("{}: {}", style("Status").bold(), campaign.status);
    println!(
        "{}: {} of {} ({}%)",
        style("Funding").bold(),
        format_amount(campaign.raised()),
        format_amount(campaign.goal()),
        campaign.progress()
    );
    if campaign.featured {
        println!("{}: {}", style("Featured").bold(), style("yes").green());
    }
    if let Some(creator) = &campaign.creator_name {
        println!("{}: {}", style("Creator").bold(), creator);
    }
    if let Some(created) = &campaign.created_at {
        println!("{}: {}", style("Created").bold(), created);
    }
    if let Some(end) = &campaign.end_date {
        println!("{}: {}", style("Ends").bold(), end);
    }

    let actions: Vec<String> = campaign
        .status
        .allowed_actions()
        .iter()
        .map(ToString::to_string)
        .collect();
    if !actions.is_empty() {
        println!("{}: {}", style("Next").bold(), actions.join(", "));
    }

    if let Some(description) = &campaign.description {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", description);
    }

    if !campaign.reviews.is_empty() {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", style("Moderation history").bold());
        for review in &campaign.reviews {
            let detail = review
                .reason
                .as_deref()
                .or(review.notes.as_deref())
                .unwrap_or("");
            println!(
                "  {} {} by {} {}",
                style(review.timestamp.format("%Y-%m-%d %H:%M")).dim(),
                review.action,
                review.reviewer,
                detail
            );
        }
    }

    Ok(())
}

fn run_decision(args: ReviewArgs, reject: bool, global: &GlobalOpts) -> Result<()> {
    let (project, mut store) = open_store(global)?;
    let config = Config::load_for(Some(&project));
    let id = resolve_id(store.records(), &args.id)?;
    let target = store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))?;

    let dialog = if reject {
        Dialog::reject(target)
    } else {
        Dialog::approve(target)
    };
    if let Some(updated) = run_review(&mut store, dialog, &args, &config.reviewer())? {
        print_done(
            global,
            format!(
                "Campaign {} is now {}",
                style(&updated.id).cyan(),
                style(updated.status()).yellow()
            ),
        );
    }
    Ok(())
}

fn run_lifecycle(args: ActionArgs, action: ReviewAction, global: &GlobalOpts) -> Result<()> {
    let (project, mut store) = open_store(global)?;
    let config = Config::load_for(Some(&project));
    let id = resolve_id(store.records(), &args.id)?;

    let mut request = ReviewRequest::new(action);
    if let Some(notes) = args.notes {
        request = request.with_notes(notes);
    }

    if let Some(updated) = run_action(&mut store, &id, request, args.yes, &config.reviewer())? {
        let message = match action {
            ReviewAction::Feature => format!("Campaign {} is featured", style(&updated.id).cyan()),
            ReviewAction::Unfeature => {
                format!("Campaign {} is no longer featured", style(&updated.id).cyan())
            }
            _ => format!(
                "Campaign {} is now {}",
                style(&updated.id).cyan(),
                style(updated.status).yellow()
            ),
        };
        print_done(global, message);
    }
    Ok(())
}

fn run_delete_cmd(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store) = open_store(global)?;
    let id = resolve_id(store.records(), &args.id)?;
    let target = store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))?;

    if let Some(removed) = run_delete(&mut store, target, args.yes)? {
        print_done(
            global,
            format!("Deleted campaign {}", style(&removed.id).cyan()),
        );
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store) = open_store(global)?;
    let (content, _) = parse_document(&args.file)?;
    let stats = store
        .import(content.as_bytes())
        .map_err(|e| miette::miette!("{}", e))?;

    print_done(
        global,
        format!(
            "Imported campaigns: {} created, {} updated, {} skipped",
            style(stats.created).green(),
            style(stats.updated).cyan(),
            style(stats.skipped).yellow()
        ),
    );
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (_, store) = open_store(global)?;
    write_export(&store, args.export_as, args.output.as_deref())
}
