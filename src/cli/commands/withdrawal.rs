//! `cfadmin withdrawal` command - Payout request review

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::common::{
    fetch_all, load_view, print_done, print_list, print_record, resolve_id, rows_for,
    run_review, show_notice, visible_columns, write_export, ListOutput, PageArgs, ReviewArgs,
};
use crate::cli::helpers::{confirm, format_amount, open_project};
use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{
    bulk_review, Config, DataSource, Dialog, ExportFormat, JsonStore, MutationState, Notice,
    Project, ReviewRequest,
};
use crate::entities::withdrawal::RiskLevel;
use crate::entities::{
    PaymentMethod, Withdrawal, WithdrawalFilters, WithdrawalSort, WithdrawalStatus,
};
use crate::pipeline::{AmountRange, DateRange, Direction};

#[derive(Subcommand, Debug)]
pub enum WithdrawalCommands {
    /// List payout requests with filtering
    List(ListArgs),

    /// Show a payout request
    Show(ShowArgs),

    /// Approve a pending payout
    Approve(ReviewArgs),

    /// Reject a pending payout (a reason is required)
    Reject(ReviewArgs),

    /// Approve several pending payouts at once
    BulkApprove(BulkArgs),

    /// Export every payout request
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<WithdrawalStatus>,

    /// Only requests made within this window: 7days, 30days, 90days, all
    #[arg(long, default_value = "all")]
    pub date_range: DateRange,

    /// Amount bucket: small (< 1,000), medium (< 5,000), large, all
    #[arg(long, default_value = "all")]
    pub amount_range: AmountRange,

    /// Filter by payment method (bank_transfer, mobile_money)
    #[arg(long)]
    pub payment_method: Option<PaymentMethod>,

    /// Sort key: newest, oldest, amount_high, amount_low, risk_high
    #[arg(long, default_value = "newest")]
    pub sort: WithdrawalSort,

    /// Override the sort key's natural direction (asc, desc)
    #[arg(long)]
    pub direction: Option<Direction>,

    #[command(flatten)]
    pub page: PageArgs,
}

impl ListArgs {
    fn filters(&self) -> WithdrawalFilters {
        WithdrawalFilters {
            statuses: self.status.clone(),
            date_range: self.date_range,
            amount_range: self.amount_range,
            payment_method: self.payment_method,
            sort_by: self.sort,
            direction: self.direction,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Withdrawal ID (a unique prefix is enough)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct BulkArgs {
    /// Withdrawal IDs to approve
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,

    /// Notes recorded on every approval
    #[arg(long)]
    pub notes: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
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
    ColumnDef::new("account", "ACCOUNT", 24),
    ColumnDef::new("bank", "BANK", 18),
    ColumnDef::new("amount", "AMOUNT", 14),
    ColumnDef::new("fee", "FEE", 10),
    ColumnDef::new("net", "NET", 14),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("method", "METHOD", 14),
    ColumnDef::new("risk", "RISK", 5),
    ColumnDef::new("requested", "REQUESTED", 10),
];

const DEFAULT_COLUMNS: &[&str] = &["id", "account", "amount", "status", "risk", "requested"];

/// Run a withdrawal subcommand
pub fn run(cmd: WithdrawalCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        WithdrawalCommands::List(args) => run_list(args, global),
        WithdrawalCommands::Show(args) => run_show(args, global),
        WithdrawalCommands::Approve(args) => run_decision(args, false, global),
        WithdrawalCommands::Reject(args) => run_decision(args, true, global),
        WithdrawalCommands::BulkApprove(args) => run_bulk_approve(args, global),
        WithdrawalCommands::Export(args) => {
            let (_, store) = open_store(global)?;
            write_export(&store, args.export_as, args.output.as_deref())
        }
    }
}

fn open_store(global: &GlobalOpts) -> Result<(Project, JsonStore<Withdrawal>)> {
    let project = open_project(global)?;
    let store = project
        .store::<Withdrawal>()
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((project, store))
}

fn to_row(w: &Withdrawal) -> TableRow {
    let account = &w.account_details;
    TableRow::new(&w.id)
        .cell("id", CellValue::Id(w.id.clone()))
        .cell("account", CellValue::Text(account.account_name.clone()))
        .cell("bank", CellValue::Text(account.bank_name.clone()))
        .cell("amount", CellValue::Amount(w.amount()))
        .cell("fee", CellValue::Amount(w.fee()))
        .cell("net", CellValue::Amount(w.net()))
        .cell("status", CellValue::Status(w.status.to_string()))
        .cell(
            "method",
            w.payment_method
                .map(|m| CellValue::Text(m.to_string()))
                .unwrap_or(CellValue::Empty),
        )
        .cell("risk", CellValue::Risk(w.risk_score))
        .cell("requested", CellValue::Date(w.requested()))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let view = load_view(&store, args.filters(), &args.page, &config)?;
    let out = ListOutput {
        columns: COLUMNS,
        visible: visible_columns(&args.page.columns, COLUMNS, DEFAULT_COLUMNS)?,
        entity: "withdrawal",
        plural: "withdrawals",
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
    let w = store.get_by_id(&id).map_err(|e| miette::miette!("{}", e))?;

    if global.format != OutputFormat::Auto {
        return print_record(&w, global);
    }

    let account = &w.account_details;
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&w.id).cyan());
    println!("{}: {}", style("Status").bold(), w.status);
    println!("{}: {}", style("Amount").bold(), format_amount(w.amount()));
    println!("{}: {}", style("Fee").bold(), format_amount(w.fee()));
    println!("{}: {}", style("Net").bold(), format_amount(w.net()));
    if let Some(method) = w.payment_method {
        println!("{}: {}", style("Method").bold(), method);
    }
    println!(
        "{}: {} ({})",
        style("Account").bold(),
        account.account_name,
        account.account_number.as_deref().unwrap_or("-")
    );
    println!("{}: {}", style("Bank").bold(), account.bank_name);
    if let (Some(score), Some(level)) = (w.risk_score, w.risk_level()) {
        let level = match level {
            RiskLevel::High => style(level.to_string()).red().bold(),
            RiskLevel::Medium => style(level.to_string()).yellow(),
            RiskLevel::Low => style(level.to_string()).green(),
        };
        println!("{}: {} ({})", style("Risk").bold(), score, level);
    }
    if let Some(requested) = &w.request_date {
        println!("{}: {}", style("Requested").bold(), requested);
    }
    if let Some(reviewed) = &w.review_date {
        println!("{}: {}", style("Reviewed").bold(), reviewed);
    }
    if let Some(reason) = &w.rejection_reason {
        println!("{}: {}", style("Rejection reason").bold(), style(reason).red());
    }
    if let Some(notes) = &w.notes {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", notes);
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
                "Withdrawal {} {} ({})",
                style(&updated.id).cyan(),
                style(updated.status).yellow(),
                format_amount(updated.amount())
            ),
        );
    }
    Ok(())
}

fn run_bulk_approve(args: BulkArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store) = open_store(global)?;
    let config = Config::load_for(Some(&project));

    let mut ids = Vec::with_capacity(args.ids.len());
    for input in &args.ids {
        match resolve_id(store.records(), input) {
            Ok(id) => ids.push(id),
            Err(e) => show_notice(&Notice::error(e.to_string()), global.quiet),
        }
    }
    if ids.is_empty() {
        return Err(miette::miette!("No withdrawals to approve"));
    }

    if !confirm(&format!("Approve {} withdrawal(s)?", ids.len()), args.yes)? {
        show_notice(&Notice::info("Cancelled"), false);
        return Ok(());
    }

    let mut request = ReviewRequest::approve();
    if let Some(notes) = args.notes {
        request = request.with_notes(notes);
    }

    let mut displayed = fetch_all(&store).map_err(|e| miette::miette!("{}", e))?;
    let batch = bulk_review(
        &mut store,
        &mut displayed,
        &ids,
        &request,
        &config.reviewer(),
        |w: &mut Withdrawal| w.status = WithdrawalStatus::Approved,
    );

    for id in batch.ids() {
        match batch.state(id) {
            Some(MutationState::Committed) if !global.quiet => {
                println!("{} {}", style("✓").green(), style(id).cyan());
            }
            Some(MutationState::Failed(message)) => {
                show_notice(&Notice::error(format!("{}: {}", id, message)), global.quiet);
            }
            _ => {}
        }
    }

    let failed = batch.failures().len();
    print_done(
        global,
        format!(
            "Approved {} of {} withdrawal(s)",
            style(batch.committed()).green(),
            batch.committed() + failed
        ),
    );
    if failed > 0 {
        return Err(miette::miette!("{} withdrawal(s) could not be approved", failed));
    }
    Ok(())
}
