//! Plumbing shared by the list/show/review subcommands

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::cli::helpers::{confirm, prompt_text, today};
use crate::cli::table::{ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Record;
use crate::core::{
    Config, DataSource, Dialog, DialogIntent, ExportFormat, Notice, NoticeLevel, ReviewRequest,
    ReviewSource, SourceError, WorkflowError,
};
use crate::pipeline::{ListSummary, ListView, PageChange, PaginationMode, Searchable, ViewFilters};

/// Batch size used when the whole collection is pulled through `list`
const FETCH_BATCH: usize = 100;

/// Paging and search flags shared by every list command
#[derive(clap::Args, Debug, Clone)]
pub struct PageArgs {
    /// Search text (case-insensitive, matched against the searchable fields)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Page to show (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Rows per page (default: page_limit from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Where paging happens: client or server (default: from config)
    #[arg(long)]
    pub pagination: Option<PaginationMode>,

    /// Show every matching row instead of one page
    #[arg(long, conflicts_with = "page")]
    pub all: bool,

    /// Show only the count of matching rows
    #[arg(long)]
    pub count: bool,

    /// Columns to display (comma-separated keys)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

impl Default for PageArgs {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            limit: None,
            pagination: None,
            all: false,
            count: false,
            columns: Vec::new(),
        }
    }
}

/// Pull every record out of a source, one batch at a time
pub fn fetch_all<T, S: DataSource<T>>(source: &S) -> Result<Vec<T>, SourceError> {
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = source.list(page, FETCH_BATCH)?;
        let pages = batch.pagination.total_pages();
        items.extend(batch.data);
        if page >= pages {
            return Ok(items);
        }
        page += 1;
    }
}

/// Build a list view over `source` for the requested page, search and filters.
///
/// In server mode the source pages; if search or filters are active the whole
/// collection is fetched instead so that the counts stay truthful.
pub fn load_view<T, F, S>(
    source: &S,
    filters: F,
    args: &PageArgs,
    config: &Config,
) -> Result<ListView<T, F>>
where
    T: Clone + Searchable,
    F: ViewFilters<T>,
    S: DataSource<T>,
{
    let limit = args.limit.filter(|n| *n > 0).unwrap_or_else(|| config.page_limit());
    let requested = args.pagination.unwrap_or_else(|| config.pagination());

    let mut view: ListView<T, F> = ListView::new(requested, limit, today());
    view.set_filters(filters.clone());
    if let Some(search) = &args.search {
        view.set_search(search.clone());
    }

    let mode = if requested == PaginationMode::Server && (view.filters_active() || args.all || args.count) {
        debug!("query narrows a server-paged list; fetching every page");
        PaginationMode::Client
    } else {
        requested
    };

    if mode != requested {
        view = ListView::new(mode, limit, today());
        view.set_filters(filters);
        if let Some(search) = &args.search {
            view.set_search(search.clone());
        }
    }

    match mode {
        PaginationMode::Client => {
            view.load(fetch_all(source).map_err(|e| miette::miette!("{}", e))?);
            if args.page != 1 && !args.all {
                view.change_page(args.page)
                    .map_err(|e| miette::miette!("{}", e))?;
            }
        }
        PaginationMode::Server => {
            let ticket = match view.change_page(args.page) {
                Ok(PageChange::Fetch(ticket)) => ticket,
                Ok(PageChange::Local) => view.begin_fetch(args.page),
                Err(e) => return Err(miette::miette!("{}", e)),
            };
            match source.list(ticket.page, ticket.limit) {
                Ok(page) => {
                    view.complete_fetch(&ticket, page);
                }
                Err(e) => {
                    if let Some(notice) = view.fail_fetch(&ticket, &e.to_string()) {
                        return Err(miette::miette!("{}", notice));
                    }
                }
            }
        }
    }

    Ok(view)
}

/// Rows the command should print for `view`
pub fn rows_for<'v, T, F>(view: &'v ListView<T, F>, args: &PageArgs) -> &'v [T]
where
    T: Clone + Searchable,
    F: ViewFilters<T>,
{
    if args.all {
        view.displayed()
    } else {
        view.visible()
    }
}

/// Validate `--columns` against the table definition, falling back to `default`
pub fn visible_columns(
    requested: &[String],
    columns: &[ColumnDef],
    default: &[&'static str],
) -> Result<Vec<&'static str>> {
    if requested.is_empty() {
        return Ok(default.to_vec());
    }
    requested
        .iter()
        .map(|key| {
            let key = key.trim();
            columns
                .iter()
                .find(|c| c.key == key)
                .map(|c| c.key)
                .ok_or_else(|| {
                    let valid: Vec<&str> = columns.iter().map(|c| c.key).collect();
                    miette::miette!("Unknown column '{}'. Valid columns: {}", key, valid.join(", "))
                })
        })
        .collect()
}

/// Everything `print_list` needs to render one table
pub struct ListOutput<'a> {
    pub columns: &'a [ColumnDef],
    pub visible: Vec<&'static str>,
    pub entity: &'static str,
    pub plural: &'static str,
}

/// Print the visible rows of a list in the requested format
pub fn print_list<T, R>(
    items: &[T],
    summary: &ListSummary,
    args: &PageArgs,
    out: &ListOutput<'_>,
    global: &GlobalOpts,
    config: &Config,
    to_row: R,
) -> Result<()>
where
    T: Serialize,
    R: Fn(&T) -> TableRow,
{
    if args.count {
        println!("{}", summary.filtered);
        return Ok(());
    }

    if items.is_empty() {
        if !global.quiet {
            println!("No {} found.", out.plural);
        }
        return Ok(());
    }

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&items).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows: Vec<TableRow> = items.iter().map(to_row).collect();
            let table_config = if global.quiet {
                TableConfig::for_pipe()
            } else {
                TableConfig::default()
            };
            TableFormatter::new(out.columns, out.entity)
                .with_config(table_config)
                .output(&rows, format, &out.visible, Some(summary));
        }
    }
    Ok(())
}

/// Print one record; YAML unless another format is asked for
pub fn print_record<T: Serialize + Record>(record: &T, global: &GlobalOpts) -> Result<()> {
    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(record).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => println!("{}", record.id()),
        _ => {
            let yaml = serde_yml::to_string(record).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Resolve an id as typed by the user: exact match first, then a unique prefix
pub fn resolve_id<T: Record>(records: &[T], input: &str) -> Result<String> {
    let input = input.trim().trim_end_matches("...");
    if records.iter().any(|r| r.id() == input) {
        return Ok(input.to_string());
    }

    let matches: Vec<&str> = records
        .iter()
        .map(|r| r.id())
        .filter(|id| !input.is_empty() && id.starts_with(input))
        .collect();
    match matches.as_slice() {
        [only] => Ok((*only).to_string()),
        [] => Err(miette::miette!("No {} found matching '{}'", T::LABEL, input)),
        many => Err(miette::miette!(
            "'{}' is ambiguous: matches {} {}s",
            input,
            many.len(),
            T::LABEL
        )),
    }
}

/// Flags shared by approve/reject
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReviewArgs {
    /// Record ID (a unique prefix is enough)
    pub id: String,

    /// Notes shown to the owner
    #[arg(long, alias = "feedback")]
    pub notes: Option<String>,

    /// Reason for a rejection
    #[arg(long, short = 'r')]
    pub reason: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Drive a review dialog to completion and apply the resulting request.
///
/// A reject without a reason prompts for one on a terminal and fails
/// otherwise; the dialog stays open until a reason arrives or the user gives up.
pub fn run_review<T, S>(
    store: &mut S,
    mut dialog: Dialog<T>,
    args: &ReviewArgs,
    reviewer: &str,
) -> Result<Option<T>>
where
    T: Record,
    S: ReviewSource<T>,
{
    let title = match &dialog {
        Dialog::Reject { .. } => "Reject",
        _ => "Approve",
    };
    if let Some(notes) = &args.notes {
        dialog.set_notes(notes.clone());
    }
    if let Some(reason) = &args.reason {
        dialog.set_reason(reason.clone());
    }

    let intent = loop {
        match dialog.submit() {
            Ok(Some(intent)) => break intent,
            Ok(None) => return Ok(None),
            Err(WorkflowError::ReasonRequired(_)) if !args.yes && console::user_attended() => {
                let reason = prompt_text("Rejection reason")?;
                if reason.trim().is_empty() {
                    dialog.cancel();
                    show_notice(&Notice::info("Cancelled"), false);
                    return Ok(None);
                }
                dialog.set_reason(reason);
            }
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    };

    let DialogIntent::Review { target, request } = intent else {
        return Ok(None);
    };
    if !confirm(&format!("{} {} {}?", title, T::LABEL, target.id()), args.yes)? {
        show_notice(&Notice::info("Cancelled"), false);
        return Ok(None);
    }

    let updated = store
        .transition(target.id(), &request, reviewer)
        .map_err(|e| miette::miette!("{}", e))?;
    Ok(Some(updated))
}

/// Apply a reason-free action (publish, pause, ...) after confirmation
pub fn run_action<T, S>(
    store: &mut S,
    id: &str,
    request: ReviewRequest,
    yes: bool,
    reviewer: &str,
) -> Result<Option<T>>
where
    T: Record,
    S: ReviewSource<T>,
{
    if !confirm(&format!("{} {} {}?", request.action, T::LABEL, id), yes)? {
        show_notice(&Notice::info("Cancelled"), false);
        return Ok(None);
    }
    let updated = store
        .transition(id, &request, reviewer)
        .map_err(|e| miette::miette!("{}", e))?;
    Ok(Some(updated))
}

/// Confirm and delete one record through the delete dialog
pub fn run_delete<T, S>(store: &mut S, target: T, yes: bool) -> Result<Option<T>>
where
    T: Record,
    S: DataSource<T>,
{
    let mut dialog = Dialog::delete(target);
    let prompt = match dialog.target() {
        Some(t) => format!("Delete {} {}?", T::LABEL, t.id()),
        None => return Ok(None),
    };
    if !confirm(&prompt, yes)? {
        dialog.cancel();
        show_notice(&Notice::info("Cancelled"), false);
        return Ok(None);
    }
    match dialog.submit().map_err(|e| miette::miette!("{}", e))? {
        Some(DialogIntent::Delete { target }) => {
            let removed = store
                .delete(target.id())
                .map_err(|e| miette::miette!("{}", e))?;
            Ok(Some(removed))
        }
        _ => Ok(None),
    }
}

/// Write an export to `output`, or stdout when absent
pub fn write_export<T, S: DataSource<T>>(
    store: &S,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let bytes = store.export(format).map_err(|e| miette::miette!("{}", e))?;
    match output {
        Some(path) => std::fs::write(path, bytes).into_diagnostic(),
        None => std::io::stdout().write_all(&bytes).into_diagnostic(),
    }
}

/// Print a notice; errors go to stderr and are shown even when quiet
pub fn show_notice(notice: &Notice, quiet: bool) {
    match notice.level {
        NoticeLevel::Error => eprintln!("{} {}", style("✗").red(), notice),
        _ if quiet => {}
        NoticeLevel::Success => println!("{} {}", style("✓").green(), notice),
        NoticeLevel::Info => println!("{} {}", style("!").yellow(), notice),
    }
}

/// Success line in the house style
pub fn print_done(global: &GlobalOpts, message: impl std::fmt::Display) {
    show_notice(&Notice::success(message.to_string()), global.quiet);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JsonStore;
    use crate::entities::Bank;
    use serde_json::json;

    fn banks(n: usize) -> JsonStore<Bank> {
        let records = (0..n)
            .map(|i| {
                serde_json::from_value(json!({
                    "id": format!("bank-{:03}", i),
                    "name": format!("Bank {}", i),
                    "code": format!("{:03}", i),
                    "is_active": i % 2 == 0
                }))
                .unwrap()
            })
            .collect();
        JsonStore::in_memory(records)
    }

    #[test]
    fn test_fetch_all_spans_batches() {
        let store = banks(250);
        let all = fetch_all(&store).unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(all[249].id, "bank-249");
    }

    #[test]
    fn test_fetch_all_empty() {
        let store = banks(0);
        assert!(fetch_all(&store).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_id_prefix() {
        let store = banks(12);
        let records = store.records();
        assert_eq!(resolve_id(records, "bank-003").unwrap(), "bank-003");
        assert!(resolve_id(records, "bank-01")
            .unwrap_err()
            .to_string()
            .contains("ambiguous"));
        assert_eq!(resolve_id(records, "bank-011").unwrap(), "bank-011");
        assert!(resolve_id(records, "nope").is_err());
    }

    #[test]
    fn test_visible_columns_validates() {
        let columns = [ColumnDef::new("id", "ID", 10), ColumnDef::new("name", "NAME", 20)];
        let requested = vec!["name".to_string()];
        assert_eq!(
            visible_columns(&requested, &columns, &["id", "name"]).unwrap(),
            vec!["name"]
        );
        assert_eq!(
            visible_columns(&[], &columns, &["id", "name"]).unwrap(),
            vec!["id", "name"]
        );
        let bad = vec!["bogus".to_string()];
        assert!(visible_columns(&bad, &columns, &["id"]).is_err());
    }

    #[test]
    fn test_load_view_server_mode_pages_at_source() {
        let store = banks(25);
        let args = PageArgs {
            page: 3,
            limit: Some(10),
            pagination: Some(PaginationMode::Server),
            ..Default::default()
        };
        let view = load_view(&store, crate::entities::BankFilters::default(), &args, &Config::default())
            .unwrap();
        let summary = view.summary();
        assert_eq!(summary.page, 3);
        assert_eq!(summary.total, 25);
        assert_eq!(view.visible().len(), 5);
    }

    #[test]
    fn test_load_view_server_mode_with_search_fetches_everything() {
        let store = banks(25);
        let args = PageArgs {
            search: Some("bank 2".into()),
            limit: Some(10),
            pagination: Some(PaginationMode::Server),
            ..Default::default()
        };
        let view = load_view(&store, crate::entities::BankFilters::default(), &args, &Config::default())
            .unwrap();
        assert_eq!(view.mode(), PaginationMode::Client);
        // "Bank 2" and "Bank 20".."Bank 24"
        assert_eq!(view.summary().filtered, 6);
        assert_eq!(view.summary().total, 25);
    }

    #[test]
    fn test_load_view_client_out_of_range_page() {
        let store = banks(5);
        let args = PageArgs {
            page: 4,
            limit: Some(2),
            pagination: Some(PaginationMode::Client),
            ..Default::default()
        };
        let result = load_view(&store, crate::entities::BankFilters::default(), &args, &Config::default());
        assert!(result.is_err());
    }
}
