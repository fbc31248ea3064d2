//! `cfadmin translation` command - UI string translations

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use std::path::PathBuf;

use crate::cli::commands::common::{
    load_view, print_done, print_list, rows_for, visible_columns, write_export, ListOutput,
    PageArgs,
};
use crate::cli::commands::language::resolve_language;
use crate::cli::helpers::open_project;
use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::cli::GlobalOpts;
use crate::core::{Config, DataSource, ExportFormat, JsonStore, Project};
use crate::entities::translation::{coverage, export_language, import_language};
use crate::entities::{Coverage, Language, Translation, TranslationFilters};
use crate::json::parse_document;
use crate::pipeline::Direction;

#[derive(Subcommand, Debug)]
pub enum TranslationCommands {
    /// List translation keys
    List(ListArgs),

    /// Set the text of one key in one language (the key is created if missing)
    Set(SetArgs),

    /// Import a JSON file: a nested bundle with --language, else a record array
    Import(ImportArgs),

    /// Export translations: a nested bundle with --language, else every record
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Language (code or ID) whose text is shown and whose coverage is filtered
    #[arg(long, short = 'l')]
    pub language: Option<String>,

    /// Coverage filter
    #[arg(long, value_enum, default_value_t = Coverage::All)]
    pub coverage: Coverage,

    /// Only keys in this namespace (first dot segment)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Key order (asc, desc)
    #[arg(long, default_value = "asc")]
    pub direction: Direction,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Dot-separated key, e.g. `auth.login.title`
    pub key: String,

    /// Translated text
    pub text: String,

    /// Language (code or ID)
    #[arg(long, short = 'l')]
    pub language: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// JSON file to import
    pub file: PathBuf,

    /// Treat the file as a nested bundle for this language (code or ID)
    #[arg(long, short = 'l')]
    pub language: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Export a nested bundle for this language (code or ID)
    #[arg(long, short = 'l')]
    pub language: Option<String>,

    /// Encoding of a full export
    #[arg(long = "as", value_enum, default_value_t = ExportFormat::Json, conflicts_with = "language")]
    pub export_as: ExportFormat,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("key", "KEY", 36),
    ColumnDef::new("namespace", "NAMESPACE", 14),
    ColumnDef::new("text", "TEXT", 40),
    ColumnDef::new("languages", "LANGS", 5),
];

const DEFAULT_COLUMNS: &[&str] = &["key", "text", "languages"];

/// Run a translation subcommand
pub fn run(cmd: TranslationCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TranslationCommands::List(args) => run_list(args, global),
        TranslationCommands::Set(args) => run_set(args, global),
        TranslationCommands::Import(args) => run_import(args, global),
        TranslationCommands::Export(args) => run_export(args, global),
    }
}

fn open_stores(global: &GlobalOpts) -> Result<(Project, JsonStore<Translation>, JsonStore<Language>)> {
    let project = open_project(global)?;
    let translations = project
        .store::<Translation>()
        .map_err(|e| miette::miette!("{}", e))?;
    let languages = project
        .store::<Language>()
        .map_err(|e| miette::miette!("{}", e))?;
    Ok((project, translations, languages))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store, languages) = open_stores(global)?;
    let config = Config::load_for(Some(&project));

    let language = match &args.language {
        Some(input) => Some(resolve_language(&languages, input)?),
        None => None,
    };
    let filters = TranslationFilters {
        language_id: language.as_ref().map(|l| l.id.clone()),
        coverage: args.coverage,
        namespace: args.namespace.clone(),
        direction: args.direction,
    };

    let view = load_view(&store, filters, &args.page, &config)?;
    let out = ListOutput {
        columns: COLUMNS,
        visible: visible_columns(&args.page.columns, COLUMNS, DEFAULT_COLUMNS)?,
        entity: "translation",
        plural: "translations",
    };
    let lang_id = language.as_ref().map(|l| l.id.as_str());
    print_list(
        rows_for(&view, &args.page),
        &view.summary(),
        &args.page,
        &out,
        global,
        &config,
        |t: &Translation| {
            let text = match lang_id {
                Some(id) => t
                    .current_translation(id)
                    .map(|s| CellValue::Text(s.to_string()))
                    .unwrap_or(CellValue::Empty),
                None => t
                    .translations
                    .iter()
                    .map(|e| e.translation.as_str())
                    .find(|s| !s.trim().is_empty())
                    .map(|s| CellValue::Text(s.to_string()))
                    .unwrap_or(CellValue::Empty),
            };
            TableRow::new(&t.id)
                .cell("id", CellValue::Id(t.id.clone()))
                .cell("key", CellValue::Text(t.key.clone()))
                .cell(
                    "namespace",
                    t.namespace()
                        .map(|s| CellValue::Text(s.to_string()))
                        .unwrap_or(CellValue::Empty),
                )
                .cell("text", text)
                .cell(
                    "languages",
                    CellValue::Number(
                        t.translations
                            .iter()
                            .filter(|e| !e.translation.trim().is_empty())
                            .count() as i64,
                    ),
                )
        },
    )?;

    if let Some(language) = &language {
        if !global.quiet && !args.page.count {
            let stats = coverage(view.original(), &language.id);
            println!(
                "{} coverage: {}/{} keys ({}%), {} missing",
                style(&language.code).cyan(),
                stats.translated,
                stats.total,
                stats.percent(),
                stats.missing()
            );
        }
    }
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store, languages) = open_stores(global)?;
    let language = resolve_language(&languages, &args.language)?;
    let key = args.key.trim();

    let existing = store.records().iter().find(|t| t.key == key).cloned();
    let record = match existing {
        Some(mut record) => {
            record.upsert_translation(&language.id, args.text);
            store
                .update(&record.id, json!({ "translations": record.translations }))
                .map_err(|e| miette::miette!("{}", e))?
        }
        None => store
            .create(json!({
                "key": key,
                "translations": [{ "language_id": language.id, "translation": args.text }],
            }))
            .map_err(|e| miette::miette!("{}", e))?,
    };

    print_done(
        global,
        format!(
            "Set {} [{}]",
            style(&record.key).yellow(),
            style(&language.code).cyan()
        ),
    );
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut store, languages) = open_stores(global)?;
    let (content, value) = parse_document(&args.file)?;

    let stats = match &args.language {
        Some(input) => {
            let language = resolve_language(&languages, input)?;
            import_language(&mut store, &language.id, &value)
        }
        None => store.import(content.as_bytes()),
    }
    .map_err(|e| miette::miette!("{}", e))?;

    print_done(
        global,
        format!(
            "Imported translations: {} created, {} updated, {} skipped",
            style(stats.created).green(),
            style(stats.updated).cyan(),
            style(stats.skipped).yellow()
        ),
    );
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (_, store, languages) = open_stores(global)?;

    let Some(input) = &args.language else {
        return write_export(&store, args.export_as, args.output.as_deref());
    };

    let language = resolve_language(&languages, input)?;
    let bundle = export_language(store.records(), &language.id);
    let json = serde_json::to_string_pretty(&bundle).into_diagnostic()?;
    match &args.output {
        Some(path) => std::fs::write(path, format!("{}\n", json)).into_diagnostic(),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
