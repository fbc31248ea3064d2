//! Table formatting utilities for CLI list commands
//!
//! Every list view hands rows of typed cells to [`TableFormatter`], which
//! renders them as aligned TSV (coloured on a terminal), CSV, Markdown, or
//! bare ids.
//!
//! # Text Wrapping
//!
//! - Use `TableConfig::with_wrap(width)` to enable word-wrapped multi-line rows
//! - CSV and ID formats remain single-line for pipability

use chrono::{DateTime, Local, Utc};
use console::style;

use crate::cli::helpers::{escape_csv, format_amount, format_short_id, truncate_str};
use crate::cli::OutputFormat;
use crate::pipeline::ListSummary;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "5 campaign(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// Create config optimized for piping (no wrapping, no summary)
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let fits = current_line.chars().count() + 1 + word.chars().count() <= max_width;
        if !current_line.is_empty() && fits {
            current_line.push(' ');
            current_line.push_str(word);
            continue;
        }
        if !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
        }

        // Force-break words longer than the line
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_width).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                current_line = piece;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record id (truncated, cyan)
    Id(String),
    /// Plain text, truncated to the column
    Text(String),
    /// Workflow status with color coding
    Status(String),
    /// Money amount; NaN renders as "-"
    Amount(f64),
    /// Funding progress percentage with a colour by band
    Progress(u32),
    /// Risk score 0-100 (low green, medium yellow, high red)
    Risk(Option<u32>),
    /// Yes/no flag
    Flag(bool),
    /// Date only; absent renders as "-"
    Date(Option<DateTime<Utc>>),
    /// Integer count
    Number(i64),
    /// Empty/placeholder
    Empty,
}

fn status_style(s: &str) -> console::StyledObject<&str> {
    match s {
        "approved" | "active" | "completed" => style(s).green(),
        "pending" | "pending_approval" => style(s).yellow(),
        "rejected" => style(s).red(),
        "paused" => style(s).magenta(),
        _ => style(s).dim(),
    }
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                format!("{:<width$}", style(format_short_id(id)).cyan(), width = width)
            }
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Status(s) => format!("{:<width$}", status_style(s), width = width),
            CellValue::Amount(a) => format!("{:>width$}", format_amount(*a), width = width),
            CellValue::Progress(p) => {
                let s = format!("{}%", p);
                let styled = if *p >= 100 {
                    style(s).green().bold()
                } else if *p >= 50 {
                    style(s).green()
                } else {
                    style(s).white()
                };
                format!("{:>width$}", styled, width = width)
            }
            CellValue::Risk(opt) => {
                let styled = match opt {
                    Some(r) if *r >= 70 => style(r.to_string()).red().bold(),
                    Some(r) if *r >= 30 => style(r.to_string()).yellow(),
                    Some(r) => style(r.to_string()).green(),
                    None => style("-".to_string()).dim(),
                };
                format!("{:>width$}", styled, width = width)
            }
            CellValue::Flag(b) => {
                let styled = if *b {
                    style("yes").green()
                } else {
                    style("no").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Date(_) => format!("{:<width$}", self.raw_or_dash(), width = width),
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        escape_csv(&self.raw())
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Flag(true) => "**yes**".to_string(),
            _ => self.raw_or_dash(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting, for ID and CSV output)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) | CellValue::Status(s) => s.clone(),
            CellValue::Amount(a) if a.is_nan() => String::new(),
            CellValue::Amount(a) => format!("{:.2}", a),
            CellValue::Progress(p) => format!("{}%", p),
            CellValue::Risk(opt) => opt.map(|r| r.to_string()).unwrap_or_default(),
            CellValue::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            CellValue::Date(Some(dt)) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::Date(None) => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    fn raw_or_dash(&self) -> String {
        let raw = self.raw();
        if raw.is_empty() {
            "-".to_string()
        } else {
            raw
        }
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => format_short_id(id).chars().count(),
            CellValue::Amount(a) => format_amount(*a).chars().count(),
            CellValue::Date(_) => 10,
            _ => self.raw_or_dash().chars().count(),
        }
    }
}

/// Column definition with header label and width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that renders rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Print rows in the specified format
    pub fn output(
        &self,
        rows: &[TableRow],
        format: OutputFormat,
        visible_columns: &[&str],
        summary: Option<&ListSummary>,
    ) {
        print!("{}", self.render(rows, format, visible_columns, summary));
    }

    /// Render rows in the specified format
    pub fn render(
        &self,
        rows: &[TableRow],
        format: OutputFormat,
        visible_columns: &[&str],
        summary: Option<&ListSummary>,
    ) -> String {
        let visible: Vec<&ColumnDef> = self
            .columns
            .iter()
            .filter(|c| visible_columns.contains(&c.key))
            .collect();

        let mut out = String::new();
        match format {
            OutputFormat::Csv => self.render_csv(&mut out, rows, &visible),
            OutputFormat::Md => self.render_md(&mut out, rows, &visible),
            OutputFormat::Id => {
                for row in rows {
                    out.push_str(&row.id);
                    out.push('\n');
                }
            }
            _ => self.render_tsv(&mut out, rows, &visible, summary),
        }
        out
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow], visible: &[&ColumnDef]) -> Vec<usize> {
        visible
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                // +2 leaves room for the truncation marker; cap at the defined width
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width.max(col.header.len()))
            })
            .collect()
    }

    fn render_tsv(
        &self,
        out: &mut String,
        rows: &[TableRow],
        visible: &[&ColumnDef],
        summary: Option<&ListSummary>,
    ) {
        let widths = self.calculate_widths(rows, visible);

        let header: Vec<String> = visible
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(&header.join(" "));
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            match self.config.wrap_width {
                Some(wrap) => self.render_row_wrapped(out, row, visible, &widths, wrap),
                None => {
                    let parts: Vec<String> = visible
                        .iter()
                        .zip(&widths)
                        .map(|(col, w)| match row.get(col.key) {
                            Some(value) => value.format_tsv(*w),
                            None => format!("{:<width$}", "-", width = *w),
                        })
                        .collect();
                    out.push_str(&parts.join(" "));
                    out.push('\n');
                }
            }
        }

        if self.config.show_summary {
            out.push('\n');
            match summary {
                Some(s) if s.total_pages > 1 => out.push_str(&format!(
                    "{} of {} {}(s) shown (page {}/{}, {} matching).\n",
                    style(rows.len()).cyan(),
                    s.total,
                    self.entity_name,
                    s.page,
                    s.total_pages,
                    s.filtered
                )),
                Some(s) => out.push_str(&format!(
                    "{} {}(s) found ({} total).\n",
                    style(rows.len()).cyan(),
                    self.entity_name,
                    s.total
                )),
                None => out.push_str(&format!(
                    "{} {}(s) found.\n",
                    style(rows.len()).cyan(),
                    self.entity_name
                )),
            }
        }
    }

    fn render_row_wrapped(
        &self,
        out: &mut String,
        row: &TableRow,
        visible: &[&ColumnDef],
        widths: &[usize],
        wrap_width: usize,
    ) {
        let wrapped: Vec<Vec<String>> = visible
            .iter()
            .map(|col| match row.get(col.key) {
                Some(value @ CellValue::Text(_)) => wrap_text(&value.raw(), wrap_width),
                Some(value) => vec![value.raw_or_dash()],
                None => vec!["-".to_string()],
            })
            .collect();

        let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        for line_idx in 0..max_lines {
            let parts: Vec<String> = wrapped
                .iter()
                .enumerate()
                .map(|(col_idx, lines)| {
                    let width = widths.get(col_idx).copied().unwrap_or(10).max(wrap_width.min(40));
                    let content = lines.get(line_idx).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", content, width = width)
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if max_lines > 1 {
            out.push('\n');
        }
    }

    fn render_csv(&self, out: &mut String, rows: &[TableRow], visible: &[&ColumnDef]) {
        let mut headers = vec!["id".to_string()];
        headers.extend(visible.iter().filter(|c| c.key != "id").map(|c| c.key.to_string()));
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let mut values = vec![escape_csv(&row.id)];
            for col in visible.iter().filter(|c| c.key != "id") {
                values.push(row.get(col.key).map(CellValue::format_csv).unwrap_or_default());
            }
            out.push_str(&values.join(","));
            out.push('\n');
        }
    }

    fn render_md(&self, out: &mut String, rows: &[TableRow], visible: &[&ColumnDef]) {
        let headers: Vec<&str> = visible.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let values: Vec<String> = visible
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 18),
        ColumnDef::new("title", "TITLE", 30),
        ColumnDef::new("goal", "GOAL", 14),
        ColumnDef::new("featured", "FEATURED", 8),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new("c1")
                .cell("id", CellValue::Id("c1".into()))
                .cell("title", CellValue::Text("Clean water, for all".into()))
                .cell("goal", CellValue::Amount(5000.0))
                .cell("featured", CellValue::Flag(true)),
            TableRow::new("c2")
                .cell("id", CellValue::Id("c2".into()))
                .cell("title", CellValue::Text("Roof | repairs".into()))
                .cell("goal", CellValue::Amount(f64::NAN)),
        ]
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("short", 10), vec!["short"]);
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(
            wrap_text("abcdefghijkl xy", 5),
            vec!["abcde", "fghij", "kl xy"]
        );
    }

    #[test]
    fn test_render_csv_escapes_and_blanks() {
        let out = TableFormatter::new(COLUMNS, "campaign").render(
            &rows(),
            OutputFormat::Csv,
            &["id", "title", "goal"],
            None,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id,title,goal");
        assert_eq!(lines[1], "c1,\"Clean water, for all\",5000.00");
        assert_eq!(lines[2], "c2,Roof | repairs,");
    }

    #[test]
    fn test_render_md_escapes_pipes() {
        let out = TableFormatter::new(COLUMNS, "campaign").render(
            &rows(),
            OutputFormat::Md,
            &["title", "goal", "featured"],
            None,
        );
        assert!(out.starts_with("| TITLE | GOAL | FEATURED |\n|---|---|---|\n"));
        assert!(out.contains("| Clean water, for all | 5000.00 | **yes** |"));
        assert!(out.contains("| Roof \\| repairs | - | - |"));
    }

    #[test]
    fn test_render_ids() {
        let out = TableFormatter::new(COLUMNS, "campaign").render(
            &rows(),
            OutputFormat::Id,
            &["id"],
            None,
        );
        assert_eq!(out, "c1\nc2\n");
    }

    #[test]
    fn test_render_tsv_summary() {
        let summary = ListSummary {
            page: 2,
            limit: 2,
            total: 5,
            filtered: 5,
            total_pages: 3,
        };
        let out = TableFormatter::new(COLUMNS, "campaign").render(
            &rows(),
            OutputFormat::Tsv,
            &["id", "title"],
            Some(&summary),
        );
        assert!(out.contains("page 2/3"));

        let piped = TableFormatter::new(COLUMNS, "campaign")
            .with_config(TableConfig::for_pipe())
            .render(&rows(), OutputFormat::Tsv, &["id"], Some(&summary));
        assert!(!piped.contains("found"));
        assert!(!piped.contains("page"));
    }
}
