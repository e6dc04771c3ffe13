//! Output renderers: incremental search-result rendering plus the table and
//! JSON formatters used by the management commands.

use std::collections::HashSet;
use std::io::{self, Write};

use anyhow::anyhow;
use loghive_api_models::{
    Alert, EVENT_ID_FIELD, IngestToken, Parser, Repository, ResultSnapshot, StatusResponse, User,
};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::format::{RowFormat, format_field, format_value};

/// Incremental renderer for successive result snapshots.
///
/// One implementation is selected from the first snapshot's aggregate flag
/// and kept for the whole invocation, even if later snapshots disagree.
pub(crate) trait SnapshotRenderer {
    /// Render whatever `snapshot` makes newly visible.
    fn render(&mut self, snapshot: &ResultSnapshot, out: &mut dyn Write) -> io::Result<()>;
}

/// Pick the renderer variant for an invocation from its first snapshot.
pub(crate) fn select_renderer(
    first: &ResultSnapshot,
    format: RowFormat,
) -> Box<dyn SnapshotRenderer> {
    if first.metadata.is_aggregate {
        Box::new(AggregateRenderer::new())
    } else {
        Box::new(EventListRenderer::new(format))
    }
}

/// Renders raw event rows through a format template, emitting each
/// identified row at most once across the invocation.
pub(crate) struct EventListRenderer {
    format: RowFormat,
    seen: HashSet<String>,
}

impl EventListRenderer {
    pub(crate) fn new(format: RowFormat) -> Self {
        Self {
            format,
            seen: HashSet::new(),
        }
    }
}

impl SnapshotRenderer for EventListRenderer {
    fn render(&mut self, snapshot: &ResultSnapshot, out: &mut dyn Write) -> io::Result<()> {
        for row in &snapshot.events {
            // Rows without an identity field cannot be deduplicated and are
            // always printed.
            if let Some(id) = row.get(EVENT_ID_FIELD).map(format_value) {
                if self.seen.contains(&id) {
                    continue;
                }
                self.seen.insert(id);
            }
            writeln!(out, "{}", self.format.render(row))?;
        }
        Ok(())
    }
}

/// Renders aggregate snapshots as a bordered table, re-drawn wholesale on
/// every poll since the server recomputes the full row set each time.
///
/// The column list is captured from the first row of the first non-empty
/// snapshot and never recomputed; `serde_json::Map` keeps keys sorted, so
/// the contract is sorted column names, stable across runs.
pub(crate) struct AggregateRenderer {
    columns: Option<Vec<String>>,
}

impl AggregateRenderer {
    pub(crate) const fn new() -> Self {
        Self { columns: None }
    }
}

impl SnapshotRenderer for AggregateRenderer {
    fn render(&mut self, snapshot: &ResultSnapshot, out: &mut dyn Write) -> io::Result<()> {
        if self.columns.is_none() {
            if let Some(first) = snapshot.events.first() {
                self.columns = Some(first.keys().cloned().collect());
            }
        }
        let Some(columns) = self.columns.as_deref() else {
            return Ok(());
        };
        if columns.is_empty() {
            return Ok(());
        }

        // Scalar shortcut: a single aggregate value (e.g. `count()`) prints
        // bare, without table decoration.
        if let [column] = columns
            && let [row] = snapshot.events.as_slice()
        {
            writeln!(out, "{}", format_field(column, row))?;
            return Ok(());
        }

        let rows: Vec<Vec<String>> = snapshot
            .events
            .iter()
            .map(|row| columns.iter().map(|column| format_field(column, row)).collect())
            .collect();

        let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
        for row in &rows {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(cell.len());
            }
        }

        write_border(out, &widths)?;
        write_table_row(out, columns, &widths)?;
        write_border(out, &widths)?;
        for row in &rows {
            write_table_row(out, row, &widths)?;
        }
        write_border(out, &widths)?;
        writeln!(out)?;
        Ok(())
    }
}

fn write_border(out: &mut dyn Write, widths: &[usize]) -> io::Result<()> {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    writeln!(out, "{line}")
}

fn write_table_row<S: AsRef<str>>(
    out: &mut dyn Write,
    cells: &[S],
    widths: &[usize],
) -> io::Result<()> {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(&format!(" {:<width$} |", cell.as_ref()));
    }
    writeln!(out, "{line}")
}

/// Pretty-print any serialisable value, for `--output json`.
pub(crate) fn render_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_repository_list(
    repositories: &[Repository],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(&repositories)?,
        OutputFormat::Table => {
            println!("{:<26} {:>10} {:>10} NAME", "ID", "SIZE", "RETENTION");
            for repository in repositories {
                let retention = repository
                    .retention_days
                    .map_or_else(|| "-".to_string(), |days| format!("{days:.0}d"));
                println!(
                    "{:<26} {:>10} {:>10} {}",
                    repository.id,
                    format_bytes(repository.compressed_byte_size),
                    retention,
                    repository.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_repository(repository: &Repository, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(repository)?,
        OutputFormat::Table => {
            println!("id: {}", repository.id);
            println!("name: {}", repository.name);
            if let Some(description) = &repository.description {
                println!("description: {description}");
            }
            println!("size: {}", format_bytes(repository.compressed_byte_size));
            if let Some(days) = repository.retention_days {
                println!("retention: {days:.0} days");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_user_list(users: &[User], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(&users)?,
        OutputFormat::Table => {
            println!("{:<24} {:<5} USERNAME", "ID", "ROOT");
            for user in users {
                println!(
                    "{:<24} {:<5} {}",
                    user.id,
                    if user.is_root { "yes" } else { "no" },
                    user.username
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_user(user: &User, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(user)?,
        OutputFormat::Table => {
            println!("id: {}", user.id);
            println!("username: {}", user.username);
            if let Some(full_name) = &user.full_name {
                println!("full name: {full_name}");
            }
            if let Some(email) = &user.email {
                println!("email: {email}");
            }
            println!("root: {}", user.is_root);
            if let Some(created_at) = &user.created_at {
                println!("created: {created_at}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_parser_list(parsers: &[Parser], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(&parsers)?,
        OutputFormat::Table => {
            println!("{:<26} {:<9} NAME", "ID", "BUILT-IN");
            for parser in parsers {
                println!(
                    "{:<26} {:<9} {}",
                    parser.id,
                    if parser.is_built_in { "yes" } else { "no" },
                    parser.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_parser(parser: &Parser, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(parser)?,
        OutputFormat::Table => {
            println!("id: {}", parser.id);
            println!("name: {}", parser.name);
            println!("built-in: {}", parser.is_built_in);
        }
    }
    Ok(())
}

pub(crate) fn render_alert_list(alerts: &[Alert], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(&alerts)?,
        OutputFormat::Table => {
            println!("{:<26} {:<8} NAME", "ID", "ENABLED");
            for alert in alerts {
                println!(
                    "{:<26} {:<8} {}",
                    alert.id,
                    if alert.enabled { "yes" } else { "no" },
                    alert.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_alert(alert: &Alert, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(alert)?,
        OutputFormat::Table => {
            println!("id: {}", alert.id);
            println!("name: {}", alert.name);
            if let Some(description) = &alert.description {
                println!("description: {description}");
            }
            println!("enabled: {}", alert.enabled);
        }
    }
    Ok(())
}

pub(crate) fn render_token_list(tokens: &[IngestToken], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(&tokens)?,
        OutputFormat::Table => {
            println!("{:<24} {:<20} TOKEN", "NAME", "PARSER");
            for token in tokens {
                println!(
                    "{:<24} {:<20} {}",
                    token.name,
                    token.parser.as_deref().unwrap_or("-"),
                    token.token
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_status(status: &StatusResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => render_json(status)?,
        OutputFormat::Table => {
            println!("status: {}", status.status);
            println!("version: {}", status.version);
        }
    }
    Ok(())
}

#[must_use]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64;
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}
