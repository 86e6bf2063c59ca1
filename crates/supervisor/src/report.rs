//! Cycle report files.
//!
//! Each cycle is written once to `cycle-<UTC timestamp>-<id8>.rec` in a flat
//! text record format:
//!
//! ```text
//! cycle {
//!   id: 6f1c...
//!   profile {
//!     id: p1
//!     outcome {
//!       placed: 1
//!     }
//!   }
//! }
//! ```
//!
//! Lines are trimmed before parsing, so indentation carries no meaning.

use crate::telemetry::{CycleTelemetry, ProfileTelemetry};
use autotrader_core::{ExecutionOutcome, SupervisorError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const FILE_PREFIX: &str = "cycle-";
const FILE_EXT: &str = ".rec";

/// A parsed `name { ... }` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordNode {
    pub name: String,
    pub fields: Vec<(String, String)>,
    pub children: Vec<RecordNode>,
}

impl RecordNode {
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RecordNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&RecordNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

struct RecordWriter {
    out: String,
    depth: usize,
}

impl RecordWriter {
    const fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    fn open(&mut self, name: &str) {
        self.indent();
        let _ = writeln!(self.out, "{name} {{");
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("}\n");
    }

    fn field(&mut self, key: &str, value: impl std::fmt::Display) {
        self.indent();
        let value = value.to_string().replace(['\n', '\r'], " ");
        let value = if value.is_empty() { "-".to_string() } else { value };
        let _ = writeln!(self.out, "{key}: {value}");
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}

#[must_use]
pub fn render(cycle: &CycleTelemetry) -> String {
    let mut w = RecordWriter::new();
    w.open("cycle");
    w.field("id", &cycle.cycle_id);
    w.field("trigger", cycle.trigger);
    w.field("started_at", cycle.started_at.to_rfc3339());
    w.field(
        "finished_at",
        cycle.finished_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
    );
    w.field("profiles_due", cycle.profiles_due);
    w.field("profiles_not_due", cycle.profiles_not_due);
    w.field("killed", cycle.killed);
    w.field("error", cycle.error.as_deref().unwrap_or_default());

    if let Some(verification) = &cycle.verification {
        w.open("verdict");
        for (axis, verdict) in verification.axes() {
            w.field(axis, verdict);
        }
        w.field("overall", verification.overall);
        w.close();
    }

    for profile in &cycle.profiles {
        render_profile(&mut w, profile);
    }
    w.close();
    w.out
}

fn render_profile(w: &mut RecordWriter, p: &ProfileTelemetry) {
    w.open("profile");
    w.field("id", &p.profile_id);
    w.field("name", &p.profile_name);
    w.field("account", &p.account_id);
    w.field("scope", &p.scope);
    w.field("symbol_scope", &p.symbol_scope);
    w.field(
        "declared_symbols",
        p.declared_symbols.map(|n| n.to_string()).unwrap_or_default(),
    );
    w.field("observed_symbols", p.observed_symbols);
    w.field("max_trades_per_cycle", p.max_trades_per_cycle);
    w.field("cooldown_minutes", p.cooldown_minutes);
    w.field("daily_risk_stop_pct", p.daily_risk_stop_pct);
    w.field("plans_proposed", p.plans_proposed);
    w.field(
        "planner_reason",
        p.planner_reason.map(|r| r.as_str()).unwrap_or_default(),
    );
    w.field("planner_message", &p.planner_message);
    w.field("status", p.status);
    w.field("reason", &p.reason);
    w.field("started_at", p.started_at.to_rfc3339());
    w.field("finished_at", p.finished_at.to_rfc3339());
    render_outcome(w, &p.outcome);
    w.close();
}

fn render_outcome(w: &mut RecordWriter, o: &ExecutionOutcome) {
    w.open("outcome");
    w.field("placed", o.placed);
    w.field("failed", o.failed);
    w.field("skipped_cooldown", o.skipped_cooldown);
    w.field("skipped_open_cap", o.skipped_open_cap);
    w.field("skipped_risk", o.skipped_risk);
    w.field("skipped_validation", o.skipped_validation);
    w.field("skipped_halted", o.skipped_halted);
    w.field("watchdog_closes", o.watchdog_closes);
    w.field("realized_pnl", o.realized_pnl);
    w.close();
}

/// Parses a report back into its block tree. Returns the top-level block.
///
/// # Errors
/// Returns `SupervisorError::Report` on unbalanced braces or stray lines.
pub fn parse(text: &str) -> Result<RecordNode, SupervisorError> {
    let mut stack: Vec<RecordNode> = Vec::new();
    let mut root: Option<RecordNode> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line == "}" {
            let node = stack
                .pop()
                .ok_or_else(|| SupervisorError::Report(format!("line {}: unmatched '}}'", lineno + 1)))?;
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => root = Some(node),
            }
        } else if let Some(name) = line.strip_suffix('{').filter(|n| !n.contains(':')) {
            stack.push(RecordNode {
                name: name.trim().to_string(),
                ..RecordNode::default()
            });
        } else if let Some((key, value)) = line.split_once(':') {
            let node = stack
                .last_mut()
                .ok_or_else(|| SupervisorError::Report(format!("line {}: field outside a block", lineno + 1)))?;
            node.fields.push((key.trim().to_string(), value.trim().to_string()));
        } else {
            return Err(SupervisorError::Report(format!("line {}: unrecognised '{line}'", lineno + 1)));
        }
    }

    if !stack.is_empty() {
        return Err(SupervisorError::Report("unterminated block".to_string()));
    }
    root.ok_or_else(|| SupervisorError::Report("empty report".to_string()))
}

#[must_use]
pub fn file_name(cycle: &CycleTelemetry) -> String {
    format!(
        "{FILE_PREFIX}{}-{}{FILE_EXT}",
        cycle.started_at.format("%Y%m%dT%H%M%S%.3fZ"),
        cycle.short_id()
    )
}

/// Writes the report to a new file in `dir`. Existing files are never overwritten.
///
/// # Errors
/// Returns `SupervisorError::Report` if the directory or file cannot be written.
pub async fn persist(dir: &Path, cycle: &CycleTelemetry) -> Result<PathBuf, SupervisorError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SupervisorError::Report(format!("create {}: {e}", dir.display())))?;

    let path = dir.join(file_name(cycle));
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|e| SupervisorError::Report(format!("create {}: {e}", path.display())))?;

    file.write_all(render(cycle).as_bytes())
        .await
        .map_err(|e| SupervisorError::Report(format!("write {}: {e}", path.display())))?;
    file.flush()
        .await
        .map_err(|e| SupervisorError::Report(format!("flush {}: {e}", path.display())))?;

    Ok(path)
}

/// Newest report in `dir` by file name, parsed. `None` when there are no reports.
///
/// # Errors
/// Returns `SupervisorError::Report` if the directory or newest file cannot be read or parsed.
pub async fn latest_report(dir: &Path) -> Result<Option<(PathBuf, RecordNode)>, SupervisorError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SupervisorError::Report(format!("read {}: {e}", dir.display()))),
    };

    let mut newest: Option<PathBuf> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SupervisorError::Report(format!("read {}: {e}", dir.display())))?
    {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !(name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXT)) {
            continue;
        }
        let path = entry.path();
        if newest.as_ref().map_or(true, |n| n.file_name() < path.file_name()) {
            newest = Some(path);
        }
    }

    let Some(path) = newest else {
        return Ok(None);
    };
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| SupervisorError::Report(format!("read {}: {e}", path.display())))?;
    Ok(Some((path, parse(&text)?)))
}
