//! Filtering, sorting and printing of fetched records

use std::cmp::Ordering;
use std::io::{self, Write};

use chrono::SecondsFormat;
use regex::Regex;
use semver::Version;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::index::error::FetchError;
use crate::index::types::ModuleVersion;

/// Order applied within records of the same module path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    /// Newest version first
    #[default]
    Version,
    /// Oldest publication first
    Timestamp,
}

/// Optional columns printed after the module path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintFields {
    pub version: bool,
    pub timestamp: bool,
}

/// Reads `rx` until it closes, keeping records whose path matches `pattern`.
pub async fn collect_matching(
    token: &CancellationToken,
    rx: &mut mpsc::Receiver<ModuleVersion>,
    pattern: &Regex,
) -> Result<Vec<ModuleVersion>, FetchError> {
    let mut matched = Vec::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FetchError::Cancelled),
            next = rx.recv() => next,
        };
        match next {
            Some(record) if pattern.is_match(&record.path) => matched.push(record),
            Some(_) => {}
            None => return Ok(matched),
        }
    }
}

/// Parse a Go module version ("v1.2.3") as semver
fn parse_version(version: &str) -> Option<Version> {
    Version::parse(version.strip_prefix('v').unwrap_or(version)).ok()
}

/// Compares versions by semver precedence, falling back to plain string
/// order when either side is not valid semver.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Sorts by path, then by `key`
pub fn sort_records(records: &mut [ModuleVersion], key: SortKey) {
    records.sort_by(|a, b| {
        a.path.cmp(&b.path).then_with(|| match key {
            SortKey::Version => compare_versions(&b.version, &a.version),
            SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
        })
    });
}

pub fn format_record(record: &ModuleVersion, fields: PrintFields) -> String {
    let mut line = record.path.clone();
    if fields.version {
        line.push(' ');
        line.push_str(&record.version);
    }
    if fields.timestamp {
        line.push(' ');
        line.push_str(&record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    line
}

pub fn write_records<W: Write>(
    out: &mut W,
    records: &[ModuleVersion],
    fields: PrintFields,
) -> io::Result<()> {
    for record in records {
        writeln!(out, "{}", format_record(record, fields))?;
    }
    out.flush()
}
