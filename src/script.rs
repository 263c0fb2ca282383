// ABOUTME: Loading and sanitizing the bundled SQL definition file
// ABOUTME: Strips CREATE DATABASE / USE statements since the setup flow handles schema selection

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

static REDUNDANT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:CREATE\s+DATABASE\b|USE\b)[^;]*;").expect("valid statement pattern")
});

static CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCREATE\s+TABLE\b").expect("valid table pattern"));

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read SQL file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A SQL file read from disk, with its schema-level statements removed
#[derive(Debug, Clone)]
pub struct SqlScript {
    pub path: PathBuf,
    pub raw: String,
    pub sanitized: String,
    pub removed: usize,
}

impl SqlScript {
    /// Read the file and sanitize it. The file must be valid UTF-8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|source| ScriptError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self::from_source(path, raw))
    }

    pub fn from_source(path: PathBuf, raw: String) -> Self {
        let (sanitized, removed) = strip_redundant_statements(&raw);
        log::debug!(
            "Sanitized {}: {} -> {} bytes, {} statement(s) removed",
            path.display(),
            raw.len(),
            sanitized.len(),
            removed
        );
        Self {
            path,
            raw,
            sanitized,
            removed,
        }
    }

    /// Nothing but whitespace left to send
    pub fn is_empty(&self) -> bool {
        self.sanitized.trim().is_empty()
    }

    /// Number of `CREATE TABLE` statements in the sanitized text
    pub fn table_definitions(&self) -> usize {
        count_table_definitions(&self.sanitized)
    }
}

/// Remove every `CREATE DATABASE ...;` and `USE ...;` statement.
///
/// A candidate only counts when it begins a statement: at the start of a line
/// or right after a `;` on the same line, with any closed `/* ... */` comments
/// in between ignored. Everything outside the removed
/// statements is copied through byte for byte. Quoted literals are not
/// understood, so a string containing `\nUSE x;` would still be cut.
pub fn strip_redundant_statements(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len());
    let mut copied_to = 0;
    let mut search_from = 0;
    let mut removed = 0;

    while let Some(m) = REDUNDANT_STATEMENT.find_at(sql, search_from) {
        if begins_statement(&sql[copied_to..m.start()]) {
            out.push_str(&sql[copied_to..m.start()]);
            copied_to = m.end();
            search_from = m.end();
            removed += 1;
        } else {
            // rescan inside the rejected match, it may hide a real statement
            search_from = m.start() + 1;
            while !sql.is_char_boundary(search_from) {
                search_from += 1;
            }
        }
    }

    out.push_str(&sql[copied_to..]);
    (out, removed)
}

fn begins_statement(preceding: &str) -> bool {
    let mut rest = preceding;
    loop {
        let line = rest.rsplit('\n').next().unwrap_or_default().trim_end();
        if line.is_empty() || line.ends_with(';') {
            return true;
        }
        if !line.ends_with("*/") {
            return false;
        }
        // drop the closed block comment, it may have opened on an earlier line
        let trimmed = rest.trim_end();
        match trimmed.rfind("/*") {
            Some(open) => rest = &trimmed[..open],
            None => return false,
        }
    }
}

pub fn count_table_definitions(sql: &str) -> usize {
    CREATE_TABLE.find_iter(sql).count()
}
