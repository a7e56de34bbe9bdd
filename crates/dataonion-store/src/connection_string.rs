//! SQLite connection strings
//!
//! Accepts the familiar `key=value;key=value` form:
//!
//! ```text
//! Data Source=orders.db;Mode=ReadWriteCreate;Foreign Keys=True;Journal Mode=Wal;Busy Timeout=5000
//! ```
//!
//! Keys are case-insensitive and may be written with or without spaces
//! (`Data Source`, `DataSource`). A string without any `=` is a bare path;
//! a path that contains `=` must be given as `Data Source=...`.
//!
//! Values containing `;` are written in double quotes, with `""` standing for
//! a literal quote: `Data Source="reports;2024.db"`.

use dataonion_core::errors::{DataOnionError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MEMORY_SOURCE: &str = ":memory:";

/// How the database file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Open read-write, creating the file if missing
    #[default]
    ReadWriteCreate,
    /// Open read-write; the file must exist
    ReadWrite,
    /// Open read-only; the file must exist
    ReadOnly,
    /// In-memory database; a named data source is shared between contexts
    Memory,
}

/// SQLite `journal_mode` pragma values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// Parsed connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    data_source: String,
    mode: OpenMode,
    foreign_keys: bool,
    journal_mode: Option<JournalMode>,
    busy_timeout: Option<Duration>,
}

impl ConnectionString {
    /// Parse a connection string
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(invalid("connection string is empty"));
        }

        if !raw.contains('=') {
            return Ok(Self::for_data_source(raw));
        }

        let mut data_source: Option<String> = None;
        let mut mode = OpenMode::default();
        let mut foreign_keys = true;
        let mut journal_mode = None;
        let mut busy_timeout = None;

        for (key, value) in split_pairs(raw)? {
            let value = value.as_str();
            match normalize_key(&key).as_str() {
                "datasource" | "filename" => {
                    if value.is_empty() {
                        return Err(invalid("Data Source cannot be empty"));
                    }
                    data_source = Some(value.to_string());
                }
                "mode" => mode = parse_mode(value)?,
                "foreignkeys" => foreign_keys = parse_bool("Foreign Keys", value)?,
                "journalmode" => journal_mode = Some(parse_journal_mode(value)?),
                "busytimeout" | "defaulttimeout" => {
                    busy_timeout = Some(parse_busy_timeout(value)?);
                }
                other => {
                    return Err(invalid(format!(
                        "unknown connection string keyword `{}`",
                        other
                    )))
                }
            }
        }

        let data_source = data_source.ok_or_else(|| invalid("Data Source is required"))?;

        Ok(Self {
            data_source,
            mode,
            foreign_keys,
            journal_mode,
            busy_timeout,
        })
    }

    /// Connection string for a data source with default options
    pub fn for_data_source(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            mode: OpenMode::default(),
            foreign_keys: true,
            journal_mode: None,
            busy_timeout: None,
        }
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn foreign_keys(&self) -> bool {
        self.foreign_keys
    }

    pub fn journal_mode(&self) -> Option<JournalMode> {
        self.journal_mode
    }

    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout
    }

    /// Whether the database lives only in memory
    pub fn is_in_memory(&self) -> bool {
        self.mode == OpenMode::Memory || self.data_source == MEMORY_SOURCE
    }

    /// Path or URI handed to SQLite when opening
    ///
    /// Named in-memory databases become shared-cache URIs so every context
    /// opened with the same name sees the same data.
    pub fn open_target(&self) -> String {
        if self.data_source == MEMORY_SOURCE {
            return MEMORY_SOURCE.to_string();
        }
        match self.mode {
            OpenMode::Memory => format!(
                "file:{}?mode=memory&cache=shared",
                urlencoding::encode(&self.data_source)
            ),
            _ => self.data_source.clone(),
        }
    }
}

impl FromStr for ConnectionString {
    type Err = DataOnionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if needs_quotes(&self.data_source) {
            write!(f, "Data Source=\"{}\"", self.data_source.replace('"', "\"\""))?;
        } else {
            write!(f, "Data Source={}", self.data_source)?;
        }
        if self.mode != OpenMode::default() {
            write!(f, ";Mode={:?}", self.mode)?;
        }
        if !self.foreign_keys {
            write!(f, ";Foreign Keys=False")?;
        }
        if let Some(journal_mode) = self.journal_mode {
            write!(f, ";Journal Mode={}", journal_mode.as_str())?;
        }
        if let Some(timeout) = self.busy_timeout {
            write!(f, ";Busy Timeout={}", timeout.as_millis())?;
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> DataOnionError {
    DataOnionError::InvalidConnectionString {
        reason: reason.into(),
    }
}

/// Split on `;` into trimmed `(key, value)` pairs; quoted values may contain `;`
fn split_pairs(raw: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut rest = raw;

    while !rest.trim().is_empty() {
        let split = rest
            .find(|c: char| c == '=' || c == ';')
            .ok_or_else(|| invalid(format!("expected key=value, got `{}`", rest.trim())))?;

        if rest[split..].starts_with(';') {
            let segment = rest[..split].trim();
            if !segment.is_empty() {
                return Err(invalid(format!("expected key=value, got `{}`", segment)));
            }
            rest = &rest[split + 1..];
            continue;
        }

        let key = rest[..split].trim().to_string();
        let after_key = rest[split + 1..].trim_start();

        let (value, remaining) = match after_key.strip_prefix('"') {
            Some(quoted) => {
                let (value, consumed) = read_quoted(quoted)?;
                let tail = quoted[consumed..].trim_start();
                let remaining = match tail.strip_prefix(';') {
                    Some(remaining) => remaining,
                    None if tail.is_empty() => tail,
                    None => {
                        return Err(invalid(format!(
                            "unexpected `{}` after quoted value for `{}`",
                            tail, key
                        )))
                    }
                };
                (value, remaining)
            }
            None => match after_key.split_once(';') {
                Some((value, remaining)) => (value.trim_end().to_string(), remaining),
                None => (after_key.trim_end().to_string(), ""),
            },
        };

        pairs.push((key, value));
        rest = remaining;
    }

    Ok(pairs)
}

/// Read a quoted value up to its closing quote, returning the value and the
/// number of bytes consumed
fn read_quoted(quoted: &str) -> Result<(String, usize)> {
    let mut value = String::new();
    let mut chars = quoted.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if c == '"' {
            if let Some((_, '"')) = chars.peek() {
                chars.next();
                value.push('"');
                continue;
            }
            return Ok((value, index + 1));
        }
        value.push(c);
    }

    Err(invalid("unterminated quoted value"))
}

fn needs_quotes(value: &str) -> bool {
    value.contains(';') || value.contains('"') || value.trim() != value
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_mode(value: &str) -> Result<OpenMode> {
    match value.to_ascii_lowercase().as_str() {
        "readwritecreate" => Ok(OpenMode::ReadWriteCreate),
        "readwrite" => Ok(OpenMode::ReadWrite),
        "readonly" => Ok(OpenMode::ReadOnly),
        "memory" => Ok(OpenMode::Memory),
        _ => Err(invalid(format!("unknown Mode `{}`", value))),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(format!("{} must be a boolean, got `{}`", name, value))),
    }
}

/// Milliseconds, capped at what SQLite's busy handler accepts (`i32::MAX`)
fn parse_busy_timeout(value: &str) -> Result<Duration> {
    let millis: u32 = value
        .parse()
        .map_err(|_| invalid(format!("Busy Timeout must be milliseconds, got `{}`", value)))?;
    if millis > i32::MAX as u32 {
        return Err(invalid(format!(
            "Busy Timeout must be at most {} milliseconds, got `{}`",
            i32::MAX,
            value
        )));
    }
    Ok(Duration::from_millis(u64::from(millis)))
}

fn parse_journal_mode(value: &str) -> Result<JournalMode> {
    match value.to_ascii_lowercase().as_str() {
        "delete" => Ok(JournalMode::Delete),
        "truncate" => Ok(JournalMode::Truncate),
        "persist" => Ok(JournalMode::Persist),
        "memory" => Ok(JournalMode::Memory),
        "wal" => Ok(JournalMode::Wal),
        "off" => Ok(JournalMode::Off),
        _ => Err(invalid(format!("unknown Journal Mode `{}`", value))),
    }
}
