//! Connection configuration.
//!
//! An endpoint is either a connection URL or the path of a MySQL-style
//! option file:
//!
//! ```text
//! [client]
//! host = db.example.com
//! port = 3306
//! user = sync
//! password = "s3cr\\#t"   # quoted values may contain '#'
//! database = airports
//! ```

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, SyncError};

/// Where to connect for one side of the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A `mysql://`, `mariadb://` or `sqlite:` URL.
    Url(String),
    /// A MySQL-style option file.
    OptionFile(PathBuf),
}

impl Endpoint {
    const URL_PREFIXES: [&'static str; 3] = ["mysql://", "mariadb://", "sqlite:"];
}

impl FromStr for Endpoint {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if Self::URL_PREFIXES.iter().any(|prefix| s.starts_with(prefix)) {
            Ok(Self::Url(s.to_string()))
        } else {
            Ok(Self::OptionFile(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::OptionFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// MySQL connection settings read from an option file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host name.
    pub host: String,
    /// Server port, if not the default.
    pub port: Option<u16>,
    /// Unix socket path, if any.
    pub socket: Option<String>,
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
    /// Default database; unqualified table names resolve against it.
    pub database: Option<String>,
}

impl ConnectionConfig {
    /// Reads and parses an option file.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the file cannot be read or holds an
    /// invalid port, and [`SyncError::MissingConfigKey`] if `host`, `user`
    /// or `password` is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SyncError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_entries(path, &parse_option_file(&text))
    }

    fn from_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<Self> {
        let required = |key: &'static str| {
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| SyncError::MissingConfigKey {
                    path: path.to_path_buf(),
                    key,
                })
        };

        let port = entries
            .get("port")
            .map(|p| {
                p.parse::<u16>().map_err(|_| SyncError::Config {
                    path: path.to_path_buf(),
                    message: format!("invalid port '{p}'"),
                })
            })
            .transpose()?;

        Ok(Self {
            host: required("host")?,
            port,
            socket: entries.get("socket").cloned(),
            user: required("user")?,
            password: required("password")?,
            database: entries.get("database").filter(|d| !d.is_empty()).cloned(),
        })
    }
}

/// Parses `key = value` entries of an option file.
///
/// Sections are ignored, later entries win.
#[must_use]
pub fn parse_option_file(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(['#', ';', '[']) {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        // '=' inside a comment
        if key.contains('#') {
            continue;
        }
        let key = key.trim();
        let value = value.trim();

        let value = match value.chars().next() {
            Some(quote @ ('\'' | '"')) => unescape(&value[1..], quote),
            _ => unescape(value, '#').trim_end().to_string(),
        };
        entries.insert(key.to_string(), value);
    }
    entries
}

/// Resolves backslash escapes up to the first unescaped `end` character.
fn unescape(value: &str, end: char) -> String {
    let mut result = String::with_capacity(value.len());
    let mut escape = false;
    for c in value.chars() {
        if escape {
            match c {
                'b' => result.push('\u{8}'),
                't' => result.push('\t'),
                'n' => result.push('\n'),
                'r' => result.push('\r'),
                '\\' => result.push('\\'),
                's' => result.push(' '),
                _ => {
                    if c != end {
                        result.push('\\');
                    }
                    result.push(c);
                }
            }
            escape = false;
        } else if c == '\\' {
            escape = true;
        } else if c == end {
            break;
        } else {
            result.push(c);
        }
    }
    if escape {
        result.push('\\');
    }
    result
}
