use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of file the user is trying to locate in a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Json,
    Xml,
    Csv,
    Yaml,
    DataWeave,
    Raml,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 6] = [
        TargetFormat::Json,
        TargetFormat::Xml,
        TargetFormat::Csv,
        TargetFormat::Yaml,
        TargetFormat::DataWeave,
        TargetFormat::Raml,
    ];

    /// Accepted file extensions, lower-case and without the dot.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            TargetFormat::Json => &["json"],
            TargetFormat::Xml => &["xml"],
            TargetFormat::Csv => &["csv"],
            TargetFormat::Yaml => &["yaml", "yml"],
            TargetFormat::DataWeave => &["dwl"],
            TargetFormat::Raml => &["raml"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TargetFormat::Json => "JSON",
            TargetFormat::Xml => "XML",
            TargetFormat::Csv => "CSV",
            TargetFormat::Yaml => "YAML",
            TargetFormat::DataWeave => "DataWeave",
            TargetFormat::Raml => "RAML",
        }
    }

    /// Parses a format token case-insensitively. Either the format name
    /// (`"DataWeave"`) or one of its extensions (`"dwl"`) is accepted.
    pub fn from_token(token: &str) -> Option<TargetFormat> {
        let token = token.trim().trim_start_matches('.').to_ascii_lowercase();
        TargetFormat::ALL.into_iter().find(|format| {
            format.label().eq_ignore_ascii_case(&token) || format.extensions().contains(&token.as_str())
        })
    }

    pub fn matches(self, file_name: &str) -> bool {
        match extension_of(file_name) {
            Some(ext) => self.extensions().contains(&ext.as_str()),
            None => false,
        }
    }

    /// The format that follows this one, wrapping around. Used by the TUI to
    /// cycle the highlight.
    pub fn next(self) -> TargetFormat {
        let idx = TargetFormat::ALL.iter().position(|f| *f == self).unwrap_or(0);
        TargetFormat::ALL[(idx + 1) % TargetFormat::ALL.len()]
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetFormat::from_token(s).ok_or_else(|| {
            let known: Vec<&str> = TargetFormat::ALL.iter().map(|f| f.label()).collect();
            format!("unknown format '{}', expected one of {}", s, known.join(", "))
        })
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

/// Does `file_name` have an extension accepted by `target_format`?
///
/// Never fails: an unrecognised target yields `false` for every file.
pub fn matches_format(file_name: &str, target_format: &str) -> bool {
    TargetFormat::from_token(target_format).is_some_and(|format| format.matches(file_name))
}
