//! Raw catalog entries and the sources that produce them
//!
//! Sources only deserialize; normalization into [`DialectDefinition`]s
//! happens in [`DialectCatalog::from_entries`].
//!
//! [`DialectDefinition`]: crate::types::DialectDefinition
//! [`DialectCatalog::from_entries`]: super::DialectCatalog::from_entries

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Parent declaration as it appears in configuration
///
/// Older schema generations declare a single parent, newer ones a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inherits {
    /// `inherits: "scim"`
    One(String),
    /// `inherits: ["scim", "oidc"]`
    Many(Vec<String>),
}

impl Inherits {
    /// Normalize to an ordered parent list
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Inherits::One(parent) => vec![parent],
            Inherits::Many(parents) => parents,
        }
    }
}

/// One dialect entry exactly as the catalog source supplies it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDialectEntry {
    /// Dialect namespace URI
    #[serde(rename = "dialectURI")]
    pub dialect_uri: String,

    /// Local claim -> root claim; null values are tolerated and dropped later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<BTreeMap<String, Option<String>>>,

    /// Parent dialect(s)
    #[serde(default, alias = "inheritsFrom", skip_serializing_if = "Option::is_none")]
    pub inherits: Option<Inherits>,

    /// Rewrite inherited keys into this dialect's namespace
    #[serde(
        default,
        rename = "overrideDialectURI",
        skip_serializing_if = "Option::is_none"
    )]
    pub override_dialect_uri: Option<bool>,
}

impl RawDialectEntry {
    /// Create an entry with only an identifier
    pub fn new(dialect_uri: impl Into<String>) -> Self {
        Self {
            dialect_uri: dialect_uri.into(),
            ..Default::default()
        }
    }
}

/// Top-level document shapes accepted by [`FileSource`]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<RawDialectEntry>),
    Wrapped { dialects: Vec<RawDialectEntry> },
}

impl CatalogDocument {
    fn into_entries(self) -> Vec<RawDialectEntry> {
        match self {
            CatalogDocument::Wrapped { dialects } => dialects,
            CatalogDocument::List(entries) => entries,
        }
    }
}

/// Producer of raw dialect entries at load and reload time
pub trait CatalogSource: Send + Sync {
    /// Read the current set of entries
    fn load(&self) -> Result<Vec<RawDialectEntry>>;

    /// Human-readable origin used in log events
    fn describe(&self) -> String {
        "catalog source".to_string()
    }
}

/// In-memory source, mainly for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<RawDialectEntry>,
}

impl StaticSource {
    /// Wrap a fixed set of entries
    pub fn new(entries: Vec<RawDialectEntry>) -> Self {
        Self { entries }
    }
}

impl CatalogSource for StaticSource {
    fn load(&self) -> Result<Vec<RawDialectEntry>> {
        Ok(self.entries.clone())
    }

    fn describe(&self) -> String {
        format!("static source ({} entries)", self.entries.len())
    }
}

/// Serialization format of a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl SourceFormat {
    /// Pick the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Json,
        }
    }
}

/// Catalog file on disk (JSON or YAML)
///
/// The document is either a bare list of entries or an object with a
/// `dialects` list.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: SourceFormat,
}

impl FileSource {
    /// Source for a file, format inferred from its extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SourceFormat::from_path(&path);
        Self { path, format }
    }

    /// Force a specific format
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a document held in memory
    pub fn parse(contents: &str, format: SourceFormat) -> Result<Vec<RawDialectEntry>> {
        let document: CatalogDocument = match format {
            SourceFormat::Json => serde_json::from_str(contents)?,
            SourceFormat::Yaml => serde_yaml::from_str(contents)?,
        };
        Ok(document.into_entries())
    }
}

impl CatalogSource for FileSource {
    fn load(&self) -> Result<Vec<RawDialectEntry>> {
        let contents = std::fs::read_to_string(&self.path)?;
        Self::parse(&contents, self.format)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
