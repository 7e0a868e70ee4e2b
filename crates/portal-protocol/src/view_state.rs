use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Labels a shell may send to mean "do not filter on this field".
const ALL_SENTINELS: &[&str] = &["all", "all states", "all regions", "all amr classes"];

/// Unknown names deserialize to the default key instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortKey {
    #[default]
    Date,
    Organism,
    Region,
    Accession,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Date,
        SortKey::Organism,
        SortKey::Region,
        SortKey::Accession,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Organism => "organism",
            SortKey::Region => "region",
            SortKey::Accession => "accession",
        }
    }

    /// Accepts the older `state` spelling for the region column.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" => Some(SortKey::Date),
            "organism" => Some(SortKey::Organism),
            "region" | "state" => Some(SortKey::Region),
            "accession" => Some(SortKey::Accession),
            _ => None,
        }
    }

    pub fn coerce(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        Self::coerce(&value)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDir::Asc),
            "desc" => Some(SortDir::Desc),
            _ => None,
        }
    }

    pub fn coerce(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

impl From<String> for SortDir {
    fn from(value: String) -> Self {
        Self::coerce(&value)
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active table ordering. Defaults to newest submissions first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortState {
    pub key: SortKey,
    pub dir: SortDir,
}

impl SortState {
    pub fn new(key: SortKey, dir: SortDir) -> Self {
        Self { key, dir }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Column-header click: the active column flips direction, any other
    /// column becomes active in ascending order.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.dir.flipped())
        } else {
            Self::new(key, SortDir::Asc)
        }
    }
}

/// Which AMR items link organisms in the similarity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    Genes,
    #[default]
    Classes,
}

impl GraphMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphMode::Genes => "genes",
            GraphMode::Classes => "classes",
        }
    }
}

/// Minimum number of shared AMR items for two organisms to be linked.
/// Always at least 1; anything else is coerced up to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "usize")]
pub struct MinShared(usize);

impl Default for MinShared {
    fn default() -> Self {
        Self(1)
    }
}

impl MinShared {
    pub fn new(value: i64) -> Self {
        Self(value.max(1) as usize)
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// Fractional thresholds round up: sharing 2.5 items means sharing 3.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value < 1.0 {
            return Self::default();
        }
        Self(value.ceil() as usize)
    }

    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().parse::<f64>() {
            Ok(v) => Self::from_f64(v),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::from_f64).unwrap_or_default(),
            serde_json::Value::String(s) => Self::parse_lenient(s),
            _ => Self::default(),
        }
    }
}

impl From<serde_json::Value> for MinShared {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<MinShared> for usize {
    fn from(value: MinShared) -> Self {
        value.0
    }
}

impl fmt::Display for MinShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tab {
    #[default]
    Genomes,
    #[serde(rename = "AMR")]
    Amr,
    Phylogeography,
    JBrowse,
    #[serde(rename = "QC")]
    Qc,
    #[serde(rename = "ETL")]
    Etl,
    Cases,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Genomes,
        Tab::Amr,
        Tab::Phylogeography,
        Tab::JBrowse,
        Tab::Qc,
        Tab::Etl,
        Tab::Cases,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Genomes => "Genomes",
            Tab::Amr => "AMR",
            Tab::Phylogeography => "Phylogeography",
            Tab::JBrowse => "JBrowse",
            Tab::Qc => "QC",
            Tab::Etl => "ETL",
            Tab::Cases => "Cases",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == value)
    }
}

fn deserialize_selector<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(Criteria::selector))
}

/// Filter inputs. `None` means the predicate is switched off; "all"-style
/// labels read from JSON are switched off too.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
    #[serde(deserialize_with = "deserialize_selector")]
    pub region: Option<String>,
    #[serde(deserialize_with = "deserialize_selector")]
    pub amr_class: Option<String>,
    pub query: String,
}

impl Criteria {
    pub fn new(region: &str, amr_class: &str, query: &str) -> Self {
        Self {
            region: Self::selector(region),
            amr_class: Self::selector(amr_class),
            query: query.to_string(),
        }
    }

    /// Maps a dropdown value to a filter, treating "all"-style labels and
    /// blank input as no filter.
    pub fn selector(value: &str) -> Option<String> {
        if Self::is_all(value) {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// True for blank input and "all"-style labels.
    pub fn is_all(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty() || ALL_SENTINELS.contains(&trimmed.to_ascii_lowercase().as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.amr_class.is_none() && self.query.trim().is_empty()
    }
}

/// Everything the shell can change between two recomputations of the view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub criteria: Criteria,
    pub sort: SortState,
    pub tab: Tab,
    pub graph_mode: GraphMode,
    pub min_shared: MinShared,
    pub admin: bool,
}
