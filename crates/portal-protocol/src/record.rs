use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type Accession = String;

/// One biosynthetic gene cluster annotation: a cluster type and how many
/// clusters of that type the genome carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BgcEntry {
    #[serde(rename = "type")]
    pub cluster_type: String,
    pub count: u32,
}

impl BgcEntry {
    pub fn new(cluster_type: &str, count: u32) -> Self {
        Self {
            cluster_type: cluster_type.to_string(),
            count,
        }
    }
}

/// One genome submission as shown in the portal tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub accession: Accession,
    pub organism: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub amr_genes: Vec<String>,
    #[serde(default)]
    pub amr_classes: Vec<String>,
    #[serde(default)]
    pub bgc: Vec<BgcEntry>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub external_ref: String,
}

impl Record {
    pub fn new(accession: &str, organism: &str, date: NaiveDate) -> Self {
        Self {
            accession: accession.to_string(),
            organism: organism.to_string(),
            date,
            project: String::new(),
            amr_genes: vec![],
            amr_classes: vec![],
            bgc: vec![],
            region: String::new(),
            subregion: String::new(),
            lat: None,
            lon: None,
            external_ref: String::new(),
        }
    }

    /// Collapses duplicate AMR genes and classes (first occurrence wins) and
    /// merges repeated BGC types by summing their counts.
    pub fn normalized(mut self) -> Self {
        dedup_in_order(&mut self.amr_genes);
        dedup_in_order(&mut self.amr_classes);
        let mut merged: Vec<BgcEntry> = Vec::with_capacity(self.bgc.len());
        for entry in self.bgc.drain(..) {
            match merged
                .iter_mut()
                .find(|e| e.cluster_type == entry.cluster_type)
            {
                Some(existing) => existing.count += entry.count,
                None => merged.push(entry),
            }
        }
        self.bgc = merged;
        self
    }

    /// Coordinates suitable for a map marker. Missing, zero or non-finite
    /// values disqualify the record.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.lat?;
        let lon = self.lon?;
        if lat == 0.0 || lon == 0.0 || !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        Some((lat, lon))
    }

    pub fn has_amr_class(&self, class: &str) -> bool {
        self.amr_classes.iter().any(|c| c == class)
    }

    pub fn bgc_types(&self) -> impl Iterator<Item = &str> {
        self.bgc.iter().map(|b| b.cluster_type.as_str())
    }

    pub fn bgc_total(&self) -> u64 {
        self.bgc.iter().map(|b| b.count as u64).sum()
    }

    /// Lower-cased text searched by the free-text filter.
    pub fn search_text(&self) -> String {
        let bgc_types = self.bgc_types().collect::<Vec<_>>().join(" ");
        format!(
            "{} {} {} {} {} {} {}",
            self.accession,
            self.organism,
            self.project,
            self.amr_genes.join(" "),
            bgc_types,
            self.region,
            self.subregion
        )
        .to_lowercase()
    }
}

fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}
