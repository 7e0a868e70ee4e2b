use anyhow::{Result, anyhow};
use itertools::Itertools;
use portal_protocol::Record;
use std::{collections::HashSet, fs, path::Path};

const BUILTIN_RECORDS_JSON: &str = include_str!("../assets/reference_records.json");

/// The immutable record set a portal session works on. Accessions are unique.
#[derive(Clone, Debug, Default)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(records.len());
        for record in records {
            if record.accession.trim().is_empty() {
                return Err(anyhow!("Record without accession (organism '{}')", record.organism));
            }
            if !seen.insert(record.accession.clone()) {
                return Err(anyhow!("Duplicate accession '{}'", record.accession));
            }
            normalized.push(record.normalized());
        }
        Ok(Self {
            records: normalized,
        })
    }

    /// The four-genome sample set bundled with the portal.
    pub fn reference() -> Result<Self> {
        Self::from_json_str(BUILTIN_RECORDS_JSON)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(text)?;
        Self::new(records)
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        let records = portal_render::parse_records_csv(text).map_err(|e| anyhow!("{e}"))?;
        Self::new(records)
    }

    /// Loads `.csv` files as metadata tables and anything else as JSON.
    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow!("Could not read dataset '{path}': {e}"))?;
        let is_csv = Path::new(path)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        let set = if is_csv {
            Self::from_csv_str(&text)
        } else {
            Self::from_json_str(&text)
        }
        .map_err(|e| anyhow!("Could not load dataset '{path}': {e}"))?;
        tracing::info!(path, records = set.len(), "dataset loaded");
        Ok(set)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, accession: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.accession == accession)
    }

    /// Distinct regions, sorted, for the region dropdown.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .sorted()
            .dedup()
            .collect()
    }

    /// Distinct AMR classes, sorted, for the class dropdown.
    pub fn amr_classes(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.amr_classes.iter().cloned())
            .sorted()
            .dedup()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reference_set_has_four_genomes() {
        let set = RecordSet::reference().unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(
            set.get("JABC01000001").map(|r| r.organism.as_str()),
            Some("Klebsiella pneumoniae")
        );
        assert_eq!(
            set.regions(),
            vec!["Gujarat", "Kerala", "Maharashtra", "West Bengal"]
        );
        assert_eq!(set.amr_classes().len(), 10);
        assert_eq!(set.amr_classes()[0], "Aminoglycoside");
    }

    #[test]
    fn duplicate_accessions_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = RecordSet::new(vec![
            Record::new("A1", "Org one", date),
            Record::new("A1", "Org two", date),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate accession 'A1'"));
    }

    #[test]
    fn blank_accessions_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = RecordSet::new(vec![Record::new("  ", "Org one", date)]).unwrap_err();
        assert!(err.to_string().contains("organism 'Org one'"));
    }

    #[test]
    fn loads_csv_and_json_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let reference = RecordSet::reference().unwrap();

        let csv_path = dir.path().join("records.csv");
        std::fs::write(
            &csv_path,
            portal_render::records_to_csv(reference.records()).unwrap(),
        )
        .unwrap();
        let from_csv = RecordSet::load_from_path(&csv_path.to_string_lossy()).unwrap();
        assert_eq!(from_csv.records(), reference.records());

        let json_path = dir.path().join("records.json");
        std::fs::write(
            &json_path,
            portal_render::records_to_json(reference.records()).unwrap(),
        )
        .unwrap();
        let from_json = RecordSet::load_from_path(&json_path.to_string_lossy()).unwrap();
        assert_eq!(from_json.records(), reference.records());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RecordSet::load_from_path("/nonexistent/records.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/records.json"));
    }
}
