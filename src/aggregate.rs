use chrono::NaiveDate;
use itertools::Itertools;
use portal_protocol::{PortalSummary, RankedCount, Record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub type CountMap = BTreeMap<String, usize>;

/// Number of records carrying each AMR class. A record counts once per class.
pub fn amr_class_counts(records: &[Record]) -> CountMap {
    let mut counts = CountMap::new();
    for record in records {
        let classes: HashSet<&str> = record.amr_classes.iter().map(String::as_str).collect();
        for class in classes {
            *counts.entry(class.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Total clusters per BGC type across all records.
pub fn bgc_type_counts(records: &[Record]) -> CountMap {
    let mut counts = CountMap::new();
    for record in records {
        for entry in &record.bgc {
            *counts.entry(entry.cluster_type.clone()).or_insert(0) += entry.count as usize;
        }
    }
    counts
}

pub fn region_counts(records: &[Record]) -> CountMap {
    let mut counts = CountMap::new();
    for record in records {
        *counts.entry(record.region.clone()).or_insert(0) += 1;
    }
    counts
}

/// Display order for a count table: largest first, then by label.
pub fn ranked(counts: &CountMap) -> Vec<RankedCount> {
    counts
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(label, count)| RankedCount {
            label: label.clone(),
            count: *count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Aggregates {
    pub amr_classes: CountMap,
    pub bgc_types: CountMap,
    pub regions: CountMap,
}

impl Aggregates {
    pub fn compute(records: &[Record]) -> Self {
        Self {
            amr_classes: amr_class_counts(records),
            bgc_types: bgc_type_counts(records),
            regions: region_counts(records),
        }
    }
}

/// Headline numbers; `reference_date` is the day counted as "today".
pub fn summary(records: &[Record], reference_date: NaiveDate) -> PortalSummary {
    PortalSummary {
        total_genomes: records.len(),
        submitted_on_reference_date: records
            .iter()
            .filter(|r| r.date == reference_date)
            .count(),
        total_amr_genes: records.iter().map(|r| r.amr_genes.len()).sum(),
        total_bgc_clusters: records.iter().map(Record::bgc_total).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RecordSet;
    use portal_protocol::BgcEntry;

    fn reference() -> Vec<Record> {
        RecordSet::reference().unwrap().records().to_vec()
    }

    #[test]
    fn amr_class_counts_count_records_not_occurrences() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut a = Record::new("A", "Org", date);
        a.amr_classes = vec!["Beta-lactam".into(), "Beta-lactam".into()];
        let mut b = Record::new("B", "Org", date);
        b.amr_classes = vec!["Beta-lactam".into(), "Quinolone".into()];
        let counts = amr_class_counts(&[a, b]);
        assert_eq!(counts.get("Beta-lactam"), Some(&2));
        assert_eq!(counts.get("Quinolone"), Some(&1));
    }

    #[test]
    fn bgc_counts_sum_cluster_counts() {
        let counts = bgc_type_counts(&reference());
        assert_eq!(counts.get("NRPS"), Some(&3));
        assert_eq!(counts.get("PKS"), Some(&2));
        assert_eq!(counts.get("RiPP"), Some(&2));
        assert_eq!(counts.get("Bacteriocin"), Some(&1));
        assert_eq!(counts.get("Siderophore"), Some(&1));
    }

    #[test]
    fn zero_count_clusters_are_listed_with_zero() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut a = Record::new("A", "Org", date);
        a.bgc = vec![BgcEntry::new("Terpene", 0)];
        assert_eq!(bgc_type_counts(&[a]).get("Terpene"), Some(&0));
    }

    #[test]
    fn region_counts_cover_every_record() {
        let rows = reference();
        let counts = region_counts(&rows);
        assert_eq!(counts.values().sum::<usize>(), rows.len());
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn ranked_orders_by_count_then_label() {
        let ranked = ranked(&bgc_type_counts(&reference()));
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["NRPS", "PKS", "RiPP", "Bacteriocin", "Siderophore"]
        );
    }

    #[test]
    fn summary_counts_reference_day_and_totals() {
        let rows = reference();
        let s = summary(&rows, NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        assert_eq!(s.total_genomes, 4);
        assert_eq!(s.submitted_on_reference_date, 1);
        assert_eq!(s.total_amr_genes, 10);
        assert_eq!(s.total_bgc_clusters, 9);
        let s = summary(&rows, NaiveDate::from_ymd_opt(2025, 8, 12).unwrap());
        assert_eq!(s.submitted_on_reference_date, 0);
    }

    #[test]
    fn aggregates_of_empty_view_are_empty() {
        assert_eq!(Aggregates::compute(&[]), Aggregates::default());
    }
}
