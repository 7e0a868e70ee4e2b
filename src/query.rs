//! Filter and sort stages of the records pipeline.
//!
//! Both stages are pure: they take the rows they are given and return new
//! vectors, preserving input order wherever the stage does not define one.

use icu_collator::{Collator, CollatorBorrowed, options::CollatorOptions};
use portal_protocol::{Criteria, Record, SortDir, SortKey, SortState};
use std::cmp::Ordering;

/// A selector holding an "all"-style label filters nothing.
fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !Criteria::is_all(v))
}

pub fn matches(record: &Record, criteria: &Criteria) -> bool {
    if let Some(region) = active(&criteria.region) {
        if record.region != region {
            return false;
        }
    }
    if let Some(class) = active(&criteria.amr_class) {
        if !record.has_amr_class(class) {
            return false;
        }
    }
    if criteria.query.trim().is_empty() {
        return true;
    }
    record
        .search_text()
        .contains(&criteria.query.to_lowercase())
}

/// Rows satisfying region, AMR class and free-text criteria, in input order.
pub fn filter_records(records: &[Record], criteria: &Criteria) -> Vec<Record> {
    records
        .iter()
        .filter(|r| matches(r, criteria))
        .cloned()
        .collect()
}

thread_local! {
    static COLLATOR: Option<CollatorBorrowed<'static>> =
        Collator::try_new(Default::default(), CollatorOptions::default()).ok();
}

fn case_rank(c: char) -> u8 {
    if c.is_uppercase() { 1 } else { 0 }
}

fn simple_collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.chars().map(case_rank).cmp(b.chars().map(case_rank)))
}

/// Locale-aware text ordering (root collation): accents and case are
/// secondary to the base letters, lowercase sorts before uppercase, and
/// punctuation sorts before letters. Code points break remaining ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => simple_collate(a, b),
        })
        .then_with(|| a.cmp(b))
}

pub fn compare_by_key(a: &Record, b: &Record, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Organism => collate(&a.organism, &b.organism),
        SortKey::Region => collate(&a.region, &b.region),
        SortKey::Accession => collate(&a.accession, &b.accession),
    }
}

/// Stable sort; rows with equal keys keep their relative order in either
/// direction.
pub fn sort_records(records: &[Record], sort: SortState) -> Vec<Record> {
    let mut rows = records.to_vec();
    rows.sort_by(|a, b| {
        let ord = compare_by_key(a, b, sort.key);
        match sort.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
    rows
}

/// Filter then sort: the rows shown in the genomes table.
pub fn run_query(records: &[Record], criteria: &Criteria, sort: SortState) -> Vec<Record> {
    sort_records(&filter_records(records, criteria), sort)
}
