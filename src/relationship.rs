//! Organism similarity graph and per-record novelty scores.

use indexmap::{IndexMap, IndexSet};
use portal_protocol::{
    GraphMode, MinShared, NoveltyScore, OrganismNode, Record, SimilarityGraph, SimilarityLink,
};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Organism count above which `GraphStrategy::Auto` stops scanning every pair.
pub const INVERTED_INDEX_CUTOFF: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphStrategy {
    #[default]
    Auto,
    /// Compare every unordered pair of organisms.
    Pairwise,
    /// Only compare organisms that share at least one item.
    InvertedIndex,
}

type OrganismItems<'a> = IndexMap<&'a str, IndexSet<&'a str>>;

fn items_of(record: &Record, mode: GraphMode) -> &[String] {
    match mode {
        GraphMode::Genes => record.amr_genes.as_slice(),
        GraphMode::Classes => record.amr_classes.as_slice(),
    }
}

/// Union of AMR items per organism, organisms in order of first appearance.
fn organism_items(records: &[Record], mode: GraphMode) -> OrganismItems<'_> {
    let mut map = OrganismItems::new();
    for record in records {
        let items = map.entry(record.organism.as_str()).or_default();
        items.extend(items_of(record, mode).iter().map(String::as_str));
    }
    map
}

fn shared_items(a: &IndexSet<&str>, b: &IndexSet<&str>) -> Vec<String> {
    a.iter()
        .filter(|item| b.contains(*item))
        .map(|item| item.to_string())
        .collect()
}

fn candidate_pairs_pairwise(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
        .collect()
}

fn candidate_pairs_indexed(organisms: &OrganismItems<'_>) -> Vec<(usize, usize)> {
    let mut by_item: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, (_, items)) in organisms.iter().enumerate() {
        for item in items {
            by_item.entry(*item).or_default().push(idx);
        }
    }
    let mut pairs = BTreeSet::new();
    for holders in by_item.values() {
        for (pos, &i) in holders.iter().enumerate() {
            for &j in &holders[pos + 1..] {
                pairs.insert((i, j));
            }
        }
    }
    pairs.into_iter().collect()
}

pub fn build_similarity_graph(
    records: &[Record],
    mode: GraphMode,
    min_shared: MinShared,
) -> SimilarityGraph {
    build_similarity_graph_with(records, mode, min_shared, GraphStrategy::Auto)
}

/// Links every pair of distinct organisms sharing at least `min_shared`
/// AMR items. Node and link order follow first appearance in `records`,
/// whatever the strategy.
pub fn build_similarity_graph_with(
    records: &[Record],
    mode: GraphMode,
    min_shared: MinShared,
    strategy: GraphStrategy,
) -> SimilarityGraph {
    let organisms = organism_items(records, mode);
    let use_index = match strategy {
        GraphStrategy::Auto => organisms.len() > INVERTED_INDEX_CUTOFF,
        GraphStrategy::Pairwise => false,
        GraphStrategy::InvertedIndex => true,
    };
    let pairs = if use_index {
        candidate_pairs_indexed(&organisms)
    } else {
        candidate_pairs_pairwise(organisms.len())
    };

    let mut links = vec![];
    for (i, j) in pairs {
        let (Some((source, a)), Some((target, b))) =
            (organisms.get_index(i), organisms.get_index(j))
        else {
            continue;
        };
        let shared = shared_items(a, b);
        if shared.len() >= min_shared.get() {
            links.push(SimilarityLink {
                source: source.to_string(),
                target: target.to_string(),
                weight: shared.len(),
                shared,
            });
        }
    }

    let nodes = organisms
        .iter()
        .map(|(organism, items)| OrganismNode {
            id: organism.to_string(),
            weight: items.len(),
        })
        .collect();

    tracing::debug!(
        mode = mode.as_str(),
        min_shared = min_shared.get(),
        indexed = use_index,
        links = links.len(),
        "similarity graph built"
    );

    SimilarityGraph {
        mode,
        min_shared,
        nodes,
        links,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Rarity score per record: each AMR gene adds 1/(records carrying it) and
/// each BGC entry adds count/(total clusters of that type). Highest first;
/// equal scores keep row order.
pub fn compute_novelty(records: &[Record]) -> Vec<NoveltyScore> {
    let mut gene_freq: HashMap<&str, usize> = HashMap::new();
    let mut bgc_freq: HashMap<&str, u64> = HashMap::new();
    for record in records {
        let genes: HashSet<&str> = record.amr_genes.iter().map(String::as_str).collect();
        for gene in genes {
            *gene_freq.entry(gene).or_insert(0) += 1;
        }
        for entry in &record.bgc {
            *bgc_freq.entry(entry.cluster_type.as_str()).or_insert(0) += entry.count as u64;
        }
    }

    let mut scores: Vec<NoveltyScore> = records
        .iter()
        .map(|record| {
            let mut seen = HashSet::new();
            let gene_score: f64 = record
                .amr_genes
                .iter()
                .filter(|g| seen.insert(g.as_str()))
                .map(|g| 1.0 / gene_freq.get(g.as_str()).copied().unwrap_or(1) as f64)
                .sum();
            let bgc_score: f64 = record
                .bgc
                .iter()
                .map(|b| match bgc_freq.get(b.cluster_type.as_str()).copied() {
                    Some(freq) if freq > 0 => b.count as f64 / freq as f64,
                    _ => 0.0,
                })
                .sum();
            let score = gene_score + bgc_score;
            NoveltyScore {
                accession: record.accession.clone(),
                organism: record.organism.clone(),
                score,
                rounded: round3(score),
            }
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RecordSet;
    use chrono::NaiveDate;
    use portal_protocol::BgcEntry;

    fn reference() -> Vec<Record> {
        RecordSet::reference().unwrap().records().to_vec()
    }

    fn record(accession: &str, organism: &str, genes: &[&str], classes: &[&str]) -> Record {
        let mut r = Record::new(
            accession,
            organism,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        r.amr_genes = genes.iter().map(|s| s.to_string()).collect();
        r.amr_classes = classes.iter().map(|s| s.to_string()).collect();
        r
    }

    #[test]
    fn reference_classes_graph_has_no_links() {
        let graph = build_similarity_graph(&reference(), GraphMode::Classes, MinShared::new(1));
        assert_eq!(graph.nodes.len(), 4);
        assert!(graph.links.is_empty());
        assert_eq!(graph.node("Streptomyces sp.").map(|n| n.weight), Some(1));
    }

    #[test]
    fn organisms_merge_items_across_records() {
        let rows = vec![
            record("A", "E. coli", &["sul1"], &["Sulfonamide"]),
            record("B", "E. coli", &["qnrS1", "sul1"], &["Quinolone"]),
            record("C", "K. pneumoniae", &["sul1", "qnrS1"], &[]),
        ];
        let graph = build_similarity_graph(&rows, GraphMode::Genes, MinShared::new(2));
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.node("E. coli").map(|n| n.weight), Some(2));
        assert_eq!(graph.links.len(), 1);
        let link = &graph.links[0];
        assert_eq!(link.source, "E. coli");
        assert_eq!(link.target, "K. pneumoniae");
        assert_eq!(link.weight, 2);
        assert_eq!(link.shared, vec!["sul1", "qnrS1"]);

        let classes = build_similarity_graph(&rows, GraphMode::Classes, MinShared::new(1));
        assert!(classes.links.is_empty());
        assert_eq!(classes.node("K. pneumoniae").map(|n| n.weight), Some(0));
    }

    #[test]
    fn threshold_limits_links() {
        let rows = vec![
            record("A", "Org A", &["x", "y"], &[]),
            record("B", "Org B", &["x"], &[]),
            record("C", "Org C", &["x", "y", "z"], &[]),
        ];
        let one = build_similarity_graph(&rows, GraphMode::Genes, MinShared::new(1));
        assert_eq!(one.links.len(), 3);
        let two = build_similarity_graph(&rows, GraphMode::Genes, MinShared::new(2));
        assert_eq!(two.links.len(), 1);
        assert!(two.link_between("Org C", "Org A").is_some());
        let three = build_similarity_graph(&rows, GraphMode::Genes, MinShared::new(3));
        assert!(three.links.is_empty());
    }

    #[test]
    fn strategies_produce_identical_graphs() {
        let rows: Vec<Record> = (0..40)
            .map(|i| {
                let genes = [format!("g{}", i % 7), format!("g{}", i % 5), "common".to_string()];
                let genes: Vec<&str> = genes.iter().map(String::as_str).collect();
                record(&format!("A{i}"), &format!("Org {}", i % 23), &genes, &[])
            })
            .collect();
        for threshold in 1..4 {
            let pairwise = build_similarity_graph_with(
                &rows,
                GraphMode::Genes,
                MinShared::new(threshold),
                GraphStrategy::Pairwise,
            );
            let indexed = build_similarity_graph_with(
                &rows,
                GraphMode::Genes,
                MinShared::new(threshold),
                GraphStrategy::InvertedIndex,
            );
            assert_eq!(pairwise, indexed);
        }
    }

    #[test]
    fn unique_items_score_one_each() {
        let scores = compute_novelty(&reference());
        let strepto = scores
            .iter()
            .find(|s| s.accession == "LMNO03000012")
            .unwrap();
        // vanHAX unique; PKS unique (2/2); NRPS shared (1/3)
        assert!((strepto.score - (1.0 + 1.0 + 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(strepto.rounded, 2.333);

        let ecoli = scores
            .iter()
            .find(|s| s.accession == "QWER02000001")
            .unwrap();
        assert_eq!(ecoli.score, 4.0);
    }

    #[test]
    fn novelty_is_sorted_descending() {
        let scores = compute_novelty(&reference());
        let order: Vec<&str> = scores.iter().map(|s| s.accession.as_str()).collect();
        // Bordetella and Klebsiella tie at 4 + 1/3 and keep row order.
        assert_eq!(
            order,
            vec!["PGFR00000000", "JABC01000001", "QWER02000001", "LMNO03000012"]
        );
        assert_eq!(scores[0].score, scores[1].score);
        assert_eq!(scores[0].rounded, 4.333);
        assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_row_order_and_empty_records_score_zero() {
        let rows = vec![
            record("A", "Org", &[], &[]),
            record("B", "Org", &["shared"], &[]),
            record("C", "Org", &["shared"], &[]),
        ];
        let scores = compute_novelty(&rows);
        let order: Vec<&str> = scores.iter().map(|s| s.accession.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
        assert_eq!(scores[0].score, 0.5);
        assert_eq!(scores[2].score, 0.0);
    }

    #[test]
    fn zero_count_bgc_types_contribute_nothing() {
        let mut r = record("A", "Org", &[], &[]);
        r.bgc = vec![BgcEntry::new("Terpene", 0)];
        let scores = compute_novelty(&[r]);
        assert_eq!(scores[0].score, 0.0);
    }
}
