use crate::{Accession, GraphMode, MinShared};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganismNode {
    pub id: String,
    /// Number of distinct AMR items seen for this organism.
    pub weight: usize,
}

/// Undirected link; `source` is the organism seen first in the row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityLink {
    pub source: String,
    pub target: String,
    pub weight: usize,
    pub shared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimilarityGraph {
    pub mode: GraphMode,
    pub min_shared: MinShared,
    pub nodes: Vec<OrganismNode>,
    pub links: Vec<SimilarityLink>,
}

impl SimilarityGraph {
    pub fn node(&self, id: &str) -> Option<&OrganismNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link_between(&self, a: &str, b: &str) -> Option<&SimilarityLink> {
        self.links.iter().find(|l| {
            (l.source == a && l.target == b) || (l.source == b && l.target == a)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyScore {
    pub accession: Accession,
    pub organism: String,
    /// Full-precision score; ordering uses this value.
    pub score: f64,
    /// Score rounded to three decimals for display.
    pub rounded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub accession: Accession,
    pub organism: String,
    pub region: String,
    pub subregion: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl MapBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// Headline numbers shown above the tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortalSummary {
    pub total_genomes: usize,
    pub submitted_on_reference_date: usize,
    pub total_amr_genes: usize,
    pub total_bgc_clusters: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCount {
    pub label: String,
    pub count: usize,
}
