//! Machine-readable contracts shared by the AMR portal engine, its renderers
//! and any shell that drives them.

pub mod derived;
pub mod record;
pub mod view_state;

pub use derived::{
    MapBounds, MapPoint, NoveltyScore, OrganismNode, PortalSummary, RankedCount, SimilarityGraph,
    SimilarityLink,
};
pub use record::{Accession, BgcEntry, Record};
pub use view_state::{Criteria, GraphMode, MinShared, SortDir, SortKey, SortState, Tab, ViewState};
