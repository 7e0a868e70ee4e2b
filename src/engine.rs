use crate::{
    aggregate::{self, Aggregates},
    config::PortalConfig,
    dataset::RecordSet,
    geo, query, relationship,
};
use chrono::NaiveDate;
use portal_protocol::{
    GraphMode, MapBounds, MapPoint, MinShared, NoveltyScore, PortalSummary, Record,
    SimilarityGraph, SortDir, SortKey, SortState, Tab, ViewState,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{error::Error, fmt};

pub type OpId = String;
pub type RunId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
    GraphSvg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    SetQuery {
        query: String,
    },
    SetRegion {
        region: String,
    },
    SetAmrClass {
        amr_class: String,
    },
    SetSort {
        key: SortKey,
        dir: SortDir,
    },
    ToggleSort {
        key: SortKey,
    },
    SetGraphMode {
        mode: GraphMode,
    },
    /// Accepts any JSON value; non-numeric or non-positive input becomes 1.
    SetMinShared {
        value: serde_json::Value,
    },
    SetTab {
        tab: Tab,
    },
    SetAdmin {
        enabled: bool,
    },
    ResetFilters,
    ExportView {
        path: String,
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub run_id: RunId,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResult {
    pub op_id: OpId,
    pub row_count: usize,
    pub warnings: Vec<String>,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub run_id: RunId,
    pub op: Operation,
    pub result: OpResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Unsupported,
    Io,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for EngineError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub supported_operations: Vec<String>,
    pub supported_export_formats: Vec<String>,
    pub sort_keys: Vec<String>,
    pub graph_modes: Vec<String>,
    pub tabs: Vec<String>,
    pub deterministic_operation_log: bool,
}

/// State that can be written to and read back from a JSON file.
pub trait PersistedState: Serialize + DeserializeOwned + Default {
    fn load_from_path(path: &str) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::new(ErrorCode::Io, format!("Could not read state file '{path}': {e}"))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            EngineError::new(
                ErrorCode::InvalidInput,
                format!("Could not parse state JSON '{path}': {e}"),
            )
        })
    }

    fn save_to_path(&self, path: &str) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| {
            EngineError::new(ErrorCode::Internal, format!("Could not serialize state: {e}"))
        })?;
        std::fs::write(path, text).map_err(|e| {
            EngineError::new(ErrorCode::Io, format!("Could not write state file '{path}': {e}"))
        })
    }
}

impl PersistedState for ViewState {}

/// Everything the dashboard renders for one `ViewState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalView {
    pub state: ViewState,
    pub summary: PortalSummary,
    pub rows: Vec<Record>,
    pub aggregates: Aggregates,
    pub graph: SimilarityGraph,
    pub novelty: Vec<NoveltyScore>,
    pub map_points: Vec<MapPoint>,
    pub map_bounds: Option<MapBounds>,
}

pub trait Engine {
    fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError>;
    fn apply_workflow(&mut self, wf: Workflow) -> Result<Vec<OpResult>, EngineError>;
    fn snapshot(&self) -> &ViewState;
}

#[derive(Debug, Clone, Default)]
pub struct PortalEngine {
    records: RecordSet,
    state: ViewState,
    reference_date: NaiveDate,
    journal: Vec<OperationRecord>,
    op_counter: u64,
}

impl PortalEngine {
    pub fn new(records: RecordSet) -> Self {
        Self::with_config(records, &PortalConfig::default())
    }

    /// Starts from the configured graph defaults.
    pub fn with_config(records: RecordSet, config: &PortalConfig) -> Self {
        let state = ViewState {
            graph_mode: config.default_graph_mode,
            min_shared: config.default_min_shared,
            ..ViewState::default()
        };
        Self {
            records,
            state,
            reference_date: config.reference_date,
            ..Self::default()
        }
    }

    pub fn from_state(records: RecordSet, state: ViewState, config: &PortalConfig) -> Self {
        Self {
            state,
            ..Self::with_config(records, config)
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn journal(&self) -> &[OperationRecord] {
        &self.journal
    }

    pub fn capabilities() -> Capabilities {
        Capabilities {
            protocol_version: "v1".to_string(),
            supported_operations: vec![
                "SetQuery".to_string(),
                "SetRegion".to_string(),
                "SetAmrClass".to_string(),
                "SetSort".to_string(),
                "ToggleSort".to_string(),
                "SetGraphMode".to_string(),
                "SetMinShared".to_string(),
                "SetTab".to_string(),
                "SetAdmin".to_string(),
                "ResetFilters".to_string(),
                "ExportView".to_string(),
            ],
            supported_export_formats: vec![
                "Csv".to_string(),
                "Json".to_string(),
                "GraphSvg".to_string(),
            ],
            sort_keys: SortKey::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            graph_modes: vec![
                GraphMode::Genes.as_str().to_string(),
                GraphMode::Classes.as_str().to_string(),
            ],
            tabs: Tab::ALL.iter().map(|t| t.label().to_string()).collect(),
            deterministic_operation_log: true,
        }
    }

    /// Filtered and sorted rows for the current state.
    pub fn rows(&self) -> Vec<Record> {
        query::run_query(self.records.records(), &self.state.criteria, self.state.sort)
    }

    pub fn graph(&self) -> SimilarityGraph {
        relationship::build_similarity_graph(
            &self.rows(),
            self.state.graph_mode,
            self.state.min_shared,
        )
    }

    pub fn novelty(&self) -> Vec<NoveltyScore> {
        relationship::compute_novelty(&self.rows())
    }

    /// Summary numbers are taken over the whole record set, not the view.
    pub fn summary(&self) -> PortalSummary {
        aggregate::summary(self.records.records(), self.reference_date)
    }

    pub fn view(&self) -> PortalView {
        let rows = self.rows();
        let map_points = geo::map_points(&rows);
        let map_bounds = geo::map_bounds(&map_points, geo::BOUNDS_PADDING);
        let view = PortalView {
            state: self.state.clone(),
            summary: self.summary(),
            aggregates: Aggregates::compute(&rows),
            graph: relationship::build_similarity_graph(
                &rows,
                self.state.graph_mode,
                self.state.min_shared,
            ),
            novelty: relationship::compute_novelty(&rows),
            map_points,
            map_bounds,
            rows,
        };
        tracing::debug!(
            rows = view.rows.len(),
            links = view.graph.links.len(),
            "view recomputed"
        );
        view
    }

    fn next_op_id(&mut self) -> OpId {
        self.op_counter += 1;
        format!("op-{}", self.op_counter)
    }

    fn export_view(&self, path: &str, format: ExportFormat) -> Result<String, EngineError> {
        let rows = self.rows();
        let text = match format {
            ExportFormat::Csv => portal_render::records_to_csv(&rows),
            ExportFormat::Json => portal_render::records_to_json(&rows),
            ExportFormat::GraphSvg => Ok(portal_render::export_similarity_svg(&self.graph())),
        }
        .map_err(|e| EngineError::new(ErrorCode::Internal, e.to_string()))?;
        std::fs::write(path, text).map_err(|e| {
            EngineError::new(ErrorCode::Io, format!("Could not write export '{path}': {e}"))
        })?;
        Ok(format!("Wrote {} rows as {format:?} to '{path}'", rows.len()))
    }

    fn apply_internal(&mut self, op: Operation) -> Result<OpResult, EngineError> {
        let mut warnings = vec![];
        let mut messages = vec![];
        match op {
            Operation::SetQuery { query } => {
                messages.push(format!("Query set to '{query}'"));
                self.state.criteria.query = query;
            }
            Operation::SetRegion { region } => {
                let selected = portal_protocol::Criteria::selector(&region);
                if let Some(r) = &selected {
                    if !self.records.records().iter().any(|rec| &rec.region == r) {
                        warnings.push(format!("Region '{r}' matches no records"));
                    }
                }
                messages.push(match &selected {
                    Some(r) => format!("Region filter set to '{r}'"),
                    None => "Region filter cleared".to_string(),
                });
                self.state.criteria.region = selected;
            }
            Operation::SetAmrClass { amr_class } => {
                let selected = portal_protocol::Criteria::selector(&amr_class);
                if let Some(c) = &selected {
                    if !self.records.records().iter().any(|rec| rec.has_amr_class(c)) {
                        warnings.push(format!("AMR class '{c}' matches no records"));
                    }
                }
                messages.push(match &selected {
                    Some(c) => format!("AMR class filter set to '{c}'"),
                    None => "AMR class filter cleared".to_string(),
                });
                self.state.criteria.amr_class = selected;
            }
            Operation::SetSort { key, dir } => {
                self.state.sort = SortState::new(key, dir);
                messages.push(format!("Sorted by {key} {dir}"));
            }
            Operation::ToggleSort { key } => {
                self.state.sort = self.state.sort.toggle(key);
                messages.push(format!(
                    "Sorted by {} {}",
                    self.state.sort.key, self.state.sort.dir
                ));
            }
            Operation::SetGraphMode { mode } => {
                self.state.graph_mode = mode;
                messages.push(format!("Graph links organisms by shared {}", mode.as_str()));
            }
            Operation::SetMinShared { value } => {
                let min_shared = MinShared::from_json(&value);
                if value.as_f64() != Some(min_shared.get() as f64) {
                    warnings.push(format!("Minimum shared items {value} coerced to {min_shared}"));
                }
                self.state.min_shared = min_shared;
                messages.push(format!("Minimum shared items set to {min_shared}"));
            }
            Operation::SetTab { tab } => {
                self.state.tab = tab;
                messages.push(format!("Tab set to {}", tab.label()));
            }
            Operation::SetAdmin { enabled } => {
                self.state.admin = enabled;
                messages.push(format!("Admin uploads {}", if enabled { "shown" } else { "hidden" }));
            }
            Operation::ResetFilters => {
                self.state.criteria = Default::default();
                messages.push("Filters cleared".to_string());
            }
            Operation::ExportView { path, format } => {
                messages.push(self.export_view(&path, format)?);
            }
        }
        Ok(OpResult {
            op_id: self.next_op_id(),
            row_count: self.rows().len(),
            warnings,
            messages,
        })
    }
}

impl Engine for PortalEngine {
    fn apply(&mut self, op: Operation) -> Result<OpResult, EngineError> {
        let run_id = "interactive".to_string();
        let result = self.apply_internal(op.clone())?;
        tracing::info!(op_id = %result.op_id, rows = result.row_count, "operation applied");
        self.journal.push(OperationRecord {
            run_id,
            op,
            result: result.clone(),
        });
        Ok(result)
    }

    fn apply_workflow(&mut self, wf: Workflow) -> Result<Vec<OpResult>, EngineError> {
        let mut results = Vec::new();
        for op in &wf.ops {
            let result = self.apply_internal(op.clone())?;
            self.journal.push(OperationRecord {
                run_id: wf.run_id.clone(),
                op: op.clone(),
                result: result.clone(),
            });
            results.push(result);
        }
        tracing::info!(run_id = %wf.run_id, ops = results.len(), "workflow applied");
        Ok(results)
    }

    fn snapshot(&self) -> &ViewState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> PortalEngine {
        PortalEngine::new(RecordSet::reference().unwrap())
    }

    fn accessions(rows: &[Record]) -> Vec<String> {
        rows.iter().map(|r| r.accession.clone()).collect()
    }

    #[test]
    fn test_default_view_covers_all_records() {
        let view = engine().view();
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.rows[0].accession, "PGFR00000000");
        assert_eq!(view.summary.total_genomes, 4);
        assert_eq!(view.map_points.len(), 4);
        assert!(view.map_bounds.is_some());
        assert_eq!(view.graph.mode, GraphMode::Classes);
        assert!(view.graph.links.is_empty());
        assert_eq!(view.novelty.len(), 4);
    }

    #[test]
    fn test_set_region_narrows_rows_and_aggregates() {
        let mut engine = engine();
        let res = engine
            .apply(Operation::SetRegion {
                region: "Maharashtra".to_string(),
            })
            .unwrap();
        assert_eq!(res.row_count, 1);
        let view = engine.view();
        assert_eq!(accessions(&view.rows), vec!["JABC01000001"]);
        assert_eq!(view.aggregates.regions.get("Maharashtra"), Some(&1));
        assert_eq!(view.aggregates.regions.len(), 1);
        // stats always describe the whole set
        assert_eq!(view.summary.total_genomes, 4);
    }

    #[test]
    fn test_unknown_region_warns() {
        let mut engine = engine();
        let res = engine
            .apply(Operation::SetRegion {
                region: "Atlantis".to_string(),
            })
            .unwrap();
        assert_eq!(res.row_count, 0);
        assert!(res.warnings[0].contains("Atlantis"));
        let res = engine
            .apply(Operation::SetRegion {
                region: "All States".to_string(),
            })
            .unwrap();
        assert_eq!(res.row_count, 4);
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_toggle_sort_and_min_shared_coercion() {
        let mut engine = engine();
        engine
            .apply(Operation::ToggleSort {
                key: SortKey::Accession,
            })
            .unwrap();
        assert_eq!(
            engine.state().sort,
            SortState::new(SortKey::Accession, SortDir::Asc)
        );
        assert_eq!(engine.rows()[0].accession, "JABC01000001");

        let res = engine
            .apply(Operation::SetMinShared { value: json!("zero") })
            .unwrap();
        assert_eq!(engine.state().min_shared.get(), 1);
        assert_eq!(res.warnings.len(), 1);
        let res = engine
            .apply(Operation::SetMinShared { value: json!(2) })
            .unwrap();
        assert_eq!(engine.state().min_shared.get(), 2);
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_workflow_is_journaled_in_order() {
        let mut engine = engine();
        let results = engine
            .apply_workflow(Workflow {
                run_id: "run-1".to_string(),
                ops: vec![
                    Operation::SetQuery {
                        query: "river".to_string(),
                    },
                    Operation::SetGraphMode {
                        mode: GraphMode::Genes,
                    },
                    Operation::ResetFilters,
                ],
            })
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].row_count, 1);
        assert_eq!(results[2].row_count, 4);
        assert_eq!(engine.journal().len(), 3);
        assert!(engine.journal().iter().all(|r| r.run_id == "run-1"));
        assert_eq!(results[2].op_id, "op-3");
        assert_eq!(engine.snapshot().graph_mode, GraphMode::Genes);
    }

    #[test]
    fn test_export_view_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine();
        engine
            .apply(Operation::SetAmrClass {
                amr_class: "Beta-lactam".to_string(),
            })
            .unwrap();
        let csv_path = dir.path().join("view.csv").to_string_lossy().to_string();
        engine
            .apply(Operation::ExportView {
                path: csv_path.clone(),
                format: ExportFormat::Csv,
            })
            .unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("\"PGFR00000000\""));

        let svg_path = dir.path().join("graph.svg").to_string_lossy().to_string();
        engine
            .apply(Operation::ExportView {
                path: svg_path.clone(),
                format: ExportFormat::GraphSvg,
            })
            .unwrap();
        assert!(std::fs::read_to_string(&svg_path).unwrap().contains("<svg"));
    }

    #[test]
    fn test_export_to_missing_directory_is_io_error() {
        let mut engine = engine();
        let err = engine
            .apply(Operation::ExportView {
                path: "/nonexistent/dir/view.json".to_string(),
                format: ExportFormat::Json,
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Io);
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn test_view_state_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json").to_string_lossy().to_string();
        let mut engine = engine();
        engine
            .apply(Operation::SetTab { tab: Tab::Phylogeography })
            .unwrap();
        engine.state().save_to_path(&path).unwrap();
        let loaded = ViewState::load_from_path(&path).unwrap();
        assert_eq!(&loaded, engine.state());
    }

    #[test]
    fn test_operations_deserialize_from_json() {
        let op: Operation =
            serde_json::from_str(r#"{"ToggleSort":{"key":"state"}}"#).unwrap();
        assert!(matches!(op, Operation::ToggleSort { key: SortKey::Region }));
        let op: Operation = serde_json::from_str(r#""ResetFilters""#).unwrap();
        assert!(matches!(op, Operation::ResetFilters));
    }

    #[test]
    fn test_state_file_with_all_labels_keeps_every_row() {
        let state: ViewState = serde_json::from_str(
            r#"{"criteria":{"region":"All States","amr_class":"all"}}"#,
        )
        .unwrap();
        let engine = PortalEngine::from_state(
            RecordSet::reference().unwrap(),
            state,
            &PortalConfig::default(),
        );
        assert_eq!(engine.rows().len(), 4);
    }

    #[test]
    fn test_unknown_sort_key_falls_back_to_default() {
        let op: Operation =
            serde_json::from_str(r#"{"SetSort":{"key":"bogus","dir":"asc"}}"#).unwrap();
        let mut engine = engine();
        engine.apply(op).unwrap();
        assert_eq!(
            engine.state().sort,
            SortState::new(SortKey::Date, SortDir::Asc)
        );
        assert_eq!(engine.rows()[0].accession, "LMNO03000012");
    }

    #[test]
    fn test_config_defaults_seed_graph_settings() {
        let config = PortalConfig {
            default_graph_mode: GraphMode::Genes,
            default_min_shared: MinShared::new(2),
            ..PortalConfig::default()
        };
        let engine = PortalEngine::with_config(RecordSet::reference().unwrap(), &config);
        assert_eq!(engine.state().graph_mode, GraphMode::Genes);
        assert_eq!(engine.graph().min_shared.get(), 2);
    }
}
