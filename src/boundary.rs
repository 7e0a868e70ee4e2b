//! Contracts for the services around the query engine: ingestion, artifact
//! retrieval, pipeline monitoring, case narratives and the genome browser.
//!
//! The engine never talks to these services itself. Shells implement the
//! traits; this module only provides the shared types, the deterministic link
//! builders and the upload flow's user-facing messages.

use crate::url_state::encode_component;
use portal_protocol::Record;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadKind {
    /// Delimited-text metadata (CSV/TSV).
    Metadata,
    /// JSON result bundle (QC/AMR/BGC results).
    ResultBundle,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            bytes,
        }
    }

    pub fn kind(&self) -> UploadKind {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => UploadKind::Metadata,
            "json" => UploadKind::ResultBundle,
            _ => UploadKind::Other,
        }
    }
}

pub trait IngestionService {
    fn submit(&self, files: &[UploadFile]) -> Result<JobId, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub job_id: Option<JobId>,
    pub message: String,
}

/// Submits one batch and turns the result into the message shown to the
/// submitter. Failures are reported, never retried.
pub fn upload_batch(service: &dyn IngestionService, files: &[UploadFile]) -> UploadOutcome {
    if files.is_empty() {
        return UploadOutcome {
            job_id: None,
            message: "Please choose at least one file.".to_string(),
        };
    }
    match service.submit(files) {
        Ok(job_id) => {
            tracing::info!(%job_id, files = files.len(), "upload accepted");
            UploadOutcome {
                job_id: Some(job_id),
                message: "Uploaded! ETL will pick this up for validation.".to_string(),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "upload failed");
            UploadOutcome {
                job_id: None,
                message: format!("Error: {e}"),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// GFF feature table.
    FeatureTable,
    /// GenBank sequence records.
    SequenceRecords,
    /// FASTA protein set.
    ProteinSet,
    /// QC summary JSON.
    QcSummary,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::FeatureTable,
        ArtifactKind::SequenceRecords,
        ArtifactKind::ProteinSet,
        ArtifactKind::QcSummary,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ArtifactKind::FeatureTable => "gff",
            ArtifactKind::SequenceRecords => "gbk",
            ArtifactKind::ProteinSet => "faa",
            ArtifactKind::QcSummary => "qc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::FeatureTable => "GFF",
            ArtifactKind::SequenceRecords => "GBK",
            ArtifactKind::ProteinSet => "FAA",
            ArtifactKind::QcSummary => "QC JSON",
        }
    }
}

pub fn artifact_url(api_base: &str, kind: ArtifactKind, accession: &str) -> String {
    format!(
        "{}/artifacts/{}?acc={}",
        api_base.trim_end_matches('/'),
        kind.slug(),
        encode_component(accession)
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLink {
    pub label: String,
    pub url: String,
}

/// Download links for every artifact kind of one record.
pub fn artifact_links(api_base: &str, accession: &str) -> Vec<ArtifactLink> {
    ArtifactKind::ALL
        .iter()
        .map(|kind| ArtifactLink {
            label: kind.label().to_string(),
            url: artifact_url(api_base, *kind, accession),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactPayload {
    Url(String),
    Bytes(Vec<u8>),
}

pub trait ArtifactSource {
    fn fetch(&self, accession: &str, kind: ArtifactKind) -> Result<ArtifactPayload, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub last_run: Option<String>,
    pub new_entries: usize,
    pub validation_errors: usize,
}

pub trait PipelineMonitor {
    fn status(&self) -> Result<PipelineStatus, String>;
    fn trigger_run(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseNarrative {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub links: Vec<CaseLink>,
}

pub trait CaseLibrary {
    fn list(&self) -> Result<Vec<CaseNarrative>, String>;
    fn get(&self, id: &str) -> Result<CaseNarrative, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Sequence,
    Feature,
    Alignment,
    Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub track_id: String,
    pub kind: TrackKind,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSession {
    pub accession: String,
    pub assembly: String,
    pub locus: String,
    pub tracks: Vec<TrackConfig>,
}

pub trait GenomeBrowser {
    fn session(&self, accession: &str) -> Result<BrowserSession, String>;
}

/// Link that opens a record in the embedded genome browser.
pub fn browser_url(browser_base: &str, record: Option<&Record>, locus: &str) -> String {
    match record {
        Some(r) => format!(
            "{browser_base}?assembly={}&loc={locus}&acc={}",
            encode_component(&r.organism),
            encode_component(&r.accession)
        ),
        None => browser_base.to_string(),
    }
}

/// Session with the annotation tracks the artifact service can always serve:
/// sequence records and the feature table. Alignment and coverage tracks
/// depend on read data and are left to `GenomeBrowser` implementations.
pub fn annotation_session(record: &Record, api_base: &str, locus: &str) -> BrowserSession {
    BrowserSession {
        accession: record.accession.clone(),
        assembly: record.organism.clone(),
        locus: locus.to_string(),
        tracks: vec![
            TrackConfig {
                track_id: format!("{}-sequence", record.accession),
                kind: TrackKind::Sequence,
                uri: artifact_url(api_base, ArtifactKind::SequenceRecords, &record.accession),
            },
            TrackConfig {
                track_id: format!("{}-features", record.accession),
                kind: TrackKind::Feature,
                uri: artifact_url(api_base, ArtifactKind::FeatureTable, &record.accession),
            },
        ],
    }
}
