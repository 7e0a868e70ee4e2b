pub mod csv_records;
pub mod export;
pub mod similarity_svg;

use std::{error::Error, fmt};

pub use csv_records::{CSV_COLUMNS, csv_template, parse_records_csv, records_to_csv};
pub use export::records_to_json;
pub use similarity_svg::export_similarity_svg;

#[derive(Debug)]
pub enum RenderError {
    Csv(csv::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl Error for RenderError {}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::Csv(e) => write!(f, "CSV error: {e}"),
            RenderError::Json(e) => write!(f, "JSON error: {e}"),
            RenderError::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<csv::Error> for RenderError {
    fn from(err: csv::Error) -> Self {
        RenderError::Csv(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Json(err)
    }
}

impl From<String> for RenderError {
    fn from(err: String) -> Self {
        RenderError::Invalid(err)
    }
}
