use crate::RenderError;
use portal_protocol::Record;

/// The current table view as pretty JSON (two-space indentation).
pub fn records_to_json(records: &[Record]) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(records)?)
}
