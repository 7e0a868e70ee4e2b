use crate::RenderError;
use chrono::NaiveDate;
use itertools::Itertools;
use portal_protocol::{BgcEntry, Record};

/// Column order of every CSV the portal writes.
pub const CSV_COLUMNS: [&str; 12] = [
    "accession",
    "organism",
    "date",
    "project",
    "amrGenes",
    "amrClasses",
    "bgc",
    "region",
    "subregion",
    "lat",
    "lon",
    "externalRef",
];

const LIST_SEPARATOR: char = '|';

/// Header names used by older metadata templates, mapped to current columns.
const LEGACY_COLUMNS: &[(&str, &str)] = &[
    ("amr", "amrGenes"),
    ("state", "region"),
    ("district", "subregion"),
    ("ncbi", "externalRef"),
];

fn format_coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_row(record: &Record) -> [String; 12] {
    [
        record.accession.clone(),
        record.organism.clone(),
        record.date.format("%Y-%m-%d").to_string(),
        record.project.clone(),
        record.amr_genes.join("|"),
        record.amr_classes.join("|"),
        record
            .bgc
            .iter()
            .map(|b| format!("{}:{}", b.cluster_type, b.count))
            .join("|"),
        record.region.clone(),
        record.subregion.clone(),
        format_coordinate(record.lat),
        format_coordinate(record.lon),
        record.external_ref.clone(),
    ]
}

/// Serializes records with a bare header line followed by rows in which
/// every field is double-quoted. Lines are separated by `\n` with no
/// trailing newline.
pub fn records_to_csv(records: &[Record]) -> Result<String, RenderError> {
    let mut out = CSV_COLUMNS.join(",").into_bytes();
    out.push(b'\n');
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    for record in records {
        writer.write_record(csv_row(record))?;
    }
    let mut bytes = writer
        .into_inner()
        .map_err(|e| format!("Could not finish CSV output: {}", e.error()))?;
    // lines are joined, not terminated
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Metadata template offered to submitters: the header plus one example row.
pub fn csv_template(example: &Record) -> Result<String, RenderError> {
    records_to_csv(std::slice::from_ref(example))
}

struct ColumnMap {
    index: [Option<usize>; 12],
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, RenderError> {
        let mut index = [None; 12];
        for (pos, raw) in headers.iter().enumerate() {
            let name = raw.trim();
            let name = LEGACY_COLUMNS
                .iter()
                .find(|(legacy, _)| *legacy == name)
                .map(|(_, current)| *current)
                .unwrap_or(name);
            if let Some(slot) = CSV_COLUMNS.iter().position(|c| *c == name) {
                index[slot] = Some(pos);
            }
        }
        for required in ["accession", "organism", "date"] {
            let slot = CSV_COLUMNS
                .iter()
                .position(|c| *c == required)
                .unwrap_or_default();
            if index[slot].is_none() {
                return Err(format!("CSV header is missing required column '{required}'").into());
            }
        }
        Ok(Self { index })
    }

    fn get<'a>(&self, row: &'a csv::StringRecord, column: &str) -> &'a str {
        CSV_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|slot| self.index[slot])
            .and_then(|pos| row.get(pos))
            .unwrap_or("")
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bgc(value: &str, line: usize) -> Result<Vec<BgcEntry>, RenderError> {
    split_list(value)
        .into_iter()
        .map(|item| -> Result<BgcEntry, RenderError> {
            let (cluster_type, count) = item.rsplit_once(':').ok_or_else(|| {
                format!("Line {line}: BGC entry '{item}' is not of the form type:count")
            })?;
            let count = count.trim().parse::<u32>().map_err(|e| {
                format!("Line {line}: invalid BGC count in '{item}': {e}")
            })?;
            Ok(BgcEntry::new(cluster_type.trim(), count))
        })
        .collect()
}

fn parse_coordinate(value: &str, column: &str, line: usize) -> Result<Option<f64>, RenderError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| format!("Line {line}: invalid {column} '{value}': {e}").into())
}

/// Reads records written by [`records_to_csv`] or by an older metadata
/// template. Quoting is optional.
pub fn parse_records_csv(text: &str) -> Result<Vec<Record>, RenderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let columns = ColumnMap::from_headers(reader.headers()?)?;

    let mut records = vec![];
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let line = idx + 2;
        let accession = columns.get(&row, "accession").trim();
        if accession.is_empty() {
            return Err(format!("Line {line}: missing accession").into());
        }
        let date_text = columns.get(&row, "date").trim();
        let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d")
            .map_err(|e| format!("Line {line}: invalid date '{date_text}': {e}"))?;

        let mut record = Record::new(accession, columns.get(&row, "organism"), date);
        record.project = columns.get(&row, "project").to_string();
        record.amr_genes = split_list(columns.get(&row, "amrGenes"));
        record.amr_classes = split_list(columns.get(&row, "amrClasses"));
        record.bgc = parse_bgc(columns.get(&row, "bgc"), line)?;
        record.region = columns.get(&row, "region").to_string();
        record.subregion = columns.get(&row, "subregion").to_string();
        record.lat = parse_coordinate(columns.get(&row, "lat"), "lat", line)?;
        record.lon = parse_coordinate(columns.get(&row, "lon"), "lon", line)?;
        record.external_ref = columns.get(&row, "externalRef").to_string();
        records.push(record.normalized());
    }
    Ok(records)
}
