//! Materialize run bundles from the files the extraction step leaves behind.
//!
//! Two layouts are accepted:
//! - a TOML manifest listing one CSV file per table, resolved relative to
//!   the manifest's directory;
//! - a single JSON document carrying every table's rows inline.
//!
//! Either way the tables go through `TableModel::new`, so schema and key
//! validation happen exactly once.

use std::path::Path;

use serde::Deserialize;

use crate::bundle::RunBundle;
use crate::error::{CompareError, Result};
use crate::table::{Record, TableModel, Value};

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleManifest {
    pub run_id: String,
    #[serde(default)]
    pub tables: Vec<TableSource>,
}

/// One `[[tables]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSource {
    pub name: String,
    pub file: String,
    pub dimensions: Vec<String>,
    /// When omitted, every header that is neither a dimension nor ignored.
    #[serde(default)]
    pub measures: Option<Vec<String>>,
    /// Columns dropped before measure inference (e.g. `run_id`).
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl BundleManifest {
    pub fn from_toml(source_name: &str, input: &str) -> Result<Self> {
        let manifest: BundleManifest =
            toml::from_str(input).map_err(|e| CompareError::bundle_parse(source_name, e.to_string()))?;
        if manifest.run_id.trim().is_empty() {
            return Err(CompareError::bundle_parse(source_name, "run_id must not be empty"));
        }
        Ok(manifest)
    }
}

/// Load a bundle from a manifest (`.toml`) or a JSON document (`.json`).
pub fn load_bundle(path: &Path) -> Result<RunBundle> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let data = read(path)?;
        bundle_from_json(&path.display().to_string(), &data)
    } else {
        load_manifest(path)
    }
}

/// Read a manifest and every CSV it references.
pub fn load_manifest(path: &Path) -> Result<RunBundle> {
    let data = read(path)?;
    let manifest = BundleManifest::from_toml(&path.display().to_string(), &data)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tables = Vec::with_capacity(manifest.tables.len());
    for source in &manifest.tables {
        let csv_path = base_dir.join(&source.file);
        let csv_data = read(&csv_path)?;
        let table = parse_csv_table(source, &csv_path.display().to_string(), &csv_data)?;
        log::debug!(
            "run '{}': loaded table '{}' ({} rows) from {}",
            manifest.run_id,
            table.name(),
            table.len(),
            csv_path.display()
        );
        tables.push(table);
    }

    RunBundle::new(manifest.run_id, tables)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CompareError::Io(format!("cannot read {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse one table's CSV text against its manifest entry.
pub fn parse_csv_table(source: &TableSource, source_name: &str, csv_data: &str) -> Result<TableModel> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CompareError::bundle_parse(source_name, e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    for dim in &source.dimensions {
        if !headers.contains(dim) {
            return Err(CompareError::malformed(
                &source.name,
                format!("missing dimension column '{dim}' in {source_name}"),
            ));
        }
    }

    let measures: Vec<String> = match source.measures {
        Some(ref declared) => {
            for m in declared {
                if !headers.contains(m) {
                    return Err(CompareError::malformed(
                        &source.name,
                        format!("missing measure column '{m}' in {source_name}"),
                    ));
                }
            }
            declared.clone()
        }
        None => headers
            .iter()
            .filter(|h| !source.dimensions.contains(h) && !source.ignore.contains(h))
            .cloned()
            .collect(),
    };

    // (header index, column name) for every declared column
    let wanted: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| source.dimensions.contains(h) || measures.contains(h))
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CompareError::bundle_parse(source_name, e.to_string()))?;
        let row: Record = wanted
            .iter()
            .map(|(i, name)| {
                let raw = record.get(*i).unwrap_or("");
                let value = if source.dimensions.contains(name) {
                    parse_csv_dimension(raw)
                } else {
                    parse_csv_value(raw)
                };
                ((*name).clone(), value)
            })
            .collect();
        records.push(row);
    }

    TableModel::new(source.name.clone(), source.dimensions.clone(), measures, records)
}

/// Type a raw CSV cell: null markers, then integer, then float, else text.
pub fn parse_csv_value(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() || matches!(raw, "NA" | "NULL" | "null") {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Text(raw.to_string())
}

/// Like `parse_csv_value`, but zero-padded integer codes (`01`, `-007`) stay
/// text so they do not collide with their unpadded form.
pub fn parse_csv_dimension(raw: &str) -> Value {
    let raw = raw.trim();
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.len() > 1 && digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Value::Text(raw.to_string());
    }
    parse_csv_value(raw)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleDocument {
    run_id: String,
    #[serde(default)]
    tables: Vec<TableDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDocument {
    name: String,
    dimensions: Vec<String>,
    measures: Vec<String>,
    #[serde(default)]
    rows: Vec<Record>,
}

/// Build a bundle from a JSON document with inline rows.
pub fn bundle_from_json(source_name: &str, input: &str) -> Result<RunBundle> {
    let doc: BundleDocument =
        serde_json::from_str(input).map_err(|e| CompareError::bundle_parse(source_name, e.to_string()))?;
    let tables = doc
        .tables
        .into_iter()
        .map(|t| TableModel::new(t.name, t.dimensions, t.measures, t.rows))
        .collect::<Result<Vec<_>>>()?;
    RunBundle::new(doc.run_id, tables)
}
