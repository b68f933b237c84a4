//! Index table loading and dataset quality checks.
//!
//! Two flat CSV datasets feed the dashboard: `countrylevel.csv` and
//! `industrylevel.csv`, both shaped `entity, year, ccii, gwe, gwghg`. The
//! loader coerces `year` to an integer and refuses to return a partially
//! coerced table: any malformed row fails the whole load.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::logging::{self, obj, v_num, v_str, Domain};

pub const INDEX_COLUMNS: [&str; 4] = ["year", "ccii", "gwe", "gwghg"];
pub const ENTITY_COLUMNS: [&str; 2] = ["country", "industry"];

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum DataError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    EmptyFile {
        path: PathBuf,
    },
    Schema {
        path: PathBuf,
        message: String,
    },
    MalformedRow {
        path: PathBuf,
        line: usize,
        message: String,
    },
    BadYear {
        path: PathBuf,
        line: usize,
        value: String,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            DataError::EmptyFile { path } => write!(f, "{} is empty", path.display()),
            DataError::Schema { path, message } => {
                write!(f, "bad schema in {}: {}", path.display(), message)
            }
            DataError::MalformedRow {
                path,
                line,
                message,
            } => write!(
                f,
                "malformed row in {} (line {}): {}",
                path.display(),
                line,
                message
            ),
            DataError::BadYear { path, line, value } => write!(
                f,
                "year not integer-coercible in {} (line {}): {:?}",
                path.display(),
                line,
                value
            ),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// =============================================================================
// Data model
// =============================================================================

/// Which of the three published indices a view is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Ccii,
    Gwe,
    Gwghg,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Ccii, Metric::Gwe, Metric::Gwghg];

    pub fn column(&self) -> &'static str {
        match self {
            Metric::Ccii => "ccii",
            Metric::Gwe => "gwe",
            Metric::Gwghg => "gwghg",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        match name {
            "ccii" => Some(Metric::Ccii),
            "gwe" => Some(Metric::Gwe),
            "gwghg" => Some(Metric::Gwghg),
            _ => None,
        }
    }

    pub fn value(&self, record: &IndexRecord) -> f64 {
        match self {
            Metric::Ccii => record.ccii,
            Metric::Gwe => record.gwe,
            Metric::Gwghg => record.gwghg,
        }
    }
}

/// One (entity, year) observation of the three indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub entity: String,
    pub year: i32,
    pub ccii: f64,
    pub gwe: f64,
    pub gwghg: f64,
}

/// An in-memory dataset, read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexTable {
    /// Header name of the entity column: "country" or "industry".
    pub entity_column: String,
    pub rows: Vec<IndexRecord>,
}

impl IndexTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct years in ascending order.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.rows.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }

    /// Rows for one year, in input order.
    pub fn rows_for_year(&self, year: i32) -> Vec<&IndexRecord> {
        self.rows.iter().filter(|r| r.year == year).collect()
    }

    /// All values of one metric, in input order.
    pub fn metric_values(&self, metric: Metric) -> Vec<f64> {
        self.rows.iter().map(|r| metric.value(r)).collect()
    }

    pub fn entity_count(&self) -> usize {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.entity.as_str()).collect();
        set.len()
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load one of the two index datasets.
///
/// The header must be exactly `country|industry, year, ccii, gwe, gwghg`.
/// Duplicate (entity, year) rows keep the first occurrence with a warning.
pub fn load_table(path: &Path) -> Result<IndexTable, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = match lines.next() {
        Some(Ok(line)) => line,
        Some(Err(source)) => {
            return Err(DataError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        None => {
            return Err(DataError::EmptyFile {
                path: path.to_path_buf(),
            })
        }
    };

    let header = split_csv_line(&header_line);
    let entity_column = check_header(path, &header)?;

    let mut rows: Vec<IndexRecord> = Vec::new();
    let mut seen: BTreeSet<(String, i32)> = BTreeSet::new();
    let mut line_no = 1usize;

    for line in lines {
        let line = line.map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(&line);
        if fields.len() != 5 {
            return Err(DataError::MalformedRow {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("expected 5 columns, got {}", fields.len()),
            });
        }
        let entity = fields[0].trim().to_string();
        if entity.is_empty() {
            return Err(DataError::MalformedRow {
                path: path.to_path_buf(),
                line: line_no,
                message: "empty entity".to_string(),
            });
        }
        let year = parse_year(fields[1].trim()).ok_or_else(|| DataError::BadYear {
            path: path.to_path_buf(),
            line: line_no,
            value: fields[1].trim().to_string(),
        })?;
        let ccii = parse_index_value(path, line_no, "ccii", fields[2].trim())?;
        let gwe = parse_index_value(path, line_no, "gwe", fields[3].trim())?;
        let gwghg = parse_index_value(path, line_no, "gwghg", fields[4].trim())?;

        if !seen.insert((entity.clone(), year)) {
            logging::warn(
                Domain::Data,
                "duplicate_row",
                obj(&[
                    ("path", v_str(&path.display().to_string())),
                    ("entity", v_str(&entity)),
                    ("year", v_num(year as f64)),
                    ("line", v_num(line_no as f64)),
                    ("action", v_str("keep_first")),
                ]),
            );
            continue;
        }

        rows.push(IndexRecord {
            entity,
            year,
            ccii,
            gwe,
            gwghg,
        });
    }

    let table = IndexTable {
        entity_column,
        rows,
    };
    logging::info(
        Domain::Data,
        "table_loaded",
        obj(&[
            ("path", v_str(&path.display().to_string())),
            ("entity_column", v_str(&table.entity_column)),
            ("rows", v_num(table.len() as f64)),
            ("entities", v_num(table.entity_count() as f64)),
            ("years", v_num(table.years().len() as f64)),
        ]),
    );
    Ok(table)
}

fn check_header(path: &Path, header: &[String]) -> Result<String, DataError> {
    if header.len() != 5 {
        return Err(DataError::Schema {
            path: path.to_path_buf(),
            message: format!("expected 5 columns, got {}", header.len()),
        });
    }
    let entity = header[0].trim().to_ascii_lowercase();
    if !ENTITY_COLUMNS.contains(&entity.as_str()) {
        return Err(DataError::Schema {
            path: path.to_path_buf(),
            message: format!(
                "first column must be one of {:?}, got {:?}",
                ENTITY_COLUMNS, header[0]
            ),
        });
    }
    for (got, want) in header[1..].iter().zip(INDEX_COLUMNS.iter()) {
        if got.trim().to_ascii_lowercase() != *want {
            return Err(DataError::Schema {
                path: path.to_path_buf(),
                message: format!("expected column {:?}, got {:?}", want, got),
            });
        }
    }
    Ok(entity)
}

/// Integer years and float literals with zero fraction are both accepted,
/// matching the original datasets where `year` sometimes arrives as "2020.0".
fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let as_float: f64 = raw.parse().ok()?;
    if as_float.fract() == 0.0 && as_float >= i32::MIN as f64 && as_float <= i32::MAX as f64 {
        Some(as_float as i32)
    } else {
        None
    }
}

/// Empty and NA cells become NaN (the upstream exporter leaves holes where an
/// index could not be computed); anything else non-numeric is malformed.
fn parse_index_value(
    path: &Path,
    line: usize,
    column: &str,
    raw: &str,
) -> Result<f64, DataError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| DataError::MalformedRow {
        path: path.to_path_buf(),
        line,
        message: format!("column {:?} is not numeric: {:?}", column, raw),
    })
}

/// Minimal CSV field splitter: handles double-quoted fields (country names
/// such as "Korea, Rep." carry embedded commas) and doubled-quote escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

// =============================================================================
// Schema validation and manifest
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub expected: Vec<String>,
    pub ok: bool,
    pub message: String,
}

pub fn validate_schema(path: &Path) -> Result<SchemaReport, DataError> {
    let columns = read_header(path)?;
    let entity = columns
        .first()
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let entity_expected = if ENTITY_COLUMNS.contains(&entity.as_str()) {
        entity
    } else {
        ENTITY_COLUMNS[0].to_string()
    };
    let mut expected = vec![entity_expected];
    expected.extend(INDEX_COLUMNS.iter().map(|s| s.to_string()));

    let normalized: Vec<String> = columns
        .iter()
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let ok = normalized == expected;
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("schema mismatch: got {:?} expected {:?}", columns, expected)
    };
    Ok(SchemaReport {
        columns,
        expected,
        ok,
        message,
    })
}

pub fn read_header(path: &Path) -> Result<Vec<String>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let read = reader.read_line(&mut line).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if read == 0 {
        return Err(DataError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    Ok(split_csv_line(line.trim_end()))
}

/// Provenance record for one dataset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub entity_count: u64,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

/// Load the table and summarize it for the manifest sidecar. Unlike
/// `load_table` callers, the manifest generator wants the error text too, so
/// this propagates `DataError` unchanged.
pub fn analyze_table(path: &Path, now_ts: u64) -> Result<DatasetManifest, DataError> {
    let hash = file_sha256(path)?;
    let columns = read_header(path)?;
    let table = load_table(path)?;

    let years = table.years();
    let mut warnings = Vec::new();
    let nan_cells = table
        .rows
        .iter()
        .map(|r| {
            [r.ccii, r.gwe, r.gwghg]
                .iter()
                .filter(|v| v.is_nan())
                .count()
        })
        .sum::<usize>();
    if nan_cells > 0 {
        warnings.push(format!("nan_cells: {}", nan_cells));
    }

    Ok(DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        row_count: table.len() as u64,
        entity_count: table.entity_count() as u64,
        year_min: years.first().copied(),
        year_max: years.last().copied(),
        columns,
        warnings,
        generated_at_epoch: now_ts,
    })
}

pub fn file_sha256(path: &Path) -> Result<String, DataError> {
    let mut file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

// =============================================================================
// Tests
// =============================================================================
