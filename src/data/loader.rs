//! Source Loader Module
//! Parses the incidents CSV (via Polars) and the intersections JSON into
//! row snapshots. CSV headers vary across exports, so column lookup goes
//! through a configurable alias table instead of hard-coded names.

use std::io::Cursor;

use polars::prelude::*;
use thiserror::Error;

use crate::data::model::{IncidentRecord, IntersectionFile, IntersectionMeta};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to parse intersections JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No {kind} column found (headers: {available:?})")]
    MissingColumn {
        kind: &'static str,
        available: Vec<String>,
    },
}

/// Accepted header spellings for each incidents-CSV column.
///
/// Matching is trimmed and case-insensitive, so only genuinely different
/// spellings need listing. Defaults cover the variants seen in the wild.
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    pub name: Vec<String>,
    pub total: Vec<String>,
    pub status: Vec<String>,
    pub street_view: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            name: vec!["crucero".into(), "cruce".into()],
            total: vec!["total de incidentes".into(), "total_incidentes".into()],
            status: vec!["semaforizado".into()],
            street_view: vec!["street_view".into(), "streetview".into()],
        }
    }
}

/// Find the first header matching any alias, trimmed and case-insensitive.
fn resolve_column<'a>(aliases: &[String], headers: &'a [String]) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| {
            let header = header.trim().to_lowercase();
            aliases.iter().any(|a| a.trim().to_lowercase() == header)
        })
        .map(String::as_str)
}

/// Parse the incidents CSV into one [`IncidentRecord`] per row.
///
/// Rows without an intersection name are skipped. The count cell is kept
/// as raw text; the merge step owns numeric coercion.
pub fn load_incidents(
    bytes: &[u8],
    aliases: &ColumnAliases,
) -> Result<Vec<IncidentRecord>, LoaderError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let name_col = resolve_column(&aliases.name, &headers).ok_or_else(|| {
        LoaderError::MissingColumn {
            kind: "intersection name",
            available: headers.clone(),
        }
    })?;
    let total_col = resolve_column(&aliases.total, &headers).ok_or_else(|| {
        LoaderError::MissingColumn {
            kind: "incident count",
            available: headers.clone(),
        }
    })?;
    let status_col = resolve_column(&aliases.status, &headers);
    let street_view_col = resolve_column(&aliases.street_view, &headers);

    let names = df.column(name_col)?;
    let totals = df.column(total_col)?;
    let statuses = status_col.map(|c| df.column(c)).transpose()?;
    let street_views = street_view_col.map(|c| df.column(c)).transpose()?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let Some(name) = cell_text(names, row) else {
            continue;
        };

        records.push(IncidentRecord {
            name,
            raw_total: cell_text(totals, row),
            status: statuses.and_then(|c| cell_text(c, row)),
            street_view: street_views.and_then(|c| cell_text(c, row)),
        });
    }

    Ok(records)
}

/// Parse the intersections JSON into its metadata entries.
pub fn load_intersections(bytes: &[u8]) -> Result<Vec<IntersectionMeta>, LoaderError> {
    let file: IntersectionFile = serde_json::from_slice(bytes)?;
    Ok(file.intersections)
}

/// Read one cell as trimmed text. Nulls and empty cells read as `None`.
fn cell_text(column: &Column, row: usize) -> Option<String> {
    let value = column.get(row).ok()?;
    if value.is_null() {
        return None;
    }
    let text = value.to_string();
    let text = text.trim_matches('"').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_uppercase_header_variant() {
        let csv = b"Crucero,TOTAL DE INCIDENTES,SEMAFORIZADO\n\
                    Av. Juarez,12,Si\n\
                    Blvd. Independencia,8,No\n";
        let records = load_incidents(csv, &ColumnAliases::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Av. Juarez");
        assert_eq!(records[0].raw_total.as_deref(), Some("12"));
        assert_eq!(records[0].status.as_deref(), Some("Si"));
        assert_eq!(records[1].name, "Blvd. Independencia");
    }

    #[test]
    fn loads_snake_case_header_variant() {
        let csv = b"crucero,total_incidentes,street_view\n\
                    Av. Juarez,12,https://maps.example/av-juarez\n";
        let records = load_incidents(csv, &ColumnAliases::default()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].street_view.as_deref(),
            Some("https://maps.example/av-juarez")
        );
    }

    #[test]
    fn missing_count_column_is_an_error() {
        let csv = b"crucero,velocidad\nAv. Juarez,60\n";
        let err = load_incidents(csv, &ColumnAliases::default()).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::MissingColumn {
                kind: "incident count",
                ..
            }
        ));
    }

    #[test]
    fn unnamed_rows_are_skipped() {
        let csv = b"crucero,total_incidentes\nAv. Juarez,12\n,5\n";
        let records = load_incidents(csv, &ColumnAliases::default()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_count_cell_reads_as_none() {
        let csv = b"crucero,total_incidentes\nBlvd. Independencia,\n";
        let records = load_incidents(csv, &ColumnAliases::default()).unwrap();
        assert_eq!(records[0].raw_total, None);
    }

    #[test]
    fn loads_intersections_json() {
        let json = br#"{
            "intersections": [
                {"cruce": "Av. Juarez", "incidentes": 5, "semaforizado": "Si"},
                {"cruce": "Calle Sola"}
            ]
        }"#;
        let metas = load_intersections(json).unwrap();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].incidents, Some(5.0));
    }

    #[test]
    fn empty_intersections_object_is_ok() {
        let metas = load_intersections(b"{}").unwrap();
        assert!(metas.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            load_intersections(b"not json").unwrap_err(),
            LoaderError::Json(_)
        ));
    }
}
