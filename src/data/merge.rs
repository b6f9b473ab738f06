//! Merge/Normalize Module
//! Joins the incidents CSV against the intersections JSON by crossing name
//! and resolves counts, status, coordinates, and street-view references
//! into render-ready records.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::data::model::{IncidentRecord, IntersectionMeta, MergedIntersection};

/// A value that was coerced or dropped during the merge. Recovered locally;
/// never aborts the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeWarning {
    UnparsableCount { name: String, raw: String },
    DuplicateName { name: String },
    HalfCoordinatePair { name: String },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsableCount { name, raw } => {
                write!(f, "{name}: count {raw:?} is not a number, using 0")
            }
            Self::DuplicateName { name } => {
                write!(f, "{name}: duplicate row dropped, first occurrence kept")
            }
            Self::HalfCoordinatePair { name } => {
                write!(f, "{name}: only one of lat/lng present, dropping both")
            }
        }
    }
}

/// Result of one merge pass: the deduplicated record sequence plus every
/// warning recorded along the way.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub intersections: Vec<MergedIntersection>,
    pub warnings: Vec<MergeWarning>,
}

/// Join key: trimmed, case-insensitive.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Merge the tabular rows with the metadata entries.
///
/// The tabular sequence drives the join: one output record per distinct
/// normalized name in `records`, in first-seen order. Metadata entries with
/// no tabular counterpart are excluded. Count priority: the tabular count
/// when positive, else the metadata count when positive, else 0 (a tabular
/// 0 counts as missing and falls back). Pure aside from the warn logs, so
/// the same inputs always produce the same output.
pub fn merge_intersections(
    records: &[IncidentRecord],
    metas: &[IntersectionMeta],
) -> MergeOutcome {
    let mut warnings = Vec::new();

    // Last write wins when the JSON repeats a crossing.
    let mut meta_by_name: HashMap<String, &IntersectionMeta> = HashMap::new();
    for meta in metas {
        meta_by_name.insert(normalize_name(&meta.name), meta);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut intersections = Vec::with_capacity(records.len());

    for record in records {
        let key = normalize_name(&record.name);
        if !seen.insert(key.clone()) {
            warnings.push(MergeWarning::DuplicateName {
                name: record.name.clone(),
            });
            continue;
        }

        let meta = meta_by_name.get(&key).copied();

        let tabular = parse_count(record, &mut warnings);
        let fallback = meta
            .and_then(|m| m.incidents)
            .filter(|c| c.is_finite() && *c > 0.0);
        let total = match tabular {
            Some(count) if count > 0.0 => count,
            _ => fallback.unwrap_or(0.0),
        };

        let coords = meta.and_then(|m| {
            let coords = m.coordinates();
            if coords.is_none() && (m.lat.is_some() || m.lng.is_some()) {
                warnings.push(MergeWarning::HalfCoordinatePair {
                    name: record.name.clone(),
                });
            }
            coords
        });

        let status = first_non_empty([
            meta.and_then(|m| m.status.as_deref()),
            record.status.as_deref(),
        ]);
        let street_view = first_non_empty([
            meta.and_then(|m| m.street_view.as_deref()),
            record.street_view.as_deref(),
        ]);

        intersections.push(MergedIntersection {
            name: record.name.trim().to_string(),
            total,
            status,
            coords,
            street_view,
        });
    }

    for warning in &warnings {
        log::warn!("merge: {warning}");
    }

    MergeOutcome {
        intersections,
        warnings,
    }
}

/// Parse the raw tabular count. Absent or empty is missing (no warning);
/// unparsable or non-finite records a warning and is treated as missing.
fn parse_count(record: &IncidentRecord, warnings: &mut Vec<MergeWarning>) -> Option<f64> {
    let raw = record.raw_total.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(count) if count.is_finite() => Some(count),
        _ => {
            warnings.push(MergeWarning::UnparsableCount {
                name: record.name.clone(),
                raw: raw.to_string(),
            });
            None
        }
    }
}

fn first_non_empty(candidates: [Option<&str>; 2]) -> String {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Coordinates;

    fn record(name: &str, raw_total: Option<&str>) -> IncidentRecord {
        IncidentRecord {
            name: name.to_string(),
            raw_total: raw_total.map(str::to_string),
            status: None,
            street_view: None,
        }
    }

    fn meta(name: &str, incidents: Option<f64>) -> IntersectionMeta {
        IntersectionMeta {
            name: name.to_string(),
            incidents,
            ..Default::default()
        }
    }

    #[test]
    fn positive_tabular_count_wins() {
        let records = [record("Av. Juarez", Some("12"))];
        let mut m = meta("Av. Juarez", Some(5.0));
        m.status = Some("Si".to_string());

        let outcome = merge_intersections(&records, &[m]);
        assert_eq!(outcome.intersections.len(), 1);
        assert_eq!(outcome.intersections[0].total, 12.0);
        assert_eq!(outcome.intersections[0].status, "Si");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn missing_tabular_count_falls_back_to_metadata() {
        let records = [record("Blvd. Independencia", None)];
        let outcome = merge_intersections(&records, &[meta("Blvd. Independencia", Some(8.0))]);
        assert_eq!(outcome.intersections[0].total, 8.0);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn zero_tabular_count_falls_back_to_metadata() {
        let records = [record("Blvd. Independencia", Some("0"))];
        let outcome = merge_intersections(&records, &[meta("Blvd. Independencia", Some(8.0))]);
        assert_eq!(outcome.intersections[0].total, 8.0);
    }

    #[test]
    fn unparsable_count_warns_and_degrades_to_zero() {
        let records = [record("Calle X", Some("abc")), record("Av. Juarez", Some("3"))];
        let outcome = merge_intersections(&records, &[]);

        // The bad row degrades, the rest of the merge still runs.
        assert_eq!(outcome.intersections.len(), 2);
        assert_eq!(outcome.intersections[0].total, 0.0);
        assert_eq!(outcome.intersections[1].total, 3.0);
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::UnparsableCount {
                name: "Calle X".to_string(),
                raw: "abc".to_string(),
            }]
        );
    }

    #[test]
    fn join_is_trimmed_and_case_insensitive() {
        let records = [record("  av. juarez ", Some(""))];
        let outcome = merge_intersections(&records, &[meta("Av. Juarez", Some(5.0))]);
        assert_eq!(outcome.intersections[0].total, 5.0);
        assert_eq!(outcome.intersections[0].name, "av. juarez");
    }

    #[test]
    fn missing_metadata_gets_empty_stand_in() {
        let records = [record("Calle Nueva", Some("4"))];
        let outcome = merge_intersections(&records, &[]);

        let merged = &outcome.intersections[0];
        assert_eq!(merged.total, 4.0);
        assert_eq!(merged.status, "");
        assert_eq!(merged.coords, None);
        assert_eq!(merged.street_view, "");
    }

    #[test]
    fn metadata_only_intersections_are_excluded() {
        let records = [record("Av. Juarez", Some("12"))];
        let metas = [meta("Av. Juarez", Some(5.0)), meta("Calle Fantasma", Some(9.0))];
        let outcome = merge_intersections(&records, &metas);
        assert_eq!(outcome.intersections.len(), 1);
        assert_eq!(outcome.intersections[0].name, "Av. Juarez");
    }

    #[test]
    fn duplicate_tabular_names_keep_first_occurrence() {
        let records = [
            record("Av. Juarez", Some("12")),
            record("AV. JUAREZ", Some("99")),
        ];
        let outcome = merge_intersections(&records, &[]);

        assert_eq!(outcome.intersections.len(), 1);
        assert_eq!(outcome.intersections[0].total, 12.0);
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::DuplicateName {
                name: "AV. JUAREZ".to_string(),
            }]
        );
    }

    #[test]
    fn duplicate_metadata_entries_last_write_wins() {
        let records = [record("Av. Juarez", None)];
        let metas = [meta("Av. Juarez", Some(5.0)), meta("Av. Juarez", Some(7.0))];
        let outcome = merge_intersections(&records, &metas);
        assert_eq!(outcome.intersections[0].total, 7.0);
    }

    #[test]
    fn coordinates_are_both_or_neither() {
        let mut whole = meta("Av. Juarez", None);
        whole.lat = Some(25.54);
        whole.lng = Some(-103.41);
        let mut half = meta("Calle Y", None);
        half.lat = Some(25.5);

        let records = [record("Av. Juarez", Some("1")), record("Calle Y", Some("1"))];
        let outcome = merge_intersections(&records, &[whole, half]);

        assert_eq!(
            outcome.intersections[0].coords,
            Some(Coordinates {
                lat: 25.54,
                lng: -103.41
            })
        );
        assert_eq!(outcome.intersections[1].coords, None);
        assert_eq!(
            outcome.warnings,
            vec![MergeWarning::HalfCoordinatePair {
                name: "Calle Y".to_string(),
            }]
        );
    }

    #[test]
    fn status_falls_back_to_tabular_column() {
        let mut rec = record("Calle Nueva", Some("4"));
        rec.status = Some("No".to_string());
        let outcome = merge_intersections(&[rec], &[]);
        assert_eq!(outcome.intersections[0].status, "No");
    }

    #[test]
    fn totals_are_never_nan_and_never_negative() {
        let records = [
            record("A", Some("NaN")),
            record("B", Some("-4")),
            record("C", Some("inf")),
            record("D", None),
        ];
        let outcome = merge_intersections(&records, &[]);
        for merged in &outcome.intersections {
            assert!(merged.total.is_finite(), "{} is not finite", merged.name);
            assert!(merged.total >= 0.0, "{} is negative", merged.name);
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let records = [
            record("Av. Juarez", Some("12")),
            record("Blvd. Independencia", Some("")),
            record("Calle X", Some("abc")),
        ];
        let metas = [
            meta("Blvd. Independencia", Some(8.0)),
            meta("Av. Juarez", Some(5.0)),
        ];

        let first = merge_intersections(&records, &metas);
        let second = merge_intersections(&records, &metas);
        assert_eq!(first.intersections, second.intersections);
        assert_eq!(first.warnings, second.warnings);
    }
}
