//! Data Model Module
//! Snapshot entities for one load cycle: CSV rows, JSON metadata, and the
//! merged render-ready records.

use serde::{Deserialize, Deserializer};

/// One row from the incidents CSV, as read.
///
/// The count is kept as the raw cell text; parsing and coercion happen in
/// the merge step so that bad values can be warned about in one place.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub name: String,
    pub raw_total: Option<String>,
    pub status: Option<String>,
    pub street_view: Option<String>,
}

/// A latitude/longitude pair. Only constructed when both halves are present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Top-level shape of the intersections JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntersectionFile {
    #[serde(default)]
    pub intersections: Vec<IntersectionMeta>,
}

/// One entry from the intersections JSON, keyed by crossing name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntersectionMeta {
    #[serde(rename = "cruce")]
    pub name: String,
    #[serde(
        default,
        rename = "incidentes",
        alias = "total_incidentes",
        deserialize_with = "count_field"
    )]
    pub incidents: Option<f64>,
    #[serde(default, rename = "semaforizado")]
    pub status: Option<String>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude", alias = "lon")]
    pub lng: Option<f64>,
    #[serde(default, rename = "streetView", alias = "street_view")]
    pub street_view: Option<String>,
}

impl IntersectionMeta {
    /// Coordinate pair, or `None` unless both halves are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// The joined, render-ready record for one intersection.
///
/// `total` is always a non-negative finite number; `status` and
/// `street_view` default to empty strings when neither source has them.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedIntersection {
    pub name: String,
    pub total: f64,
    pub status: String,
    pub coords: Option<Coordinates>,
    pub street_view: String,
}

/// Some exports carry the incident count as a number, others as a quoted
/// numeric string. Accept both; anything else reads as absent.
fn count_field<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok(),
    })
}
