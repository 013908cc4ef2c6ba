//! The academy document as read from the persistent store.
//!
//! Documents are owned by the store and written elsewhere; this model only
//! reads them, so every field deserializes tolerantly. Unknown fields
//! round-trip untouched so API responses carry the full stored document.

use academy_geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// One academy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademyRecord {
    /// Externally-assigned id, distinct from the store's own identity.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// "Art" or "Sports"; kept as stored so unexpected values pass through.
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub address: Address,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,

    #[serde(default)]
    pub artprogram: Vec<ProgramEntry>,

    #[serde(default)]
    pub sportsprogram: Vec<ProgramEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,

    #[serde(
        default,
        deserialize_with = "de_datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "de_datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub academy_startat: Option<DateTime<Utc>>,

    /// Remaining document fields (website, trainers, achievements, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl AcademyRecord {
    /// The record's location as a validated point, if it has one.
    ///
    /// Anything other than an exactly-2-element numeric `[lng, lat]` pair
    /// counts as "no location" and excludes the record from distance
    /// computation without failing the request.
    pub fn point(&self) -> Option<GeoPoint> {
        self.location.as_ref().and_then(GeoLocation::point)
    }

    /// All finite fee values across both program arrays.
    pub fn fees(&self) -> impl Iterator<Item = f64> + '_ {
        self.artprogram
            .iter()
            .chain(self.sportsprogram.iter())
            .filter_map(|p| p.fees_per_month)
            .filter(|f| f.is_finite())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// One program entry nested inside `artprogram` or `sportsprogram`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_name: Option<String>,
    #[serde(default)]
    pub level: String,
    #[serde(default, deserialize_with = "de_fee_opt")]
    pub fees_per_month: Option<f64>,
}

/// GeoJSON-shaped point. `coordinates` is kept raw so malformed shapes
/// survive deserialization and are rejected at access time instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: JsonValue,
}

impl GeoLocation {
    pub fn point(&self) -> Option<GeoPoint> {
        let pair: Vec<f64> = self
            .coordinates
            .as_array()?
            .iter()
            .map(JsonValue::as_f64)
            .collect::<Option<Vec<f64>>>()?;
        GeoPoint::from_lng_lat_slice(&pair)
    }
}

/// Fees appear both as numbers and as numeric strings in stored documents;
/// anything else reads as absent.
fn de_fee_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(coerce_fee(&value))
}

fn coerce_fee(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Timestamps read as RFC 3339; malformed values read as absent so one bad
/// record never fails a whole result set.
fn de_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}
