use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version embedded in every draft snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted projection of the active round, written to the draft slot.
///
/// Every field except `version` and `updatedAt` is optional on the way in so
/// older or partially written drafts still deserialize; the codec in
/// [`crate::state::snapshot`] fills the gaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Schema version of the payload.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Identity of the round, preserved across resume.
    #[serde(default)]
    pub round_id: Option<Uuid>,
    /// Calendar date (`YYYY-MM-DD`) the round was started on.
    #[serde(default)]
    pub date: Option<String>,
    /// Number of holes in the round (9 or 18).
    #[serde(default)]
    pub holes_count: Option<u32>,
    /// Alias of `currentIndex` kept for older readers.
    #[serde(default)]
    pub hole_index: Option<usize>,
    /// Index of the hole currently displayed.
    #[serde(default)]
    pub current_index: Option<usize>,
    /// Per-hole scoring.
    #[serde(default)]
    pub holes: Vec<HoleEntity>,
    /// Course name, if entered.
    #[serde(default)]
    pub course: Option<String>,
    /// `"stats"` or `"simple"`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Milliseconds since the Unix epoch when the round started.
    #[serde(default)]
    pub started_at: Option<i64>,
    /// Weather observed at round start.
    #[serde(default)]
    pub weather: Option<WeatherEntity>,
    /// Milliseconds since the Unix epoch of the last write.
    #[serde(default)]
    pub updated_at: i64,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    /// Whether the draft was written less than `max_age_ms` before `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, max_age_ms: i64) -> bool {
        now_ms.saturating_sub(self.updated_at) < max_age_ms
    }
}

/// Hole as stored in a draft; stat fields are absent for simple rounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoleEntity {
    pub number: u32,
    #[serde(default)]
    pub strokes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fairway_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_in_reg: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalties: Option<u32>,
}

/// Weather observation; every field is independently nullable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherEntity {
    pub temp_c: Option<f64>,
    pub wind_mps: Option<f64>,
    pub code: Option<i64>,
    pub desc: Option<String>,
    pub time: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Payload handed to the ledger when a round is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoundEntity {
    pub date: String,
    pub holes_count: u32,
    pub holes: Vec<HoleRecordEntity>,
    pub course: Option<String>,
    pub weather: Option<WeatherEntity>,
}

/// One per-hole detail row of a finalized round.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoleRecordEntity {
    pub number: u32,
    pub strokes: u32,
    pub putts: u32,
    pub fairway_hit: bool,
    pub green_in_reg: bool,
    pub penalties: u32,
}

/// Identity and derived total returned by a successful ledger append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedRound {
    /// Store-assigned identifier.
    pub id: i64,
    /// Sum of the persisted hole strokes.
    pub total_strokes: u32,
}

/// Header row of a finalized round, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummaryEntity {
    pub id: i64,
    pub date: String,
    pub holes_count: u32,
    pub total_strokes: u32,
    pub course: Option<String>,
}

/// Finalized round with its weather and ordered hole rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundDetailsEntity {
    pub id: i64,
    pub date: String,
    pub holes_count: u32,
    pub total_strokes: u32,
    pub course: Option<String>,
    pub weather: WeatherEntity,
    /// Ordered by hole number.
    pub holes: Vec<HoleRecordEntity>,
}

impl RoundDetailsEntity {
    /// Recompute the stroke total from the hole rows.
    pub fn hole_strokes_sum(&self) -> u64 {
        self.holes.iter().map(|hole| u64::from(hole.strokes)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_snapshot_deserializes_with_defaults() {
        let raw = r#"{"holes":[{"number":1,"strokes":3},{"number":2}]}"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.round_id, None);
        assert_eq!(snapshot.holes.len(), 2);
        assert_eq!(snapshot.holes[1].strokes, 0);
        assert_eq!(snapshot.updated_at, 0);
    }

    #[test]
    fn simple_holes_serialize_without_stat_fields() {
        let hole = HoleEntity {
            number: 4,
            strokes: 5,
            putts: None,
            fairway_hit: None,
            green_in_reg: None,
            penalties: None,
        };
        let json = serde_json::to_value(&hole).unwrap();
        assert_eq!(json, serde_json::json!({"number": 4, "strokes": 5}));
    }

    #[test]
    fn freshness_window_is_exclusive() {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            round_id: None,
            date: None,
            holes_count: None,
            hole_index: None,
            current_index: None,
            holes: Vec::new(),
            course: None,
            mode: None,
            started_at: None,
            weather: None,
            updated_at: 1_000,
        };
        assert!(snapshot.is_fresh(1_999, 1_000));
        assert!(!snapshot.is_fresh(2_000, 1_000));
    }
}
