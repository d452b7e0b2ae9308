use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{HoleRecordEntity, RoundDetailsEntity},
    dto::validation::{validate_course_name, validate_holes_count},
    state::round::RoundMode,
};

/// Input collected before a round starts.
#[derive(Debug, Clone, Deserialize)]
pub struct StartRoundRequest {
    pub holes_count: u32,
    #[serde(default)]
    pub course: Option<String>,
    /// Track putts, fairways, greens in regulation and penalties.
    #[serde(default)]
    pub with_stats: bool,
    /// Look up the current weather once and attach it to the round.
    #[serde(default)]
    pub include_weather: bool,
    /// Where the round is played; required for the weather lookup.
    #[serde(default)]
    pub location: Option<CoordinatesInput>,
}

impl StartRoundRequest {
    pub fn mode(&self) -> RoundMode {
        if self.with_stats {
            RoundMode::Stats
        } else {
            RoundMode::Simple
        }
    }
}

impl Validate for StartRoundRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_holes_count(self.holes_count) {
            errors.add("holes_count", e);
        }

        // An empty string means no course was entered.
        if let Some(ref course) = self.course {
            if !course.is_empty() {
                if let Err(e) = validate_course_name(course) {
                    errors.add("course", e);
                }
            }
        }

        if let Some(ref location) = self.location {
            if let Err(location_errors) = location.validate() {
                errors.merge_self("location", Err(location_errors));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct CoordinatesInput {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// Aggregates shown on a finished round's summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundStatsView {
    pub holes_played: u32,
    pub total_strokes: u32,
    pub total_putts: u32,
    pub fairways_hit: u32,
    pub greens_in_reg: u32,
    pub total_penalties: u32,
}

impl From<&RoundDetailsEntity> for RoundStatsView {
    fn from(round: &RoundDetailsEntity) -> Self {
        let sum = |field: fn(&HoleRecordEntity) -> u32| {
            round
                .holes
                .iter()
                .map(field)
                .fold(0u32, u32::saturating_add)
        };
        Self {
            holes_played: round.holes_count,
            total_strokes: round.total_strokes,
            total_putts: sum(|hole| hole.putts),
            fairways_hit: sum(|hole| u32::from(hole.fairway_hit)),
            greens_in_reg: sum(|hole| u32::from(hole.green_in_reg)),
            total_penalties: sum(|hole| hole.penalties),
        }
    }
}

/// A finished round together with its derived stats.
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round: RoundDetailsEntity,
    pub stats: RoundStatsView,
}

impl From<RoundDetailsEntity> for RoundReport {
    fn from(round: RoundDetailsEntity) -> Self {
        let stats = RoundStatsView::from(&round);
        Self { round, stats }
    }
}
