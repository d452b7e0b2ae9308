use uuid::Uuid;

use crate::dao::models::{HoleEntity, HoleRecordEntity, NewRoundEntity, WeatherEntity};

/// Hole counts a round may be started with.
pub const SUPPORTED_HOLE_COUNTS: [u32; 2] = [9, 18];

/// Upper bound for strokes, putts and penalties on a single hole.
pub const MAX_PER_HOLE: u32 = 99;

/// How much detail is tracked per hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    /// Strokes plus putts, fairway, green in regulation and penalties.
    Stats,
    /// Strokes only.
    Simple,
}

impl RoundMode {
    /// Persisted spelling of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundMode::Stats => "stats",
            RoundMode::Simple => "simple",
        }
    }

    /// Parse the persisted spelling; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stats" => Some(RoundMode::Stats),
            "simple" => Some(RoundMode::Simple),
            _ => None,
        }
    }
}

/// Scoring for one hole. Stat fields exist only for rounds played in stats mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hole {
    /// Strokes only.
    Simple { number: u32, strokes: u32 },
    /// Strokes with the per-hole stats.
    WithStats {
        number: u32,
        strokes: u32,
        putts: u32,
        fairway_hit: bool,
        green_in_reg: bool,
        penalties: u32,
    },
}

impl Hole {
    /// Unplayed hole for the given mode.
    pub fn blank(number: u32, mode: Option<RoundMode>) -> Self {
        match mode {
            Some(RoundMode::Stats) => Hole::WithStats {
                number,
                strokes: 0,
                putts: 0,
                fairway_hit: false,
                green_in_reg: false,
                penalties: 0,
            },
            _ => Hole::Simple { number, strokes: 0 },
        }
    }

    /// Hole number, starting at 1.
    pub fn number(&self) -> u32 {
        match *self {
            Hole::Simple { number, .. } | Hole::WithStats { number, .. } => number,
        }
    }

    /// Strokes played on the hole.
    pub fn strokes(&self) -> u32 {
        match *self {
            Hole::Simple { strokes, .. } | Hole::WithStats { strokes, .. } => strokes,
        }
    }

    /// Putts, for stats holes.
    pub fn putts(&self) -> Option<u32> {
        match *self {
            Hole::WithStats { putts, .. } => Some(putts),
            Hole::Simple { .. } => None,
        }
    }

    /// Fairway hit, for stats holes.
    pub fn fairway_hit(&self) -> Option<bool> {
        match *self {
            Hole::WithStats { fairway_hit, .. } => Some(fairway_hit),
            Hole::Simple { .. } => None,
        }
    }

    /// Green in regulation, for stats holes.
    pub fn green_in_reg(&self) -> Option<bool> {
        match *self {
            Hole::WithStats { green_in_reg, .. } => Some(green_in_reg),
            Hole::Simple { .. } => None,
        }
    }

    /// Penalty strokes, for stats holes.
    pub fn penalties(&self) -> Option<u32> {
        match *self {
            Hole::WithStats { penalties, .. } => Some(penalties),
            Hole::Simple { .. } => None,
        }
    }

    fn with_strokes(self, value: u32) -> Self {
        let mut hole = self;
        match &mut hole {
            Hole::Simple { strokes, .. } | Hole::WithStats { strokes, .. } => *strokes = value,
        }
        hole
    }

    /// Apply `edit` to the stat fields; simple holes are returned unchanged.
    fn edit_stats(self, edit: impl FnOnce(&mut u32, &mut bool, &mut bool, &mut u32)) -> Self {
        let mut hole = self;
        if let Hole::WithStats {
            putts,
            fairway_hit,
            green_in_reg,
            penalties,
            ..
        } = &mut hole
        {
            edit(putts, fairway_hit, green_in_reg, penalties);
        }
        hole
    }
}

impl From<HoleEntity> for Hole {
    fn from(entity: HoleEntity) -> Self {
        let has_stats = entity.putts.is_some()
            || entity.fairway_hit.is_some()
            || entity.green_in_reg.is_some()
            || entity.penalties.is_some();
        let strokes = entity.strokes.min(MAX_PER_HOLE);
        if has_stats {
            Hole::WithStats {
                number: entity.number,
                strokes,
                putts: entity.putts.unwrap_or_default().min(MAX_PER_HOLE),
                fairway_hit: entity.fairway_hit.unwrap_or_default(),
                green_in_reg: entity.green_in_reg.unwrap_or_default(),
                penalties: entity.penalties.unwrap_or_default().min(MAX_PER_HOLE),
            }
        } else {
            Hole::Simple {
                number: entity.number,
                strokes,
            }
        }
    }
}

impl From<Hole> for HoleEntity {
    fn from(hole: Hole) -> Self {
        HoleEntity {
            number: hole.number(),
            strokes: hole.strokes(),
            putts: hole.putts(),
            fairway_hit: hole.fairway_hit(),
            green_in_reg: hole.green_in_reg(),
            penalties: hole.penalties(),
        }
    }
}

impl From<Hole> for HoleRecordEntity {
    fn from(hole: Hole) -> Self {
        HoleRecordEntity {
            number: hole.number(),
            strokes: hole.strokes(),
            putts: hole.putts().unwrap_or_default(),
            fairway_hit: hole.fairway_hit().unwrap_or_default(),
            green_in_reg: hole.green_in_reg().unwrap_or_default(),
            penalties: hole.penalties().unwrap_or_default(),
        }
    }
}

/// Weather observed when the round started.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weather {
    pub temperature_c: Option<f64>,
    pub wind_mps: Option<f64>,
    /// WMO weather interpretation code.
    pub code: Option<i64>,
    pub description: Option<String>,
    /// Observation time as reported by the provider.
    pub observed_at: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<WeatherEntity> for Weather {
    fn from(value: WeatherEntity) -> Self {
        Self {
            temperature_c: value.temp_c,
            wind_mps: value.wind_mps,
            code: value.code,
            description: value.desc,
            observed_at: value.time,
            latitude: value.lat,
            longitude: value.lon,
        }
    }
}

impl From<Weather> for WeatherEntity {
    fn from(value: Weather) -> Self {
        Self {
            temp_c: value.temperature_c,
            wind_mps: value.wind_mps,
            code: value.code,
            desc: value.description,
            time: value.observed_at,
            lat: value.latitude,
            lon: value.longitude,
        }
    }
}

/// Optional metadata supplied when starting a round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundExtras {
    pub course: Option<String>,
    pub mode: Option<RoundMode>,
    /// Milliseconds since the Unix epoch.
    pub started_at: Option<i64>,
    pub weather: Option<Weather>,
}

/// The single round in progress. Every transform returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRound {
    pub round_id: Uuid,
    /// Calendar date (`YYYY-MM-DD`).
    pub date: String,
    pub holes_count: u32,
    /// Ordered by number, contiguous from 1.
    pub holes: Vec<Hole>,
    /// Always a valid index into `holes`.
    pub current_index: usize,
    pub course: Option<String>,
    pub mode: Option<RoundMode>,
    pub started_at: Option<i64>,
    pub weather: Option<Weather>,
}

impl ActiveRound {
    /// Build a fresh round with `holes_count` unplayed holes.
    pub fn new(round_id: Uuid, date: String, holes_count: u32, extras: RoundExtras) -> Self {
        let holes = (1..=holes_count)
            .map(|number| Hole::blank(number, extras.mode))
            .collect();
        Self {
            round_id,
            date,
            holes_count,
            holes,
            current_index: 0,
            course: extras.course,
            mode: extras.mode,
            started_at: extras.started_at,
            weather: extras.weather,
        }
    }

    /// Hole currently displayed.
    pub fn current_hole(&self) -> Option<&Hole> {
        self.holes.get(self.current_index)
    }

    /// Sum of strokes over all holes.
    pub fn total_strokes(&self) -> u32 {
        self.holes.iter().map(Hole::strokes).sum()
    }

    fn map_hole(&self, number: u32, edit: impl FnOnce(Hole) -> Hole) -> Self {
        let mut next = self.clone();
        if let Some(hole) = next.holes.iter_mut().find(|hole| hole.number() == number) {
            *hole = edit(*hole);
        }
        next
    }

    /// Set strokes on hole `number`, clamped to `0..=MAX_PER_HOLE`.
    pub fn with_strokes(&self, number: u32, strokes: i64) -> Self {
        let strokes = clamp_count(strokes);
        self.map_hole(number, |hole| hole.with_strokes(strokes))
    }

    /// Set putts on a stats hole.
    pub fn with_putts(&self, number: u32, value: i64) -> Self {
        let value = clamp_count(value);
        self.map_hole(number, |hole| {
            hole.edit_stats(|putts, _, _, _| *putts = value)
        })
    }

    /// Set penalties on a stats hole.
    pub fn with_penalties(&self, number: u32, value: i64) -> Self {
        let value = clamp_count(value);
        self.map_hole(number, |hole| {
            hole.edit_stats(|_, _, _, penalties| *penalties = value)
        })
    }

    /// Flip fairway hit on a stats hole.
    pub fn with_fairway_toggled(&self, number: u32) -> Self {
        self.map_hole(number, |hole| {
            hole.edit_stats(|_, fairway_hit, _, _| *fairway_hit = !*fairway_hit)
        })
    }

    /// Flip green in regulation on a stats hole.
    pub fn with_green_in_reg_toggled(&self, number: u32) -> Self {
        self.map_hole(number, |hole| {
            hole.edit_stats(|_, _, green_in_reg, _| *green_in_reg = !*green_in_reg)
        })
    }

    /// Advance one hole; stays put on the last hole.
    pub fn next_hole(&self) -> Self {
        let last = self.holes.len().saturating_sub(1);
        Self {
            current_index: (self.current_index + 1).min(last),
            ..self.clone()
        }
    }

    /// Go back one hole; stays put on the first hole.
    pub fn prev_hole(&self) -> Self {
        Self {
            current_index: self.current_index.saturating_sub(1),
            ..self.clone()
        }
    }

    /// Payload written to the ledger on finalize.
    pub fn to_new_round(&self) -> NewRoundEntity {
        NewRoundEntity {
            date: self.date.clone(),
            holes_count: self.holes_count,
            holes: self.holes.iter().copied().map(Into::into).collect(),
            course: self.course.clone(),
            weather: self.weather.clone().map(Into::into),
        }
    }
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(MAX_PER_HOLE)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(holes: u32, mode: Option<RoundMode>) -> ActiveRound {
        ActiveRound::new(
            Uuid::new_v4(),
            "2025-06-01".into(),
            holes,
            RoundExtras {
                mode,
                ..RoundExtras::default()
            },
        )
    }

    #[test]
    fn simple_round_has_numbered_holes_without_stats() {
        let round = round(9, Some(RoundMode::Simple));
        assert_eq!(round.holes.len(), 9);
        for (index, hole) in round.holes.iter().enumerate() {
            assert_eq!(hole.number(), index as u32 + 1);
            assert_eq!(hole.strokes(), 0);
            assert_eq!(hole.putts(), None);
            assert_eq!(hole.fairway_hit(), None);
        }
    }

    #[test]
    fn stats_round_initializes_stat_fields() {
        let round = round(18, Some(RoundMode::Stats));
        assert_eq!(round.holes.len(), 18);
        assert!(round.holes.iter().all(|hole| {
            hole.putts() == Some(0)
                && hole.fairway_hit() == Some(false)
                && hole.green_in_reg() == Some(false)
                && hole.penalties() == Some(0)
        }));
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        let round = round(9, Some(RoundMode::Stats))
            .with_strokes(1, -3)
            .with_putts(1, -1)
            .with_penalties(1, -7);
        let hole = round.holes[0];
        assert_eq!(hole.strokes(), 0);
        assert_eq!(hole.putts(), Some(0));
        assert_eq!(hole.penalties(), Some(0));
    }

    #[test]
    fn huge_values_clamp_to_the_hole_maximum() {
        let round = round(18, Some(RoundMode::Stats))
            .with_strokes(1, i64::MAX)
            .with_strokes(2, 5)
            .with_putts(1, i64::MAX)
            .with_penalties(1, 1_000);
        let hole = round.holes[0];
        assert_eq!(hole.strokes(), MAX_PER_HOLE);
        assert_eq!(hole.putts(), Some(MAX_PER_HOLE));
        assert_eq!(hole.penalties(), Some(MAX_PER_HOLE));
        assert_eq!(round.total_strokes(), MAX_PER_HOLE + 5);
    }

    #[test]
    fn decoded_counts_are_clamped() {
        let hole: Hole = HoleEntity {
            number: 1,
            strokes: u32::MAX,
            putts: Some(u32::MAX),
            fairway_hit: None,
            green_in_reg: None,
            penalties: None,
        }
        .into();
        assert_eq!(hole.strokes(), MAX_PER_HOLE);
        assert_eq!(hole.putts(), Some(MAX_PER_HOLE));
    }

    #[test]
    fn setters_only_touch_the_addressed_hole() {
        let before = round(9, None);
        let after = before.with_strokes(3, 6);
        assert_eq!(after.holes[2].strokes(), 6);
        assert_eq!(after.total_strokes(), 6);
        assert_eq!(before.total_strokes(), 0);
        assert_eq!(before.with_strokes(42, 6), before);
    }

    #[test]
    fn stat_edits_are_ignored_on_simple_holes() {
        let before = round(9, Some(RoundMode::Simple));
        assert_eq!(before.with_putts(1, 2), before);
        assert_eq!(before.with_fairway_toggled(1), before);
        assert_eq!(before.with_green_in_reg_toggled(1), before);
    }

    #[test]
    fn toggles_flip_in_place() {
        let round = round(9, Some(RoundMode::Stats)).with_fairway_toggled(2);
        assert_eq!(round.holes[1].fairway_hit(), Some(true));
        let round = round.with_fairway_toggled(2).with_green_in_reg_toggled(2);
        assert_eq!(round.holes[1].fairway_hit(), Some(false));
        assert_eq!(round.holes[1].green_in_reg(), Some(true));
    }

    #[test]
    fn navigation_is_clamped_at_both_ends() {
        let start = round(9, None);
        assert_eq!(start.prev_hole(), start);

        let mut last = start.clone();
        for _ in 0..20 {
            last = last.next_hole();
            assert!(last.current_index < last.holes.len());
        }
        assert_eq!(last.current_index, 8);
        assert_eq!(last.next_hole(), last);
    }

    #[test]
    fn partial_stat_entity_becomes_stats_hole_with_defaults() {
        let hole: Hole = HoleEntity {
            number: 3,
            strokes: 4,
            putts: Some(2),
            fairway_hit: None,
            green_in_reg: None,
            penalties: None,
        }
        .into();
        assert_eq!(
            hole,
            Hole::WithStats {
                number: 3,
                strokes: 4,
                putts: 2,
                fairway_hit: false,
                green_in_reg: false,
                penalties: 0,
            }
        );
    }

    #[test]
    fn finalize_payload_defaults_missing_stats() {
        let payload = round(9, None).with_strokes(1, 4).to_new_round();
        assert_eq!(payload.holes.len(), 9);
        assert_eq!(payload.holes[0].strokes, 4);
        assert_eq!(payload.holes[0].putts, 0);
        assert!(!payload.holes[0].fairway_hit);
    }
}
