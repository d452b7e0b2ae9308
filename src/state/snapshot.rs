//! Conversion between the live round and its persisted draft snapshot.
//!
//! Both directions are pure. Decoding fills whatever an older or partially
//! written draft is missing, and rejects drafts that cannot form a 9 or 18
//! hole round.

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::models::{SNAPSHOT_VERSION, Snapshot},
    state::round::{ActiveRound, Hole, RoundMode, SUPPORTED_HOLE_COUNTS},
};

/// Hole count assumed when a draft carries neither holes nor a count.
const FALLBACK_HOLES_COUNT: u32 = 9;

/// A draft that cannot be turned into a live round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidSnapshot {
    /// The hole count is not one a round can be played with.
    #[error("draft has {0} holes; a round has 9 or 18")]
    HolesCount(u32),
    /// A hole number falls outside `1..=holes_count`.
    #[error("draft hole {0} is out of range")]
    HoleNumber(u32),
    /// The same hole number appears twice.
    #[error("draft lists hole {0} twice")]
    DuplicateHole(u32),
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Today's UTC calendar date as `YYYY-MM-DD`.
pub fn today() -> String {
    OffsetDateTime::now_utc().date().to_string()
}

/// Project the live round into a snapshot stamped with the current time.
pub fn to_snapshot(round: &ActiveRound) -> Snapshot {
    Snapshot {
        version: SNAPSHOT_VERSION,
        round_id: Some(round.round_id),
        date: Some(round.date.clone()),
        holes_count: Some(round.holes_count),
        hole_index: Some(round.current_index),
        current_index: Some(round.current_index),
        holes: round.holes.iter().copied().map(Into::into).collect(),
        course: round.course.clone(),
        mode: round.mode.map(|mode| mode.as_str().to_owned()),
        started_at: Some(round.started_at.unwrap_or_else(now_millis)),
        weather: round.weather.clone().map(Into::into),
        updated_at: now_millis(),
    }
}

/// Rebuild a live round from a snapshot, keeping its round id.
///
/// Holes missing from the draft are filled in blank. The hole count comes from
/// `holesCount`, else the length of the hole list.
pub fn from_snapshot(snapshot: &Snapshot) -> Result<ActiveRound, InvalidSnapshot> {
    let mode = snapshot.mode.as_deref().and_then(RoundMode::parse);

    let holes_count = match snapshot.holes_count {
        Some(count) => count,
        None if snapshot.holes.is_empty() => FALLBACK_HOLES_COUNT,
        None => u32::try_from(snapshot.holes.len()).unwrap_or(u32::MAX),
    };
    if !SUPPORTED_HOLE_COUNTS.contains(&holes_count) {
        return Err(InvalidSnapshot::HolesCount(holes_count));
    }

    let mut slots: Vec<Option<Hole>> = vec![None; holes_count as usize];
    for entity in &snapshot.holes {
        let number = entity.number;
        let slot = number
            .checked_sub(1)
            .and_then(|index| slots.get_mut(index as usize))
            .ok_or(InvalidSnapshot::HoleNumber(number))?;
        if slot.is_some() {
            return Err(InvalidSnapshot::DuplicateHole(number));
        }
        *slot = Some(entity.clone().into());
    }
    let holes: Vec<Hole> = slots
        .into_iter()
        .zip(1..)
        .map(|(hole, number)| hole.unwrap_or_else(|| Hole::blank(number, mode)))
        .collect();

    let last = holes.len() - 1;
    let current_index = snapshot
        .current_index
        .or(snapshot.hole_index)
        .unwrap_or(0)
        .min(last);

    Ok(ActiveRound {
        round_id: snapshot.round_id.unwrap_or_else(Uuid::new_v4),
        date: snapshot.date.clone().unwrap_or_else(today),
        holes_count,
        holes,
        current_index,
        course: snapshot.course.clone(),
        mode,
        started_at: Some(snapshot.started_at.unwrap_or_else(now_millis)),
        weather: snapshot.weather.clone().map(Into::into),
    })
}
