use std::time::Duration;

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::{
        draft_store::DraftStore,
        models::{RoundSummaryEntity, Snapshot},
        round_ledger::RoundLedger,
    },
    dto::round::{RoundReport, StartRoundRequest},
    error::ServiceError,
    services::weather_service::WeatherProvider,
    state::{
        RoundManager,
        round::{ActiveRound, RoundExtras, Weather},
        snapshot::{from_snapshot, now_millis},
    },
};

/// Drafts older than this are not offered for resume.
pub const DEFAULT_DRAFT_MAX_AGE: Duration = Duration::from_secs(72 * 60 * 60);

/// Validate the request, look the weather up once when asked to, and start the round.
///
/// A failed weather lookup never blocks the round; it starts without weather.
pub async fn start_round(
    manager: &RoundManager,
    request: StartRoundRequest,
    weather: Option<&dyn WeatherProvider>,
) -> Result<ActiveRound, ServiceError> {
    request.validate()?;

    let observed = match (request.include_weather, request.location, weather) {
        (true, Some(location), Some(provider)) => {
            fetch_weather(provider, location.latitude, location.longitude).await
        }
        (true, None, _) => {
            warn!("weather requested without a location; continuing without weather");
            None
        }
        _ => None,
    };

    let mode = request.mode();
    let extras = RoundExtras {
        course: request
            .course
            .map(|course| course.trim().to_owned())
            .filter(|course| !course.is_empty()),
        mode: Some(mode),
        started_at: Some(now_millis()),
        weather: observed,
    };
    manager.start_round(request.holes_count, extras)
}

async fn fetch_weather(
    provider: &dyn WeatherProvider,
    latitude: f64,
    longitude: f64,
) -> Option<Weather> {
    match provider.current_weather(latitude, longitude).await {
        Ok(weather) => Some(weather),
        Err(err) => {
            warn!(error = %err, "weather lookup failed; continuing without weather");
            None
        }
    }
}

/// Load the draft if it is fresh enough to offer for resume.
///
/// Storage failures and drafts that cannot form a round degrade to `None`.
/// Stale drafts are left in place.
pub async fn resumable_draft(drafts: &dyn DraftStore, max_age: Duration) -> Option<Snapshot> {
    let snapshot = match drafts.load().await {
        Ok(snapshot) => snapshot?,
        Err(err) => {
            warn!(error = %err, "draft load failed; no resume offered");
            return None;
        }
    };

    if let Err(err) = from_snapshot(&snapshot) {
        warn!(round_id = ?snapshot.round_id, error = %err, "draft cannot be resumed; ignoring it");
        return None;
    }

    let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
    if snapshot.is_fresh(now_millis(), max_age_ms) {
        Some(snapshot)
    } else {
        info!(
            round_id = ?snapshot.round_id,
            updated_at = snapshot.updated_at,
            "draft is stale; not offering resume"
        );
        None
    }
}

/// Resume the fresh draft, if any, into the manager.
pub async fn resume_draft(
    manager: &RoundManager,
    drafts: &dyn DraftStore,
    max_age: Duration,
) -> Result<Option<ActiveRound>, ServiceError> {
    let Some(snapshot) = resumable_draft(drafts, max_age).await else {
        return Ok(None);
    };
    manager.hydrate_from_snapshot(&snapshot).map(Some)
}

/// Throw the saved draft away.
pub async fn discard_draft(drafts: &dyn DraftStore) -> Result<(), ServiceError> {
    drafts.clear().await?;
    info!("draft discarded");
    Ok(())
}

/// Most recent finalized rounds, newest first.
pub async fn recent_rounds(
    ledger: &dyn RoundLedger,
    limit: usize,
) -> Result<Vec<RoundSummaryEntity>, ServiceError> {
    let mut rounds = ledger.list().await?;
    rounds.truncate(limit);
    Ok(rounds)
}

/// Finished round with its hole rows and derived stats.
pub async fn round_report(ledger: &dyn RoundLedger, id: i64) -> Result<RoundReport, ServiceError> {
    let details = ledger.get_details(id).await?;
    Ok(details.into())
}

/// Delete a finished round and its hole rows.
pub async fn delete_round(ledger: &dyn RoundLedger, id: i64) -> Result<(), ServiceError> {
    ledger.remove(id).await?;
    Ok(())
}
