mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use common::Harness;
use fairplay_core::{
    dto::round::{CoordinatesInput, StartRoundRequest},
    error::ServiceError,
    services::{
        round_service,
        weather_service::{WeatherError, WeatherProvider},
    },
    state::{RoundMode, RoundPhase, Weather},
};
use futures::future::BoxFuture;

struct FixedWeather {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl WeatherProvider for FixedWeather {
    fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> BoxFuture<'static, Result<Weather, WeatherError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                return Err(WeatherError::Status(503));
            }
            Ok(Weather {
                temperature_c: Some(21.0),
                code: Some(0),
                description: Some("Clear".into()),
                latitude: Some(latitude),
                longitude: Some(longitude),
                ..Weather::default()
            })
        })
    }
}

fn provider(fail: bool) -> (FixedWeather, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (
        FixedWeather {
            calls: Arc::clone(&calls),
            fail,
        },
        calls,
    )
}

fn request() -> StartRoundRequest {
    StartRoundRequest {
        holes_count: 18,
        course: Some("  Seaside Links ".into()),
        with_stats: true,
        include_weather: true,
        location: Some(CoordinatesInput {
            latitude: 55.6,
            longitude: 12.6,
        }),
    }
}

#[tokio::test(start_paused = true)]
async fn weather_is_looked_up_once_and_attached() {
    let h = Harness::new();
    let (weather, calls) = provider(false);

    let round = round_service::start_round(&h.manager, request(), Some(&weather))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(round.mode, Some(RoundMode::Stats));
    assert_eq!(round.course.as_deref(), Some("Seaside Links"));
    assert!(round.started_at.is_some());
    let observed = round.weather.unwrap();
    assert_eq!(observed.description.as_deref(), Some("Clear"));
    assert_eq!(observed.latitude, Some(55.6));
}

#[tokio::test(start_paused = true)]
async fn failed_weather_lookup_still_starts_the_round() {
    let h = Harness::new();
    let (weather, calls) = provider(true);

    let round = round_service::start_round(&h.manager, request(), Some(&weather))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(round.weather.is_none());
    assert_eq!(h.manager.phase(), RoundPhase::Active);
}

#[tokio::test(start_paused = true)]
async fn weather_is_skipped_when_not_requested() {
    let h = Harness::new();
    let (weather, calls) = provider(false);
    let mut req = request();
    req.include_weather = false;

    let round = round_service::start_round(&h.manager, req, Some(&weather))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(round.weather.is_none());
}

#[tokio::test(start_paused = true)]
async fn invalid_request_starts_nothing() {
    let h = Harness::new();
    let mut req = request();
    req.holes_count = 27;

    let err = round_service::start_round(&h.manager, req, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(h.manager.phase(), RoundPhase::Empty);
}

#[tokio::test(start_paused = true)]
async fn blank_course_is_dropped() {
    let h = Harness::new();
    let mut req = request();
    req.course = Some(String::new());
    req.include_weather = false;

    let round = round_service::start_round(&h.manager, req, None)
        .await
        .unwrap();
    assert!(round.course.is_none());
}

#[tokio::test(start_paused = true)]
async fn recent_rounds_are_truncated_and_ids_resolve() {
    let h = Harness::new();
    for _ in 0..3 {
        h.manager
            .start_round(9, Default::default())
            .unwrap();
        h.manager.set_stroke_for_hole(1, 5);
        h.manager.end_round().await.unwrap();
    }

    let recent = round_service::recent_rounds(&h.ledger, 2).await.unwrap();
    assert_eq!(recent.len(), 2);

    let report = round_service::round_report(&h.ledger, recent[0].id)
        .await
        .unwrap();
    assert_eq!(report.stats.total_strokes, 5);

    assert!(matches!(
        round_service::delete_round(&h.ledger, 999).await,
        Err(ServiceError::NotFound(_))
    ));
}
