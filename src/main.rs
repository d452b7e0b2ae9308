//! `fairplay` binary: a line-oriented scorecard driving the round manager over
//! a local SQLite database.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use fairplay_core::{
    config::{AppConfig, WeatherConfig},
    dao::{draft_store::DraftStore, round_ledger::RoundLedger, sqlite::SqliteDatabase},
    dto::round::RoundReport,
    error::ServiceError,
    services::{round_service, weather_service::WeatherProvider},
    state::{
        ActiveRound, Hole, RoundManager, SaveOutcome, SharedRoundManager,
        scheduler::TokioScheduler,
    },
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let database = SqliteDatabase::open(&config.database_path).with_context(|| {
        format!("opening database {}", config.database_path.display())
    })?;
    let drafts: Arc<dyn DraftStore> = Arc::new(database.draft_store());
    let ledger: Arc<dyn RoundLedger> = Arc::new(database.round_ledger());
    let scheduler = TokioScheduler::current().context("binding autosave to the runtime")?;

    let app = App {
        manager: RoundManager::new(
            Arc::clone(&drafts),
            Arc::clone(&ledger),
            Arc::new(scheduler),
            config.autosave_delay,
        ),
        drafts,
        ledger,
        weather: build_weather_provider(&config.weather),
        draft_max_age: config.draft_max_age,
    };

    app.offer_resume().await;
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                interrupted = true;
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match cli::parse_line(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => app.execute(command).await,
                    Ok(None) => {}
                    Err(message) => println!("{message}"),
                }
            }
        }
    }

    match app.manager.shutdown().await {
        SaveOutcome::Saved => info!("draft saved on exit"),
        SaveOutcome::Skipped(reason) => info!(?reason, "no draft written on exit"),
        SaveOutcome::Failed(err) => warn!(error = %err, "draft could not be saved on exit"),
    }
    if interrupted {
        // The blocked stdin reader would keep the runtime alive until the next line.
        std::process::exit(0);
    }
    Ok(())
}

struct App {
    manager: SharedRoundManager,
    drafts: Arc<dyn DraftStore>,
    ledger: Arc<dyn RoundLedger>,
    weather: Option<Arc<dyn WeatherProvider>>,
    draft_max_age: Duration,
}

impl App {
    async fn offer_resume(&self) {
        if let Some(snapshot) =
            round_service::resumable_draft(self.drafts.as_ref(), self.draft_max_age).await
        {
            println!(
                "A round from {} ({} holes) was not finished. Type `resume` or `discard`.",
                snapshot.date.as_deref().unwrap_or("an earlier day"),
                snapshot.holes_count.unwrap_or(snapshot.holes.len() as u32),
            );
        }
    }

    async fn execute(&self, command: Command) {
        if let Err(err) = self.dispatch(command).await {
            println!("error: {err}");
        }
    }

    async fn dispatch(&self, command: Command) -> Result<(), ServiceError> {
        match command {
            Command::Help => println!("{}", cli::build_help()),
            Command::Start(request) => {
                let round =
                    round_service::start_round(&self.manager, request, self.weather.as_deref())
                        .await?;
                print_round(&round);
            }
            Command::Stroke { hole, value } => self.edit(hole, |manager, number| {
                manager.set_stroke_for_hole(number, value)
            }),
            Command::Putts { hole, value } => self.edit(hole, |manager, number| {
                manager.set_putts_for_hole(number, value)
            }),
            Command::Penalties { hole, value } => self.edit(hole, |manager, number| {
                manager.set_penalties_for_hole(number, value)
            }),
            Command::Fairway { hole } => {
                self.edit(hole, |manager, number| manager.toggle_fairway_hit(number))
            }
            Command::Gir { hole } => {
                self.edit(hole, |manager, number| manager.toggle_green_in_reg(number))
            }
            Command::Next => print_current(self.manager.next_hole()),
            Command::Prev => print_current(self.manager.prev_hole()),
            Command::Show => match self.manager.current() {
                Some(round) => print_round(&round),
                None => println!("No round in progress."),
            },
            Command::End => match self.manager.end_round().await? {
                Some(saved) => println!(
                    "Saved round #{} with {} strokes.",
                    saved.id, saved.total_strokes
                ),
                None => println!("No round in progress."),
            },
            Command::Resume => {
                match round_service::resume_draft(
                    &self.manager,
                    self.drafts.as_ref(),
                    self.draft_max_age,
                )
                .await?
                {
                    Some(round) => print_round(&round),
                    None => println!("No recent draft to resume."),
                }
            }
            Command::Discard => {
                round_service::discard_draft(self.drafts.as_ref()).await?;
                println!("Draft discarded.");
            }
            Command::Rounds { limit } => {
                let rounds = round_service::recent_rounds(self.ledger.as_ref(), limit).await?;
                if rounds.is_empty() {
                    println!("No finished rounds yet.");
                }
                for round in rounds {
                    println!(
                        "#{:<4} {}  {:>2} holes  {:>3} strokes  {}",
                        round.id,
                        round.date,
                        round.holes_count,
                        round.total_strokes,
                        round.course.as_deref().unwrap_or("-"),
                    );
                }
            }
            Command::Round { id } => {
                let report = round_service::round_report(self.ledger.as_ref(), id).await?;
                print_report(&report);
            }
            Command::Delete { id } => {
                round_service::delete_round(self.ledger.as_ref(), id).await?;
                println!("Deleted round #{id}.");
            }
            Command::Quit => {}
        }
        Ok(())
    }

    /// Apply a per-hole edit, defaulting to the hole currently displayed.
    fn edit(
        &self,
        hole: Option<u32>,
        apply: impl FnOnce(&RoundManager, u32) -> Option<ActiveRound>,
    ) {
        let number = hole.or_else(|| {
            self.manager
                .current()
                .and_then(|round| round.current_hole().map(Hole::number))
        });
        match number {
            Some(number) => print_current(apply(self.manager.as_ref(), number)),
            None => println!("No round in progress."),
        }
    }
}

fn print_current(round: Option<ActiveRound>) {
    let Some(round) = round else {
        println!("No round in progress.");
        return;
    };
    if let Some(hole) = round.current_hole() {
        println!(
            "Hole {}/{}: {}  (total {})",
            hole.number(),
            round.holes_count,
            describe_hole(hole),
            round.total_strokes()
        );
    }
}

fn print_round(round: &ActiveRound) {
    println!(
        "{}  {} holes  {}  total {}",
        round.date,
        round.holes_count,
        round.course.as_deref().unwrap_or("-"),
        round.total_strokes()
    );
    if let Some(weather) = &round.weather {
        println!(
            "Weather: {} {}",
            weather.description.as_deref().unwrap_or("unknown"),
            weather
                .temperature_c
                .map(|temp| format!("{temp:.0}°C"))
                .unwrap_or_default()
        );
    }
    for (index, hole) in round.holes.iter().enumerate() {
        let marker = if index == round.current_index { '>' } else { ' ' };
        println!("{marker}{:>3}  {}", hole.number(), describe_hole(hole));
    }
}

fn print_report(report: &RoundReport) {
    let round = &report.round;
    println!(
        "#{} {}  {} holes  {}",
        round.id,
        round.date,
        round.holes_count,
        round.course.as_deref().unwrap_or("-")
    );
    for hole in &round.holes {
        println!(
            "{:>3}  strokes {:>2}  putts {:>2}  fw {}  gir {}  pen {}",
            hole.number,
            hole.strokes,
            hole.putts,
            yes_no(hole.fairway_hit),
            yes_no(hole.green_in_reg),
            hole.penalties
        );
    }
    let stats = &report.stats;
    println!(
        "Total {}  putts {}  fairways {}  greens {}  penalties {}",
        stats.total_strokes,
        stats.total_putts,
        stats.fairways_hit,
        stats.greens_in_reg,
        stats.total_penalties
    );
}

fn describe_hole(hole: &Hole) -> String {
    match *hole {
        Hole::Simple { strokes, .. } => format!("{strokes} strokes"),
        Hole::WithStats {
            strokes,
            putts,
            fairway_hit,
            green_in_reg,
            penalties,
            ..
        } => format!(
            "{strokes} strokes, {putts} putts, fw {}, gir {}, {penalties} pen",
            yes_no(fairway_hit),
            yes_no(green_in_reg)
        ),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(feature = "weather")]
fn build_weather_provider(config: &WeatherConfig) -> Option<Arc<dyn WeatherProvider>> {
    use fairplay_core::services::weather_service::OpenMeteoClient;

    if !config.enabled {
        info!("weather lookup disabled");
        return None;
    }
    match OpenMeteoClient::new(config.base_url.clone(), config.timeout) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            warn!(error = %err, "weather client unavailable; rounds start without weather");
            None
        }
    }
}

#[cfg(not(feature = "weather"))]
fn build_weather_provider(_config: &WeatherConfig) -> Option<Arc<dyn WeatherProvider>> {
    None
}

/// Configure tracing subscribers; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
