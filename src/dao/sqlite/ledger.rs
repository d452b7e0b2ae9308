use futures::future::BoxFuture;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use crate::dao::{
    models::{
        HoleRecordEntity, NewRoundEntity, RoundDetailsEntity, RoundSummaryEntity, SavedRound,
        WeatherEntity,
    },
    round_ledger::{LedgerError, LedgerResult, RoundLedger, validate_new_round},
    storage::{StorageError, StorageResult},
};

use super::{
    SqliteDatabase,
    error::{SqliteDaoError, SqliteResult},
};

/// Finalized rounds stored in `rounds` with detail rows in `round_holes`.
#[derive(Clone)]
pub struct SqliteRoundLedger {
    database: SqliteDatabase,
}

impl SqliteRoundLedger {
    /// Ledger over the shared database handle.
    pub fn new(database: SqliteDatabase) -> Self {
        Self { database }
    }
}

fn query_err(op: &'static str) -> impl Fn(rusqlite::Error) -> SqliteDaoError {
    move |source| SqliteDaoError::Query { op, source }
}

fn insert_round(
    conn: &mut Connection,
    round: &NewRoundEntity,
    total: u32,
) -> SqliteResult<SavedRound> {
    let weather = round.weather.clone().unwrap_or_default();

    // Dropping the transaction without commit rolls every row back.
    let tx = conn.transaction().map_err(query_err("append_begin"))?;
    tx.execute(
        "INSERT INTO rounds (
            date, holes_count, total_strokes, course,
            weather_temp_c, weather_wind_mps, weather_code, weather_desc,
            weather_time, weather_lat, weather_lon
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            round.date,
            round.holes_count,
            total,
            round.course,
            weather.temp_c,
            weather.wind_mps,
            weather.code,
            weather.desc,
            weather.time,
            weather.lat,
            weather.lon,
        ],
    )
    .map_err(query_err("append_round"))?;
    let round_id = tx.last_insert_rowid();

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO round_holes
                    (round_id, hole_number, strokes, putts, fairway_hit, green_in_reg, penalties)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(query_err("append_holes"))?;
        for hole in &round.holes {
            stmt.execute(params![
                round_id,
                hole.number,
                hole.strokes,
                hole.putts,
                hole.fairway_hit,
                hole.green_in_reg,
                hole.penalties,
            ])
            .map_err(query_err("append_holes"))?;
        }
    }

    tx.commit().map_err(query_err("append_commit"))?;
    Ok(SavedRound {
        id: round_id,
        total_strokes: total,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<RoundSummaryEntity> {
    Ok(RoundSummaryEntity {
        id: row.get(0)?,
        date: row.get(1)?,
        holes_count: row.get(2)?,
        total_strokes: row.get(3)?,
        course: row.get(4)?,
    })
}

fn hole_from_row(row: &Row<'_>) -> rusqlite::Result<HoleRecordEntity> {
    Ok(HoleRecordEntity {
        number: row.get(0)?,
        strokes: row.get(1)?,
        putts: row.get::<_, Option<u32>>(2)?.unwrap_or_default(),
        fairway_hit: row.get::<_, Option<bool>>(3)?.unwrap_or_default(),
        green_in_reg: row.get::<_, Option<bool>>(4)?.unwrap_or_default(),
        penalties: row.get::<_, Option<u32>>(5)?.unwrap_or_default(),
    })
}

fn select_rounds(conn: &mut Connection) -> SqliteResult<Vec<RoundSummaryEntity>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, date, holes_count, total_strokes, course
             FROM rounds
             ORDER BY date DESC, id DESC",
        )
        .map_err(query_err("list_rounds"))?;
    let rows = stmt
        .query_map([], summary_from_row)
        .map_err(query_err("list_rounds"))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(query_err("list_rounds"))
}

fn select_details(conn: &mut Connection, id: i64) -> SqliteResult<Option<RoundDetailsEntity>> {
    let header = conn
        .query_row(
            "SELECT id, date, holes_count, total_strokes, course,
                    weather_temp_c, weather_wind_mps, weather_code, weather_desc,
                    weather_time, weather_lat, weather_lon
             FROM rounds
             WHERE id = ?1",
            params![id],
            |row| {
                let summary = summary_from_row(row)?;
                let weather = WeatherEntity {
                    temp_c: row.get(5)?,
                    wind_mps: row.get(6)?,
                    code: row.get(7)?,
                    desc: row.get(8)?,
                    time: row.get(9)?,
                    lat: row.get(10)?,
                    lon: row.get(11)?,
                };
                Ok((summary, weather))
            },
        )
        .optional()
        .map_err(query_err("round_details"))?;

    let Some((summary, weather)) = header else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare(
            "SELECT hole_number, strokes, putts, fairway_hit, green_in_reg, penalties
             FROM round_holes
             WHERE round_id = ?1
             ORDER BY hole_number",
        )
        .map_err(query_err("round_holes"))?;
    let holes = stmt
        .query_map(params![id], hole_from_row)
        .map_err(query_err("round_holes"))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_err("round_holes"))?;

    Ok(Some(RoundDetailsEntity {
        id: summary.id,
        date: summary.date,
        holes_count: summary.holes_count,
        total_strokes: summary.total_strokes,
        course: summary.course,
        weather,
        holes,
    }))
}

fn delete_round(conn: &mut Connection, id: i64) -> SqliteResult<usize> {
    conn.execute("DELETE FROM rounds WHERE id = ?1", params![id])
        .map_err(query_err("delete_round"))
}

impl RoundLedger for SqliteRoundLedger {
    fn append(&self, round: NewRoundEntity) -> BoxFuture<'static, LedgerResult<SavedRound>> {
        let database = self.database.clone();
        Box::pin(async move {
            let total = validate_new_round(&round)?;
            let saved = database
                .run("append_round", move |conn| insert_round(conn, &round, total))
                .await
                .map_err(StorageError::from)?;
            info!(
                round_id = saved.id,
                total_strokes = saved.total_strokes,
                "finalized round stored"
            );
            Ok(saved)
        })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<RoundSummaryEntity>>> {
        let database = self.database.clone();
        Box::pin(async move {
            database
                .run("list_rounds", select_rounds)
                .await
                .map_err(Into::into)
        })
    }

    fn get_details(&self, id: i64) -> BoxFuture<'static, LedgerResult<RoundDetailsEntity>> {
        let database = self.database.clone();
        Box::pin(async move {
            database
                .run("round_details", move |conn| select_details(conn, id))
                .await
                .map_err(StorageError::from)?
                .ok_or(LedgerError::NotFound(id))
        })
    }

    fn remove(&self, id: i64) -> BoxFuture<'static, LedgerResult<()>> {
        let database = self.database.clone();
        Box::pin(async move {
            let removed = database
                .run("delete_round", move |conn| delete_round(conn, id))
                .await
                .map_err(StorageError::from)?;
            if removed == 0 {
                return Err(LedgerError::NotFound(id));
            }
            info!(round_id = id, "finalized round deleted");
            Ok(())
        })
    }
}
