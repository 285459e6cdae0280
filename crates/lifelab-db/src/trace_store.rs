//! Append-only generation traces in `raw_data.generation_trace`.
//!
//! Uniqueness of `(experiment_id, generation_num)` is enforced by the
//! table, so a repeated append fails instead of overwriting.

use chrono::{DateTime, Utc};
use lifelab_core::board::Board;
use lifelab_core::store::{StoreError, TraceRecord};
use lifelab_types::{ExperimentId, GenerationTrace, TraceId};
use sqlx::PgPool;

use crate::error::{DbError, storage};

/// Operations on the `raw_data.generation_trace` table.
pub struct TraceTable<'a> {
    pool: &'a PgPool,
}

impl<'a> TraceTable<'a> {
    /// Create a new trace table handle bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Encode `board` and insert it as generation `generation`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateGeneration`] if the row exists,
    /// [`StoreError::ExperimentNotFound`] if the experiment does not,
    /// [`StoreError::InvalidBoard`] if the live count check fails, or
    /// [`StoreError::Storage`] on any other database failure.
    pub async fn append(
        &self,
        experiment_id: ExperimentId,
        generation: u32,
        board: &Board,
        captured_at: DateTime<Utc>,
    ) -> Result<TraceId, StoreError> {
        let record = TraceRecord::capture(generation, board, captured_at)?;
        let generation_num = i32::try_from(record.generation_num).map_err(|_| {
            StoreError::from(DbError::InvalidRow(format!(
                "generation {generation} exceeds INTEGER"
            )))
        })?;
        let live_cells = i32::try_from(record.live_cells_count).map_err(|_| {
            StoreError::from(DbError::InvalidRow(format!(
                "live cell count {} exceeds INTEGER",
                record.live_cells_count
            )))
        })?;

        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            r"INSERT INTO raw_data.generation_trace
                (experiment_id, generation_num, capture_time, board_state, live_cells_count)
              VALUES ($1, $2, $3, $4, $5)
              RETURNING trace_id",
        )
        .bind(experiment_id.into_inner())
        .bind(generation_num)
        .bind(record.capture_time)
        .bind(&record.board_state)
        .bind(live_cells)
        .fetch_one(self.pool)
        .await;

        match result {
            Ok((trace_id,)) => Ok(TraceId(trace_id)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateGeneration {
                    experiment_id,
                    generation,
                })
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(StoreError::ExperimentNotFound(experiment_id))
            }
            Err(err) => Err(storage(err)),
        }
    }

    /// All traces of an experiment, ordered by generation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the experiment does not exist or
    /// [`StoreError::Storage`] on database failure.
    pub async fn traces(
        &self,
        experiment_id: ExperimentId,
    ) -> Result<Vec<GenerationTrace>, StoreError> {
        let exists: Option<(i64,)> = sqlx::query_as(
            r"SELECT experiment_id FROM raw_data.experiments WHERE experiment_id = $1",
        )
        .bind(experiment_id.into_inner())
        .fetch_optional(self.pool)
        .await
        .map_err(storage)?;
        if exists.is_none() {
            return Err(StoreError::NotFound(experiment_id));
        }

        let rows = sqlx::query_as::<_, TraceRow>(
            r"SELECT trace_id, experiment_id, generation_num, capture_time, board_state, live_cells_count
              FROM raw_data.generation_trace
              WHERE experiment_id = $1
              ORDER BY generation_num ASC",
        )
        .bind(experiment_id.into_inner())
        .fetch_all(self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter()
            .map(|row| GenerationTrace::try_from(row).map_err(StoreError::from))
            .collect()
    }
}

/// A row from the `raw_data.generation_trace` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TraceRow {
    /// Surrogate key.
    pub trace_id: i64,
    /// Owning experiment.
    pub experiment_id: i64,
    /// Generation number.
    pub generation_num: i32,
    /// Capture timestamp.
    pub capture_time: DateTime<Utc>,
    /// Encoded board.
    pub board_state: String,
    /// Live cells in `board_state`.
    pub live_cells_count: i32,
}

impl TryFrom<TraceRow> for GenerationTrace {
    type Error = DbError;

    fn try_from(row: TraceRow) -> Result<Self, Self::Error> {
        let invalid = |what: &str, value: i32| {
            DbError::InvalidRow(format!("trace {}: negative {what} {value}", row.trace_id))
        };
        Ok(Self {
            trace_id: TraceId(row.trace_id),
            experiment_id: ExperimentId(row.experiment_id),
            generation_num: u32::try_from(row.generation_num)
                .map_err(|_| invalid("generation_num", row.generation_num))?,
            capture_time: row.capture_time,
            live_cells_count: u32::try_from(row.live_cells_count)
                .map_err(|_| invalid("live_cells_count", row.live_cells_count))?,
            board_state: row.board_state,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_trace() {
        let row = TraceRow {
            trace_id: 11,
            experiment_id: 2,
            generation_num: 5,
            capture_time: Utc::now(),
            board_state: String::from("0110"),
            live_cells_count: 2,
        };
        let trace = GenerationTrace::try_from(row).unwrap();
        assert_eq!(trace.trace_id, TraceId(11));
        assert_eq!(trace.generation_num, 5);
        assert_eq!(trace.live_cells_count, 2);
    }

    #[test]
    fn negative_generation_is_invalid() {
        let row = TraceRow {
            trace_id: 1,
            experiment_id: 1,
            generation_num: -1,
            capture_time: Utc::now(),
            board_state: String::new(),
            live_cells_count: 0,
        };
        assert!(matches!(
            GenerationTrace::try_from(row),
            Err(DbError::InvalidRow(_))
        ));
    }
}
