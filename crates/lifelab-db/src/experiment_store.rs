//! Experiment rows in `raw_data.experiments`.
//!
//! Rows are created `RUNNING` and move exactly once to `COMPLETED` or
//! `FAILED`. The terminal transition runs in one transaction: the row is
//! locked with `FOR UPDATE`, its status checked, the duration computed
//! from the stored `start_time`, and the update applied. Concurrent
//! finishers therefore serialize and the loser sees `AlreadyTerminal`.

use chrono::{DateTime, Utc};
use lifelab_core::clock;
use lifelab_core::store::StoreError;
use lifelab_types::{Experiment, ExperimentId, ExperimentStatus, NewExperiment};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::{DbError, storage};

/// Columns selected for an [`ExperimentRow`].
const EXPERIMENT_COLUMNS: &str = "experiment_id, name, board_size, num_steps, initial_config, \
     start_time, end_time, duration_seconds, status, rules_notation, survival_rules, birth_rules";

/// Operations on the `raw_data.experiments` table.
pub struct ExperimentTable<'a> {
    pool: &'a PgPool,
}

impl<'a> ExperimentTable<'a> {
    /// Create a new experiment table handle bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a `RUNNING` experiment and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the insert fails.
    pub async fn create(&self, new: &NewExperiment) -> Result<ExperimentId, StoreError> {
        let board_size = to_column(new.board_size, "board_size")?;
        let num_steps = to_column(new.num_steps, "num_steps")?;

        let row: (i64,) = sqlx::query_as(
            r"INSERT INTO raw_data.experiments
                (name, board_size, num_steps, initial_config, start_time, status,
                 rules_notation, survival_rules, birth_rules)
              VALUES ($1, $2, $3, $4, $5, 'RUNNING', $6, $7, $8)
              RETURNING experiment_id",
        )
        .bind(&new.name)
        .bind(board_size)
        .bind(num_steps)
        .bind(&new.initial_config)
        .bind(new.start_time)
        .bind(&new.rules_notation)
        .bind(format_rule_list(&new.survival_rules))
        .bind(format_rule_list(&new.birth_rules))
        .fetch_one(self.pool)
        .await
        .map_err(storage)?;

        Ok(ExperimentId(row.0))
    }

    /// Move a `RUNNING` experiment to `status` at `end_time`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids,
    /// [`StoreError::AlreadyTerminal`] if the row has already finished
    /// (nothing is written), or [`StoreError::Storage`] on database failure.
    pub async fn finish(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
        status: ExperimentStatus,
    ) -> Result<Experiment, StoreError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let current: Option<(DateTime<Utc>, String)> = sqlx::query_as(
            r"SELECT start_time, status
              FROM raw_data.experiments
              WHERE experiment_id = $1
              FOR UPDATE",
        )
        .bind(id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        let Some((start_time, current_status)) = current else {
            return Err(StoreError::NotFound(id));
        };
        let current_status = parse_status(&current_status)?;
        if current_status.is_terminal() {
            return Err(StoreError::AlreadyTerminal {
                experiment_id: id,
                status: current_status,
            });
        }

        let duration = clock::elapsed_seconds(start_time, end_time);
        let row = sqlx::query_as::<_, ExperimentRow>(&format!(
            r"UPDATE raw_data.experiments
              SET status = $2, end_time = $3, duration_seconds = $4
              WHERE experiment_id = $1
              RETURNING {EXPERIMENT_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(status.as_str())
        .bind(end_time)
        .bind(duration)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        tracing::debug!(experiment_id = %id, %status, %duration, "Experiment finished");
        Ok(Experiment::try_from(row)?)
    }

    /// Load one experiment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids or
    /// [`StoreError::Storage`] on database failure.
    pub async fn get(&self, id: ExperimentId) -> Result<Experiment, StoreError> {
        let row = sqlx::query_as::<_, ExperimentRow>(&format!(
            r"SELECT {EXPERIMENT_COLUMNS}
              FROM raw_data.experiments
              WHERE experiment_id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await
        .map_err(storage)?
        .ok_or(StoreError::NotFound(id))?;

        Ok(Experiment::try_from(row)?)
    }

    /// List experiments, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the query fails.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Experiment>, StoreError> {
        let rows = sqlx::query_as::<_, ExperimentRow>(&format!(
            r"SELECT {EXPERIMENT_COLUMNS}
              FROM raw_data.experiments
              ORDER BY start_time DESC, experiment_id DESC
              LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter()
            .map(|row| Experiment::try_from(row).map_err(StoreError::from))
            .collect()
    }
}

/// A row from the `raw_data.experiments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExperimentRow {
    /// Experiment id.
    pub experiment_id: i64,
    /// Experiment name.
    pub name: String,
    /// Board side length.
    pub board_size: i32,
    /// Requested step count.
    pub num_steps: i32,
    /// Initial board descriptor.
    pub initial_config: String,
    /// Start timestamp.
    pub start_time: DateTime<Utc>,
    /// Terminal timestamp.
    pub end_time: Option<DateTime<Utc>>,
    /// `end_time - start_time` in seconds.
    pub duration_seconds: Option<Decimal>,
    /// `RUNNING`, `COMPLETED` or `FAILED`.
    pub status: String,
    /// Canonical rule notation.
    pub rules_notation: String,
    /// Comma-separated survival counts.
    pub survival_rules: String,
    /// Comma-separated birth counts.
    pub birth_rules: String,
}

impl TryFrom<ExperimentRow> for Experiment {
    type Error = DbError;

    fn try_from(row: ExperimentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            experiment_id: ExperimentId(row.experiment_id),
            board_size: from_column(row.board_size, "board_size")?,
            num_steps: from_column(row.num_steps, "num_steps")?,
            status: row
                .status
                .parse()
                .map_err(|e| DbError::InvalidRow(format!("experiment {}: {e}", row.experiment_id)))?,
            survival_rules: parse_rule_list(&row.survival_rules)?,
            birth_rules: parse_rule_list(&row.birth_rules)?,
            name: row.name,
            initial_config: row.initial_config,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_seconds: row.duration_seconds,
            rules_notation: row.rules_notation,
        })
    }
}

fn parse_status(raw: &str) -> Result<ExperimentStatus, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::from(DbError::InvalidRow(format!("{e}"))))
}

fn to_column(value: u32, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::from(DbError::InvalidRow(format!("{column} {value} exceeds INTEGER"))))
}

fn from_column(value: i32, column: &str) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::InvalidRow(format!("negative {column}: {value}")))
}

/// Render neighbor counts as `2,3`.
pub fn format_rule_list(counts: &[u8]) -> String {
    counts
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-separated count list. Whitespace is tolerated, so rows
/// written as `2, 3` read back the same as `2,3`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRow`] for non-numeric entries.
pub fn parse_rule_list(raw: &str) -> Result<Vec<u8>, DbError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>()
                .map_err(|_| DbError::InvalidRow(format!("bad rule list entry {part:?}")))
        })
        .collect()
}
