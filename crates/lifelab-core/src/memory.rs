//! In-process store implementing all three storage traits.
//!
//! State sits behind one `tokio::sync::RwLock`, so every operation is
//! atomic with respect to the others: a status read never observes a
//! half-applied terminal transition. Ids are handed out from counters
//! starting at 1, like the `BIGSERIAL` columns they stand in for.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lifelab_types::{
    Experiment, ExperimentId, ExperimentStatus, GenerationTrace, NewExperiment, TraceId,
};
use tokio::sync::RwLock;

use crate::board::Board;
use crate::clock;
use crate::store::{ExperimentStore, StoreError, TraceReader, TraceRecord, TraceSink};

#[derive(Debug)]
struct MemoryState {
    experiments: BTreeMap<ExperimentId, Experiment>,
    traces: BTreeMap<(ExperimentId, u32), GenerationTrace>,
    next_experiment_id: i64,
    next_trace_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            experiments: BTreeMap::new(),
            traces: BTreeMap::new(),
            next_experiment_id: 1,
            next_trace_id: 1,
        }
    }
}

/// Take the current counter value and advance it.
fn bump(counter: &mut i64) -> Result<i64, StoreError> {
    let id = *counter;
    *counter = id
        .checked_add(1)
        .ok_or_else(|| StoreError::storage(std::io::Error::other("id sequence exhausted")))?;
    Ok(id)
}

/// Cheaply cloneable handle to shared in-memory state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn finish(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
        status: ExperimentStatus,
    ) -> Result<Experiment, StoreError> {
        let mut state = self.inner.write().await;
        let experiment = state
            .experiments
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if experiment.is_terminal() {
            return Err(StoreError::AlreadyTerminal {
                experiment_id: id,
                status: experiment.status,
            });
        }
        experiment.status = status;
        experiment.end_time = Some(end_time);
        experiment.duration_seconds = Some(clock::elapsed_seconds(experiment.start_time, end_time));
        Ok(experiment.clone())
    }
}

impl ExperimentStore for MemoryStore {
    async fn create(&self, new: &NewExperiment) -> Result<ExperimentId, StoreError> {
        let mut state = self.inner.write().await;
        let id = ExperimentId(bump(&mut state.next_experiment_id)?);
        state.experiments.insert(id, Experiment::running(id, new));
        Ok(id)
    }

    async fn complete(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
    ) -> Result<Experiment, StoreError> {
        self.finish(id, end_time, ExperimentStatus::Completed).await
    }

    async fn fail(&self, id: ExperimentId, end_time: DateTime<Utc>) -> Result<Experiment, StoreError> {
        self.finish(id, end_time, ExperimentStatus::Failed).await
    }

    async fn get(&self, id: ExperimentId) -> Result<Experiment, StoreError> {
        self.inner
            .read()
            .await
            .experiments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Experiment>, StoreError> {
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .inner
            .read()
            .await
            .experiments
            .values()
            .rev()
            .take(take)
            .cloned()
            .collect())
    }
}

impl TraceSink for MemoryStore {
    async fn append(
        &self,
        experiment_id: ExperimentId,
        generation: u32,
        board: &Board,
        captured_at: DateTime<Utc>,
    ) -> Result<TraceId, StoreError> {
        let record = TraceRecord::capture(generation, board, captured_at)?;
        let mut state = self.inner.write().await;
        if !state.experiments.contains_key(&experiment_id) {
            return Err(StoreError::ExperimentNotFound(experiment_id));
        }
        if state.traces.contains_key(&(experiment_id, generation)) {
            return Err(StoreError::DuplicateGeneration {
                experiment_id,
                generation,
            });
        }
        let trace_id = TraceId(bump(&mut state.next_trace_id)?);
        state.traces.insert(
            (experiment_id, generation),
            record.into_trace(trace_id, experiment_id),
        );
        Ok(trace_id)
    }
}

impl TraceReader for MemoryStore {
    async fn traces(&self, experiment_id: ExperimentId) -> Result<Vec<GenerationTrace>, StoreError> {
        let state = self.inner.read().await;
        if !state.experiments.contains_key(&experiment_id) {
            return Err(StoreError::NotFound(experiment_id));
        }
        Ok(state
            .traces
            .range((experiment_id, 0)..=(experiment_id, u32::MAX))
            .map(|(_, trace)| trace.clone())
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::codec::decode;

    fn new_experiment(name: &str) -> NewExperiment {
        NewExperiment {
            name: name.to_owned(),
            board_size: 3,
            num_steps: 2,
            initial_config: String::from("010101010"),
            start_time: clock::now(),
            rules_notation: String::from("B3/S23"),
            survival_rules: vec![2, 3],
            birth_rules: vec![3],
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.create(&new_experiment("a")).await.unwrap();
        let b = store.create(&new_experiment("b")).await.unwrap();
        assert_eq!(a, ExperimentId(1));
        assert_eq!(b, ExperimentId(2));

        let got = store.get(a).await.unwrap();
        assert_eq!(got.status, ExperimentStatus::Running);
        assert!(got.end_time.is_none());
    }

    #[tokio::test]
    async fn complete_sets_exact_duration() {
        let store = MemoryStore::new();
        let new = new_experiment("timed");
        let id = store.create(&new).await.unwrap();
        let end = new.start_time + Duration::microseconds(1_234_567);

        let done = store.complete(id, end).await.unwrap();
        assert_eq!(done.status, ExperimentStatus::Completed);
        assert_eq!(done.end_time, Some(end));
        assert_eq!(done.duration_seconds, Some(Decimal::new(1_234_567, 6)));
    }

    #[tokio::test]
    async fn second_terminal_call_is_rejected_without_mutation() {
        let store = MemoryStore::new();
        let new = new_experiment("once");
        let id = store.create(&new).await.unwrap();
        let first = store.fail(id, clock::now()).await.unwrap();

        let later = first.end_time.unwrap() + Duration::seconds(5);
        let err = store.complete(id, later).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::AlreadyTerminal {
                status: ExperimentStatus::Failed,
                ..
            }
        ));
        assert!(matches!(
            store.fail(id, later).await,
            Err(StoreError::AlreadyTerminal { .. })
        ));
        assert_eq!(store.get(id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn unknown_experiment() {
        let store = MemoryStore::new();
        let missing = ExperimentId(77);
        assert!(matches!(store.get(missing).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.complete(missing, clock::now()).await,
            Err(StoreError::NotFound(_))
        ));
        let board = decode("0000", 2).unwrap();
        assert!(matches!(
            store.append(missing, 0, &board, clock::now()).await,
            Err(StoreError::ExperimentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_generation_never_overwrites() {
        let store = MemoryStore::new();
        let id = store.create(&new_experiment("dup")).await.unwrap();
        let first = decode("010101010", 3).unwrap();
        let second = decode("111111111", 3).unwrap();

        store.append(id, 0, &first, clock::now()).await.unwrap();
        let err = store.append(id, 0, &second, clock::now()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateGeneration { generation: 0, .. }
        ));

        let traces = store.traces(id).await.unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces.first().unwrap().board_state, "010101010");
    }

    #[tokio::test]
    async fn traces_are_ordered_and_scoped() {
        let store = MemoryStore::new();
        let a = store.create(&new_experiment("a")).await.unwrap();
        let b = store.create(&new_experiment("b")).await.unwrap();
        let board = decode("1001", 2).unwrap();
        for generation in [2, 0, 1] {
            store.append(a, generation, &board, clock::now()).await.unwrap();
        }
        store.append(b, 0, &board, clock::now()).await.unwrap();

        let gens: Vec<u32> = store
            .traces(a)
            .await
            .unwrap()
            .iter()
            .map(|t| t.generation_num)
            .collect();
        assert_eq!(gens, vec![0, 1, 2]);
        assert_eq!(store.traces(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_recent_is_newest_first() {
        let store = MemoryStore::new();
        for name in ["one", "two", "three"] {
            store.create(&new_experiment(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .list_recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["three", "two"]);
    }
}
