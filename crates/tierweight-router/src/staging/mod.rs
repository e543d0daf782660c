//! Staging - per-tier edit state between local drags and remote commits
//!
//! Each tier moves through `Clean -> Dirty -> Saving -> Clean`. Staged
//! weights overlay the confirmed ones until a commit succeeds; a failed
//! commit rolls the tier back to what the store last confirmed.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tierweight_core::{FixedWeight, Rebalancer};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::store::WeightStore;
use crate::tier::{Tier, TierError};

/// Edit state of one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierEditState {
    /// Local view matches the store
    Clean,
    /// Local edits not yet sent
    Dirty,
    /// A commit is in flight
    Saving,
}

/// What a commit sends to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPlan {
    pub tier_id: String,
    /// Weights that are new or changed since the last confirmed state
    pub updates: Vec<FixedWeight<String>>,
    /// Associations detached since the last confirmed state
    pub removed: Vec<String>,
}

impl CommitPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.removed.is_empty()
    }
}

/// Confirmed and staged views of a single tier
#[derive(Debug, Clone)]
pub struct TierSession {
    confirmed: Tier,
    staged: Option<Tier>,
    state: TierEditState,
}

impl TierSession {
    pub fn new(confirmed: Tier) -> Self {
        Self {
            confirmed,
            staged: None,
            state: TierEditState::Clean,
        }
    }

    pub fn state(&self) -> TierEditState {
        self.state
    }

    pub fn confirmed(&self) -> &Tier {
        &self.confirmed
    }

    /// Staged view if any, otherwise the confirmed one
    pub fn current(&self) -> &Tier {
        self.staged.as_ref().unwrap_or(&self.confirmed)
    }

    fn edit<F>(&mut self, apply: F) -> Result<&Tier, TierError>
    where
        F: FnOnce(&mut Tier) -> Result<(), TierError>,
    {
        if self.state == TierEditState::Saving {
            return Err(TierError::CommitInFlight);
        }

        let mut next = self.current().clone();
        apply(&mut next)?;
        self.state = TierEditState::Dirty;
        Ok(&*self.staged.insert(next))
    }

    pub fn stage_weight(
        &mut self,
        id: &str,
        unit: f64,
        rebalancer: &Rebalancer,
    ) -> Result<&Tier, TierError> {
        self.edit(|tier| tier.set_weight(id, unit, rebalancer))
    }

    pub fn stage_attach(&mut self, id: &str, rebalancer: &Rebalancer) -> Result<&Tier, TierError> {
        self.edit(|tier| tier.attach(id, rebalancer))
    }

    pub fn stage_detach(&mut self, id: &str, rebalancer: &Rebalancer) -> Result<&Tier, TierError> {
        self.edit(|tier| tier.detach(id, rebalancer))
    }

    /// Drop staged edits
    pub fn discard(&mut self) -> Result<(), TierError> {
        if self.state == TierEditState::Saving {
            return Err(TierError::CommitInFlight);
        }
        self.staged = None;
        self.state = TierEditState::Clean;
        Ok(())
    }

    /// Freeze the staged tier and compute what must be sent.
    pub fn begin_commit(
        &mut self,
        rebalancer: &Rebalancer,
        require_settled: bool,
    ) -> Result<CommitPlan, TierError> {
        match self.state {
            TierEditState::Clean => return Err(TierError::NotDirty),
            TierEditState::Saving => return Err(TierError::CommitInFlight),
            TierEditState::Dirty => {}
        }
        let staged = self.staged.as_ref().ok_or(TierError::NotDirty)?;

        if require_settled && !staged.is_settled(rebalancer.scale()) {
            return Err(TierError::VacatedEndpoints(staged.vacated()));
        }

        let confirmed: HashMap<String, u32> = self
            .confirmed
            .fixed_weights(rebalancer)
            .into_iter()
            .map(|w| (w.id, w.fixed))
            .collect();

        let updates: Vec<FixedWeight<String>> = staged
            .fixed_weights(rebalancer)
            .into_iter()
            .filter(|w| confirmed.get(&w.id) != Some(&w.fixed))
            .collect();

        let kept: HashSet<&str> = staged.entries().iter().map(|e| e.id.as_str()).collect();
        let removed: Vec<String> = self
            .confirmed
            .entries()
            .iter()
            .filter(|e| !kept.contains(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect();

        self.state = TierEditState::Saving;
        Ok(CommitPlan {
            tier_id: staged.id().to_string(),
            updates,
            removed,
        })
    }

    /// The store accepted the plan
    pub fn complete_commit(&mut self) -> Result<(), TierError> {
        if self.state != TierEditState::Saving {
            return Err(TierError::NotDirty);
        }
        if let Some(staged) = self.staged.take() {
            self.confirmed = staged;
        }
        self.state = TierEditState::Clean;
        Ok(())
    }

    /// The store rejected the plan; roll back to the confirmed weights
    pub fn fail_commit(&mut self) -> Result<(), TierError> {
        if self.state != TierEditState::Saving {
            return Err(TierError::NotDirty);
        }
        self.staged = None;
        self.state = TierEditState::Clean;
        Ok(())
    }
}

/// All tiers being edited, each independent of the others
#[derive(Debug)]
pub struct TierBoard {
    rebalancer: Rebalancer,
    require_settled: bool,
    sessions: RwLock<HashMap<String, TierSession>>,
}

impl TierBoard {
    pub fn new(config: &Config) -> Self {
        Self {
            rebalancer: config.rebalancer(),
            require_settled: config.staging.require_settled,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn rebalancer(&self) -> &Rebalancer {
        &self.rebalancer
    }

    /// Track a confirmed tier, replacing any previous session for it.
    ///
    /// A tier with a commit in flight keeps its session until the store
    /// answers.
    pub fn insert(&self, tier: Tier) -> Result<(), TierError> {
        let mut sessions = self.sessions.write();
        if let Some(existing) = sessions.get(tier.id()) {
            if existing.state() == TierEditState::Saving {
                return Err(TierError::CommitInFlight);
            }
        }
        let id = tier.id().to_string();
        sessions.insert(id, TierSession::new(tier));
        Ok(())
    }

    /// Load a tier from the store and start tracking it
    pub async fn load(&self, tier_id: &str, store: &dyn WeightStore) -> Result<Tier, TierError> {
        let stored = store.load_tier(tier_id).await?;
        let tier = Tier::from_stored(tier_id, &stored, &self.rebalancer);
        self.insert(tier.clone())?;
        debug!(tier = tier_id, endpoints = tier.len(), store = store.name(), "loaded tier");
        Ok(tier)
    }

    pub fn state(&self, tier_id: &str) -> Option<TierEditState> {
        self.sessions.read().get(tier_id).map(|s| s.state())
    }

    /// Current (staged or confirmed) view of a tier
    pub fn current(&self, tier_id: &str) -> Option<Tier> {
        self.sessions.read().get(tier_id).map(|s| s.current().clone())
    }

    pub fn confirmed(&self, tier_id: &str) -> Option<Tier> {
        self.sessions.read().get(tier_id).map(|s| s.confirmed().clone())
    }

    fn with_session<T, F>(&self, tier_id: &str, f: F) -> Result<T, TierError>
    where
        F: FnOnce(&mut TierSession, &Rebalancer) -> Result<T, TierError>,
    {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(tier_id)
            .ok_or_else(|| TierError::UnknownTier(tier_id.to_string()))?;
        f(session, &self.rebalancer)
    }

    pub fn stage_weight(&self, tier_id: &str, id: &str, unit: f64) -> Result<Tier, TierError> {
        self.with_session(tier_id, |s, rb| s.stage_weight(id, unit, rb).cloned())
    }

    pub fn stage_attach(&self, tier_id: &str, id: &str) -> Result<Tier, TierError> {
        self.with_session(tier_id, |s, rb| s.stage_attach(id, rb).cloned())
    }

    pub fn stage_detach(&self, tier_id: &str, id: &str) -> Result<Tier, TierError> {
        self.with_session(tier_id, |s, rb| s.stage_detach(id, rb).cloned())
    }

    pub fn discard(&self, tier_id: &str) -> Result<(), TierError> {
        self.with_session(tier_id, |s, _| s.discard())
    }

    /// Send a tier's staged weights to the store.
    ///
    /// On success the staged weights become confirmed; on failure the tier
    /// rolls back and the store error is returned.
    pub async fn commit(
        &self,
        tier_id: &str,
        store: &dyn WeightStore,
    ) -> Result<CommitPlan, TierError> {
        let require_settled = self.require_settled;
        let plan = self.with_session(tier_id, |s, rb| s.begin_commit(rb, require_settled))?;

        match store.put_weights(&plan).await {
            Ok(()) => {
                self.with_session(tier_id, |s, _| s.complete_commit())?;
                info!(
                    tier = tier_id,
                    updates = plan.updates.len(),
                    removed = plan.removed.len(),
                    store = store.name(),
                    "committed tier weights"
                );
                Ok(plan)
            }
            Err(e) => {
                warn!(tier = tier_id, error = %e, "commit failed, rolling back staged weights");
                if let Err(rollback) = self.with_session(tier_id, |s, _| s.fail_commit()) {
                    warn!(tier = tier_id, error = %rollback, "rollback skipped");
                }
                Err(TierError::Store(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryWeightStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tierweight_core::RawWeightEntry;
    use tokio::sync::Notify;

    fn tier(ids: &[&str]) -> Tier {
        let rb = Rebalancer::new();
        let mut tier = Tier::new("t1");
        for id in ids {
            tier.attach(id, &rb).unwrap();
        }
        tier
    }

    #[derive(Debug)]
    struct RejectingStore;

    #[async_trait]
    impl WeightStore for RejectingStore {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn put_weights(&self, _plan: &CommitPlan) -> Result<(), StoreError> {
            Err(StoreError::Rejected("weights locked".to_string()))
        }

        async fn load_tier(&self, tier_id: &str) -> Result<Vec<RawWeightEntry<String>>, StoreError> {
            Err(StoreError::NotFound(tier_id.to_string()))
        }
    }

    /// Holds every `put_weights` until the gate opens
    #[derive(Debug)]
    struct GatedStore {
        inner: MemoryWeightStore,
        gate: Notify,
        reject: bool,
    }

    impl GatedStore {
        async fn seeded(reject: bool) -> Self {
            let inner = MemoryWeightStore::default();
            inner
                .seed(
                    "t1",
                    vec![
                        RawWeightEntry { id: "a".to_string(), weight: 0.5, scale: None },
                        RawWeightEntry { id: "b".to_string(), weight: 0.5, scale: None },
                    ],
                )
                .await;
            Self {
                inner,
                gate: Notify::new(),
                reject,
            }
        }
    }

    #[async_trait]
    impl WeightStore for GatedStore {
        fn name(&self) -> &str {
            "gated"
        }

        async fn put_weights(&self, plan: &CommitPlan) -> Result<(), StoreError> {
            self.gate.notified().await;
            if self.reject {
                return Err(StoreError::Rejected("weights locked".to_string()));
            }
            self.inner.put_weights(plan).await
        }

        async fn load_tier(&self, tier_id: &str) -> Result<Vec<RawWeightEntry<String>>, StoreError> {
            self.inner.load_tier(tier_id).await
        }
    }

    async fn wait_until_saving(board: &TierBoard, tier_id: &str) {
        while board.state(tier_id) != Some(TierEditState::Saving) {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_session_transitions() {
        let rb = Rebalancer::new();
        let mut session = TierSession::new(tier(&["a", "b"]));
        assert_eq!(session.state(), TierEditState::Clean);
        assert!(matches!(session.begin_commit(&rb, true), Err(TierError::NotDirty)));

        session.stage_weight("a", 0.8, &rb).unwrap();
        assert_eq!(session.state(), TierEditState::Dirty);
        assert_eq!(session.confirmed().unit_of("a"), Some(0.5));
        assert_eq!(session.current().unit_of("a"), Some(0.8));

        let plan = session.begin_commit(&rb, true).unwrap();
        assert_eq!(session.state(), TierEditState::Saving);
        assert_eq!(plan.updates.len(), 2);
        assert!(matches!(
            session.stage_weight("a", 0.1, &rb),
            Err(TierError::CommitInFlight)
        ));
        assert!(matches!(session.discard(), Err(TierError::CommitInFlight)));

        session.complete_commit().unwrap();
        assert_eq!(session.state(), TierEditState::Clean);
        assert_eq!(session.confirmed().unit_of("a"), Some(0.8));
    }

    #[test]
    fn test_staged_edits_accumulate() {
        let rb = Rebalancer::new();
        let mut session = TierSession::new(tier(&["a", "b", "c"]));

        session.stage_weight("a", 0.5, &rb).unwrap();
        let current = session.stage_weight("b", 0.3, &rb).unwrap().clone();
        assert_eq!(current.unit_of("b"), Some(0.3));
        // a and c split 0.7 in their staged 0.5 : 0.25 ratio
        let a = current.unit_of("a").unwrap();
        let c = current.unit_of("c").unwrap();
        assert!((a / c - 2.0).abs() < 1e-3);

        session.discard().unwrap();
        assert_eq!(session.state(), TierEditState::Clean);
        assert_eq!(session.current(), session.confirmed());
    }

    #[test]
    fn test_plan_lists_only_changes() {
        let rb = Rebalancer::new();
        let mut confirmed = tier(&["a", "b", "c"]);
        confirmed.set_weight("a", 0.5, &rb).unwrap();
        let mut session = TierSession::new(confirmed);

        // c at 0.25 leaves a and b untouched
        session.stage_weight("c", 0.25, &rb).unwrap();
        session.stage_attach("d", &rb).unwrap();
        session.stage_detach("b", &rb).unwrap();

        let plan = session.begin_commit(&rb, true).unwrap();
        assert_eq!(plan.removed, vec!["b".to_string()]);
        let ids: Vec<&str> = plan.updates.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(plan.updates.iter().map(|w| w.fixed).sum::<u32>(), 10_000);
    }

    #[test]
    fn test_vacated_endpoints_block_commit() {
        let rb = Rebalancer::new();
        let mut session = TierSession::new(tier(&["a", "b", "c"]));
        session.stage_weight("a", 1.0, &rb).unwrap();

        match session.begin_commit(&rb, true) {
            Err(TierError::VacatedEndpoints(ids)) => {
                assert_eq!(ids, vec!["b".to_string(), "c".to_string()])
            }
            other => panic!("expected vacated endpoints, got {:?}", other),
        }
        assert_eq!(session.state(), TierEditState::Dirty);

        // Allowed when the board is configured not to require settled tiers
        assert!(session.begin_commit(&rb, false).is_ok());
    }

    #[tokio::test]
    async fn test_board_commit_round_trip() {
        let board = TierBoard::new(&Config::default());
        let store = MemoryWeightStore::default();
        store
            .seed(
                "t1",
                vec![
                    RawWeightEntry { id: "a".to_string(), weight: 30.0, scale: None },
                    RawWeightEntry { id: "b".to_string(), weight: 30.0, scale: None },
                ],
            )
            .await;

        let loaded = board.load("t1", &store).await.unwrap();
        assert_eq!(loaded.unit_of("a"), Some(0.5));

        board.stage_weight("t1", "a", 0.9).unwrap();
        assert_eq!(board.state("t1"), Some(TierEditState::Dirty));

        let plan = board.commit("t1", &store).await.unwrap();
        assert_eq!(plan.updates.len(), 2);
        assert_eq!(board.state("t1"), Some(TierEditState::Clean));
        assert_eq!(board.confirmed("t1").unwrap().unit_of("a"), Some(0.9));

        let reloaded = board.load("t1", &store).await.unwrap();
        assert_eq!(reloaded.unit_of("b"), Some(0.1));
    }

    #[tokio::test]
    async fn test_board_commit_failure_rolls_back() {
        let board = TierBoard::new(&Config::default());
        board.insert(tier(&["a", "b"])).unwrap();
        board.stage_weight("t1", "b", 0.25).unwrap();

        let result = board.commit("t1", &RejectingStore).await;
        assert!(matches!(result, Err(TierError::Store(StoreError::Rejected(_)))));
        assert_eq!(board.state("t1"), Some(TierEditState::Clean));
        assert_eq!(board.current("t1").unwrap().unit_of("b"), Some(0.5));
    }

    #[tokio::test]
    async fn test_board_tiers_are_independent() {
        let board = TierBoard::new(&Config::default());
        board.insert(tier(&["a", "b"])).unwrap();
        let mut other = Tier::new("t2");
        other.attach("x", board.rebalancer()).unwrap();
        board.insert(other).unwrap();

        board.stage_weight("t1", "a", 0.6).unwrap();
        assert_eq!(board.state("t2"), Some(TierEditState::Clean));
        assert!(matches!(
            board.stage_weight("t3", "a", 0.6),
            Err(TierError::UnknownTier(_))
        ));
        assert!(matches!(
            board.commit("t2", &MemoryWeightStore::default()).await,
            Err(TierError::NotDirty)
        ));
    }

    #[tokio::test]
    async fn test_reload_during_commit_keeps_session() {
        let board = Arc::new(TierBoard::new(&Config::default()));
        let store = Arc::new(GatedStore::seeded(false).await);
        board.load("t1", store.as_ref()).await.unwrap();
        board.stage_weight("t1", "a", 0.9).unwrap();

        let commit = {
            let board = board.clone();
            let store = store.clone();
            tokio::spawn(async move { board.commit("t1", store.as_ref()).await })
        };
        wait_until_saving(&board, "t1").await;

        assert!(matches!(
            board.load("t1", store.as_ref()).await,
            Err(TierError::CommitInFlight)
        ));
        assert!(matches!(
            board.insert(tier(&["a", "b"])),
            Err(TierError::CommitInFlight)
        ));

        store.gate.notify_one();
        let plan = commit.await.unwrap().unwrap();
        assert_eq!(plan.updates.len(), 2);
        assert_eq!(board.state("t1"), Some(TierEditState::Clean));
        assert_eq!(board.confirmed("t1").unwrap().unit_of("a"), Some(0.9));
        assert_eq!(store.inner.load_tier("t1").await.unwrap()[0].weight, 0.9);
    }

    #[tokio::test]
    async fn test_rejected_commit_reports_store_error_after_reload_attempt() {
        let board = Arc::new(TierBoard::new(&Config::default()));
        let store = Arc::new(GatedStore::seeded(true).await);
        board.load("t1", store.as_ref()).await.unwrap();
        board.stage_weight("t1", "a", 0.9).unwrap();

        let commit = {
            let board = board.clone();
            let store = store.clone();
            tokio::spawn(async move { board.commit("t1", store.as_ref()).await })
        };
        wait_until_saving(&board, "t1").await;
        assert!(board.load("t1", store.as_ref()).await.is_err());

        store.gate.notify_one();
        let result = commit.await.unwrap();
        assert!(matches!(result, Err(TierError::Store(StoreError::Rejected(_)))));
        assert_eq!(board.state("t1"), Some(TierEditState::Clean));
        assert_eq!(board.current("t1").unwrap().unit_of("a"), Some(0.5));
    }
}
