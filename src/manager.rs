//! Quest progression manager.
//!
//! Orchestrates the per-player instance lifecycle: start eligibility,
//! progress application, completion detection, reward dispatch, and
//! repeat-cycle resets. The manager is explicitly constructed with its
//! collaborators and owned by the composition root; callers serialize
//! operations per player (instances are the unit of mutation), while
//! different players are fully independent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::catalog::QuestCatalog;
use crate::definition::{ExclusivityPolicy, RewardDelivery};
use crate::error::{ClaimError, StartDenied};
use crate::events::{IgnoreReason, ProgressOutcome, ProgressPayload, QuestTransition};
use crate::instance::{QuestInstance, QuestStatus};
use crate::objective::ApplyResult;
use crate::reward::{GrantOutcome, RewardResolver};

// ============================================================================
// Collaborator traits
// ============================================================================

/// Persistence boundary. Loading happens at session start; saves are
/// fire-and-forget from the engine's perspective (batching, retries, and
/// failure handling belong to the implementor).
pub trait QuestStore {
    fn load_instances(&self, player_id: &str) -> Vec<QuestInstance>;
    fn save_instance(&self, player_id: &str, instance: &QuestInstance);
}

/// Player level lookup, derived externally (e.g. through a
/// [`crate::leveling::LevelCurve`] over stored experience).
pub trait PlayerLevels {
    fn level(&self, player_id: &str) -> i32;
}

/// All quest instances held in memory for one player.
#[derive(Default)]
struct PlayerQuestLog {
    quests: HashMap<String, QuestInstance>,
}

// ============================================================================
// Manager
// ============================================================================

pub struct QuestManager {
    catalog: Arc<QuestCatalog>,
    store: Box<dyn QuestStore>,
    levels: Box<dyn PlayerLevels>,
    rewards: RewardResolver,
    players: HashMap<String, PlayerQuestLog>,
}

impl QuestManager {
    pub fn new(
        catalog: Arc<QuestCatalog>,
        store: Box<dyn QuestStore>,
        levels: Box<dyn PlayerLevels>,
        rewards: RewardResolver,
    ) -> Self {
        Self {
            catalog,
            store,
            levels,
            rewards,
            players: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Session boundaries
    // ------------------------------------------------------------------

    /// Pull a player's instances from the store (player join).
    pub fn load_player(&mut self, player_id: &str) {
        let instances = self.store.load_instances(player_id);
        info!(player_id, count = instances.len(), "loaded quest instances");
        let quests = instances
            .into_iter()
            .map(|instance| (instance.quest_id.clone(), instance))
            .collect();
        self.players
            .insert(player_id.to_string(), PlayerQuestLog { quests });
    }

    /// Drop a player's in-memory state (player leave). Instances were
    /// saved on every mutation, so nothing is flushed here.
    pub fn unload_player(&mut self, player_id: &str) {
        self.players.remove(player_id);
    }

    // ------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------

    /// Check every start precondition without mutating anything.
    pub fn can_start(&self, player_id: &str, quest_id: &str) -> Result<(), StartDenied> {
        let Some(definition) = self.catalog.get(quest_id) else {
            return Err(StartDenied::UnknownQuest {
                quest_id: quest_id.to_string(),
            });
        };

        let log = self.players.get(player_id);
        let existing = log.and_then(|l| l.quests.get(quest_id));

        if existing.is_some_and(|i| i.is_active()) {
            return Err(StartDenied::AlreadyActive {
                quest_id: quest_id.to_string(),
            });
        }

        let times_completed = existing.map(|i| i.times_completed).unwrap_or(0);
        if !definition.completion_limit.allows(times_completed) {
            return Err(StartDenied::LimitReached {
                quest_id: quest_id.to_string(),
            });
        }

        // Completed but not yet reset: the next cycle starts via
        // try_reset/force_reset, not directly.
        if existing.is_some_and(|i| i.status == QuestStatus::Completed) {
            return Err(StartDenied::AwaitingReset {
                quest_id: quest_id.to_string(),
            });
        }

        let level = self.levels.level(player_id);
        if definition.min_level > 0 && level < definition.min_level {
            return Err(StartDenied::LevelTooLow {
                required: definition.min_level,
                actual: level,
            });
        }
        if definition.max_level > 0 && level > definition.max_level {
            return Err(StartDenied::LevelTooHigh {
                maximum: definition.max_level,
                actual: level,
            });
        }

        for prerequisite in &definition.prerequisites {
            let completed = log
                .and_then(|l| l.quests.get(prerequisite))
                .is_some_and(|i| i.times_completed > 0);
            if !completed {
                return Err(StartDenied::PrerequisiteMissing {
                    prerequisite: prerequisite.clone(),
                });
            }
        }

        for exclusive in &definition.exclusive {
            let Some(other) = log.and_then(|l| l.quests.get(exclusive)) else {
                continue;
            };
            let blocks = other.is_active()
                || (definition.exclusivity == ExclusivityPolicy::ActiveOrCompleted
                    && other.times_completed > 0);
            if blocks {
                return Err(StartDenied::ExclusiveConflict {
                    conflicting: exclusive.clone(),
                });
            }
        }

        Ok(())
    }

    /// Start (or reactivate after a cycle reset) a quest for a player.
    /// On denial, nothing is mutated.
    pub fn start(
        &mut self,
        player_id: &str,
        quest_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StartDenied> {
        self.can_start(player_id, quest_id)?;

        let Some(definition) = self.catalog.get(quest_id) else {
            return Err(StartDenied::UnknownQuest {
                quest_id: quest_id.to_string(),
            });
        };

        let log = self.players.entry(player_id.to_string()).or_default();
        let instance = log
            .quests
            .entry(quest_id.to_string())
            .and_modify(|existing| existing.reactivate(&definition, now))
            .or_insert_with(|| QuestInstance::new(&definition, now));

        info!(player_id, quest_id, "quest started");
        self.store.save_instance(player_id, instance);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------

    /// Apply one objective progress event.
    ///
    /// Events for quests that are not in progress, unknown or
    /// out-of-sequence objectives, or already-complete objectives are
    /// dropped softly and reported in the outcome. When the last
    /// objective completes, the quest transitions per its delivery type;
    /// immediate delivery grants the reward synchronously and the grant
    /// outcome rides along in the result.
    pub fn apply_progress(
        &mut self,
        player_id: &str,
        quest_id: &str,
        objective_id: &str,
        payload: ProgressPayload,
        now: DateTime<Utc>,
    ) -> ProgressOutcome {
        let Some(definition) = self.catalog.get(quest_id) else {
            debug!(player_id, quest_id, "event for unknown quest dropped");
            return ProgressOutcome::ignored(quest_id, IgnoreReason::QuestNotActive);
        };

        let Some(instance) = self
            .players
            .get_mut(player_id)
            .and_then(|l| l.quests.get_mut(quest_id))
        else {
            debug!(player_id, quest_id, "event for unstarted quest dropped");
            return ProgressOutcome::ignored(quest_id, IgnoreReason::QuestNotActive);
        };

        if instance.status != QuestStatus::InProgress {
            debug!(
                player_id,
                quest_id,
                status = %instance.status,
                "event for inactive quest dropped"
            );
            return ProgressOutcome::ignored(quest_id, IgnoreReason::QuestNotActive);
        }

        if instance.objective(objective_id).is_none() {
            debug!(player_id, quest_id, objective_id, "event for unknown objective dropped");
            return ProgressOutcome::ignored(quest_id, IgnoreReason::UnknownObjective);
        }

        if definition.sequential && instance.first_incomplete() != Some(objective_id) {
            debug!(player_id, quest_id, objective_id, "out-of-sequence event dropped");
            return ProgressOutcome::ignored(quest_id, IgnoreReason::OutOfSequence);
        }

        let Some(objective) = instance.objective_mut(objective_id) else {
            return ProgressOutcome::ignored(quest_id, IgnoreReason::UnknownObjective);
        };
        let was_complete = objective.is_complete();
        let result = objective.apply(&payload);
        let (current, target) = objective.counts();

        if result == ApplyResult::Ignored {
            let reason = if was_complete {
                IgnoreReason::AlreadyComplete
            } else {
                IgnoreReason::PayloadMismatch
            };
            debug!(player_id, quest_id, objective_id, reason = reason.as_str(), "event dropped");
            return ProgressOutcome::ignored(quest_id, reason);
        }

        let objective_completed = result == ApplyResult::Completed;
        let mut transition = QuestTransition::None;
        let mut grant = None;

        if objective_completed && instance.all_complete() {
            match definition.delivery {
                RewardDelivery::NpcVisit => {
                    instance.status = QuestStatus::AwaitingReward;
                    transition = QuestTransition::AwaitingReward;
                    info!(player_id, quest_id, "quest objectives complete, awaiting reward");
                }
                RewardDelivery::Immediate => {
                    instance.complete(now);
                    transition = QuestTransition::Completed;
                    grant = Some(self.rewards.grant(player_id, &definition.reward));
                    info!(player_id, quest_id, "quest completed, reward granted");
                }
            }
        }

        self.store.save_instance(player_id, instance);
        debug!(player_id, quest_id, objective_id, current, target, "progress applied");

        ProgressOutcome::Applied {
            quest_id: quest_id.to_string(),
            objective_id: objective_id.to_string(),
            current,
            target,
            objective_completed,
            transition,
            grant,
        }
    }

    // ------------------------------------------------------------------
    // Claim
    // ------------------------------------------------------------------

    /// Claim the reward of a quest waiting at its delivery point. Valid
    /// only from `AwaitingReward`; anything else is a caller bug and
    /// fails loudly.
    pub fn claim(
        &mut self,
        player_id: &str,
        quest_id: &str,
        now: DateTime<Utc>,
    ) -> Result<GrantOutcome, ClaimError> {
        let Some(definition) = self.catalog.get(quest_id) else {
            return Err(ClaimError::UnknownQuest {
                quest_id: quest_id.to_string(),
            });
        };

        let Some(instance) = self
            .players
            .get_mut(player_id)
            .and_then(|l| l.quests.get_mut(quest_id))
        else {
            return Err(ClaimError::NoInstance {
                quest_id: quest_id.to_string(),
            });
        };

        if instance.status != QuestStatus::AwaitingReward {
            return Err(ClaimError::NotAwaitingReward {
                quest_id: quest_id.to_string(),
                status: instance.status,
            });
        }

        instance.complete(now);
        let outcome = self.rewards.grant(player_id, &definition.reward);
        self.store.save_instance(player_id, instance);
        info!(player_id, quest_id, "quest reward claimed");
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Repeat cycles
    // ------------------------------------------------------------------

    /// Reset a completed daily/weekly quest once its window has elapsed.
    ///
    /// Returns true when the reset happened. Idempotent: after a reset
    /// the instance is `NotStarted`, so a second call is a no-op.
    pub fn try_reset(&mut self, player_id: &str, quest_id: &str, now: DateTime<Utc>) -> bool {
        let Some(definition) = self.catalog.get(quest_id) else {
            return false;
        };
        let Some(window) = definition.repeat.window() else {
            return false;
        };
        let Some(instance) = self
            .players
            .get_mut(player_id)
            .and_then(|l| l.quests.get_mut(quest_id))
        else {
            return false;
        };
        if instance.status != QuestStatus::Completed {
            return false;
        }
        let Some(completed_at) = instance.last_completed_at else {
            return false;
        };
        if now < completed_at + window {
            return false;
        }

        instance.reset_cycle(now);
        self.store.save_instance(player_id, instance);
        info!(player_id, quest_id, "repeat cycle reset");
        true
    }

    /// Reset a completed repeatable quest regardless of window. Entry
    /// point for the external scheduler driving `Manual` cycles.
    pub fn force_reset(&mut self, player_id: &str, quest_id: &str, now: DateTime<Utc>) -> bool {
        let Some(definition) = self.catalog.get(quest_id) else {
            return false;
        };
        if !definition.repeat.is_repeatable() {
            return false;
        }
        let Some(instance) = self
            .players
            .get_mut(player_id)
            .and_then(|l| l.quests.get_mut(quest_id))
        else {
            return false;
        };
        if instance.status != QuestStatus::Completed {
            return false;
        }

        instance.reset_cycle(now);
        self.store.save_instance(player_id, instance);
        info!(player_id, quest_id, "repeat cycle force-reset");
        true
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn instance(&self, player_id: &str, quest_id: &str) -> Option<&QuestInstance> {
        self.players
            .get(player_id)
            .and_then(|l| l.quests.get(quest_id))
    }

    /// All quests currently in progress or awaiting reward.
    pub fn active(&self, player_id: &str) -> Vec<&QuestInstance> {
        self.players
            .get(player_id)
            .map(|l| l.quests.values().filter(|i| i.is_active()).collect())
            .unwrap_or_default()
    }
}
