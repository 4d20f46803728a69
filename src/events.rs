//! Progress event payloads and the outcome of applying them.
//!
//! The surrounding layers translate world events ("player broke a block",
//! "player killed a mob") into a payload routed at one objective of one
//! quest; the engine reports back exactly what changed.

use serde::{Deserialize, Serialize};

/// Payload of one objective progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPayload {
    /// Additive progress toward a counter objective.
    Add(i32),
    /// A condition objective's condition was met.
    Satisfied,
}

/// Why a progress event was dropped. Soft by design: logged at low
/// severity, never an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The quest is unknown or not currently in progress for this player.
    QuestNotActive,
    /// No objective with that id exists on the instance.
    UnknownObjective,
    /// Sequential quest and this is not the first incomplete objective.
    OutOfSequence,
    /// The objective is already complete; re-applying is a no-op.
    AlreadyComplete,
    /// Payload kind does not match the objective kind.
    PayloadMismatch,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::QuestNotActive => "quest_not_active",
            IgnoreReason::UnknownObjective => "unknown_objective",
            IgnoreReason::OutOfSequence => "out_of_sequence",
            IgnoreReason::AlreadyComplete => "already_complete",
            IgnoreReason::PayloadMismatch => "payload_mismatch",
        }
    }
}

/// Quest-level transition triggered by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestTransition {
    /// Quest stays in progress.
    None,
    /// All objectives complete; reward is claimed at the delivery point.
    AwaitingReward,
    /// All objectives complete; reward granted synchronously.
    Completed,
}

/// Result of `QuestManager::apply_progress`.
#[derive(Debug, Clone)]
pub enum ProgressOutcome {
    Applied {
        quest_id: String,
        objective_id: String,
        /// Progress after the event (condition objectives report 0 or 1).
        current: i32,
        target: i32,
        /// Whether this event completed the objective.
        objective_completed: bool,
        transition: QuestTransition,
        /// Present when the transition granted the reward immediately.
        grant: Option<crate::reward::GrantOutcome>,
    },
    Ignored {
        quest_id: String,
        reason: IgnoreReason,
    },
}

impl ProgressOutcome {
    pub fn ignored(quest_id: &str, reason: IgnoreReason) -> Self {
        ProgressOutcome::Ignored {
            quest_id: quest_id.to_string(),
            reason,
        }
    }

    /// Whether the event changed any state.
    pub fn was_applied(&self) -> bool {
        matches!(self, ProgressOutcome::Applied { .. })
    }

    pub fn transition(&self) -> QuestTransition {
        match self {
            ProgressOutcome::Applied { transition, .. } => *transition,
            ProgressOutcome::Ignored { .. } => QuestTransition::None,
        }
    }
}
