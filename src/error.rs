//! Error taxonomy for the quest engine.
//!
//! Build-time definition faults, start-eligibility failures, and claim
//! failures are distinct families so callers can react to each precisely.
//! Soft event drops are not errors at all; see `events::IgnoreReason`.

use thiserror::Error;

use crate::instance::QuestStatus;

/// A quest definition that must not enter the catalog.
///
/// Raised by `QuestBuilder::build()`. Fatal at definition-load time: the
/// catalog logs the fault and rejects the quest, never silently accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quest id is empty")]
    EmptyQuestId,

    #[error("quest '{quest_id}' has no objectives")]
    NoObjectives { quest_id: String },

    #[error("quest '{quest_id}' declares objective '{objective_id}' twice")]
    DuplicateObjective {
        quest_id: String,
        objective_id: String,
    },

    #[error("objective '{objective_id}' in quest '{quest_id}' has non-positive target {target}")]
    NonPositiveTarget {
        quest_id: String,
        objective_id: String,
        target: i32,
    },

    #[error("objective '{objective_id}' in quest '{quest_id}' has unknown kind '{kind}'")]
    UnknownObjectiveKind {
        quest_id: String,
        objective_id: String,
        kind: String,
    },

    #[error("quest '{quest_id}' has inverted level bounds {min}..{max}")]
    InvertedLevelBounds {
        quest_id: String,
        min: i32,
        max: i32,
    },

    #[error("quest '{quest_id}' lists itself as a prerequisite")]
    SelfPrerequisite { quest_id: String },

    #[error("quest '{quest_id}' lists itself as exclusive")]
    SelfExclusive { quest_id: String },

    #[error("quest '{quest_id}' has a completion limit of zero")]
    ZeroCompletionLimit { quest_id: String },

    #[error("quest '{quest_id}' grants a non-positive amount of currency '{currency}'")]
    NonPositiveCurrency {
        quest_id: String,
        currency: String,
    },

    #[error("quest '{quest_id}' grants a non-positive count of item '{item_id}'")]
    NonPositiveItemCount {
        quest_id: String,
        item_id: String,
    },

    #[error("quest '{quest_id}' grants negative experience")]
    NegativeExperience { quest_id: String },
}

/// Why `start()` refused to create a quest instance.
///
/// One variant per unmet precondition, so the caller can surface a precise
/// user-facing reason. No state is mutated when start is denied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartDenied {
    #[error("quest '{quest_id}' is not in the catalog")]
    UnknownQuest { quest_id: String },

    #[error("quest '{quest_id}' is already active")]
    AlreadyActive { quest_id: String },

    #[error("quest '{quest_id}' has reached its completion limit")]
    LimitReached { quest_id: String },

    #[error("quest '{quest_id}' was completed this cycle and has not reset yet")]
    AwaitingReset { quest_id: String },

    #[error("player level {actual} is below the required level {required}")]
    LevelTooLow { required: i32, actual: i32 },

    #[error("player level {actual} is above the maximum level {maximum}")]
    LevelTooHigh { maximum: i32, actual: i32 },

    #[error("prerequisite quest '{prerequisite}' has not been completed")]
    PrerequisiteMissing { prerequisite: String },

    #[error("exclusive quest '{conflicting}' blocks this quest")]
    ExclusiveConflict { conflicting: String },
}

/// `claim()` called in the wrong state. A caller bug, surfaced loudly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("quest '{quest_id}' is not in the catalog")]
    UnknownQuest { quest_id: String },

    #[error("no progress record for quest '{quest_id}'")]
    NoInstance { quest_id: String },

    #[error("quest '{quest_id}' is not awaiting its reward (status: {status})")]
    NotAwaitingReward {
        quest_id: String,
        status: QuestStatus,
    },
}

/// Failure while loading quest definitions into the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read quest directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse quest file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
