//! Quest Progression & Leveling Engine
//!
//! Tracks player progression through rule-governed quests and computes
//! character level from accumulated experience. The engine is a pure
//! in-process library: rendering, command parsing, storage engines, and
//! world manipulation are external collaborators behind small traits.
//!
//! The two cores:
//! - the quest progression engine: quest definitions (validated,
//!   immutable templates), per-player objective state machines, gating
//!   and repeat-cycle rules, reward resolution;
//! - the leveling curve engine: deterministic experience <-> level
//!   conversions per character class.

pub mod catalog;
pub mod definition;
pub mod error;
pub mod events;
pub mod instance;
pub mod leveling;
pub mod manager;
pub mod objective;
pub mod reward;

pub use catalog::QuestCatalog;
pub use definition::{
    CompletionLimit, ExclusivityPolicy, ItemGrant, QuestBuilder, QuestDefinition, RepeatCycle,
    Reward, RewardDelivery,
};
pub use error::{CatalogError, ClaimError, StartDenied, ValidationError};
pub use events::{IgnoreReason, ProgressOutcome, ProgressPayload, QuestTransition};
pub use instance::{QuestInstance, QuestStatus};
pub use leveling::{ClassCategory, ClassProfile, LevelCurve, CALIBRATION_EXP, INFINITE_EXP};
pub use manager::{PlayerLevels, QuestManager, QuestStore};
pub use objective::{ApplyResult, ObjectiveDef, ObjectiveProgress, ObjectiveSpec, ObjectiveState};
pub use reward::{
    preview, ExperienceSink, GrantOutcome, Inventory, RewardLine, RewardResolver, Wallet,
    WorldDrop,
};
