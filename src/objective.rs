//! Objective templates and per-player objective state.
//!
//! Definitions carry [`ObjectiveDef`] templates; each player's quest
//! instance clones them into [`ObjectiveProgress`] records. Counter
//! progress is additive and clamps at the target; condition progress is
//! idempotent and only reverts through an explicit reset.

use serde::{Deserialize, Serialize};

use crate::events::ProgressPayload;

/// What applying a payload did to a single objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// No state change (already complete, or payload kind mismatch).
    Ignored,
    /// Progress recorded, objective still incomplete.
    Advanced,
    /// This payload completed the objective.
    Completed,
}

/// Template for one objective inside a quest definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveSpec {
    /// Accumulate `target` units of progress.
    Counter { target: i32 },
    /// A single yes/no condition reported by the world.
    Condition,
}

/// A named objective template. The id is unique within its quest and is
/// how events are routed; descriptions belong to presentation and are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveDef {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub spec: ObjectiveSpec,
}

impl ObjectiveDef {
    pub fn counter(id: &str, description: &str, target: i32) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            spec: ObjectiveSpec::Counter { target },
        }
    }

    pub fn condition(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            spec: ObjectiveSpec::Condition,
        }
    }
}

/// Kind-specific mutable state of one objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveState {
    Counter { current: i32, target: i32 },
    Condition { satisfied: bool },
}

/// Per-player progress on a single objective. Owned exclusively by the
/// quest instance that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub id: String,
    pub state: ObjectiveState,
}

impl ObjectiveProgress {
    /// Fresh state cloned from a template.
    pub fn from_def(def: &ObjectiveDef) -> Self {
        let state = match def.spec {
            ObjectiveSpec::Counter { target } => ObjectiveState::Counter { current: 0, target },
            ObjectiveSpec::Condition => ObjectiveState::Condition { satisfied: false },
        };
        Self {
            id: def.id.clone(),
            state,
        }
    }

    /// Apply a payload to this objective.
    ///
    /// Counter deltas are additive and clamp to `[0, target]`; a satisfied
    /// event on an already-satisfied condition is a no-op. Payloads of the
    /// wrong kind are ignored.
    pub fn apply(&mut self, payload: &ProgressPayload) -> ApplyResult {
        match (&mut self.state, payload) {
            (ObjectiveState::Counter { current, target }, ProgressPayload::Add(delta)) => {
                if *current >= *target {
                    return ApplyResult::Ignored;
                }
                *current = (*current + delta).clamp(0, *target);
                if *current >= *target {
                    ApplyResult::Completed
                } else {
                    ApplyResult::Advanced
                }
            }
            (ObjectiveState::Condition { satisfied }, ProgressPayload::Satisfied) => {
                if *satisfied {
                    ApplyResult::Ignored
                } else {
                    *satisfied = true;
                    ApplyResult::Completed
                }
            }
            _ => ApplyResult::Ignored,
        }
    }

    pub fn is_complete(&self) -> bool {
        match &self.state {
            ObjectiveState::Counter { current, target } => current >= target,
            ObjectiveState::Condition { satisfied } => *satisfied,
        }
    }

    /// Progress fraction in [0, 1].
    pub fn fraction(&self) -> f32 {
        match &self.state {
            ObjectiveState::Counter { current, target } => {
                if *target <= 0 {
                    1.0
                } else {
                    (*current as f32 / *target as f32).clamp(0.0, 1.0)
                }
            }
            ObjectiveState::Condition { satisfied } => {
                if *satisfied {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// `(current, target)` counts; condition objectives report 0-or-1 of 1.
    pub fn counts(&self) -> (i32, i32) {
        match &self.state {
            ObjectiveState::Counter { current, target } => (*current, *target),
            ObjectiveState::Condition { satisfied } => (i32::from(*satisfied), 1),
        }
    }

    /// Clear progress back to the freshly-started state.
    pub fn reset(&mut self) {
        match &mut self.state {
            ObjectiveState::Counter { current, .. } => *current = 0,
            ObjectiveState::Condition { satisfied } => *satisfied = false,
        }
    }
}
