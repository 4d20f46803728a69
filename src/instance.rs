//! Per-player quest progress records.
//!
//! A [`QuestInstance`] is the mutable state behind one `(player, quest)`
//! pair: objective progress cloned from the definition's templates, the
//! lifecycle status, and repeat-cycle bookkeeping. Instances are only
//! mutated by the progression manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::definition::QuestDefinition;
use crate::objective::ObjectiveProgress;

/// Lifecycle status of a quest for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Never started, or reset and waiting to be started again.
    NotStarted,
    /// Started, objectives accepting progress events.
    InProgress,
    /// All objectives complete; reward pending at the delivery point.
    AwaitingReward,
    /// Completed; terminal until a repeat-cycle reset.
    Completed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::NotStarted => "not_started",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::AwaitingReward => "awaiting_reward",
            QuestStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(QuestStatus::NotStarted),
            "in_progress" => Some(QuestStatus::InProgress),
            "awaiting_reward" => Some(QuestStatus::AwaitingReward),
            "completed" => Some(QuestStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable per-player state for one quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestInstance {
    pub quest_id: String,
    pub status: QuestStatus,
    /// Objective state in definition order.
    pub objectives: Vec<ObjectiveProgress>,
    /// Completions so far; incremented when the reward is granted.
    pub times_completed: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub last_reset_at: Option<DateTime<Utc>>,
}

impl QuestInstance {
    /// Fresh instance with objective state cloned from the definition.
    pub fn new(definition: &QuestDefinition, now: DateTime<Utc>) -> Self {
        Self {
            quest_id: definition.id.clone(),
            status: QuestStatus::InProgress,
            objectives: definition
                .objectives
                .iter()
                .map(ObjectiveProgress::from_def)
                .collect(),
            times_completed: 0,
            started_at: Some(now),
            last_completed_at: None,
            last_reset_at: None,
        }
    }

    pub fn objective(&self, id: &str) -> Option<&ObjectiveProgress> {
        self.objectives.iter().find(|o| o.id == id)
    }

    pub fn objective_mut(&mut self, id: &str) -> Option<&mut ObjectiveProgress> {
        self.objectives.iter_mut().find(|o| o.id == id)
    }

    /// Id of the first incomplete objective in definition order.
    pub fn first_incomplete(&self) -> Option<&str> {
        self.objectives
            .iter()
            .find(|o| !o.is_complete())
            .map(|o| o.id.as_str())
    }

    pub fn all_complete(&self) -> bool {
        self.objectives.iter().all(|o| o.is_complete())
    }

    /// In progress or awaiting its reward.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            QuestStatus::InProgress | QuestStatus::AwaitingReward
        )
    }

    /// Overall progress fraction in [0, 1], averaged over objectives.
    pub fn fraction(&self) -> f32 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.objectives.iter().map(|o| o.fraction()).sum();
        sum / self.objectives.len() as f32
    }

    /// Mark completed and count the completion.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = QuestStatus::Completed;
        self.last_completed_at = Some(now);
        self.times_completed += 1;
    }

    /// Begin a new repeat cycle: clear objective state, drop the
    /// completion timestamp, return to `NotStarted`.
    pub fn reset_cycle(&mut self, now: DateTime<Utc>) {
        for objective in &mut self.objectives {
            objective.reset();
        }
        self.status = QuestStatus::NotStarted;
        self.last_completed_at = None;
        self.last_reset_at = Some(now);
    }

    /// Re-enter `InProgress` after a cycle reset, with fresh objective
    /// state cloned from the definition (templates may have changed).
    pub fn reactivate(&mut self, definition: &QuestDefinition, now: DateTime<Utc>) {
        self.objectives = definition
            .objectives
            .iter()
            .map(ObjectiveProgress::from_def)
            .collect();
        self.status = QuestStatus::InProgress;
        self.started_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::QuestDefinition;
    use crate::events::ProgressPayload;

    fn two_objective_quest() -> QuestDefinition {
        QuestDefinition::builder("first_hunt")
            .counter_objective("kill_slimes", "Kill 5 slimes", 5)
            .condition_objective("report_back", "Report back")
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_clones_fresh_state() {
        let def = two_objective_quest();
        let instance = QuestInstance::new(&def, Utc::now());

        assert_eq!(instance.status, QuestStatus::InProgress);
        assert_eq!(instance.objectives.len(), 2);
        assert_eq!(instance.times_completed, 0);
        assert!(!instance.all_complete());
        assert_eq!(instance.first_incomplete(), Some("kill_slimes"));
    }

    #[test]
    fn test_complete_counts_and_stamps() {
        let def = two_objective_quest();
        let mut instance = QuestInstance::new(&def, Utc::now());
        let now = Utc::now();

        instance.complete(now);
        assert_eq!(instance.status, QuestStatus::Completed);
        assert_eq!(instance.times_completed, 1);
        assert_eq!(instance.last_completed_at, Some(now));
    }

    #[test]
    fn test_reset_cycle_clears_state() {
        let def = two_objective_quest();
        let mut instance = QuestInstance::new(&def, Utc::now());

        instance
            .objective_mut("kill_slimes")
            .unwrap()
            .apply(&ProgressPayload::Add(5));
        instance
            .objective_mut("report_back")
            .unwrap()
            .apply(&ProgressPayload::Satisfied);
        instance.complete(Utc::now());

        let reset_at = Utc::now();
        instance.reset_cycle(reset_at);

        assert_eq!(instance.status, QuestStatus::NotStarted);
        assert_eq!(instance.times_completed, 1);
        assert_eq!(instance.last_completed_at, None);
        assert_eq!(instance.last_reset_at, Some(reset_at));
        assert!(instance.objectives.iter().all(|o| !o.is_complete()));
    }

    #[test]
    fn test_fraction_averages_objectives() {
        let def = two_objective_quest();
        let mut instance = QuestInstance::new(&def, Utc::now());
        assert_eq!(instance.fraction(), 0.0);

        instance
            .objective_mut("report_back")
            .unwrap()
            .apply(&ProgressPayload::Satisfied);
        assert_eq!(instance.fraction(), 0.5);
    }

    #[test]
    fn test_serde_round_trip_mid_progress() {
        let def = two_objective_quest();
        let mut instance = QuestInstance::new(&def, Utc::now());
        instance
            .objective_mut("kill_slimes")
            .unwrap()
            .apply(&ProgressPayload::Add(3));

        let json = serde_json::to_string(&instance).unwrap();
        let restored: QuestInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, instance);
        assert_eq!(restored.objective("kill_slimes").unwrap().counts(), (3, 5));
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            QuestStatus::NotStarted,
            QuestStatus::InProgress,
            QuestStatus::AwaitingReward,
            QuestStatus::Completed,
        ] {
            assert_eq!(QuestStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(QuestStatus::from_str("abandoned"), None);
    }
}
