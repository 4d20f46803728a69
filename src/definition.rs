//! Quest definition structures and the validating builder.
//!
//! Definitions are immutable templates; per-player state lives in
//! `instance`. Construction always goes through [`QuestBuilder`] so every
//! definition in the system has passed the same validation, whether it
//! came from code or from a TOML file.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::objective::{ObjectiveDef, ObjectiveSpec};

// ============================================================================
// Reward
// ============================================================================

/// One item line of a reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGrant {
    pub item_id: String,
    pub count: i32,
}

/// An immutable bundle of currencies, items, and experience.
///
/// Duplicate currency types merge additively. An empty reward is legal and
/// grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    #[serde(default)]
    pub currencies: BTreeMap<String, i64>,
    #[serde(default)]
    pub items: Vec<ItemGrant>,
    #[serde(default)]
    pub exp: i64,
}

impl Reward {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_currency(mut self, currency: &str, amount: i64) -> Self {
        *self.currencies.entry(currency.to_string()).or_insert(0) += amount;
        self
    }

    pub fn with_item(mut self, item_id: &str, count: i32) -> Self {
        self.items.push(ItemGrant {
            item_id: item_id.to_string(),
            count,
        });
        self
    }

    pub fn with_exp(mut self, exp: i64) -> Self {
        self.exp = exp;
        self
    }

    /// True when granting this reward would do nothing.
    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty() && self.items.is_empty() && self.exp == 0
    }
}

// ============================================================================
// Policy enums
// ============================================================================

/// How often a quest may be repeated, and on what clock.
///
/// Daily and weekly imply repeatability by construction; the old
/// repeatable/daily/weekly flag triple collapses into one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatCycle {
    /// One-shot quest; never resets.
    #[default]
    None,
    /// Repeatable, but only through an explicit external reset trigger.
    Manual,
    /// Resets 24 hours after completion.
    Daily,
    /// Resets 7 days after completion.
    Weekly,
}

impl RepeatCycle {
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, RepeatCycle::None)
    }

    /// Automatic reset window, when the cycle has one.
    pub fn window(&self) -> Option<Duration> {
        match self {
            RepeatCycle::Daily => Some(Duration::hours(24)),
            RepeatCycle::Weekly => Some(Duration::days(7)),
            RepeatCycle::None | RepeatCycle::Manual => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatCycle::None => "none",
            RepeatCycle::Manual => "manual",
            RepeatCycle::Daily => "daily",
            RepeatCycle::Weekly => "weekly",
        }
    }
}

/// When a completed quest's reward is actually granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardDelivery {
    /// Granted synchronously the moment the last objective completes.
    #[default]
    Immediate,
    /// Held until the player returns to the quest source to claim it.
    NpcVisit,
}

/// Whether a completed exclusive quest keeps blocking, or only an active
/// one. The source behavior was underspecified, so it is a per-quest flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusivityPolicy {
    /// Only an in-progress or reward-pending exclusive quest blocks.
    #[default]
    ActiveOnly,
    /// A previously completed exclusive quest blocks forever.
    ActiveOrCompleted,
}

/// Maximum number of completions per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionLimit {
    Unlimited,
    Limited(u32),
}

impl CompletionLimit {
    /// Whether another completion cycle may begin.
    pub fn allows(&self, times_completed: u32) -> bool {
        match self {
            CompletionLimit::Unlimited => true,
            CompletionLimit::Limited(n) => times_completed < *n,
        }
    }
}

// ============================================================================
// Quest definition
// ============================================================================

/// A fully validated, immutable quest template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Ordered objective templates; order matters for sequential quests.
    pub objectives: Vec<ObjectiveDef>,
    /// Objectives must complete in listed order.
    pub sequential: bool,
    pub reward: Reward,
    pub repeat: RepeatCycle,
    /// Minimum player level; 0 = unbounded.
    pub min_level: i32,
    /// Maximum player level; 0 = unbounded.
    pub max_level: i32,
    /// Quests that must be completed at least once before this one starts.
    pub prerequisites: BTreeSet<String>,
    /// Quests mutually exclusive with this one.
    pub exclusive: BTreeSet<String>,
    pub exclusivity: ExclusivityPolicy,
    pub delivery: RewardDelivery,
    pub completion_limit: CompletionLimit,
}

impl QuestDefinition {
    pub fn builder(id: &str) -> QuestBuilder {
        QuestBuilder::new(id)
    }

    /// Get an objective template by id.
    pub fn objective(&self, id: &str) -> Option<&ObjectiveDef> {
        self.objectives.iter().find(|o| o.id == id)
    }

    /// Whether a player level satisfies the bounds (0 = unbounded).
    pub fn level_allows(&self, level: i32) -> bool {
        (self.min_level <= 0 || level >= self.min_level)
            && (self.max_level <= 0 || level <= self.max_level)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Accumulates quest configuration; `build()` validates and produces the
/// immutable [`QuestDefinition`] or a [`ValidationError`].
#[derive(Debug, Clone)]
pub struct QuestBuilder {
    id: String,
    name: String,
    description: String,
    category: String,
    objectives: Vec<ObjectiveDef>,
    sequential: bool,
    reward: Reward,
    repeat: RepeatCycle,
    min_level: i32,
    max_level: i32,
    prerequisites: BTreeSet<String>,
    exclusive: BTreeSet<String>,
    exclusivity: ExclusivityPolicy,
    delivery: RewardDelivery,
    completion_limit: Option<CompletionLimit>,
}

impl QuestBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            description: String::new(),
            category: String::new(),
            objectives: Vec::new(),
            sequential: false,
            reward: Reward::default(),
            repeat: RepeatCycle::None,
            min_level: 0,
            max_level: 0,
            prerequisites: BTreeSet::new(),
            exclusive: BTreeSet::new(),
            exclusivity: ExclusivityPolicy::default(),
            delivery: RewardDelivery::default(),
            completion_limit: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Append an objective template (definition order is completion order
    /// for sequential quests).
    pub fn objective(mut self, objective: ObjectiveDef) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn counter_objective(self, id: &str, description: &str, target: i32) -> Self {
        self.objective(ObjectiveDef::counter(id, description, target))
    }

    pub fn condition_objective(self, id: &str, description: &str) -> Self {
        self.objective(ObjectiveDef::condition(id, description))
    }

    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn reward(mut self, reward: Reward) -> Self {
        self.reward = reward;
        self
    }

    pub fn repeat(mut self, repeat: RepeatCycle) -> Self {
        self.repeat = repeat;
        self
    }

    /// Repeatable on an explicit external trigger.
    pub fn repeatable(self) -> Self {
        self.repeat(RepeatCycle::Manual)
    }

    pub fn daily(self) -> Self {
        self.repeat(RepeatCycle::Daily)
    }

    pub fn weekly(self) -> Self {
        self.repeat(RepeatCycle::Weekly)
    }

    pub fn min_level(mut self, min_level: i32) -> Self {
        self.min_level = min_level;
        self
    }

    pub fn max_level(mut self, max_level: i32) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn level_range(self, min_level: i32, max_level: i32) -> Self {
        self.min_level(min_level).max_level(max_level)
    }

    /// Require another quest to be completed at least once first.
    pub fn requires(mut self, quest_id: &str) -> Self {
        self.prerequisites.insert(quest_id.to_string());
        self
    }

    /// Mark another quest as mutually exclusive with this one.
    pub fn excludes(mut self, quest_id: &str) -> Self {
        self.exclusive.insert(quest_id.to_string());
        self
    }

    pub fn exclusivity(mut self, policy: ExclusivityPolicy) -> Self {
        self.exclusivity = policy;
        self
    }

    pub fn delivery(mut self, delivery: RewardDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn completion_limit(mut self, limit: u32) -> Self {
        self.completion_limit = Some(CompletionLimit::Limited(limit));
        self
    }

    pub fn unlimited_completions(mut self) -> Self {
        self.completion_limit = Some(CompletionLimit::Unlimited);
        self
    }

    /// Validate and produce the immutable definition.
    pub fn build(self) -> Result<QuestDefinition, ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyQuestId);
        }

        if self.objectives.is_empty() {
            return Err(ValidationError::NoObjectives { quest_id: self.id });
        }

        let mut seen = BTreeSet::new();
        for objective in &self.objectives {
            if !seen.insert(objective.id.as_str()) {
                return Err(ValidationError::DuplicateObjective {
                    quest_id: self.id,
                    objective_id: objective.id.clone(),
                });
            }
            if let ObjectiveSpec::Counter { target } = objective.spec {
                if target <= 0 {
                    return Err(ValidationError::NonPositiveTarget {
                        quest_id: self.id,
                        objective_id: objective.id.clone(),
                        target,
                    });
                }
            }
        }

        if self.max_level > 0 && self.min_level > self.max_level {
            return Err(ValidationError::InvertedLevelBounds {
                quest_id: self.id,
                min: self.min_level,
                max: self.max_level,
            });
        }

        if self.prerequisites.contains(&self.id) {
            return Err(ValidationError::SelfPrerequisite { quest_id: self.id });
        }
        if self.exclusive.contains(&self.id) {
            return Err(ValidationError::SelfExclusive { quest_id: self.id });
        }

        for (currency, amount) in &self.reward.currencies {
            if *amount <= 0 {
                return Err(ValidationError::NonPositiveCurrency {
                    quest_id: self.id,
                    currency: currency.clone(),
                });
            }
        }
        for item in &self.reward.items {
            if item.count <= 0 {
                return Err(ValidationError::NonPositiveItemCount {
                    quest_id: self.id,
                    item_id: item.item_id.clone(),
                });
            }
        }
        if self.reward.exp < 0 {
            return Err(ValidationError::NegativeExperience { quest_id: self.id });
        }

        // One-shot quests default to a single completion; repeatable
        // quests default to no limit.
        let completion_limit = match self.completion_limit {
            Some(CompletionLimit::Limited(0)) => {
                return Err(ValidationError::ZeroCompletionLimit { quest_id: self.id });
            }
            Some(limit) => limit,
            None if self.repeat.is_repeatable() => CompletionLimit::Unlimited,
            None => CompletionLimit::Limited(1),
        };

        Ok(QuestDefinition {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            objectives: self.objectives,
            sequential: self.sequential,
            reward: self.reward,
            repeat: self.repeat,
            min_level: self.min_level,
            max_level: self.max_level,
            prerequisites: self.prerequisites,
            exclusive: self.exclusive,
            exclusivity: self.exclusivity,
            delivery: self.delivery,
            completion_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_minimal_quest() {
        let quest = QuestDefinition::builder("first_hunt")
            .name("First Hunt")
            .counter_objective("kill_slimes", "Kill 5 slimes", 5)
            .build()
            .unwrap();

        assert_eq!(quest.id, "first_hunt");
        assert_eq!(quest.objectives.len(), 1);
        assert_eq!(quest.repeat, RepeatCycle::None);
        assert_eq!(quest.completion_limit, CompletionLimit::Limited(1));
        assert_eq!(quest.delivery, RewardDelivery::Immediate);
    }

    #[test]
    fn test_empty_objectives_rejected() {
        let err = QuestDefinition::builder("empty").build().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NoObjectives {
                quest_id: "empty".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_objective_rejected() {
        let err = QuestDefinition::builder("dup")
            .counter_objective("a", "", 1)
            .condition_objective("a", "")
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateObjective { .. }));
    }

    #[test]
    fn test_non_positive_target_rejected() {
        let err = QuestDefinition::builder("bad_target")
            .counter_objective("a", "", 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonPositiveTarget { target: 0, .. }));
    }

    #[test]
    fn test_inverted_level_bounds_rejected() {
        let err = QuestDefinition::builder("bounds")
            .counter_objective("a", "", 1)
            .level_range(20, 10)
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvertedLevelBounds { min: 20, max: 10, .. }));

        // max_level == 0 means unbounded above, so any min is fine.
        let quest = QuestDefinition::builder("bounds_ok")
            .counter_objective("a", "", 1)
            .min_level(20)
            .build()
            .unwrap();
        assert!(quest.level_allows(20));
        assert!(!quest.level_allows(19));
        assert!(quest.level_allows(500));
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = QuestDefinition::builder("loop")
            .counter_objective("a", "", 1)
            .requires("loop")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SelfPrerequisite {
                quest_id: "loop".to_string()
            }
        );

        let err = QuestDefinition::builder("loop")
            .counter_objective("a", "", 1)
            .excludes("loop")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SelfExclusive {
                quest_id: "loop".to_string()
            }
        );
    }

    #[test]
    fn test_daily_implies_repeatable_and_unlimited() {
        let quest = QuestDefinition::builder("daily_bounty")
            .counter_objective("a", "", 1)
            .daily()
            .build()
            .unwrap();
        assert!(quest.repeat.is_repeatable());
        assert_eq!(quest.repeat.window(), Some(Duration::hours(24)));
        assert_eq!(quest.completion_limit, CompletionLimit::Unlimited);
    }

    #[test]
    fn test_zero_completion_limit_rejected() {
        let err = QuestDefinition::builder("zero")
            .counter_objective("a", "", 1)
            .completion_limit(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::ZeroCompletionLimit { .. }));
    }

    #[test]
    fn test_reward_currency_merges_additively() {
        let reward = Reward::new()
            .with_currency("gold", 25)
            .with_currency("gold", 10)
            .with_currency("gems", 1);
        assert_eq!(reward.currencies.get("gold"), Some(&35));
        assert_eq!(reward.currencies.get("gems"), Some(&1));
    }

    #[test]
    fn test_empty_reward_is_legal() {
        let quest = QuestDefinition::builder("thankless")
            .counter_objective("a", "", 1)
            .build()
            .unwrap();
        assert!(quest.reward.is_empty());
    }

    #[test]
    fn test_bad_reward_rejected() {
        let err = QuestDefinition::builder("bad_gold")
            .counter_objective("a", "", 1)
            .reward(Reward::new().with_currency("gold", 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonPositiveCurrency { .. }));

        let err = QuestDefinition::builder("bad_exp")
            .counter_objective("a", "", 1)
            .reward(Reward::new().with_exp(-5))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::NegativeExperience { .. }));
    }
}
