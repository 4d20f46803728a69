//! Quest catalog.
//!
//! Loads quest definitions from TOML files, funnels every file through the
//! validating builder, and serves them as shared read-only templates.
//! Malformed definitions are rejected and logged, never silently accepted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::definition::{
    ExclusivityPolicy, QuestBuilder, QuestDefinition, RepeatCycle, Reward, RewardDelivery,
};
use crate::error::{CatalogError, ValidationError};
use crate::objective::ObjectiveDef;

// ============================================================================
// Raw TOML structures
// ============================================================================

/// Top-level shape of a quest file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sequential: bool,
    #[serde(default)]
    pub repeat: RepeatCycle,
    #[serde(default)]
    pub delivery: RewardDelivery,
    #[serde(default)]
    pub min_level: i32,
    #[serde(default)]
    pub max_level: i32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub exclusive: Vec<String>,
    #[serde(default)]
    pub exclusivity: ExclusivityPolicy,
    /// 0 = unlimited; absent = engine default for the repeat cycle.
    #[serde(default)]
    pub completion_limit: Option<u32>,
    #[serde(default)]
    pub objectives: Vec<RawObjective>,
    #[serde(default)]
    pub reward: Option<RawReward>,
}

/// Raw objective as it appears in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    pub id: String,
    pub kind: String,
    #[serde(default = "default_target")]
    pub target: i32,
    #[serde(default)]
    pub description: String,
}

fn default_target() -> i32 {
    1
}

/// Raw reward as it appears in TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReward {
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub currencies: HashMap<String, i64>,
    #[serde(default)]
    pub items: Vec<RawItemGrant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawItemGrant {
    pub id: String,
    #[serde(default = "default_target")]
    pub count: i32,
}

impl RawQuest {
    /// Run the raw data through the builder, producing a validated
    /// definition or the specific fault.
    pub fn build(&self) -> Result<QuestDefinition, ValidationError> {
        let mut builder = QuestBuilder::new(&self.id)
            .name(&self.name)
            .description(&self.description)
            .category(&self.category)
            .sequential(self.sequential)
            .repeat(self.repeat)
            .delivery(self.delivery)
            .exclusivity(self.exclusivity)
            .min_level(self.min_level)
            .max_level(self.max_level);

        for objective in &self.objectives {
            let def = match objective.kind.as_str() {
                "counter" => ObjectiveDef::counter(
                    &objective.id,
                    &objective.description,
                    objective.target,
                ),
                "condition" => ObjectiveDef::condition(&objective.id, &objective.description),
                other => {
                    return Err(ValidationError::UnknownObjectiveKind {
                        quest_id: self.id.clone(),
                        objective_id: objective.id.clone(),
                        kind: other.to_string(),
                    });
                }
            };
            builder = builder.objective(def);
        }

        for prerequisite in &self.prerequisites {
            builder = builder.requires(prerequisite);
        }
        for exclusive in &self.exclusive {
            builder = builder.excludes(exclusive);
        }

        if let Some(raw) = &self.reward {
            let mut reward = Reward::new().with_exp(raw.exp);
            for (currency, amount) in &raw.currencies {
                reward = reward.with_currency(currency, *amount);
            }
            for item in &raw.items {
                reward = reward.with_item(&item.id, item.count);
            }
            builder = builder.reward(reward);
        }

        builder = match self.completion_limit {
            Some(0) => builder.unlimited_completions(),
            Some(n) => builder.completion_limit(n),
            None => builder,
        };

        builder.build()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Registry of all validated quest definitions.
#[derive(Default)]
pub struct QuestCatalog {
    quests: HashMap<String, Arc<QuestDefinition>>,
}

impl QuestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition built in code.
    pub fn insert(&mut self, definition: QuestDefinition) {
        if self.quests.contains_key(&definition.id) {
            warn!("Duplicate quest id '{}', overwriting", definition.id);
        }
        self.quests.insert(definition.id.clone(), Arc::new(definition));
    }

    /// Load all quest definitions from a directory tree of `*.toml` files.
    ///
    /// Individual files that fail to parse or validate are logged and
    /// skipped; returns how many definitions were accepted.
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        if !dir.exists() {
            warn!("Quest directory does not exist: {:?}", dir);
            return Ok(0);
        }

        let mut paths = Vec::new();
        collect_toml_files(dir, &mut paths)?;

        let mut count = 0;
        for path in paths {
            match self.load_quest_file(&path) {
                Ok(quest_id) => {
                    info!("Loaded quest '{}' from {:?}", quest_id, path);
                    count += 1;
                }
                Err(e) => {
                    warn!("Rejected quest file {:?}: {}", path, e);
                }
            }
        }

        info!("Loaded {} quest definitions", count);
        self.check_references();
        Ok(count)
    }

    fn load_quest_file(&mut self, path: &Path) -> Result<String, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let raw: RawQuestFile = toml::from_str(&content)?;
        let quest = raw.quest.build()?;
        let quest_id = quest.id.clone();
        self.insert(quest);
        Ok(quest_id)
    }

    /// Warn about prerequisite/exclusive ids that name no loaded quest.
    /// Dangling references are not fatal: the gate simply never opens
    /// (prerequisite) or never blocks (exclusive).
    fn check_references(&self) {
        for quest in self.quests.values() {
            for prerequisite in &quest.prerequisites {
                if !self.quests.contains_key(prerequisite) {
                    warn!(
                        "Quest '{}' requires unknown quest '{}'",
                        quest.id, prerequisite
                    );
                }
            }
            for exclusive in &quest.exclusive {
                if !self.quests.contains_key(exclusive) {
                    warn!(
                        "Quest '{}' excludes unknown quest '{}'",
                        quest.id, exclusive
                    );
                }
            }
        }
    }

    pub fn get(&self, quest_id: &str) -> Option<Arc<QuestDefinition>> {
        self.quests.get(quest_id).cloned()
    }

    pub fn contains(&self, quest_id: &str) -> bool {
        self.quests.contains_key(quest_id)
    }

    pub fn all_ids(&self) -> Vec<String> {
        self.quests.keys().cloned().collect()
    }

    pub fn quests_in_category(&self, category: &str) -> Vec<Arc<QuestDefinition>> {
        self.quests
            .values()
            .filter(|q| q.category == category)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::CompletionLimit;
    use tempfile::TempDir;

    fn valid_quest_toml() -> &'static str {
        r#"
[quest]
id = "first_hunt"
name = "First Hunt"
description = "Thin the slimes near the village"
category = "hunting"
repeat = "daily"
delivery = "npc_visit"
min_level = 3

[[quest.objectives]]
id = "kill_slimes"
kind = "counter"
target = 5
description = "Kill 5 slimes"

[[quest.objectives]]
id = "report_back"
kind = "condition"
description = "Report back to the hunter"

[quest.reward]
exp = 50
currencies = { gold = 25 }

[[quest.reward.items]]
id = "short_sword"
count = 1
"#
    }

    fn invalid_quest_toml() -> &'static str {
        // No objectives: must be rejected by validation.
        r#"
[quest]
id = "hollow"
name = "Hollow Quest"
"#
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("hunting");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("first_hunt.toml"), valid_quest_toml()).unwrap();

        let mut catalog = QuestCatalog::new();
        let count = catalog.load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(count, 1);

        let quest = catalog.get("first_hunt").unwrap();
        assert_eq!(quest.name, "First Hunt");
        assert_eq!(quest.objectives.len(), 2);
        assert_eq!(quest.repeat, RepeatCycle::Daily);
        assert_eq!(quest.delivery, RewardDelivery::NpcVisit);
        assert_eq!(quest.min_level, 3);
        assert_eq!(quest.completion_limit, CompletionLimit::Unlimited);
        assert_eq!(quest.reward.exp, 50);
        assert_eq!(quest.reward.currencies.get("gold"), Some(&25));
        assert_eq!(quest.reward.items.len(), 1);
    }

    #[test]
    fn test_invalid_definition_rejected_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("good.toml"), valid_quest_toml()).unwrap();
        std::fs::write(temp_dir.path().join("bad.toml"), invalid_quest_toml()).unwrap();

        let mut catalog = QuestCatalog::new();
        let count = catalog.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(count, 1);
        assert!(catalog.contains("first_hunt"));
        assert!(!catalog.contains("hollow"));
    }

    #[test]
    fn test_unknown_objective_kind_rejected() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = "odd"

[[quest.objectives]]
id = "obj"
kind = "escort"
"#,
        )
        .unwrap();

        let err = raw.quest.build().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownObjectiveKind { .. }));
    }

    #[test]
    fn test_completion_limit_zero_means_unlimited() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = "grind"
completion_limit = 0

[[quest.objectives]]
id = "obj"
kind = "counter"
target = 10
"#,
        )
        .unwrap();

        let quest = raw.quest.build().unwrap();
        assert_eq!(quest.completion_limit, CompletionLimit::Unlimited);
    }

    #[test]
    fn test_category_lookup() {
        let mut catalog = QuestCatalog::new();
        catalog.insert(
            QuestDefinition::builder("a")
                .category("hunting")
                .counter_objective("x", "", 1)
                .build()
                .unwrap(),
        );
        catalog.insert(
            QuestDefinition::builder("b")
                .category("gathering")
                .counter_objective("x", "", 1)
                .build()
                .unwrap(),
        );

        let hunting = catalog.quests_in_category("hunting");
        assert_eq!(hunting.len(), 1);
        assert_eq!(hunting[0].id, "a");
        assert_eq!(catalog.len(), 2);
    }
}
