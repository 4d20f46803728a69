//! Reward resolution.
//!
//! `preview` turns a reward bundle into display lines with no side
//! effects; `RewardResolver::grant` applies the bundle to a player through
//! the wallet/inventory/world-drop/experience collaborators. Granting is
//! best-effort per sub-reward: an item that does not fit the inventory is
//! dropped into the world instead, and reported, so a quest reward is
//! never silently lost.

use tracing::{debug, warn};

use crate::definition::{ItemGrant, Reward};

// ============================================================================
// Collaborator traits
// ============================================================================

/// Currency sink for a player.
pub trait Wallet {
    fn deposit(&mut self, player_id: &str, currency: &str, amount: i64);
}

/// Item sink for a player. `try_give` returns false when there is no room.
pub trait Inventory {
    fn try_give(&mut self, player_id: &str, item_id: &str, count: i32) -> bool;
}

/// Fallback item sink: drops the item into the world at the player.
pub trait WorldDrop {
    fn drop_item(&mut self, player_id: &str, item_id: &str, count: i32);
}

/// Experience sink for a player.
pub trait ExperienceSink {
    fn grant_exp(&mut self, player_id: &str, amount: i64);
}

// ============================================================================
// Preview
// ============================================================================

/// One display line of a reward preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardLine {
    Currency { currency: String, amount: i64 },
    Item { item_id: String, count: i32 },
    Experience { amount: i64 },
}

/// Describe a reward without applying it: currency lines, then item
/// lines, then the experience line. Pure; used by presentation.
pub fn preview(reward: &Reward) -> Vec<RewardLine> {
    let mut lines = Vec::new();
    for (currency, amount) in &reward.currencies {
        lines.push(RewardLine::Currency {
            currency: currency.clone(),
            amount: *amount,
        });
    }
    for item in &reward.items {
        lines.push(RewardLine::Item {
            item_id: item.item_id.clone(),
            count: item.count,
        });
    }
    if reward.exp > 0 {
        lines.push(RewardLine::Experience { amount: reward.exp });
    }
    lines
}

// ============================================================================
// Grant
// ============================================================================

/// What actually happened when a reward was granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantOutcome {
    /// The bundle that was applied.
    pub granted: Reward,
    /// Items that did not fit the inventory and fell to the world.
    /// Non-empty means the caller should notify the player.
    pub dropped_items: Vec<ItemGrant>,
}

impl GrantOutcome {
    /// Everything landed where it was supposed to.
    pub fn fully_delivered(&self) -> bool {
        self.dropped_items.is_empty()
    }
}

/// Applies reward bundles to players through injected collaborators.
pub struct RewardResolver {
    wallet: Box<dyn Wallet>,
    inventory: Box<dyn Inventory>,
    world_drop: Box<dyn WorldDrop>,
    experience: Box<dyn ExperienceSink>,
}

impl RewardResolver {
    pub fn new(
        wallet: Box<dyn Wallet>,
        inventory: Box<dyn Inventory>,
        world_drop: Box<dyn WorldDrop>,
        experience: Box<dyn ExperienceSink>,
    ) -> Self {
        Self {
            wallet,
            inventory,
            world_drop,
            experience,
        }
    }

    /// Grant a reward bundle to a player, best-effort per sub-reward.
    /// Nothing is rolled back on a partial failure.
    pub fn grant(&mut self, player_id: &str, reward: &Reward) -> GrantOutcome {
        for (currency, amount) in &reward.currencies {
            self.wallet.deposit(player_id, currency, *amount);
            debug!(player_id, currency = %currency, amount = *amount, "granted currency");
        }

        let mut dropped_items = Vec::new();
        for item in &reward.items {
            if self.inventory.try_give(player_id, &item.item_id, item.count) {
                debug!(player_id, item_id = %item.item_id, count = item.count, "granted item");
            } else {
                self.world_drop.drop_item(player_id, &item.item_id, item.count);
                warn!(
                    player_id,
                    item_id = %item.item_id,
                    count = item.count,
                    "inventory full, reward item dropped to world"
                );
                dropped_items.push(item.clone());
            }
        }

        if reward.exp > 0 {
            self.experience.grant_exp(player_id, reward.exp);
            debug!(player_id, exp = reward.exp, "granted experience");
        }

        GrantOutcome {
            granted: reward.clone(),
            dropped_items,
        }
    }
}
