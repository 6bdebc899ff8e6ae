use rand::Rng;
use rand::RngExt;

use crate::*;

pub const STARTING_GOLD: Gold = 10;
pub const DYNAMITE_PRICE: Gold = 15;
pub const PING_PRICE: Gold = 10;

/// Gold cost of a single dig. Better shovels dig cheaper, floor of 1.
pub fn dig_cost(shovel_level: u8) -> Gold {
    let discount = Gold::from(shovel_level.saturating_sub(1) / 2);
    3u32.saturating_sub(discount).max(1)
}

/// Price of the next shovel upgrade, linear in the current level.
pub fn shovel_upgrade_cost(shovel_level: u8) -> Gold {
    25 + Gold::from(shovel_level.saturating_sub(1)) * 15
}

/// Ore payout for a direct dig. Deeper layers pay a small bonus.
pub fn ore_reward(rng: &mut impl Rng, depth: u32) -> Gold {
    6 + rng.random_range(0u32..6) + depth / 2
}

/// Ore payout inside a dynamite blast. Flat, no depth bonus.
pub fn blast_ore_reward(rng: &mut impl Rng) -> Gold {
    4 + rng.random_range(0u32..6)
}

/// Gold for a graded answer. Wrong answers keep a small participation payout.
pub fn answer_reward(difficulty: u8, correct: bool) -> Gold {
    let base = 6 + Gold::from(difficulty) * 3;
    if correct {
        base
    } else {
        (base * 35 / 100).max(2)
    }
}
