//! Block spawning
//!
//! Each new block's width and category come from the tier matching the
//! current tower height, rolled with the round's seeded RNG. Higher towers
//! hand out narrower blocks.

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::body::{BlockCategory, PhysicsBody};
use crate::settings::{SpawnSettings, SpawnTier};

/// Size and category for the next block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSpec {
    pub size: DVec2,
    pub category: BlockCategory,
}

/// Tier that applies at `height` (the last tier is open ended)
pub fn tier_for_height(settings: &SpawnSettings, height: u32) -> SpawnTier {
    settings
        .tiers
        .iter()
        .find(|t| t.max_height.is_none_or(|max| height < max))
        .or(settings.tiers.last())
        .copied()
        .unwrap_or(SpawnTier {
            max_height: None,
            min_width: crate::consts::BLOCK_WIDTH,
            max_width: crate::consts::BLOCK_WIDTH,
        })
}

/// Roll a category from the configured odds
fn roll_category(settings: &SpawnSettings, rng: &mut Pcg32) -> BlockCategory {
    let roll = rng.random_range(0..100u32);
    let bonus = settings.bonus_chance;
    let wide = bonus + settings.wide_chance;
    let narrow = wide + settings.narrow_chance;

    if roll < bonus {
        BlockCategory::Bonus
    } else if roll < wide {
        BlockCategory::Wide
    } else if roll < narrow {
        BlockCategory::Narrow
    } else {
        BlockCategory::Standard
    }
}

/// Roll the next block for a tower of `height` levels
pub fn roll_block(settings: &SpawnSettings, height: u32, rng: &mut Pcg32) -> BlockSpec {
    let tier = tier_for_height(settings, height);
    let width = if tier.max_width > tier.min_width {
        rng.random_range(tier.min_width..=tier.max_width)
    } else {
        tier.min_width
    };
    let category = roll_category(settings, rng);

    BlockSpec {
        size: DVec2::new(
            (width * category.width_scale()).round(),
            settings.block_height,
        ),
        category,
    }
}

/// Create a carried body from a rolled spec, hanging from `hook`
pub fn spawn_carried(id: u32, spec: BlockSpec, hook: DVec2) -> PhysicsBody {
    let mut body = PhysicsBody::carried(id, hook, spec.size, spec.category);
    body.hang_from(hook);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_tier_lookup() {
        let settings = SpawnSettings::default();
        assert_eq!(tier_for_height(&settings, 0).max_height, Some(10));
        assert_eq!(tier_for_height(&settings, 9).max_height, Some(10));
        assert_eq!(tier_for_height(&settings, 10).max_height, Some(25));
        assert_eq!(tier_for_height(&settings, 400).max_height, None);
    }

    #[test]
    fn test_widths_follow_tier() {
        let settings = SpawnSettings::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let spec = roll_block(&settings, 30, &mut rng);
            let w = spec.size.x / spec.category.width_scale();
            assert!((69.0..=101.0).contains(&w), "width {}", spec.size.x);
            assert_eq!(spec.size.y, settings.block_height);
        }
    }

    #[test]
    fn test_same_seed_same_blocks() {
        let settings = SpawnSettings::default();
        let mut a = Pcg32::seed_from_u64(99);
        let mut b = Pcg32::seed_from_u64(99);
        for h in 0..50 {
            assert_eq!(roll_block(&settings, h, &mut a), roll_block(&settings, h, &mut b));
        }
    }

    #[test]
    fn test_category_odds_cover_all() {
        let settings = SpawnSettings {
            wide_chance: 30,
            narrow_chance: 30,
            bonus_chance: 30,
            ..SpawnSettings::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(format!("{:?}", roll_block(&settings, 0, &mut rng).category));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_spawned_body_hangs_from_hook() {
        let spec = BlockSpec {
            size: DVec2::new(100.0, 40.0),
            category: BlockCategory::Standard,
        };
        let body = spawn_carried(5, spec, DVec2::new(240.0, 160.0));
        assert_eq!(body.top(), 160.0);
        assert_eq!(body.pos.x, 240.0);
        assert_eq!(body.id, 5);
    }
}
