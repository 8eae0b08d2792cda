/// Embedded sprite and animation registry.
///
/// All art ships in the binary as small colored character grids (space =
/// transparent). Entity animations are keyed by `(EntityKind, Action)` and
/// looked up through an ordered fallback chain, so a missing clip degrades
/// to a related one instead of crashing.

use std::collections::HashMap;

use crate::domain::animation::{Animation, AnimationSource, ConfigError, Sprite};
use crate::domain::entity::{Action, EntityKind};
use crate::domain::fx::{ParticleKind, PickupKind, ProjectileOwner};
use crate::domain::tile::TileKind;

const PLAYER_FG: (u8, u8, u8) = (120, 200, 255);
const ENEMY_FG: (u8, u8, u8) = (230, 90, 90);
const BOSS_FG: (u8, u8, u8) = (200, 80, 220);
const GRASS_FG: (u8, u8, u8) = (90, 180, 80);
const STONE_FG: (u8, u8, u8) = (140, 140, 150);
const DECOR_FG: (u8, u8, u8) = (110, 150, 90);
const LEAF_FG: (u8, u8, u8) = (80, 160, 70);
const BURST_FG: (u8, u8, u8) = (240, 240, 200);

/// Ordered lookup chain for an animation request: exact key, then the
/// player's clip for that action, then any other entity's.
pub fn fallback_candidates(kind: EntityKind, action: Action) -> Vec<(EntityKind, Action)> {
    let mut out = vec![(kind, action)];
    for k in [EntityKind::Player, EntityKind::Enemy, EntityKind::Boss] {
        if k != kind {
            out.push((k, action));
        }
    }
    out
}

pub struct AssetLibrary {
    animations: HashMap<(EntityKind, Action), Animation>,
    particles: HashMap<ParticleKind, Animation>,
    tiles: HashMap<(TileKind, u8), Sprite>,
    shuriken_sprite: Sprite,
    hostile_shot_sprite: Sprite,
    pickup_shuriken: Sprite,
    pickup_kunai: Sprite,
}

impl AssetLibrary {
    pub fn build() -> Result<Self, ConfigError> {
        let mut animations = HashMap::new();

        let anim = |frames: Vec<Sprite>, duration: u32, looping: bool| {
            Animation::new(frames, duration, looping)
        };

        // Player
        animations.insert(
            (EntityKind::Player, Action::Idle),
            anim(
                vec![
                    Sprite::new(&["@=", "/\\"], PLAYER_FG),
                    Sprite::new(&["@=", "|\\"], PLAYER_FG),
                ],
                12,
                true,
            )?,
        );
        animations.insert(
            (EntityKind::Player, Action::Run),
            anim(
                vec![
                    Sprite::new(&["@=", "/>"], PLAYER_FG),
                    Sprite::new(&["@=", "|}"], PLAYER_FG),
                ],
                4,
                true,
            )?,
        );
        animations.insert(
            (EntityKind::Player, Action::Jump),
            anim(vec![Sprite::new(&["@=", "vv"], PLAYER_FG)], 5, true)?,
        );
        animations.insert(
            (EntityKind::Player, Action::WallSlide),
            anim(vec![Sprite::new(&["=@", " |"], PLAYER_FG)], 5, true)?,
        );
        animations.insert(
            (EntityKind::Player, Action::Attack),
            anim(
                vec![
                    Sprite::new(&["@/", "/\\"], PLAYER_FG),
                    Sprite::new(&["@-", "/\\"], PLAYER_FG),
                    Sprite::new(&["@,", "/\\"], PLAYER_FG),
                ],
                3,
                false,
            )?,
        );

        // Enemy
        animations.insert(
            (EntityKind::Enemy, Action::Idle),
            anim(
                vec![
                    Sprite::new(&["&.", "/\\"], ENEMY_FG),
                    Sprite::new(&["&,", "/\\"], ENEMY_FG),
                ],
                15,
                true,
            )?,
        );
        animations.insert(
            (EntityKind::Enemy, Action::Run),
            anim(
                vec![
                    Sprite::new(&["&.", "/>"], ENEMY_FG),
                    Sprite::new(&["&.", "|}"], ENEMY_FG),
                ],
                6,
                true,
            )?,
        );

        // Boss
        animations.insert(
            (EntityKind::Boss, Action::Idle),
            anim(
                vec![
                    Sprite::new(&[" ## ", "#@@#", " /\\ "], BOSS_FG),
                    Sprite::new(&[" ## ", "#@@#", " || "], BOSS_FG),
                ],
                15,
                true,
            )?,
        );
        animations.insert(
            (EntityKind::Boss, Action::Run),
            anim(
                vec![
                    Sprite::new(&[" ## ", "#@@#", " />_"], BOSS_FG),
                    Sprite::new(&[" ## ", "#@@#", "_<\\ "], BOSS_FG),
                ],
                6,
                true,
            )?,
        );
        animations.insert(
            (EntityKind::Boss, Action::Attack),
            anim(
                vec![
                    Sprite::new(&[" ##/", "#@@=", " /\\ "], BOSS_FG),
                    Sprite::new(&[" ##-", "#@@=", " /\\ "], BOSS_FG),
                ],
                4,
                false,
            )?,
        );

        let mut particles = HashMap::new();
        particles.insert(
            ParticleKind::Leaf,
            anim(
                vec![
                    Sprite::new(&[","], LEAF_FG),
                    Sprite::new(&["'"], LEAF_FG),
                    Sprite::new(&["`"], LEAF_FG),
                    Sprite::new(&["."], LEAF_FG),
                ],
                20,
                false,
            )?,
        );
        particles.insert(
            ParticleKind::Burst,
            anim(
                vec![
                    Sprite::new(&["*"], BURST_FG),
                    Sprite::new(&["+"], BURST_FG),
                    Sprite::new(&["."], BURST_FG),
                ],
                4,
                false,
            )?,
        );

        let mut tiles = HashMap::new();
        tiles.insert((TileKind::Grass, 0), Sprite::new(&["\"\"\"\"", "####"], GRASS_FG));
        tiles.insert((TileKind::Grass, 1), Sprite::new(&["''''", "####"], GRASS_FG));
        tiles.insert((TileKind::Stone, 0), Sprite::new(&["####", "####"], STONE_FG));
        tiles.insert((TileKind::Stone, 1), Sprite::new(&["#==#", "####"], STONE_FG));
        tiles.insert((TileKind::Decor, 0), Sprite::new(&["db"], DECOR_FG));
        tiles.insert((TileKind::Decor, 1), Sprite::new(&["ww"], DECOR_FG));
        // Tree: crown plus trunk, drawn as off-grid decor
        tiles.insert(
            (TileKind::LargeDecor, 2),
            Sprite::new(
                &[" @@@@@@ ", "@@@@@@@@", "  |##|  ", "  |##|  "],
                LEAF_FG,
            ),
        );
        tiles.insert((TileKind::LargeDecor, 0), Sprite::new(&["/##\\", "\\##/"], STONE_FG));

        Ok(AssetLibrary {
            animations,
            particles,
            tiles,
            shuriken_sprite: Sprite::new(&["*"], (200, 230, 255)),
            hostile_shot_sprite: Sprite::new(&["-"], (255, 160, 80)),
            pickup_shuriken: Sprite::new(&["*"], (180, 210, 255)),
            pickup_kunai: Sprite::new(&["!"], (255, 220, 120)),
        })
    }

    /// Fresh playback of a particle animation.
    pub fn particle(&self, kind: ParticleKind) -> Animation {
        self.particles
            .get(&kind)
            .map(Animation::fresh_copy)
            .unwrap_or_else(Animation::missing)
    }

    pub fn projectile_sprite(&self, owner: ProjectileOwner) -> &Sprite {
        match owner {
            ProjectileOwner::Player => &self.shuriken_sprite,
            ProjectileOwner::Hostile => &self.hostile_shot_sprite,
        }
    }

    pub fn pickup_sprite(&self, kind: PickupKind) -> &Sprite {
        match kind {
            PickupKind::Shuriken => &self.pickup_shuriken,
            PickupKind::Kunai => &self.pickup_kunai,
        }
    }

    /// Tile art; unknown variants fall back to variant 0 of the same kind.
    pub fn tile_sprite(&self, kind: TileKind, variant: u8) -> Option<&Sprite> {
        self.tiles
            .get(&(kind, variant))
            .or_else(|| self.tiles.get(&(kind, 0)))
    }
}

impl AnimationSource for AssetLibrary {
    fn animation(&self, kind: EntityKind, action: Action) -> Option<Animation> {
        for key in fallback_candidates(kind, action) {
            if let Some(a) = self.animations.get(&key) {
                return Some(a.fresh_copy());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds() {
        assert!(AssetLibrary::build().is_ok());
    }

    #[test]
    fn fallback_order_exact_then_player_then_any() {
        let chain = fallback_candidates(EntityKind::Boss, Action::Jump);
        assert_eq!(chain[0], (EntityKind::Boss, Action::Jump));
        assert_eq!(chain[1], (EntityKind::Player, Action::Jump));
        assert!(chain.contains(&(EntityKind::Enemy, Action::Jump)));

        // The exact key leads even for the player itself
        let chain = fallback_candidates(EntityKind::Player, Action::Run);
        assert_eq!(chain[0], (EntityKind::Player, Action::Run));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn missing_clip_borrows_from_player() {
        let lib = AssetLibrary::build().unwrap();
        // Enemies have no jump clip of their own; the player's stands in
        let direct = lib.animations.get(&(EntityKind::Enemy, Action::Jump));
        assert!(direct.is_none());
        assert!(lib.animation(EntityKind::Enemy, Action::Jump).is_some());
    }

    #[test]
    fn sprites_have_uniform_row_widths() {
        let lib = AssetLibrary::build().unwrap();
        for anim in lib.animations.values() {
            let s = anim.current();
            for row in &s.rows {
                assert_eq!(row.chars().count(), s.width());
            }
        }
        for sprite in lib.tiles.values() {
            for row in &sprite.rows {
                assert_eq!(sprite.width(), row.chars().count());
            }
        }
    }

    #[test]
    fn tile_variant_falls_back_to_zero() {
        let lib = AssetLibrary::build().unwrap();
        let v0 = lib.tile_sprite(TileKind::Stone, 0).unwrap();
        let v9 = lib.tile_sprite(TileKind::Stone, 9).unwrap();
        assert_eq!(v0, v9);
        assert!(lib.tile_sprite(TileKind::Spawner, 0).is_none());
    }

    #[test]
    fn lookups_hand_out_fresh_playback() {
        let lib = AssetLibrary::build().unwrap();
        let mut a = lib.animation(EntityKind::Player, Action::Attack).unwrap();
        for _ in 0..40 {
            a.update();
        }
        assert!(a.is_done());
        let b = lib.animation(EntityKind::Player, Action::Attack).unwrap();
        assert!(!b.is_done());
    }
}
