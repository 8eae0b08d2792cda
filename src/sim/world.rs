/// WorldState: the complete snapshot of a running game.
///
/// ## Coordinates
///
/// The simulation runs in float pixel space: 16x16-pixel tiles and a
/// 320x240-pixel logical viewport. The renderer maps pixels to terminal
/// cells; nothing in the sim layer knows about cells.
///
/// ## Level lifecycle counters
///
/// Two counters drive level flow instead of a phase enum:
///   - `transition` — load sets -30; it counts up to 0 (fade-in). Once the
///     enemy wave is cleared it counts 0..30 (fade-out), then the next
///     level loads.
///   - `dead` — 0 while alive; set to 1 on death, counts up each tick.
///     At 10 the fade-out starts, past 40 the level reloads.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{CombatTuning, PhysicsTuning};
use crate::domain::entity::{Boss, Enemy, Player};
use crate::domain::fx::{Particle, Pickup, Projectile, Spark};
use crate::domain::physics::{Rect, Vec2};
use crate::domain::tilemap::Tilemap;
use crate::sim::assets::AssetLibrary;

/// Logical viewport in world pixels.
pub const VIEW_W: f32 = 320.0;
pub const VIEW_H: f32 = 240.0;

pub struct WorldState {
    // ── Static per level ──
    pub tilemap: Tilemap,
    pub leaf_spawners: Vec<Rect>,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,

    // ── Effects ──
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub sparks: Vec<Spark>,
    pub pickups: Vec<Pickup>,

    // ── Camera / feel ──
    pub scroll: Vec2,
    pub screenshake: f32,

    // ── Level flow ──
    pub level: usize,
    /// <0 fading in, 0 playing, >0 fading out toward the next level.
    pub transition: i32,
    /// 0 = alive; counts up from 1 after death.
    pub dead: u32,
    pub paused: bool,

    // ── Services ──
    pub assets: AssetLibrary,
    pub physics: PhysicsTuning,
    pub combat: CombatTuning,
    pub rng: SmallRng,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(assets: AssetLibrary, physics: PhysicsTuning, combat: CombatTuning) -> Self {
        let player = Player::new(Vec2::ZERO, &assets, combat);
        WorldState {
            tilemap: Tilemap::new(),
            leaf_spawners: vec![],
            player,
            enemies: vec![],
            boss: None,
            projectiles: vec![],
            particles: vec![],
            sparks: vec![],
            pickups: vec![],
            scroll: Vec2::ZERO,
            screenshake: 0.0,
            level: 0,
            transition: 0,
            dead: 0,
            paused: false,
            assets,
            physics,
            combat,
            rng: SmallRng::from_entropy(),
            message: String::new(),
            message_timer: 0,
        }
    }

    /// The enemy wave (boss included) is gone: the level is won.
    pub fn wave_cleared(&self) -> bool {
        self.enemies.is_empty() && self.boss.is_none()
    }

    /// Camera target: viewport centered on the player.
    pub fn camera_target(&self) -> Vec2 {
        let c = self.player.body.rect().center();
        Vec2::new(c.x - VIEW_W / 2.0, c.y - VIEW_H / 2.0)
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}
