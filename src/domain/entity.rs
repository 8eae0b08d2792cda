/// Combat entities: Player, Enemy, Boss.
///
/// Each wraps a physics `Body` and layers its behavior on top. Entities are
/// pure over their inputs: anything that needs the wider world (spawning
/// projectiles, screenshake, level flow) is reported back to the caller as a
/// return value and handled in `sim::step`.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::config::{CombatTuning, PhysicsTuning};
use crate::domain::animation::AnimationSource;
use crate::domain::physics::{Body, Rect, Vec2};
use crate::domain::tilemap::Tilemap;

pub const PLAYER_SIZE: (f32, f32) = (8.0, 15.0);
pub const ENEMY_SIZE: (f32, f32) = (8.0, 15.0);
pub const BOSS_SIZE: (f32, f32) = (16.0, 24.0);

/// Horizontal kick + upward impulse of a wall jump.
const WALL_JUMP: (f32, f32) = (3.5, 2.5);
/// Pixels added to the body rect on the facing side for a kunai strike.
const KUNAI_REACH: f32 = 20.0;
/// Wall-slide fall-speed cap.
const SLIDE_SPEED: f32 = 0.5;
/// How far the boss wanders from its spawn point.
const BOSS_RANGE: f32 = 80.0;
const BOSS_MELEE_RANGE: f32 = 40.0;
const BOSS_RANGED_RANGE: f32 = 240.0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityKind {
    Player,
    Enemy,
    Boss,
}

/// Resolved per-tick actor state. Exactly one is active at a time; it picks
/// the animation and nothing else branches on it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Idle,
    Run,
    Jump,
    WallSlide,
    Attack,
}

/// A projectile request: where it starts and its horizontal speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shot {
    pub pos: Vec2,
    pub dx: f32,
}

// ════════════════════════════════════════════════════════════════════
//  Player
// ════════════════════════════════════════════════════════════════════

pub struct Player {
    pub body: Body,
    /// Ticks since last ground contact.
    pub air_time: u32,
    /// Stored jump charges; refilled on landing.
    pub jumps: u8,
    pub wall_slide: bool,
    /// Signed dash timer: counts from ±60 toward 0, sign = direction.
    pub dashing: i32,
    pub hits: u32,
    pub shuriken_count: u32,
    pub kunai_count: u32,
    pub kunai_cooldown: u32,
    tuning: CombatTuning,
}

impl Player {
    pub fn new(pos: Vec2, assets: &dyn AnimationSource, tuning: CombatTuning) -> Self {
        Player {
            body: Body::new(EntityKind::Player, pos, PLAYER_SIZE, assets),
            air_time: 0,
            jumps: 1,
            wall_slide: false,
            dashing: 0,
            hits: 0,
            shuriken_count: 0,
            kunai_count: 0,
            kunai_cooldown: 0,
            tuning,
        }
    }

    pub fn max_hits(&self) -> u32 {
        self.tuning.max_hits
    }

    /// Invulnerable to projectiles and lethal to regular enemies.
    pub fn dash_active(&self) -> bool {
        self.dashing.abs() >= 50
    }

    /// Hidden during the high-speed dash phase.
    pub fn visible(&self) -> bool {
        self.dashing.abs() <= 50
    }

    pub fn update(
        &mut self,
        tilemap: &Tilemap,
        movement: Vec2,
        assets: &dyn AnimationSource,
        phys: &PhysicsTuning,
    ) {
        self.body.update(tilemap, movement, phys);

        self.air_time += 1;
        if self.body.collisions.down {
            self.air_time = 0;
            self.jumps = 1;
        }

        self.wall_slide = false;
        if (self.body.collisions.right || self.body.collisions.left) && self.air_time > 4 {
            self.wall_slide = true;
            self.body.velocity.y = self.body.velocity.y.min(SLIDE_SPEED);
            // Face away from the wall
            self.body.flip = self.body.collisions.right;
            self.body.set_action(Action::WallSlide, assets);
        }

        if !self.wall_slide {
            // A running attack animation holds the state until it finishes
            let attacking =
                self.body.action == Action::Attack && !self.body.animation.is_done();
            if !attacking {
                if self.air_time > 4 {
                    self.body.set_action(Action::Jump, assets);
                } else if movement.x != 0.0 {
                    self.body.set_action(Action::Run, assets);
                } else {
                    self.body.set_action(Action::Idle, assets);
                }
            }
        }

        if self.dashing > 0 {
            self.dashing -= 1;
        }
        if self.dashing < 0 {
            self.dashing += 1;
        }
        if self.dashing.abs() > 50 {
            self.body.velocity.x = 8.0 * self.dashing.signum() as f32;
            if self.dashing.abs() == 51 {
                // Hard damp at the end of the burst phase
                self.body.velocity.x *= 0.1;
            }
        }

        if self.body.velocity.x > 0.0 {
            self.body.velocity.x = (self.body.velocity.x - 0.1).max(0.0);
        } else {
            self.body.velocity.x = (self.body.velocity.x + 0.1).min(0.0);
        }

        self.kunai_cooldown = self.kunai_cooldown.saturating_sub(1);
    }

    /// Ground jump or wall jump. Returns true if a jump happened.
    pub fn try_jump(&mut self) -> bool {
        if self.wall_slide {
            // Only when still pressing into the wall
            if self.body.flip && self.body.last_movement.x > 0.0 {
                // Wall on the right, kick off to the left
                self.body.velocity.x = -WALL_JUMP.0;
                self.body.velocity.y = -WALL_JUMP.1;
                self.air_time = 5;
                self.jumps = self.jumps.saturating_sub(1);
                return true;
            }
            if !self.body.flip && self.body.last_movement.x < 0.0 {
                self.body.velocity.x = WALL_JUMP.0;
                self.body.velocity.y = -WALL_JUMP.1;
                self.air_time = 5;
                self.jumps = self.jumps.saturating_sub(1);
                return true;
            }
        } else if self.jumps > 0 {
            self.body.velocity.y = -self.tuning.jump_impulse;
            self.jumps -= 1;
            self.air_time = 5;
            return true;
        }
        false
    }

    /// Begin a dash in the facing direction. Refused while one is running.
    pub fn start_dash(&mut self) -> bool {
        if self.dashing != 0 {
            return false;
        }
        self.dashing = if self.body.flip {
            -self.tuning.dash_ticks
        } else {
            self.tuning.dash_ticks
        };
        true
    }

    /// Throw a shuriken if one is in the inventory. The projectile starts
    /// just past the facing edge of the body, not at its center.
    pub fn throw_shuriken(&mut self) -> Option<Shot> {
        if self.shuriken_count == 0 {
            return None;
        }
        self.shuriken_count -= 1;
        let dir = if self.body.flip { -1.0 } else { 1.0 };
        let center = self.body.rect().center();
        Some(Shot {
            pos: Vec2::new(center.x + 6.0 * dir, center.y),
            dx: 3.5 * dir,
        })
    }

    /// Begin a kunai strike: consumes one kunai, arms the cooldown and
    /// returns the reach rect. The caller applies it to whatever is inside.
    pub fn strike(&mut self, assets: &dyn AnimationSource) -> Option<Rect> {
        if self.kunai_count == 0 || self.kunai_cooldown > 0 {
            return None;
        }
        self.kunai_count -= 1;
        self.kunai_cooldown = self.tuning.kunai_cooldown;
        self.body.set_action(Action::Attack, assets);
        Some(self.reach_rect())
    }

    /// Body rect widened on the facing side. Overlap tests against it are
    /// inclusive (`Rect::touches`).
    pub fn reach_rect(&self) -> Rect {
        let r = self.body.rect();
        if self.body.flip {
            Rect::new(r.x - KUNAI_REACH, r.y, r.w + KUNAI_REACH, r.h)
        } else {
            Rect::new(r.x, r.y, r.w + KUNAI_REACH, r.h)
        }
    }

    /// Register one hit. The counter never decreases within a life.
    /// Returns true exactly once, on the hit that reaches the maximum.
    pub fn take_hit(&mut self) -> bool {
        if self.hits >= self.tuning.max_hits {
            return false;
        }
        self.hits += 1;
        self.hits == self.tuning.max_hits
    }
}

// ════════════════════════════════════════════════════════════════════
//  Enemy
// ════════════════════════════════════════════════════════════════════

pub struct Enemy {
    pub body: Body,
    /// Remaining ticks of the current walking window; 0 = idle.
    pub walking: u32,
}

impl Enemy {
    pub fn new(pos: Vec2, assets: &dyn AnimationSource) -> Self {
        Enemy {
            body: Body::new(EntityKind::Enemy, pos, ENEMY_SIZE, assets),
            walking: 0,
        }
    }

    /// One AI tick. Returns a shot request if the enemy fires at the player.
    pub fn update(
        &mut self,
        tilemap: &Tilemap,
        player_pos: Vec2,
        rng: &mut SmallRng,
        assets: &dyn AnimationSource,
        phys: &PhysicsTuning,
    ) -> Option<Shot> {
        let mut movement = Vec2::ZERO;
        let mut shot = None;

        if self.walking > 0 {
            let rect = self.body.rect();
            let ahead = if self.body.flip { -7.0 } else { 7.0 };
            // Probe one step ahead, just below the feet
            let probe = Vec2::new(rect.center().x + ahead, self.body.pos.y + 23.0);
            if tilemap.solid_check(probe) {
                if self.body.collisions.right || self.body.collisions.left {
                    self.body.flip = !self.body.flip;
                } else {
                    movement.x = if self.body.flip { -0.5 } else { 0.5 };
                }
            } else {
                // Ledge ahead, turn around
                self.body.flip = !self.body.flip;
            }
            self.walking -= 1;
            if self.walking == 0 {
                // End of the window: fire if the player is level and in front
                let dx = player_pos.x - self.body.pos.x;
                let dy = player_pos.y - self.body.pos.y;
                if dy.abs() < 16.0 {
                    if self.body.flip && dx < 0.0 {
                        shot = Some(Shot {
                            pos: Vec2::new(rect.center().x - 7.0, rect.center().y),
                            dx: -1.5,
                        });
                    }
                    if !self.body.flip && dx > 0.0 {
                        shot = Some(Shot {
                            pos: Vec2::new(rect.center().x + 7.0, rect.center().y),
                            dx: 1.5,
                        });
                    }
                }
            }
        } else if rng.gen::<f32>() < 0.01 {
            self.walking = rng.gen_range(30..120);
        }

        self.body.update(tilemap, movement, phys);

        if movement.x != 0.0 {
            self.body.set_action(Action::Run, assets);
        } else {
            self.body.set_action(Action::Idle, assets);
        }

        shot
    }
}

// ════════════════════════════════════════════════════════════════════
//  Boss
// ════════════════════════════════════════════════════════════════════

/// What the boss does this tick, for the step layer to carry out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BossAttack {
    /// Directional close strike; hits the player if their rect touches this.
    Melee(Rect),
    /// Aimed projectile toward the player.
    Ranged(Shot),
}

pub struct Boss {
    pub body: Body,
    pub hp: u32,
    /// Remaining post-hit invulnerability ticks.
    pub invuln: u32,
    /// Signed walk timer like the player dash: sign = direction.
    walk: i32,
    attack_timer: u32,
    anchor: Vec2,
    ground_y: f32,
    tuning: CombatTuning,
}

impl Boss {
    pub fn new(pos: Vec2, assets: &dyn AnimationSource, tuning: CombatTuning) -> Self {
        Boss {
            body: Body::new(EntityKind::Boss, pos, BOSS_SIZE, assets),
            hp: tuning.boss_hp,
            invuln: 0,
            walk: 0,
            attack_timer: tuning.boss_attack_period,
            anchor: pos,
            ground_y: pos.y,
            tuning,
        }
    }

    pub fn max_hp(&self) -> u32 {
        self.tuning.boss_hp
    }

    pub fn update(
        &mut self,
        tilemap: &Tilemap,
        player_center: Vec2,
        rng: &mut SmallRng,
        assets: &dyn AnimationSource,
        phys: &PhysicsTuning,
    ) -> Option<BossAttack> {
        self.invuln = self.invuln.saturating_sub(1);

        let mut movement = Vec2::ZERO;
        if self.walk != 0 {
            movement.x = 0.5 * self.walk.signum() as f32;
            self.walk -= self.walk.signum();
        } else if rng.gen::<f32>() < 0.01 {
            let len = rng.gen_range(30..120);
            self.walk = if rng.gen::<bool>() { len } else { -len };
        }

        self.body.update(tilemap, movement, phys);

        // Pinned: no gravity, no wandering off the spawn platform
        self.body.pos.y = self.ground_y;
        self.body.velocity.y = 0.0;
        self.body.collisions.down = true;
        self.body.pos.x = self
            .body
            .pos
            .x
            .clamp(self.anchor.x - BOSS_RANGE, self.anchor.x + BOSS_RANGE);

        if movement.x != 0.0 {
            self.body.set_action(Action::Run, assets);
        } else {
            self.body.set_action(Action::Idle, assets);
        }

        // Attack selection by distance, on a fixed period
        self.attack_timer = self.attack_timer.saturating_sub(1);
        if self.attack_timer == 0 {
            self.attack_timer = self.tuning.boss_attack_period;
            let center = self.body.rect().center();
            let dist = center.distance(player_center);
            self.body.flip = player_center.x < center.x;
            if dist <= BOSS_MELEE_RANGE {
                self.body.set_action(Action::Attack, assets);
                return Some(BossAttack::Melee(self.reach_rect()));
            }
            if dist <= BOSS_RANGED_RANGE {
                let dx = if self.body.flip { -2.0 } else { 2.0 };
                return Some(BossAttack::Ranged(Shot { pos: center, dx }));
            }
        }
        None
    }

    fn reach_rect(&self) -> Rect {
        let r = self.body.rect();
        if self.body.flip {
            Rect::new(r.x - KUNAI_REACH, r.y, r.w + KUNAI_REACH, r.h)
        } else {
            Rect::new(r.x, r.y, r.w + KUNAI_REACH, r.h)
        }
    }

    /// Apply one hit unless the invulnerability window is open.
    /// Returns true when this hit drops the boss to zero HP.
    pub fn take_hit(&mut self) -> bool {
        if self.invuln > 0 || self.hp == 0 {
            return false;
        }
        self.hp -= 1;
        self.invuln = self.tuning.boss_invuln_ticks;
        self.hp == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::tests::test_source;
    use crate::domain::tilemap::tests::map_from_rows;
    use rand::SeedableRng;

    fn phys() -> PhysicsTuning {
        PhysicsTuning {
            gravity: 0.1,
            terminal_velocity: 5.0,
        }
    }

    fn combat() -> CombatTuning {
        CombatTuning {
            jump_impulse: 3.0,
            dash_ticks: 60,
            max_hits: 5,
            kunai_cooldown: 30,
            boss_hp: 12,
            boss_invuln_ticks: 30,
            boss_attack_period: 90,
        }
    }

    fn floor_map() -> Tilemap {
        map_from_rows(&["....", "....", "SSSS"])
    }

    fn player_on_floor() -> (Player, Tilemap) {
        let map = floor_map();
        let mut p = Player::new(Vec2::new(4.0, 17.0), &test_source(), combat());
        for _ in 0..5 {
            p.update(&map, Vec2::ZERO, &test_source(), &phys());
        }
        assert!(p.body.collisions.down);
        (p, map)
    }

    // ── Hits / death ──

    #[test]
    fn fifth_hit_triggers_death_exactly_once() {
        let (mut p, _) = player_on_floor();
        for _ in 0..4 {
            assert!(!p.take_hit());
        }
        assert_eq!(p.hits, 4);
        assert!(p.take_hit()); // fifth hit
        assert_eq!(p.hits, 5);
        // Further hits neither grow the counter nor re-trigger death
        assert!(!p.take_hit());
        assert_eq!(p.hits, 5);
    }

    // ── Jumping ──

    #[test]
    fn one_jump_charge_refilled_on_landing() {
        let (mut p, map) = player_on_floor();
        assert!(p.try_jump());
        assert_eq!(p.body.velocity.y, -3.0);
        p.update(&map, Vec2::ZERO, &test_source(), &phys());
        assert!(!p.try_jump()); // no double jump
        // Fall back down and land
        for _ in 0..120 {
            p.update(&map, Vec2::ZERO, &test_source(), &phys());
        }
        assert!(p.body.collisions.down);
        assert!(p.try_jump());
    }

    #[test]
    fn wall_jump_requires_pressing_into_wall() {
        // Wall column on the right at tile x=3
        let map = map_from_rows(&["...S", "...S", "...S", "SSSS"]);
        let mut p = Player::new(Vec2::new(30.0, 8.0), &test_source(), combat());
        // Hold right into the wall until the slide engages
        for _ in 0..10 {
            p.update(&map, Vec2::new(1.0, 0.0), &test_source(), &phys());
        }
        assert!(p.wall_slide);
        assert!(p.body.flip); // facing away from the wall

        // Releasing the stick means no wall jump
        p.update(&map, Vec2::ZERO, &test_source(), &phys());
        if p.wall_slide {
            assert!(!p.try_jump());
        }

        // Pressing into the wall again allows the kick-off
        p.update(&map, Vec2::new(1.0, 0.0), &test_source(), &phys());
        assert!(p.wall_slide);
        assert!(p.try_jump());
        assert_eq!(p.body.velocity.x, -3.5);
        assert_eq!(p.body.velocity.y, -2.5);
    }

    #[test]
    fn wall_slide_caps_fall_speed() {
        let map = map_from_rows(&["...S", "...S", "...S", "...S", "...S", "SSSS"]);
        let mut p = Player::new(Vec2::new(30.0, 8.0), &test_source(), combat());
        for _ in 0..30 {
            p.update(&map, Vec2::new(1.0, 0.0), &test_source(), &phys());
            if p.wall_slide {
                assert!(p.body.velocity.y <= 0.5);
            }
        }
    }

    // ── Dash ──

    #[test]
    fn dash_timer_and_forced_velocity() {
        let (mut p, map) = player_on_floor();
        assert!(p.start_dash());
        assert_eq!(p.dashing, 60); // facing right
        assert!(!p.start_dash()); // refused while running

        p.update(&map, Vec2::ZERO, &test_source(), &phys());
        assert_eq!(p.dashing, 59);
        assert!(p.body.velocity.x > 7.0);
        assert!(p.dash_active());
        assert!(!p.visible());

        // Run the timer down past the burst phase
        for _ in 0..9 {
            p.update(&map, Vec2::ZERO, &test_source(), &phys());
        }
        assert_eq!(p.dashing, 50);
        assert!(p.visible());
        // Velocity was damped hard when the burst ended
        assert!(p.body.velocity.x < 1.0);

        for _ in 0..50 {
            p.update(&map, Vec2::ZERO, &test_source(), &phys());
        }
        assert_eq!(p.dashing, 0);
        assert!(p.start_dash());
    }

    #[test]
    fn dash_direction_follows_facing() {
        let (mut p, map) = player_on_floor();
        p.update(&map, Vec2::new(-1.0, 0.0), &test_source(), &phys());
        assert!(p.body.flip);
        assert!(p.start_dash());
        assert_eq!(p.dashing, -60);
    }

    // ── Inventory / attacks ──

    #[test]
    fn shuriken_consumes_inventory() {
        let (mut p, _) = player_on_floor();
        assert_eq!(p.throw_shuriken(), None);
        p.shuriken_count = 2;
        let shot = p.throw_shuriken().unwrap();
        assert_eq!(shot.dx, 3.5);
        assert_eq!(p.shuriken_count, 1);
    }

    #[test]
    fn shuriken_spawns_at_the_facing_edge() {
        let (mut p, _) = player_on_floor();
        p.shuriken_count = 2;
        let center = p.body.rect().center();

        let shot = p.throw_shuriken().unwrap();
        assert_eq!(shot.pos.x, center.x + 6.0);
        assert_eq!(shot.pos.y, center.y);

        p.body.flip = true;
        let shot = p.throw_shuriken().unwrap();
        assert_eq!(shot.pos.x, center.x - 6.0);
        assert_eq!(shot.dx, -3.5);
    }

    #[test]
    fn kunai_cooldown_blocks_repeat_strikes() {
        let (mut p, map) = player_on_floor();
        p.kunai_count = 3;
        assert!(p.strike(&test_source()).is_some());
        assert_eq!(p.kunai_count, 2);
        assert_eq!(p.kunai_cooldown, 30);
        assert!(p.strike(&test_source()).is_none()); // cooling down
        for _ in 0..30 {
            p.update(&map, Vec2::ZERO, &test_source(), &phys());
        }
        assert_eq!(p.kunai_cooldown, 0);
        assert!(p.strike(&test_source()).is_some());
    }

    #[test]
    fn reach_rect_is_boundary_inclusive() {
        let (p, _) = player_on_floor();
        let reach = p.reach_rect();
        assert_eq!(reach.w, PLAYER_SIZE.0 + 20.0);
        // An enemy rect starting exactly at the reach edge still counts
        let edge = Rect::new(reach.right(), reach.y, 8.0, 15.0);
        assert!(reach.touches(&edge));
        let beyond = Rect::new(reach.right() + 0.1, reach.y, 8.0, 15.0);
        assert!(!reach.touches(&beyond));
    }

    // ── Enemy ──

    #[test]
    fn enemy_turns_at_ledge() {
        // Platform of 3 tiles, enemy walking right toward the edge
        let map = map_from_rows(&["...", "...", "SSS"]);
        let mut e = Enemy::new(Vec2::new(4.0, 17.0), &test_source());
        let mut rng = SmallRng::seed_from_u64(7);
        e.walking = 200;
        e.body.flip = false;
        for _ in 0..120 {
            e.update(&map, Vec2::new(500.0, 500.0), &mut rng, &test_source(), &phys());
        }
        // Still on the platform: never walked off either end
        assert!(e.body.pos.x >= 0.0);
        assert!(e.body.rect().right() <= 48.0);
        assert!(e.body.collisions.down);
    }

    #[test]
    fn enemy_fires_only_when_player_is_level_and_ahead() {
        let map = map_from_rows(&["......", "......", "SSSSSS"]);
        let mut rng = SmallRng::seed_from_u64(1);

        // Player level with the enemy and to its right, enemy facing right
        let mut e = Enemy::new(Vec2::new(8.0, 17.0), &test_source());
        e.body.flip = false;
        e.walking = 1;
        let shot = e.update(&map, Vec2::new(60.0, 17.0), &mut rng, &test_source(), &phys());
        let shot = shot.expect("level, ahead: fires");
        assert_eq!(shot.dx, 1.5);

        // Player behind the facing direction: no shot
        let mut e = Enemy::new(Vec2::new(40.0, 17.0), &test_source());
        e.body.flip = false;
        e.walking = 1;
        assert!(e
            .update(&map, Vec2::new(8.0, 17.0), &mut rng, &test_source(), &phys())
            .is_none());

        // Player too far above: no shot
        let mut e = Enemy::new(Vec2::new(8.0, 17.0), &test_source());
        e.body.flip = false;
        e.walking = 1;
        assert!(e
            .update(&map, Vec2::new(60.0, 0.0), &mut rng, &test_source(), &phys())
            .is_none());
    }

    // ── Boss ──

    #[test]
    fn boss_invuln_window_ignores_hits() {
        let b_tuning = combat();
        let mut b = Boss::new(Vec2::new(64.0, 32.0), &test_source(), b_tuning);
        assert_eq!(b.hp, 12);
        assert!(!b.take_hit());
        assert_eq!(b.hp, 11);
        assert_eq!(b.invuln, 30);
        // Hits inside the window are ignored entirely
        assert!(!b.take_hit());
        assert_eq!(b.hp, 11);
    }

    #[test]
    fn boss_dies_at_zero_hp() {
        let map = floor_map();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut b = Boss::new(Vec2::new(32.0, 16.0), &test_source(), combat());
        let mut died = 0;
        for _ in 0..12 {
            // Let the invulnerability window lapse between hits
            for _ in 0..31 {
                b.update(&map, Vec2::new(300.0, 300.0), &mut rng, &test_source(), &phys());
            }
            if b.take_hit() {
                died += 1;
            }
        }
        assert_eq!(b.hp, 0);
        assert_eq!(died, 1);
        assert!(!b.take_hit());
    }

    #[test]
    fn boss_stays_pinned_and_in_range() {
        let map = map_from_rows(&["........................"]);
        let mut rng = SmallRng::seed_from_u64(3);
        let spawn = Vec2::new(160.0, 48.0);
        let mut b = Boss::new(spawn, &test_source(), combat());
        for _ in 0..600 {
            b.update(&map, Vec2::new(0.0, 0.0), &mut rng, &test_source(), &phys());
            assert_eq!(b.body.pos.y, 48.0);
            assert!(b.body.pos.x >= spawn.x - 80.0);
            assert!(b.body.pos.x <= spawn.x + 80.0);
        }
    }

    #[test]
    fn boss_attack_selection_by_distance() {
        let map = map_from_rows(&["........................"]);
        let mut rng = SmallRng::seed_from_u64(4);
        let mut b = Boss::new(Vec2::new(160.0, 48.0), &test_source(), combat());
        b.walk = 0;

        // Drain the timer with the player far out of every range
        let mut attack = None;
        for _ in 0..90 {
            attack = b.update(&map, Vec2::new(1000.0, 48.0), &mut rng, &test_source(), &phys());
        }
        assert_eq!(attack, None);

        // Within ranged distance: an aimed projectile
        let mut attack = None;
        for _ in 0..90 {
            attack = b.update(&map, Vec2::new(300.0, 56.0), &mut rng, &test_source(), &phys());
            if attack.is_some() {
                break;
            }
        }
        match attack {
            Some(BossAttack::Ranged(shot)) => assert_eq!(shot.dx, 2.0),
            other => panic!("expected ranged attack, got {:?}", other),
        }

        // Point blank (player glued to the boss): melee reach rect
        let mut attack = None;
        for _ in 0..90 {
            let at_boss = b.body.rect().center();
            attack = b.update(&map, at_boss, &mut rng, &test_source(), &phys());
            if attack.is_some() {
                break;
            }
        }
        assert!(matches!(attack, Some(BossAttack::Melee(_))));
    }
}
