/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Timers: message, screenshake decay
///   2. Level flow: enemy-clear transition, death counter
///   3. Camera smoothing
///   4. Ambient particles (leaves)
///   5. Player input + update, fall death, dash contact
///   6. Enemies (AI + fire)
///   7. Boss (AI + attack selection)
///   8. Projectiles (movement + collision, owner-aware)
///   9. Pickups
///  10. Sparks / particles decay
///
/// Each effect list is walked with index-and-remove so removals never skip
/// a neighbor. Boss protection (hits only land once the enemy wave is gone)
/// is enforced here, on the attacking side, not inside the boss.

use std::f32::consts::TAU;

use rand::Rng;

use crate::config::GameConfig;
use crate::domain::entity::BossAttack;
use crate::domain::fx::{
    leaf_spawns, projectile_in_wall, spark_burst, Particle, ParticleKind, PickupKind, Projectile,
    ProjectileOwner,
};
use crate::domain::physics::Vec2;
use crate::sim::event::GameEvent;
use crate::sim::level::load_level;
use crate::sim::world::WorldState;

/// Per-tick input: movement keys are held, the rest are edge-triggered.
#[derive(Clone, Copy, Default, Debug)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub dash: bool,
    pub throw: bool,
    pub strike: bool,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, config: &GameConfig) -> Vec<GameEvent> {
    if world.paused {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 {
            world.message.clear();
        }
    }

    world.screenshake = (world.screenshake - 1.0).max(0.0);

    // ── Level flow ──
    if world.wave_cleared() {
        world.transition += 1;
        if world.transition == 1 {
            events.push(GameEvent::LevelClear);
        }
        if world.transition > 30 {
            let next = world.level + 1;
            load_level(world, next, config);
            return events;
        }
    }
    if world.transition < 0 {
        world.transition += 1;
    }

    if world.dead > 0 {
        world.dead += 1;
        if world.dead > 40 {
            load_level(world, world.level, config);
            return events;
        }
    }

    // ── Camera ──
    let target = world.camera_target();
    world.scroll.x += (target.x - world.scroll.x) / 30.0;
    world.scroll.y += (target.y - world.scroll.y) / 30.0;

    // ── Ambient leaves ──
    for pos in leaf_spawns(&world.leaf_spawners, &mut world.rng) {
        let anim = world.assets.particle(ParticleKind::Leaf);
        world
            .particles
            .push(Particle::new(ParticleKind::Leaf, pos, Vec2::new(-0.1, 0.3), anim));
    }

    // ── Player ──
    if world.dead == 0 {
        resolve_player(world, input, &mut events);
    }

    // ── Enemies ──
    let player_pos = world.player.body.pos;
    for i in 0..world.enemies.len() {
        let shot = world.enemies[i].update(
            &world.tilemap,
            player_pos,
            &mut world.rng,
            &world.assets,
            &world.physics,
        );
        if let Some(shot) = shot {
            world
                .projectiles
                .push(Projectile::new(shot.pos, shot.dx, ProjectileOwner::Hostile));
            let muzzle = spark_burst(shot.pos, 4, &mut world.rng);
            world.sparks.extend(muzzle);
            events.push(GameEvent::Shoot);
        }
    }

    // ── Boss ──
    resolve_boss(world, &mut events);

    // ── Projectiles ──
    resolve_projectiles(world, &mut events);

    // ── Pickups ──
    if world.dead == 0 {
        let player_rect = world.player.body.rect();
        let mut i = 0;
        while i < world.pickups.len() {
            if world.pickups[i].rect().touches(&player_rect) {
                match world.pickups[i].kind {
                    PickupKind::Shuriken => world.player.shuriken_count += 1,
                    PickupKind::Kunai => world.player.kunai_count += 1,
                }
                world.pickups.remove(i);
                events.push(GameEvent::Pickup);
            } else {
                i += 1;
            }
        }
    }

    // ── Effects decay ──
    world.sparks.retain_mut(|s| !s.update());
    world.particles.retain_mut(|p| !p.update());

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, input: FrameInput, events: &mut Vec<GameEvent>) {
    // Dash trail and the start/end bursts, keyed off the timer value
    // before this tick decrements it
    let center = world.player.body.rect().center();
    let d = world.player.dashing.abs();
    if d == 60 || d == 50 {
        burst_particles(world, center, 20);
    }
    if d > 50 {
        let dir = world.player.dashing.signum() as f32;
        let vel = Vec2::new(dir * world.rng.gen::<f32>() * 3.0, 0.0);
        let anim = world.assets.particle(ParticleKind::Burst);
        world
            .particles
            .push(Particle::new(ParticleKind::Burst, center, vel, anim));
    }

    if input.jump && world.player.try_jump() {
        events.push(GameEvent::Jump);
    }
    if input.dash && world.player.start_dash() {
        events.push(GameEvent::Dash);
    }
    if input.throw {
        if let Some(shot) = world.player.throw_shuriken() {
            world
                .projectiles
                .push(Projectile::new(shot.pos, shot.dx, ProjectileOwner::Player));
            events.push(GameEvent::Shoot);
        }
    }
    if input.strike {
        let reach = world.player.strike(&world.assets);
        if let Some(reach) = reach {
            events.push(GameEvent::Strike);
            let mut i = 0;
            while i < world.enemies.len() {
                if world.enemies[i].body.rect().touches(&reach) {
                    kill_enemy_at(world, i, events);
                } else {
                    i += 1;
                }
            }
            let boss_in_reach = world
                .boss
                .as_ref()
                .map_or(false, |b| b.body.rect().touches(&reach));
            if boss_in_reach {
                if world.enemies.is_empty() {
                    hit_boss(world, events);
                } else {
                    deflect(world, reach.center(), events);
                }
            }
        }
    }

    let movement = Vec2::new(
        (input.right as i32 - input.left as i32) as f32,
        0.0,
    );
    world
        .player
        .update(&world.tilemap, movement, &world.assets, &world.physics);

    // Fell out of the world
    if world.player.air_time > 120 {
        start_death(world, events);
        return;
    }

    // Dash contact kills
    if world.player.dash_active() {
        let player_rect = world.player.body.rect();
        let mut i = 0;
        while i < world.enemies.len() {
            if world.enemies[i].body.rect().overlaps(&player_rect) {
                kill_enemy_at(world, i, events);
            } else {
                i += 1;
            }
        }
        let boss_contact = world
            .boss
            .as_ref()
            .map_or(false, |b| b.body.rect().overlaps(&player_rect));
        if boss_contact {
            if world.enemies.is_empty() {
                hit_boss(world, events);
            } else {
                deflect(world, player_rect.center(), events);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Boss
// ══════════════════════════════════════════════════════════════

fn resolve_boss(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player_center = world.player.body.rect().center();
    let mut attack = None;
    if let Some(b) = world.boss.as_mut() {
        attack = b.update(
            &world.tilemap,
            player_center,
            &mut world.rng,
            &world.assets,
            &world.physics,
        );
    }
    match attack {
        Some(BossAttack::Melee(reach)) => {
            if world.dead == 0
                && !world.player.dash_active()
                && reach.touches(&world.player.body.rect())
            {
                hit_player(world, events);
            }
        }
        Some(BossAttack::Ranged(shot)) => {
            world
                .projectiles
                .push(Projectile::new(shot.pos, shot.dx, ProjectileOwner::Hostile));
            events.push(GameEvent::Shoot);
        }
        None => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

fn resolve_projectiles(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut i = 0;
    while i < world.projectiles.len() {
        world.projectiles[i].update();
        let pos = world.projectiles[i].pos;
        let owner = world.projectiles[i].owner;

        let mut remove = world.projectiles[i].expired();

        if projectile_in_wall(&world.projectiles[i], &world.tilemap) {
            let impact = spark_burst(pos, 4, &mut world.rng);
            world.sparks.extend(impact);
            remove = true;
        } else if !remove {
            match owner {
                ProjectileOwner::Hostile => {
                    if world.dead == 0
                        && !world.player.dash_active()
                        && world.player.body.rect().contains(pos)
                    {
                        hit_player(world, events);
                        remove = true;
                    }
                }
                ProjectileOwner::Player => {
                    if let Some(j) = world
                        .enemies
                        .iter()
                        .position(|e| e.body.rect().contains(pos))
                    {
                        kill_enemy_at(world, j, events);
                        remove = true;
                    } else if world
                        .boss
                        .as_ref()
                        .map_or(false, |b| b.body.rect().contains(pos))
                    {
                        if world.enemies.is_empty() {
                            hit_boss(world, events);
                        } else {
                            deflect(world, pos, events);
                        }
                        remove = true;
                    }
                }
            }
        }

        if remove {
            world.projectiles.remove(i);
        } else {
            i += 1;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Damage / effects helpers
// ══════════════════════════════════════════════════════════════

fn hit_player(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.dead > 0 {
        return;
    }
    let center = world.player.body.rect().center();
    world.screenshake = world.screenshake.max(16.0);
    let hurt = spark_burst(center, 10, &mut world.rng);
    world.sparks.extend(hurt);
    if world.player.take_hit() {
        start_death(world, events);
    } else {
        events.push(GameEvent::PlayerHit);
    }
}

fn start_death(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.dead > 0 {
        return;
    }
    world.dead = 1;
    world.screenshake = world.screenshake.max(16.0);
    let center = world.player.body.rect().center();
    let burst = spark_burst(center, 30, &mut world.rng);
    world.sparks.extend(burst);
    burst_particles(world, center, 20);
    events.push(GameEvent::PlayerDied);
}

fn kill_enemy_at(world: &mut WorldState, idx: usize, events: &mut Vec<GameEvent>) {
    let center = world.enemies[idx].body.rect().center();
    world.enemies.remove(idx);
    world.screenshake = world.screenshake.max(16.0);
    let burst = spark_burst(center, 30, &mut world.rng);
    world.sparks.extend(burst);
    burst_particles(world, center, 10);
    events.push(GameEvent::EnemyDied);
}

fn hit_boss(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let (center, died) = match world.boss.as_mut() {
        Some(b) if b.invuln == 0 => (b.body.rect().center(), b.take_hit()),
        _ => return,
    };
    if died {
        world.boss = None;
        world.screenshake = world.screenshake.max(24.0);
        let burst = spark_burst(center, 60, &mut world.rng);
        world.sparks.extend(burst);
        burst_particles(world, center, 30);
        events.push(GameEvent::BossDefeated);
    } else {
        world.screenshake = world.screenshake.max(8.0);
        let burst = spark_burst(center, 10, &mut world.rng);
        world.sparks.extend(burst);
        events.push(GameEvent::BossHit);
    }
}

fn deflect(world: &mut WorldState, pos: Vec2, events: &mut Vec<GameEvent>) {
    let burst = spark_burst(pos, 6, &mut world.rng);
    world.sparks.extend(burst);
    events.push(GameEvent::Deflect);
}

fn burst_particles(world: &mut WorldState, pos: Vec2, count: usize) {
    for _ in 0..count {
        let angle = world.rng.gen::<f32>() * TAU;
        let speed = world.rng.gen::<f32>() * 0.5 + 0.5;
        let vel = Vec2::new(angle.cos() * speed * 0.5, angle.sin() * speed * 0.5);
        let anim = world.assets.particle(ParticleKind::Burst);
        world
            .particles
            .push(Particle::new(ParticleKind::Burst, pos, vel, anim));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatTuning, PhysicsTuning};
    use crate::sim::assets::AssetLibrary;
    use crate::sim::level;

    fn fresh_world(level_idx: usize) -> (WorldState, GameConfig) {
        let config = GameConfig::default();
        let mut w = WorldState::new(
            AssetLibrary::build().unwrap(),
            PhysicsTuning::default(),
            CombatTuning::default(),
        );
        level::load_level(&mut w, level_idx, &config);
        (w, config)
    }

    #[test]
    fn clearing_the_wave_advances_the_level() {
        let (mut w, config) = fresh_world(0);
        w.enemies.clear();
        let mut cleared = 0;
        for _ in 0..100 {
            let events = step(&mut w, FrameInput::default(), &config);
            cleared += events
                .iter()
                .filter(|e| **e == GameEvent::LevelClear)
                .count();
            if w.level == 1 {
                break;
            }
        }
        assert_eq!(w.level, 1);
        assert_eq!(cleared, 1);
        assert_eq!(w.transition, -30); // fresh fade-in
    }

    #[test]
    fn death_counter_reloads_the_level() {
        let (mut w, config) = fresh_world(0);
        w.player.shuriken_count = 3;
        w.dead = 1;
        for _ in 0..60 {
            step(&mut w, FrameInput::default(), &config);
            if w.dead == 0 {
                break;
            }
        }
        assert_eq!(w.dead, 0);
        assert_eq!(w.level, 0);
        assert_eq!(w.transition, -30);
        // Reload resets the player, inventory included
        assert_eq!(w.player.shuriken_count, 0);
        assert_eq!(w.player.hits, 0);
    }

    #[test]
    fn long_fall_kills_the_player() {
        let (mut w, config) = fresh_world(0);
        // Over the first pit
        w.player.body.pos = Vec2::new(198.0, 0.0);
        let mut died = false;
        for _ in 0..200 {
            let events = step(&mut w, FrameInput::default(), &config);
            if events.contains(&GameEvent::PlayerDied) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(w.dead > 0);
    }

    #[test]
    fn hostile_projectile_hits_unless_dashing() {
        let (mut w, config) = fresh_world(0);
        let center = w.player.body.rect().center();

        w.projectiles
            .push(Projectile::new(center, 0.0, ProjectileOwner::Hostile));
        let events = step(&mut w, FrameInput::default(), &config);
        assert!(events.contains(&GameEvent::PlayerHit));
        assert_eq!(w.player.hits, 1);
        assert!(w.projectiles.is_empty());

        // Mid-dash the same projectile passes straight through
        let center = w.player.body.rect().center();
        w.player.dashing = 51;
        w.projectiles
            .push(Projectile::new(center, 0.0, ProjectileOwner::Hostile));
        let events = step(&mut w, FrameInput::default(), &config);
        assert!(!events.contains(&GameEvent::PlayerHit));
        assert_eq!(w.player.hits, 1);
        assert_eq!(w.projectiles.len(), 1);
    }

    #[test]
    fn boss_melee_cannot_hit_a_dashing_player() {
        let (mut w, config) = fresh_world(2);
        w.enemies.clear();
        let boss_pos = w.boss.as_ref().unwrap().body.pos;
        let spot = Vec2::new(boss_pos.x - 12.0, boss_pos.y + 9.0);

        // Pinned inside melee range with the dash window held open:
        // no swing ever lands
        for _ in 0..200 {
            w.player.body.pos = spot;
            w.player.dashing = -60;
            w.player.air_time = 0;
            step(&mut w, FrameInput::default(), &config);
            assert_eq!(w.player.hits, 0);
        }

        // Same spot without the dash: the boss connects
        let mut landed = false;
        for _ in 0..200 {
            w.player.body.pos = spot;
            w.player.dashing = 0;
            w.player.air_time = 0;
            step(&mut w, FrameInput::default(), &config);
            if w.player.hits > 0 {
                landed = true;
                break;
            }
        }
        assert!(landed);
    }

    #[test]
    fn boss_is_protected_while_enemies_remain() {
        let (mut w, config) = fresh_world(2);
        assert!(w.boss.is_some());
        assert!(!w.enemies.is_empty());
        let full_hp = w.boss.as_ref().unwrap().hp;

        // Stand next to the boss, facing it
        let boss_pos = w.boss.as_ref().unwrap().body.pos;
        w.player.body.pos = Vec2::new(boss_pos.x - 16.0, boss_pos.y + 9.0);
        w.player.body.flip = false;
        w.player.kunai_count = 2;

        let strike = FrameInput { strike: true, ..FrameInput::default() };
        let events = step(&mut w, strike, &config);
        assert!(events.contains(&GameEvent::Deflect));
        assert_eq!(w.boss.as_ref().unwrap().hp, full_hp);

        // Wave cleared: the same strike lands
        w.enemies.clear();
        w.player.kunai_cooldown = 0;
        w.player.body.pos = Vec2::new(boss_pos.x - 16.0, boss_pos.y + 9.0);
        let events = step(&mut w, strike, &config);
        assert!(events.contains(&GameEvent::BossHit));
        assert_eq!(w.boss.as_ref().unwrap().hp, full_hp - 1);
    }

    #[test]
    fn kunai_strike_kills_enemies_in_reach() {
        let (mut w, config) = fresh_world(0);
        let n = w.enemies.len();
        w.player.kunai_count = 1;
        // Teleport next to the first enemy, inside reach
        let target = w.enemies[0].body.pos;
        w.player.body.pos = Vec2::new(target.x - 20.0, target.y);
        w.player.body.flip = false;

        let strike = FrameInput { strike: true, ..FrameInput::default() };
        let events = step(&mut w, strike, &config);
        assert!(events.contains(&GameEvent::Strike));
        assert!(events.contains(&GameEvent::EnemyDied));
        assert_eq!(w.enemies.len(), n - 1);
        assert_eq!(w.player.kunai_count, 0);
    }

    #[test]
    fn pickups_transfer_to_inventory() {
        let (mut w, config) = fresh_world(0);
        w.pickups.truncate(1);
        w.pickups[0].kind = PickupKind::Kunai;
        w.pickups[0].pos = w.player.body.pos;
        let events = step(&mut w, FrameInput::default(), &config);
        assert!(events.contains(&GameEvent::Pickup));
        assert!(w.pickups.is_empty());
        assert_eq!(w.player.kunai_count, 1);
    }

    #[test]
    fn camera_tracks_the_player() {
        let (mut w, config) = fresh_world(0);
        for _ in 0..100 {
            step(&mut w, FrameInput::default(), &config);
        }
        let target = w.camera_target();
        assert!((w.scroll.x - target.x).abs() < 2.0);
        assert!((w.scroll.y - target.y).abs() < 2.0);
    }

    #[test]
    fn paused_world_does_not_advance() {
        let (mut w, config) = fresh_world(0);
        w.paused = true;
        let pos = w.player.body.pos;
        let events = step(&mut w, FrameInput { right: true, ..FrameInput::default() }, &config);
        assert!(events.is_empty());
        assert_eq!(w.player.body.pos, pos);
    }
}
