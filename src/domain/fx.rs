/// Short-lived effect objects: projectiles, particles, sparks, pickups.
///
/// All of them follow the same shape: a small struct, an `update` that
/// advances one tick and reports whether the object is spent, and removal
/// handled by the owning list in `sim::step`.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::domain::animation::Animation;
use crate::domain::physics::{Rect, Vec2};
use crate::domain::tilemap::Tilemap;

/// Ticks before a projectile that hits nothing is culled.
pub const PROJECTILE_MAX_AGE: u32 = 360;

/// Who fired a projectile decides who it can hurt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProjectileOwner {
    /// Player shuriken: hurts enemies and (when unprotected) the boss.
    Player,
    /// Enemy or boss fire: hurts only the player.
    Hostile,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub pos: Vec2,
    pub dx: f32,
    pub age: u32,
    pub owner: ProjectileOwner,
}

impl Projectile {
    pub fn new(pos: Vec2, dx: f32, owner: ProjectileOwner) -> Self {
        Projectile {
            pos,
            dx,
            age: 0,
            owner,
        }
    }

    pub fn update(&mut self) {
        self.pos.x += self.dx;
        self.age += 1;
    }

    pub fn expired(&self) -> bool {
        self.age > PROJECTILE_MAX_AGE
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ParticleKind {
    /// Drifts sideways on a sine wave while falling.
    Leaf,
    /// Dash trail / impact puff.
    Burst,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub animation: Animation,
    age: u32,
}

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, velocity: Vec2, animation: Animation) -> Self {
        Particle {
            kind,
            pos,
            velocity,
            animation,
            age: 0,
        }
    }

    /// Advance one tick. Returns true once the one-shot animation finished
    /// and the particle should be removed.
    pub fn update(&mut self) -> bool {
        self.pos.x += self.velocity.x;
        self.pos.y += self.velocity.y;
        if self.kind == ParticleKind::Leaf {
            self.pos.x += (self.age as f32 * 0.035).sin() * 0.3;
        }
        self.age += 1;
        self.animation.update();
        self.animation.is_done()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Spark {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
}

impl Spark {
    pub fn new(pos: Vec2, angle: f32, speed: f32) -> Self {
        Spark { pos, angle, speed }
    }

    /// Polar motion with linear decay. Returns true when spent.
    pub fn update(&mut self) -> bool {
        self.pos.x += self.angle.cos() * self.speed;
        self.pos.y += self.angle.sin() * self.speed;
        self.speed = (self.speed - 0.1).max(0.0);
        self.speed == 0.0
    }
}

/// Ring of sparks flying out from a point, used for deaths and impacts.
pub fn spark_burst(pos: Vec2, count: usize, rng: &mut SmallRng) -> Vec<Spark> {
    (0..count)
        .map(|_| {
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let speed = rng.gen::<f32>() * 2.0 + 0.5;
            Spark::new(pos, angle, speed)
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupKind {
    Shuriken,
    Kunai,
}

#[derive(Clone, Copy, Debug)]
pub struct Pickup {
    pub kind: PickupKind,
    pub pos: Vec2,
}

impl Pickup {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, 6.0, 6.0)
    }
}

/// Leaf particles fall out of tree-crown rects; bigger crowns shed more.
/// Returns spawn positions for this tick.
pub fn leaf_spawns(spawners: &[Rect], rng: &mut SmallRng) -> Vec<Vec2> {
    let mut out = Vec::new();
    for rect in spawners {
        if rng.gen::<f32>() * 49999.0 < rect.w * rect.h {
            out.push(Vec2::new(
                rect.x + rng.gen::<f32>() * rect.w,
                rect.y + rng.gen::<f32>() * rect.h,
            ));
        }
    }
    out
}

/// A projectile that entered a solid tile stops there.
pub fn projectile_in_wall(p: &Projectile, tilemap: &Tilemap) -> bool {
    tilemap.solid_check(p.pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::Sprite;
    use crate::domain::tilemap::tests::map_from_rows;
    use rand::SeedableRng;

    fn one_shot(frames: usize, duration: u32) -> Animation {
        let sprites: Vec<Sprite> = (0..frames)
            .map(|_| Sprite::new(&["*"], (200, 200, 200)))
            .collect();
        Animation::new(sprites, duration, false).unwrap()
    }

    #[test]
    fn projectile_expires_after_max_age() {
        let mut p = Projectile::new(Vec2::ZERO, 1.5, ProjectileOwner::Player);
        for _ in 0..360 {
            p.update();
            assert!(!p.expired());
        }
        p.update(); // 361st
        assert!(p.expired());
        assert_eq!(p.pos.x, 361.0 * 1.5);
    }

    #[test]
    fn projectile_stops_in_solid_tiles() {
        let map = map_from_rows(&["..S"]);
        let mut p = Projectile::new(Vec2::new(0.0, 8.0), 3.5, ProjectileOwner::Hostile);
        let mut hit = false;
        for _ in 0..20 {
            p.update();
            if projectile_in_wall(&p, &map) {
                hit = true;
                break;
            }
        }
        assert!(hit);
        assert!(p.pos.x >= 32.0);
    }

    #[test]
    fn particle_culled_when_animation_finishes() {
        let mut p = Particle::new(
            ParticleKind::Burst,
            Vec2::ZERO,
            Vec2::new(0.3, 0.3),
            one_shot(4, 3),
        );
        let mut removed_at = 0;
        for i in 1..=20 {
            if p.update() {
                removed_at = i;
                break;
            }
        }
        // 4 frames * 3 ticks: done latches on tick 11 (counter clamps at total-1)
        assert_eq!(removed_at, 11);
    }

    #[test]
    fn leaf_drift_stays_bounded() {
        let mut p = Particle::new(
            ParticleKind::Leaf,
            Vec2::ZERO,
            Vec2::new(-0.1, 0.3),
            one_shot(20, 20),
        );
        for _ in 0..200 {
            p.update();
        }
        // Sine drift adds at most 0.3/tick on top of the base velocity
        assert!(p.pos.x >= -0.4 * 200.0);
        assert!(p.pos.x <= 0.2 * 200.0);
        assert!(p.pos.y > 0.0);
    }

    #[test]
    fn spark_decays_to_nothing() {
        let mut s = Spark::new(Vec2::ZERO, 0.0, 1.0);
        let mut ticks = 0;
        while !s.update() {
            ticks += 1;
            assert!(ticks < 100, "spark never died");
        }
        assert_eq!(s.speed, 0.0);
        // Moved only in the angle direction
        assert!(s.pos.x > 0.0);
        assert_eq!(s.pos.y, 0.0);
    }

    #[test]
    fn spark_burst_spreads_speeds_and_angles() {
        let mut rng = SmallRng::seed_from_u64(9);
        let burst = spark_burst(Vec2::new(10.0, 10.0), 30, &mut rng);
        assert_eq!(burst.len(), 30);
        for s in &burst {
            assert!(s.speed >= 0.5 && s.speed <= 2.5);
            assert_eq!(s.pos, Vec2::new(10.0, 10.0));
        }
    }
}
