/// Pixel-space physics: vectors, axis-aligned rectangles and the shared
/// moving body used by every combat entity.
///
/// ## Collision model
///
/// Resolution is discrete and per-axis: the horizontal displacement is
/// applied and resolved against the solid rects around the body, then the
/// vertical displacement independently. Bodies are snapped to the near edge
/// of whatever solid rect they ended up overlapping. Two consequences are
/// accepted limitations, not bugs:
///   - a fast body can tunnel through a thin solid (no sweep test)
///   - resolving the axes in sequence can catch on tile corners
///
/// `Rect::overlaps` is strict (shared edges do not collide) so a body
/// resting on the ground does not re-collide with its floor during the
/// horizontal pass. Attack reach tests use the inclusive `Rect::touches`.

use crate::config::PhysicsTuning;
use crate::domain::animation::{Animation, AnimationSource};
use crate::domain::entity::{Action, EntityKind};
use crate::domain::tilemap::Tilemap;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap: rects sharing only an edge do NOT overlap.
    /// Used by collision resolution.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Inclusive overlap: a rect exactly at the boundary counts.
    /// Used by attack reach tests.
    pub fn touches(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    /// Is the point inside this rect (inclusive edges)?
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Which sides touched a solid this frame. Recomputed every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct Touch {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// The base moving body shared by player, enemies and the boss.
#[derive(Clone, Debug)]
pub struct Body {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub size: (f32, f32),
    pub velocity: Vec2,
    pub collisions: Touch,
    /// Facing: false = right, true = left.
    pub flip: bool,
    /// Desired movement from the previous update; wall jumps check it.
    pub last_movement: Vec2,
    pub action: Action,
    pub animation: Animation,
    /// Visual alignment offset applied at render time (pixels).
    pub anim_offset: Vec2,
}

impl Body {
    pub fn new(
        kind: EntityKind,
        pos: Vec2,
        size: (f32, f32),
        assets: &dyn AnimationSource,
    ) -> Self {
        let animation = assets
            .animation(kind, Action::Idle)
            .unwrap_or_else(Animation::missing);
        Body {
            kind,
            pos,
            size,
            velocity: Vec2::ZERO,
            collisions: Touch::default(),
            flip: false,
            last_movement: Vec2::ZERO,
            action: Action::Idle,
            animation,
            anim_offset: Vec2::new(-3.0, -3.0),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.0, self.size.1)
    }

    /// Switch the action and restart its animation. A missing asset keeps
    /// the current animation playing (degraded, never a crash).
    pub fn set_action(&mut self, action: Action, assets: &dyn AnimationSource) {
        if action != self.action {
            self.action = action;
            if let Some(anim) = assets.animation(self.kind, action) {
                self.animation = anim;
            }
        }
    }

    /// Advance one tick: apply desired movement + velocity with per-axis
    /// collision resolution, then gravity and the animation counter.
    pub fn update(&mut self, tilemap: &Tilemap, movement: Vec2, phys: &PhysicsTuning) {
        self.collisions = Touch::default();

        let frame_movement = Vec2::new(
            movement.x + self.velocity.x,
            movement.y + self.velocity.y,
        );

        // Horizontal axis
        self.pos.x += frame_movement.x;
        let mut rect = self.rect();
        for solid in tilemap.physics_rects_around(self.pos) {
            if rect.overlaps(&solid) {
                if frame_movement.x > 0.0 {
                    rect.x = solid.x - rect.w;
                    self.collisions.right = true;
                }
                if frame_movement.x < 0.0 {
                    rect.x = solid.right();
                    self.collisions.left = true;
                }
                self.pos.x = rect.x;
            }
        }

        // Vertical axis, independent of the horizontal outcome
        self.pos.y += frame_movement.y;
        let mut rect = self.rect();
        for solid in tilemap.physics_rects_around(self.pos) {
            if rect.overlaps(&solid) {
                if frame_movement.y > 0.0 {
                    rect.y = solid.y - rect.h;
                    self.collisions.down = true;
                }
                if frame_movement.y < 0.0 {
                    rect.y = solid.bottom();
                    self.collisions.up = true;
                }
                self.pos.y = rect.y;
            }
        }

        // Facing follows desired movement, not velocity; zero leaves it alone
        if movement.x > 0.0 {
            self.flip = false;
        }
        if movement.x < 0.0 {
            self.flip = true;
        }

        self.last_movement = movement;

        self.velocity.y = (self.velocity.y + phys.gravity).min(phys.terminal_velocity);
        if self.collisions.down || self.collisions.up {
            self.velocity.y = 0.0;
        }

        self.animation.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::tests::test_source;
    use crate::domain::tilemap::tests::map_from_rows;

    fn tuning() -> PhysicsTuning {
        PhysicsTuning {
            gravity: 0.1,
            terminal_velocity: 5.0,
        }
    }

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(EntityKind::Player, Vec2::new(x, y), (8.0, 15.0), &test_source())
    }

    // ── Rect ──

    #[test]
    fn rect_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(!a.overlaps(&b));
        let c = Rect::new(15.9, 0.0, 16.0, 16.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn rect_touch_is_inclusive() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        let b = Rect::new(16.0, 0.0, 16.0, 16.0);
        assert!(a.touches(&b));
        let c = Rect::new(16.1, 0.0, 16.0, 16.0);
        assert!(!a.touches(&c));
    }

    // ── Horizontal resolution ──

    #[test]
    fn walk_into_wall_snaps_and_flags() {
        // Wall column at tile x=2 (pixels 32..48), body starting left of it
        let map = map_from_rows(&["..S", "..S", "SSS"]);
        let mut b = body_at(20.0, 17.0);
        for _ in 0..20 {
            b.velocity.y = 0.0; // isolate the horizontal axis
            b.update(&map, Vec2::new(2.0, 0.0), &tuning());
            let r = b.rect();
            for solid in map.physics_rects_around(b.pos) {
                assert!(!r.overlaps(&solid), "body overlaps solid after resolve");
            }
        }
        assert!(b.collisions.right);
        assert_eq!(b.rect().right(), 32.0);
    }

    #[test]
    fn walk_left_into_wall() {
        let map = map_from_rows(&["S..", "S..", "SSS"]);
        let mut b = body_at(24.0, 17.0);
        for _ in 0..20 {
            b.velocity.y = 0.0;
            b.update(&map, Vec2::new(-2.0, 0.0), &tuning());
        }
        assert!(b.collisions.left);
        assert_eq!(b.rect().x, 16.0);
    }

    // ── Vertical resolution / gravity ──

    #[test]
    fn falls_and_lands_on_floor() {
        let map = map_from_rows(&["...", "...", "SSS"]);
        let mut b = body_at(4.0, 0.0);
        for _ in 0..120 {
            b.update(&map, Vec2::ZERO, &tuning());
        }
        assert!(b.collisions.down);
        assert_eq!(b.rect().bottom(), 32.0);
        assert_eq!(b.velocity.y, 0.0);
    }

    #[test]
    fn fall_speed_clamped_to_terminal() {
        let map = map_from_rows(&["..."]); // nothing solid, free fall
        let mut b = body_at(4.0, -400.0);
        for _ in 0..200 {
            b.update(&map, Vec2::ZERO, &tuning());
        }
        assert_eq!(b.velocity.y, 5.0);
    }

    #[test]
    fn only_moved_axis_sets_flags() {
        let map = map_from_rows(&["...", "...", "SSS"]);
        let mut b = body_at(4.0, 17.0);
        // Settle onto the floor first
        for _ in 0..5 {
            b.update(&map, Vec2::ZERO, &tuning());
        }
        b.update(&map, Vec2::new(1.0, 0.0), &tuning());
        assert!(!b.collisions.left);
        assert!(!b.collisions.right);
        assert!(b.collisions.down);
    }

    // ── Facing ──

    #[test]
    fn flip_follows_desired_movement_only() {
        let map = map_from_rows(&["...", "SSS"]);
        let mut b = body_at(4.0, 1.0);
        b.update(&map, Vec2::new(-1.0, 0.0), &tuning());
        assert!(b.flip);
        // Leftover velocity with zero desired movement must not re-flip
        b.velocity.x = 3.0;
        b.update(&map, Vec2::ZERO, &tuning());
        assert!(b.flip);
        b.update(&map, Vec2::new(0.5, 0.0), &tuning());
        assert!(!b.flip);
    }
}
