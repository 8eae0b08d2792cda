/// Frame-indexed sprite animation.
///
/// Frames are shared (`Rc`) between every entity playing the same asset;
/// playback position is per-instance. `fresh_copy` is how an entity gets
/// its own counter over shared frames.

use std::rc::Rc;

use thiserror::Error;

use crate::domain::entity::{Action, EntityKind};

/// A sprite frame: rows of characters with a foreground color.
/// Space is transparent. All rows of one sprite have equal width.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub rows: Vec<String>,
    pub fg: (u8, u8, u8),
}

impl Sprite {
    pub fn new(rows: &[&str], fg: (u8, u8, u8)) -> Self {
        Sprite {
            rows: rows.iter().map(|r| r.to_string()).collect(),
            fg,
        }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.chars().count())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Malformed asset definitions fail at registry build time, not at use.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("animation has no frames")]
    NoFrames,
    #[error("animation frame duration is zero")]
    ZeroDuration,
}

#[derive(Clone, Debug)]
pub struct Animation {
    frames: Rc<Vec<Sprite>>,
    frame_duration: u32,
    looping: bool,
    tick: u32,
    done: bool,
}

impl Animation {
    pub fn new(frames: Vec<Sprite>, frame_duration: u32, looping: bool) -> Result<Self, ConfigError> {
        if frames.is_empty() {
            return Err(ConfigError::NoFrames);
        }
        if frame_duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(Animation {
            frames: Rc::new(frames),
            frame_duration,
            looping,
            tick: 0,
            done: false,
        })
    }

    /// Single-frame placeholder used when an asset is missing entirely.
    pub fn missing() -> Self {
        Animation {
            frames: Rc::new(vec![Sprite::new(&["??", "??"], (255, 0, 255))]),
            frame_duration: 1,
            looping: true,
            tick: 0,
            done: false,
        }
    }

    /// Independent playback over the same shared frames.
    pub fn fresh_copy(&self) -> Self {
        Animation {
            frames: Rc::clone(&self.frames),
            frame_duration: self.frame_duration,
            looping: self.looping,
            tick: 0,
            done: false,
        }
    }

    /// Advance one tick. Looping wraps; one-shot clamps at the last frame
    /// and latches `done` exactly once.
    pub fn update(&mut self) {
        let total = self.frame_duration * self.frames.len() as u32;
        if self.looping {
            self.tick = (self.tick + 1) % total;
        } else {
            self.tick = (self.tick + 1).min(total - 1);
            if self.tick >= total - 1 {
                self.done = true;
            }
        }
    }

    pub fn current(&self) -> &Sprite {
        &self.frames[(self.tick / self.frame_duration) as usize]
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    #[cfg(test)]
    pub fn tick_count(&self) -> u32 {
        self.tick
    }
}

/// Narrow asset-provider interface the entities consume.
/// The concrete registry (with fallback lookup) lives in `sim::assets`.
pub trait AnimationSource {
    fn animation(&self, kind: EntityKind, action: Action) -> Option<Animation>;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Minimal source for physics/entity tests: one looping frame per request.
    pub struct StubSource;

    impl AnimationSource for StubSource {
        fn animation(&self, _kind: EntityKind, _action: Action) -> Option<Animation> {
            Some(Animation::new(vec![Sprite::new(&["x"], (255, 255, 255))], 1, true).unwrap())
        }
    }

    pub fn test_source() -> StubSource {
        StubSource
    }

    fn frames(n: usize) -> Vec<Sprite> {
        (0..n)
            .map(|i| Sprite::new(&[&i.to_string()], (255, 255, 255)))
            .collect()
    }

    #[test]
    fn rejects_empty_and_zero_duration() {
        assert_eq!(Animation::new(vec![], 5, true).unwrap_err(), ConfigError::NoFrames);
        assert_eq!(
            Animation::new(frames(2), 0, true).unwrap_err(),
            ConfigError::ZeroDuration
        );
    }

    #[test]
    fn looping_wraps_with_period_duration_times_frames() {
        // 4 images, 5 ticks each: after 20 updates the counter is back at 0
        let mut a = Animation::new(frames(4), 5, true).unwrap();
        for _ in 0..20 {
            a.update();
        }
        assert_eq!(a.tick_count(), 0);
        assert_eq!(a.current().rows[0], "0");
        assert!(!a.is_done());
    }

    #[test]
    fn looping_never_done() {
        let mut a = Animation::new(frames(2), 3, true).unwrap();
        for _ in 0..100 {
            a.update();
            assert!(!a.is_done());
        }
    }

    #[test]
    fn one_shot_clamps_and_latches_done_once() {
        let mut a = Animation::new(frames(3), 2, false).unwrap();
        for _ in 0..4 {
            a.update();
            assert!(!a.is_done());
        }
        a.update(); // tick reaches 5 = total-1
        assert!(a.is_done());
        assert_eq!(a.current().rows[0], "2");
        // Further updates keep it clamped and done
        for _ in 0..10 {
            a.update();
        }
        assert!(a.is_done());
        assert_eq!(a.current().rows[0], "2");
    }

    #[test]
    fn fresh_copy_has_own_counter() {
        let mut a = Animation::new(frames(4), 5, false).unwrap();
        for _ in 0..19 {
            a.update();
        }
        assert!(a.is_done());
        let b = a.fresh_copy();
        assert!(!b.is_done());
        assert_eq!(b.tick_count(), 0);
        // Frames are shared, not cloned
        assert!(Rc::ptr_eq(&a.frames, &b.frames));
    }
}
