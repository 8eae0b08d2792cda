/// Static level geometry: grid tiles keyed by integer coordinates plus
/// free-floating off-grid decor. Answers the two queries the physics layer
/// needs (point solidity, candidate rects near a point) and extracts spawn
/// markers at level load.

use std::collections::HashMap;

use crate::domain::physics::{Rect, Vec2};
use crate::domain::tile::{OffgridTile, Tile, TileKind, TILE_SIZE};

/// 3x3 neighborhood offsets around the tile containing a point.
const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),  (0, 0),  (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// A tile pulled out by `extract`, position converted to pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedTile {
    pub kind: TileKind,
    pub variant: u8,
    pub pos: Vec2,
}

#[derive(Default)]
pub struct Tilemap {
    grid: HashMap<(i32, i32), Tile>,
    offgrid: Vec<OffgridTile>,
}

impl Tilemap {
    pub fn new() -> Self {
        Tilemap::default()
    }

    /// Replace all contents (level load).
    pub fn replace(&mut self, grid: HashMap<(i32, i32), Tile>, offgrid: Vec<OffgridTile>) {
        self.grid = grid;
        self.offgrid = offgrid;
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.offgrid.clear();
    }

    pub fn insert(&mut self, x: i32, y: i32, tile: Tile) {
        self.grid.insert((x, y), tile);
    }

    pub fn push_offgrid(&mut self, tile: OffgridTile) {
        self.offgrid.push(tile);
    }

    /// Grid coordinate of the tile containing a pixel position.
    fn tile_coord(pos: Vec2) -> (i32, i32) {
        (
            (pos.x / TILE_SIZE as f32).floor() as i32,
            (pos.y / TILE_SIZE as f32).floor() as i32,
        )
    }

    /// Is the tile containing this pixel position solid?
    pub fn solid_check(&self, pos: Vec2) -> bool {
        let key = Self::tile_coord(pos);
        self.grid.get(&key).map_or(false, |t| t.kind.is_solid())
    }

    /// Collision rects for the solid tiles in the 3x3 neighborhood around
    /// the tile containing `pos`. At most 9 rects.
    pub fn physics_rects_around(&self, pos: Vec2) -> Vec<Rect> {
        let (tx, ty) = Self::tile_coord(pos);
        let mut rects = Vec::with_capacity(9);
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let key = (tx + dx, ty + dy);
            if let Some(tile) = self.grid.get(&key) {
                if tile.kind.is_solid() {
                    rects.push(Rect::new(
                        (key.0 * TILE_SIZE) as f32,
                        (key.1 * TILE_SIZE) as f32,
                        TILE_SIZE as f32,
                        TILE_SIZE as f32,
                    ));
                }
            }
        }
        rects
    }

    /// Pull out every tile whose (kind, variant) pair is in `matches`.
    /// Grid positions are converted to pixel space. With `keep = false`
    /// the matched tiles are removed from the map (one-shot spawn markers);
    /// with `keep = true` they stay (decorative markers that still render).
    pub fn extract(&mut self, matches: &[(TileKind, u8)], keep: bool) -> Vec<ExtractedTile> {
        let wanted = |kind: TileKind, variant: u8| matches.contains(&(kind, variant));
        let mut out = Vec::new();

        let mut removed_keys = Vec::new();
        for (&(x, y), tile) in &self.grid {
            if wanted(tile.kind, tile.variant) {
                out.push(ExtractedTile {
                    kind: tile.kind,
                    variant: tile.variant,
                    pos: Vec2::new((x * TILE_SIZE) as f32, (y * TILE_SIZE) as f32),
                });
                if !keep {
                    removed_keys.push((x, y));
                }
            }
        }
        for key in removed_keys {
            self.grid.remove(&key);
        }

        let mut i = 0;
        while i < self.offgrid.len() {
            let t = &self.offgrid[i];
            if wanted(t.kind, t.variant) {
                out.push(ExtractedTile {
                    kind: t.kind,
                    variant: t.variant,
                    pos: t.pos,
                });
                if !keep {
                    self.offgrid.remove(i);
                    continue;
                }
            }
            i += 1;
        }

        out
    }

    /// Grid tiles intersecting a pixel-space view rect, with pixel positions.
    /// Iterates only the visible tile range, not the whole map.
    pub fn visible_tiles(&self, view: Rect) -> Vec<(Vec2, Tile)> {
        let x0 = (view.x / TILE_SIZE as f32).floor() as i32;
        let y0 = (view.y / TILE_SIZE as f32).floor() as i32;
        let x1 = (view.right() / TILE_SIZE as f32).ceil() as i32;
        let y1 = (view.bottom() / TILE_SIZE as f32).ceil() as i32;
        let mut out = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(tile) = self.grid.get(&(x, y)) {
                    out.push((
                        Vec2::new((x * TILE_SIZE) as f32, (y * TILE_SIZE) as f32),
                        *tile,
                    ));
                }
            }
        }
        out
    }

    pub fn offgrid_tiles(&self) -> &[OffgridTile] {
        &self.offgrid
    }

    #[cfg(test)]
    pub fn grid_len(&self) -> usize {
        self.grid.len()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Build a map from rows of characters, one tile per char:
    /// 'S' = stone, 'G' = grass, anything else = empty.
    pub fn map_from_rows(rows: &[&str]) -> Tilemap {
        let mut map = Tilemap::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    'S' => Some(TileKind::Stone),
                    'G' => Some(TileKind::Grass),
                    _ => None,
                };
                if let Some(kind) = kind {
                    map.insert(x as i32, y as i32, Tile { kind, variant: 0 });
                }
            }
        }
        map
    }

    #[test]
    fn solid_check_hits_solid_tiles_only() {
        let mut map = map_from_rows(&["S.", ".."]);
        map.insert(1, 1, Tile { kind: TileKind::Decor, variant: 0 });
        assert!(map.solid_check(Vec2::new(8.0, 8.0)));
        assert!(!map.solid_check(Vec2::new(24.0, 8.0))); // empty
        assert!(!map.solid_check(Vec2::new(24.0, 24.0))); // decor
    }

    #[test]
    fn solid_check_negative_coords() {
        let mut map = Tilemap::new();
        map.insert(-1, -1, Tile { kind: TileKind::Stone, variant: 0 });
        assert!(map.solid_check(Vec2::new(-8.0, -8.0)));
        assert!(!map.solid_check(Vec2::new(8.0, 8.0)));
    }

    #[test]
    fn rects_around_limited_to_neighborhood() {
        // Fully solid 5x5 map: only the 3x3 block around the point comes back
        let map = map_from_rows(&["SSSSS"; 5]);
        let rects = map.physics_rects_around(Vec2::new(40.0, 40.0));
        assert_eq!(rects.len(), 9);
        for r in &rects {
            assert!(r.x >= 16.0 && r.x <= 48.0);
            assert!(r.y >= 16.0 && r.y <= 48.0);
        }
    }

    #[test]
    fn rects_around_skips_non_solid() {
        let mut map = map_from_rows(&["...", ".S.", "..."]);
        map.insert(0, 0, Tile { kind: TileKind::Decor, variant: 3 });
        let rects = map.physics_rects_around(Vec2::new(24.0, 24.0));
        assert_eq!(rects, vec![Rect::new(16.0, 16.0, 16.0, 16.0)]);
    }

    #[test]
    fn extract_removes_unless_kept() {
        let mut map = Tilemap::new();
        map.insert(2, 3, Tile { kind: TileKind::Spawner, variant: 0 });
        map.insert(4, 3, Tile { kind: TileKind::Spawner, variant: 1 });
        map.insert(5, 3, Tile { kind: TileKind::Stone, variant: 0 });

        let found = map.extract(&[(TileKind::Spawner, 0), (TileKind::Spawner, 1)], false);
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|t| t.variant == 0 && t.pos == Vec2::new(32.0, 48.0)));
        assert_eq!(map.grid_len(), 1); // markers removed, stone stays

        let again = map.extract(&[(TileKind::Spawner, 0)], false);
        assert!(again.is_empty());
    }

    #[test]
    fn extract_keep_leaves_tiles_in_place() {
        let mut map = Tilemap::new();
        map.push_offgrid(OffgridTile {
            kind: TileKind::LargeDecor,
            variant: 2,
            pos: Vec2::new(100.0, 40.0),
        });
        let found = map.extract(&[(TileKind::LargeDecor, 2)], true);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pos, Vec2::new(100.0, 40.0));
        assert_eq!(map.offgrid_tiles().len(), 1);
    }
}
