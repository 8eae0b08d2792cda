/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use crate::domain::physics::Vec2;

/// Side length of a grid tile in world pixels.
pub const TILE_SIZE: i32 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TileKind {
    Grass,      // Solid terrain
    Stone,      // Solid terrain
    Decor,      // Small decoration, never solid
    LargeDecor, // Trees etc., never solid (variant 2 = tree crown / leaf spawner)
    Spawner,    // Marker: variant 0 = player, 1 = enemy, 2 = boss
    Item,       // Marker: variant 0 = shuriken pickup, 1 = kunai pickup
}

impl TileKind {
    /// Does this kind participate in collision resolution?
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }

    /// Parse the kind name used by the JSON level format.
    pub fn from_name(s: &str) -> Option<TileKind> {
        match s {
            "grass" => Some(TileKind::Grass),
            "stone" => Some(TileKind::Stone),
            "decor" => Some(TileKind::Decor),
            "large_decor" => Some(TileKind::LargeDecor),
            "spawners" => Some(TileKind::Spawner),
            "items" => Some(TileKind::Item),
            _ => None,
        }
    }
}

/// A tile snapped to the grid. The grid position is the key in the tilemap,
/// so only kind and sub-variant live here.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub kind: TileKind,
    pub variant: u8,
}

/// A decoration placed at an arbitrary pixel position (not grid-snapped).
#[derive(Clone, Debug)]
pub struct OffgridTile {
    pub kind: TileKind,
    pub variant: u8,
    pub pos: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_kinds() {
        assert!(TileKind::Grass.is_solid());
        assert!(TileKind::Stone.is_solid());
        assert!(!TileKind::Decor.is_solid());
        assert!(!TileKind::LargeDecor.is_solid());
        assert!(!TileKind::Spawner.is_solid());
        assert!(!TileKind::Item.is_solid());
    }

    #[test]
    fn kind_names() {
        for (name, kind) in [
            ("grass", TileKind::Grass),
            ("stone", TileKind::Stone),
            ("decor", TileKind::Decor),
            ("large_decor", TileKind::LargeDecor),
            ("spawners", TileKind::Spawner),
            ("items", TileKind::Item),
        ] {
            assert_eq!(TileKind::from_name(name), Some(kind));
        }
        assert_eq!(TileKind::from_name("lava"), None);
    }
}
