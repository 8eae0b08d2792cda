/// Level loading.
///
/// ## Sources (priority order):
///   1. `<levels_dir>/<index>.json` — the map-editor JSON format
///   2. Built-in embedded ASCII levels
///
/// A malformed JSON file yields an empty (but playable) map and an on-screen
/// warning; it never aborts the game. An index past the last level clamps to
/// the last one.
///
/// ## JSON format:
///   ```json
///   {
///     "tile_size": 16,
///     "tilemap": { "3;10": { "type": "grass", "variant": 1, "pos": [3, 10] } },
///     "offgrid": [ { "type": "large_decor", "variant": 2, "pos": [120.0, 93.5] } ]
///   }
///   ```
///   Grid keys are `"x;y"` tile coordinates; off-grid positions are pixels.
///
/// ## Embedded ASCII legend:
///   'G' = grass     'S' = stone      'd' = decoration
///   'P' = player    'E' = enemy      'B' = boss
///   's' = shuriken  'k' = kunai      'T' = tree (leaf spawner)
///   '.' = empty

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::entity::{Boss, Enemy, Player, BOSS_SIZE};
use crate::domain::fx::{Pickup, PickupKind};
use crate::domain::physics::{Rect, Vec2};
use crate::domain::tile::{OffgridTile, Tile, TileKind, TILE_SIZE};
use crate::sim::world::WorldState;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed level json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad tile key {0:?} (expected \"x;y\")")]
    BadKey(String),
    #[error("unknown tile kind {0:?}")]
    UnknownKind(String),
}

type TileSets = (HashMap<(i32, i32), Tile>, Vec<OffgridTile>);

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load a level into the world state. Inventory and hit counter reset;
/// the level index is recorded for restarts.
pub fn load_level(world: &mut WorldState, index: usize, config: &GameConfig) {
    let index = index.min(level_count(config).saturating_sub(1));
    let (grid, offgrid, warning) = level_source(index, config);
    world.tilemap.replace(grid, offgrid);
    world.level = index;

    // Spawn markers
    let spawners = world.tilemap.extract(
        &[
            (TileKind::Spawner, 0),
            (TileKind::Spawner, 1),
            (TileKind::Spawner, 2),
        ],
        false,
    );
    let mut player_spawn = Vec2::new(50.0, 0.0);
    world.enemies.clear();
    world.boss = None;
    for s in &spawners {
        match s.variant {
            0 => player_spawn = s.pos,
            1 => world.enemies.push(Enemy::new(s.pos, &world.assets)),
            _ => {
                // Bottom-align the taller boss body with its marker tile
                let pos = Vec2::new(s.pos.x, s.pos.y + TILE_SIZE as f32 - BOSS_SIZE.1);
                world.boss = Some(Boss::new(pos, &world.assets, world.combat));
            }
        }
    }
    world.player = Player::new(player_spawn, &world.assets, world.combat);

    // Item markers, then a few randomized extras on open ground
    let items = world
        .tilemap
        .extract(&[(TileKind::Item, 0), (TileKind::Item, 1)], false);
    world.pickups.clear();
    for item in items {
        let kind = if item.variant == 0 {
            PickupKind::Shuriken
        } else {
            PickupKind::Kunai
        };
        world.pickups.push(Pickup {
            kind,
            pos: Vec2::new(item.pos.x + 5.0, item.pos.y + 8.0),
        });
    }
    scatter_pickups(world);

    // Tree crowns shed leaves
    let trees = world.tilemap.extract(&[(TileKind::LargeDecor, 2)], true);
    world.leaf_spawners = trees
        .iter()
        .map(|t| Rect::new(t.pos.x + 4.0, t.pos.y + 4.0, 23.0, 13.0))
        .collect();

    world.projectiles.clear();
    world.particles.clear();
    world.sparks.clear();
    world.transition = -30;
    world.dead = 0;
    world.screenshake = 0.0;
    world.paused = false;
    world.scroll = world.camera_target();

    match warning {
        Some(w) => world.set_message(&w, 180),
        None => world.set_message(&format!("Stage {}", index + 1), 90),
    }
}

/// How many levels the configured source provides.
pub fn level_count(config: &GameConfig) -> usize {
    let mut n = 0;
    while config.levels_dir.join(format!("{n}.json")).is_file() {
        n += 1;
    }
    if n > 0 {
        n
    } else {
        EMBEDDED_LEVELS.len()
    }
}

/// Parse the JSON level format into tile sets.
pub fn parse_level(content: &str) -> Result<TileSets, LoadError> {
    let file: LevelFile = serde_json::from_str(content)?;

    let mut grid = HashMap::new();
    for (key, entry) in file.tilemap {
        let (x, y) = parse_grid_key(&key)?;
        let kind =
            TileKind::from_name(&entry.kind).ok_or_else(|| LoadError::UnknownKind(entry.kind))?;
        grid.insert(
            (x, y),
            Tile {
                kind,
                variant: entry.variant,
            },
        );
    }

    let mut offgrid = Vec::new();
    for entry in file.offgrid {
        let kind =
            TileKind::from_name(&entry.kind).ok_or_else(|| LoadError::UnknownKind(entry.kind))?;
        offgrid.push(OffgridTile {
            kind,
            variant: entry.variant,
            pos: Vec2::new(entry.pos[0], entry.pos[1]),
        });
    }

    Ok((grid, offgrid))
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct LevelFile {
    #[serde(default)]
    #[allow(dead_code)]
    tile_size: Option<i32>,
    tilemap: HashMap<String, TileEntry>,
    #[serde(default)]
    offgrid: Vec<TileEntry>,
}

#[derive(Deserialize)]
struct TileEntry {
    #[serde(rename = "type")]
    kind: String,
    variant: u8,
    pos: [f32; 2],
}

fn parse_grid_key(key: &str) -> Result<(i32, i32), LoadError> {
    let mut parts = key.split(';');
    let bad = || LoadError::BadKey(key.to_string());
    let x = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
    let y = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok((x, y))
}

fn level_source(index: usize, config: &GameConfig) -> (HashMap<(i32, i32), Tile>, Vec<OffgridTile>, Option<String>) {
    let path = config.levels_dir.join(format!("{index}.json"));
    if path.is_file() {
        match load_file(&path) {
            Ok((grid, offgrid)) => return (grid, offgrid, None),
            Err(e) => {
                return (
                    HashMap::new(),
                    vec![],
                    Some(format!("Level {} failed to load: {}", index, e)),
                )
            }
        }
    }

    let rows = EMBEDDED_LEVELS[index.min(EMBEDDED_LEVELS.len() - 1)];
    let (grid, offgrid) = level_from_ascii(rows);
    (grid, offgrid, None)
}

fn load_file(path: &Path) -> Result<TileSets, LoadError> {
    let content = std::fs::read_to_string(path)?;
    parse_level(&content)
}

fn level_from_ascii(rows: &[&str]) -> TileSets {
    let mut grid = HashMap::new();
    let mut offgrid = Vec::new();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let (x, y) = (x as i32, y as i32);
            let tile = match ch {
                'G' => Some(Tile { kind: TileKind::Grass, variant: 0 }),
                'S' => Some(Tile { kind: TileKind::Stone, variant: 0 }),
                'd' => Some(Tile { kind: TileKind::Decor, variant: 0 }),
                'P' => Some(Tile { kind: TileKind::Spawner, variant: 0 }),
                'E' => Some(Tile { kind: TileKind::Spawner, variant: 1 }),
                'B' => Some(Tile { kind: TileKind::Spawner, variant: 2 }),
                's' => Some(Tile { kind: TileKind::Item, variant: 0 }),
                'k' => Some(Tile { kind: TileKind::Item, variant: 1 }),
                'T' => {
                    // Trees hang as off-grid decor, crown above the marker
                    offgrid.push(OffgridTile {
                        kind: TileKind::LargeDecor,
                        variant: 2,
                        pos: Vec2::new(
                            (x * TILE_SIZE) as f32 - 8.0,
                            (y * TILE_SIZE) as f32 - 16.0,
                        ),
                    });
                    None
                }
                _ => None,
            };
            if let Some(tile) = tile {
                grid.insert((x, y), tile);
            }
        }
    }
    (grid, offgrid)
}

/// Drop 2-5 extra pickups on random open floor tiles.
fn scatter_pickups(world: &mut WorldState) {
    let mut candidates = Vec::new();
    for ty in -5..30 {
        for tx in -5..60 {
            let here = Vec2::new(
                (tx * TILE_SIZE) as f32 + 8.0,
                (ty * TILE_SIZE) as f32 + 8.0,
            );
            let below = Vec2::new(here.x, here.y + TILE_SIZE as f32);
            if !world.tilemap.solid_check(here) && world.tilemap.solid_check(below) {
                candidates.push(Vec2::new(
                    (tx * TILE_SIZE) as f32 + 5.0,
                    (ty * TILE_SIZE) as f32 + 8.0,
                ));
            }
        }
    }
    if candidates.is_empty() {
        return;
    }
    let count = world.rng.gen_range(2..=5);
    for _ in 0..count {
        let pos = candidates[world.rng.gen_range(0..candidates.len())];
        let kind = if world.rng.gen::<bool>() {
            PickupKind::Shuriken
        } else {
            PickupKind::Kunai
        };
        world.pickups.push(Pickup { kind, pos });
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED_LEVELS: [&[&str]; 3] = [
    // Stage 1 — open meadow, pits between the platforms
    &[
        "........................................",
        "........................................",
        "....T...........T.......................",
        "........................................",
        "..........s.............k...............",
        "........GGGG........GGGG................",
        "........................................",
        "......P.........E............E....E.....",
        "GGGGGGGGGGGG..GGGGGGGGGG..GGGGGGGGGGGGGG",
        "SSSSSSSSSSSS..SSSSSSSSSS..SSSSSSSSSSSSSS",
        "SSSSSSSSSSSS..SSSSSSSSSS..SSSSSSSSSSSSSS",
    ],
    // Stage 2 — walled canyon, wall jumps to the upper shelves
    &[
        "S......................................S",
        "S......................................S",
        "S...s........................k.........S",
        "S..GGGG....................GGGG........S",
        "S..........................T...........S",
        "S.........E.........E..................S",
        "S......GGGGGGG..GGGGGGGG...............S",
        "S......................................S",
        "S...............................E......S",
        "S.P.........................GGGGGGG....S",
        "GGGGGG..GGGGGGGGGGGGGGGGGG..GGGGGGGGGGGG",
        "SSSSSS..SSSSSSSSSSSSSSSSSS..SSSSSSSSSSSS",
    ],
    // Stage 3 — boss arena
    &[
        "SSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSS",
        "S......................................S",
        "S......................................S",
        "S..s..k........................s..k....S",
        "S..GGGG........................GGGG....S",
        "S......................................S",
        "S......E......................E........S",
        "S....GGGGG..............GGGGG..........S",
        "S......................................S",
        "S...P..........................B.......S",
        "SGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGS",
        "SSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSS",
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatTuning, PhysicsTuning};
    use crate::sim::assets::AssetLibrary;

    fn world() -> WorldState {
        WorldState::new(
            AssetLibrary::build().unwrap(),
            PhysicsTuning::default(),
            CombatTuning::default(),
        )
    }

    #[test]
    fn parses_the_json_format() {
        let json = r#"{
            "tile_size": 16,
            "tilemap": {
                "3;10": { "type": "grass", "variant": 1, "pos": [3, 10] },
                "-2;4": { "type": "stone", "variant": 0, "pos": [-2, 4] }
            },
            "offgrid": [
                { "type": "large_decor", "variant": 2, "pos": [120.5, 93.0] }
            ]
        }"#;
        let (grid, offgrid) = parse_level(json).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(
            grid[&(3, 10)],
            Tile { kind: TileKind::Grass, variant: 1 }
        );
        assert!(grid.contains_key(&(-2, 4)));
        assert_eq!(offgrid.len(), 1);
        assert_eq!(offgrid[0].pos, Vec2::new(120.5, 93.0));
    }

    #[test]
    fn rejects_bad_grid_keys() {
        let json = r#"{ "tilemap": { "3,10": { "type": "grass", "variant": 0, "pos": [3, 10] } } }"#;
        assert!(matches!(parse_level(json), Err(LoadError::BadKey(_))));
    }

    #[test]
    fn rejects_unknown_tile_kinds() {
        let json = r#"{ "tilemap": { "0;0": { "type": "lava", "variant": 0, "pos": [0, 0] } } }"#;
        assert!(matches!(parse_level(json), Err(LoadError::UnknownKind(_))));
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(parse_level("not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn embedded_levels_have_spawns() {
        for rows in EMBEDDED_LEVELS {
            let (grid, _) = level_from_ascii(rows);
            let players = grid
                .values()
                .filter(|t| t.kind == TileKind::Spawner && t.variant == 0)
                .count();
            assert_eq!(players, 1);
        }
        // Last stage is the boss arena
        let (grid, _) = level_from_ascii(EMBEDDED_LEVELS[EMBEDDED_LEVELS.len() - 1]);
        assert!(grid
            .values()
            .any(|t| t.kind == TileKind::Spawner && t.variant == 2));
    }

    #[test]
    fn load_populates_world() {
        let mut w = world();
        let config = GameConfig::default();
        load_level(&mut w, 0, &config);

        assert_eq!(w.level, 0);
        assert_eq!(w.transition, -30);
        assert_eq!(w.dead, 0);
        assert_eq!(w.enemies.len(), 3);
        assert!(w.boss.is_none());
        assert!(!w.leaf_spawners.is_empty());
        // Map markers (2) plus 2-5 scattered extras
        assert!(w.pickups.len() >= 4 && w.pickups.len() <= 7);
        // Player stands where the marker was
        assert_eq!(w.player.body.pos, Vec2::new(6.0 * 16.0, 7.0 * 16.0));
    }

    #[test]
    fn out_of_range_index_clamps_to_last_level() {
        let mut w = world();
        let config = GameConfig::default();
        load_level(&mut w, 99, &config);
        assert_eq!(w.level, EMBEDDED_LEVELS.len() - 1);
        assert!(w.boss.is_some());
    }

    #[test]
    fn malformed_file_falls_back_to_empty_map() {
        let dir = std::env::temp_dir().join("shadowdash-level-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0.json"), "{ broken").unwrap();

        let mut w = world();
        let mut config = GameConfig::default();
        config.levels_dir = dir.clone();
        load_level(&mut w, 0, &config);

        assert!(w.enemies.is_empty());
        assert!(w.message.contains("failed to load"));
        // Still playable: no tiles, but state is consistent
        assert_eq!(w.transition, -30);

        std::fs::remove_dir_all(&dir).ok();
    }
}
