/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub physics: PhysicsTuning,
    pub combat: CombatTuning,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub users_file: PathBuf,
}

#[derive(Clone, Copy, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

/// Tunables consumed by `Body::update`.
#[derive(Clone, Copy, Debug)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub terminal_velocity: f32,
}

/// Tunables consumed by the combat entities.
#[derive(Clone, Copy, Debug)]
pub struct CombatTuning {
    pub jump_impulse: f32,
    pub dash_ticks: i32,
    pub max_hits: u32,
    pub kunai_cooldown: u32,
    pub boss_hp: u32,
    pub boss_invuln_ticks: u32,
    pub boss_attack_period: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub dash: Vec<String>,
    pub throw: Vec<String>,
    pub strike: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        PhysicsTuning {
            gravity: default_gravity(),
            terminal_velocity: default_terminal_velocity(),
        }
    }
}

impl Default for CombatTuning {
    fn default() -> Self {
        CombatTuning {
            jump_impulse: default_jump_impulse(),
            dash_ticks: default_dash_ticks(),
            max_hits: default_max_hits(),
            kunai_cooldown: default_kunai_cooldown(),
            boss_hp: default_boss_hp(),
            boss_invuln_ticks: default_boss_invuln(),
            boss_attack_period: default_boss_attack_period(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: default_tick_rate(),
            },
            physics: PhysicsTuning::default(),
            combat: CombatTuning::default(),
            gamepad: GamepadConfig {
                jump: default_pad_jump(),
                dash: default_pad_dash(),
                throw: default_pad_throw(),
                strike: default_pad_strike(),
                confirm: default_confirm(),
                cancel: default_cancel(),
            },
            levels_dir: PathBuf::from(default_levels_dir()),
            users_file: PathBuf::from(default_users_file()),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    combat: TomlCombat,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_terminal_velocity")]
    terminal_velocity: f32,
}

#[derive(Deserialize, Debug)]
struct TomlCombat {
    #[serde(default = "default_jump_impulse")]
    jump_impulse: f32,
    #[serde(default = "default_dash_ticks")]
    dash_ticks: i32,
    #[serde(default = "default_max_hits")]
    max_hits: u32,
    #[serde(default = "default_kunai_cooldown")]
    kunai_cooldown: u32,
    #[serde(default = "default_boss_hp")]
    boss_hp: u32,
    #[serde(default = "default_boss_invuln")]
    boss_invuln_ticks: u32,
    #[serde(default = "default_boss_attack_period")]
    boss_attack_period: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_dash")]
    dash: Vec<String>,
    #[serde(default = "default_pad_throw")]
    throw: Vec<String>,
    #[serde(default = "default_pad_strike")]
    strike: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_users_file")]
    users_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }          // ~60 Hz
fn default_gravity() -> f32 { 0.1 }
fn default_terminal_velocity() -> f32 { 5.0 }
fn default_jump_impulse() -> f32 { 3.0 }
fn default_dash_ticks() -> i32 { 60 }
fn default_max_hits() -> u32 { 5 }
fn default_kunai_cooldown() -> u32 { 30 }
fn default_boss_hp() -> u32 { 12 }
fn default_boss_invuln() -> u32 { 30 }
fn default_boss_attack_period() -> u32 { 90 }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_dash() -> Vec<String> { vec!["B".into(), "R1".into()] }
fn default_pad_throw() -> Vec<String> { vec!["X".into()] }
fn default_pad_strike() -> Vec<String> { vec!["Y".into(), "L1".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_users_file() -> String { "users.json".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            terminal_velocity: default_terminal_velocity(),
        }
    }
}

impl Default for TomlCombat {
    fn default() -> Self {
        TomlCombat {
            jump_impulse: default_jump_impulse(),
            dash_ticks: default_dash_ticks(),
            max_hits: default_max_hits(),
            kunai_cooldown: default_kunai_cooldown(),
            boss_hp: default_boss_hp(),
            boss_invuln_ticks: default_boss_invuln(),
            boss_attack_period: default_boss_attack_period(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            dash: default_pad_dash(),
            throw: default_pad_throw(),
            strike: default_pad_strike(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            users_file: default_users_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms,
            },
            physics: PhysicsTuning {
                gravity: toml_cfg.physics.gravity,
                terminal_velocity: toml_cfg.physics.terminal_velocity,
            },
            combat: CombatTuning {
                jump_impulse: toml_cfg.combat.jump_impulse,
                dash_ticks: toml_cfg.combat.dash_ticks,
                max_hits: toml_cfg.combat.max_hits,
                kunai_cooldown: toml_cfg.combat.kunai_cooldown,
                boss_hp: toml_cfg.combat.boss_hp,
                boss_invuln_ticks: toml_cfg.combat.boss_invuln_ticks,
                boss_attack_period: toml_cfg.combat.boss_attack_period,
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                dash: toml_cfg.gamepad.dash,
                throw: toml_cfg.gamepad.throw,
                strike: toml_cfg.gamepad.strike,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            levels_dir: resolve_dir(&toml_cfg.general.levels_dir, search_dirs),
            users_file: resolve_file(&toml_cfg.general.users_file, search_dirs),
        }
    }
}

/// Relative data directories are searched next to the exe, then the CWD.
fn resolve_dir(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let raw = PathBuf::from(name);
    if raw.is_absolute() {
        return raw;
    }
    search_dirs
        .iter()
        .map(|d| d.join(name))
        .find(|p| p.is_dir())
        .unwrap_or(raw)
}

fn resolve_file(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let raw = PathBuf::from(name);
    if raw.is_absolute() {
        return raw;
    }
    search_dirs
        .iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(raw)
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (resolve symlinks)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/shadowdash)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/shadowdash");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/shadowdash)
    let sys = PathBuf::from("/usr/share/shadowdash");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.speed.tick_rate_ms, 16);
        assert_eq!(cfg.physics.gravity, 0.1);
        assert_eq!(cfg.combat.max_hits, 5);
        assert_eq!(cfg.general.levels_dir, "levels");
    }

    #[test]
    fn partial_section_fills_missing_keys() {
        let cfg: TomlConfig = toml::from_str("[combat]\nboss_hp = 20\n").unwrap();
        assert_eq!(cfg.combat.boss_hp, 20);
        // Untouched keys in the same section keep their defaults
        assert_eq!(cfg.combat.boss_invuln_ticks, 30);
        assert_eq!(cfg.combat.kunai_cooldown, 30);
        // Other sections too
        assert_eq!(cfg.physics.terminal_velocity, 5.0);
    }

    #[test]
    fn gamepad_lists_override_whole_key() {
        let cfg: TomlConfig = toml::from_str("[gamepad]\njump = [\"X\", \"R2\"]\n").unwrap();
        assert_eq!(cfg.gamepad.jump, vec!["X".to_string(), "R2".to_string()]);
        assert_eq!(cfg.gamepad.dash, vec!["B".to_string(), "R1".to_string()]);
    }
}
