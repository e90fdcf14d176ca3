/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::domain::geometry::Vec2;
use crate::domain::physics::Tuning;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: Tuning,
    pub actor: ActorConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub level_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ActorConfig {
    pub width: f32,
    pub height: f32,
    pub inset: f32, // trimmed from each side of the sprite for the hitbox
}

impl ActorConfig {
    /// Collision box size: sprite width minus the inset on both sides.
    pub fn hitbox(&self) -> Vec2 {
        Vec2::new((self.width - 2.0 * self.inset).max(1.0), self.height)
    }
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub max_dt_ms: u64, // longer frames are clamped to this step
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub move_forward: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    actor: TomlActor,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_friction")]
    friction: f32,
    #[serde(default = "default_jump_impulse")]
    jump_impulse: f32,
    #[serde(default = "default_jump_cutoff")]
    jump_cutoff: f32,
    #[serde(default = "default_forward_accel")]
    forward_accel: f32,
    #[serde(default = "default_min_vx")]
    min_velocity_x: f32,
    #[serde(default = "default_min_vy")]
    min_velocity_y: f32,
    #[serde(default = "default_max_vx")]
    max_velocity_x: f32,
    #[serde(default = "default_max_vy")]
    max_velocity_y: f32,
}

#[derive(Deserialize, Debug)]
struct TomlActor {
    #[serde(default = "default_actor_width")]
    width: f32,
    #[serde(default = "default_actor_height")]
    height: f32,
    #[serde(default = "default_actor_inset")]
    inset: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_max_dt")]
    max_dt_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_move_forward")]
    move_forward: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
}

// ── Defaults ──

fn default_gravity() -> f32 { -450.0 }
fn default_friction() -> f32 { 0.90 }      // per tick, not per second
fn default_jump_impulse() -> f32 { 310.0 }
fn default_jump_cutoff() -> f32 { 150.0 }  // release jump early → ascent capped here
fn default_forward_accel() -> f32 { 800.0 }
fn default_min_vx() -> f32 { 0.0 }         // the runner never walks backwards
fn default_min_vy() -> f32 { -450.0 }
fn default_max_vx() -> f32 { 120.0 }
fn default_max_vy() -> f32 { 250.0 }

fn default_actor_width() -> f32 { 16.0 }
fn default_actor_height() -> f32 { 20.0 }
fn default_actor_inset() -> f32 { 3.0 }

fn default_tick_rate() -> u64 { 16 }       // ~60 fps
fn default_max_dt() -> u64 { 50 }

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_move_forward() -> Vec<String> { vec!["X".into(), "R1".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            friction: default_friction(),
            jump_impulse: default_jump_impulse(),
            jump_cutoff: default_jump_cutoff(),
            forward_accel: default_forward_accel(),
            min_velocity_x: default_min_vx(),
            min_velocity_y: default_min_vy(),
            max_velocity_x: default_max_vx(),
            max_velocity_y: default_max_vy(),
        }
    }
}

impl Default for TomlActor {
    fn default() -> Self {
        TomlActor {
            width: default_actor_width(),
            height: default_actor_height(),
            inset: default_actor_inset(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            max_dt_ms: default_max_dt(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            move_forward: default_move_forward(),
            restart: default_restart(),
            quit: default_quit(),
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
        let mut config = GameConfig::from_toml(toml_cfg);

        // Relative level paths resolve against the first directory that has them.
        if let Some(rel) = config.level_file.as_ref().filter(|p| p.is_relative()) {
            if let Some(found) = search_dirs.iter().map(|d| d.join(rel)).find(|p| p.is_file()) {
                config.level_file = Some(found);
            }
        }
        config
    }

    /// Parse a config document. Errors fall back to defaults with a warning.
    pub fn parse(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => GameConfig::from_toml(cfg),
            Err(e) => {
                warn!("config.toml parse error: {e}; using default settings");
                GameConfig::from_toml(TomlConfig::default())
            }
        }
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let p = cfg.physics;
        GameConfig {
            physics: Tuning {
                gravity: p.gravity,
                friction: p.friction,
                jump_impulse: p.jump_impulse,
                jump_cutoff: p.jump_cutoff,
                forward_accel: p.forward_accel,
                min_velocity: Vec2::new(p.min_velocity_x, p.min_velocity_y),
                max_velocity: Vec2::new(p.max_velocity_x, p.max_velocity_y),
            },
            actor: ActorConfig {
                width: cfg.actor.width,
                height: cfg.actor.height,
                inset: cfg.actor.inset,
            },
            timing: TimingConfig {
                tick_rate_ms: cfg.timing.tick_rate_ms.max(1),
                max_dt_ms: cfg.timing.max_dt_ms.max(1),
            },
            gamepad: GamepadConfig {
                jump: cfg.gamepad.jump,
                move_forward: cfg.gamepad.move_forward,
                restart: cfg.gamepad.restart,
                quit: cfg.gamepad.quit,
            },
            level_file: cfg.general.level_file.map(PathBuf::from),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
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

    // 3. XDG data home (~/.local/share/koalio)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/koalio");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/koalio)
    let sys = PathBuf::from("/usr/share/koalio");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

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
                    Ok(cfg) => {
                        info!("using {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        warn!("{} parse error: {e}; using default settings", path.display());
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
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
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::parse("");
        assert_eq!(cfg.physics, Tuning::default());
        assert_eq!(cfg.actor.hitbox(), Vec2::new(10.0, 20.0));
        assert_eq!(cfg.timing.tick_rate_ms, 16);
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string(), "B".to_string()]);
        assert!(cfg.level_file.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[physics]\ngravity = -900.0\n\n[general]\nlevel_file = \"levels/custom.txt\"\n",
        );
        assert_eq!(cfg.physics.gravity, -900.0);
        assert_eq!(cfg.physics.friction, 0.90);
        assert_eq!(cfg.physics.max_velocity, Vec2::new(120.0, 250.0));
        assert_eq!(cfg.level_file, Some(PathBuf::from("levels/custom.txt")));
    }

    #[test]
    fn malformed_document_falls_back() {
        let cfg = GameConfig::parse("[physics\ngravity = ");
        assert_eq!(cfg.physics, Tuning::default());
    }

    #[test]
    fn zero_timings_are_raised() {
        let cfg = GameConfig::parse("[timing]\ntick_rate_ms = 0\nmax_dt_ms = 0\n");
        assert_eq!(cfg.timing.tick_rate_ms, 1);
        assert_eq!(cfg.timing.max_dt_ms, 1);
    }
}
