/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub gamepad: GamepadConfig,
    pub frame_ms: u64,
    pub maps_dir: PathBuf,
    pub seed: Option<u64>,
}

/// Tuning for the per-frame resolver. Velocities are px/ms.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub flap_velocity: f32,
    pub flap_animation_speed: f32,
    pub move_speed: f32,
    pub bounce_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: default_gravity(),
            flap_velocity: default_flap_velocity(),
            flap_animation_speed: default_flap_animation_speed(),
            move_speed: default_move_speed(),
            bounce_damping: default_bounce_damping(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub flap: Vec<String>,
    pub start: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_flap_velocity")]
    flap_velocity: f32,
    #[serde(default = "default_flap_animation_speed")]
    flap_animation_speed: f32,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_bounce_damping")]
    bounce_damping: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_flap_buttons")]
    flap: Vec<String>,
    #[serde(default = "default_start_buttons")]
    start: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_maps_dir")]
    maps_dir: String,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.0001 }
fn default_flap_velocity() -> f32 { -0.08 }
fn default_flap_animation_speed() -> f32 { 1.8 }
fn default_move_speed() -> f32 { 0.14 }
fn default_bounce_damping() -> f32 { 0.03 }

fn default_flap_buttons() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_start_buttons() -> Vec<String> { vec!["Start".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }

fn default_frame_ms() -> u64 { 16 }
fn default_maps_dir() -> String { "maps".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            flap_velocity: default_flap_velocity(),
            flap_animation_speed: default_flap_animation_speed(),
            move_speed: default_move_speed(),
            bounce_damping: default_bounce_damping(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            flap: default_flap_buttons(),
            start: default_start_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            frame_ms: default_frame_ms(),
            maps_dir: default_maps_dir(),
            seed: None,
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
        let maps_dir = resolve_maps_dir(&toml_cfg.general.maps_dir, &search_dirs);
        Self::from_toml(toml_cfg, maps_dir)
    }

    fn from_toml(cfg: TomlConfig, maps_dir: PathBuf) -> Self {
        GameConfig {
            physics: PhysicsConfig {
                gravity: cfg.physics.gravity,
                flap_velocity: cfg.physics.flap_velocity,
                flap_animation_speed: cfg.physics.flap_animation_speed,
                move_speed: cfg.physics.move_speed,
                bounce_damping: cfg.physics.bounce_damping,
            },
            gamepad: GamepadConfig {
                flap: cfg.gamepad.flap,
                start: cfg.gamepad.start,
                quit: cfg.gamepad.quit,
            },
            frame_ms: cfg.general.frame_ms.max(1),
            maps_dir,
            seed: cfg.general.seed,
        }
    }
}

/// Absolute paths are used as-is; relative ones are looked up next to the
/// candidate dirs and default to CWD-relative.
fn resolve_maps_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
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
                Ok(text) => return parse_toml(&text),
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("config.toml parse error, using default settings: {e}");
            TomlConfig::default()
        }
    }
}
