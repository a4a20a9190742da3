/// Named game presets
///
/// Presets are immutable starting points; callers override individual fields
/// (seeds, turn limits) on the returned value.
use crate::config::types::GameConfig;

/// Preset names accepted by [`preset`].
pub const PRESET_NAMES: [&str; 2] = ["classic", "mini"];

/// Six colors, four pegs, generous turn limit.
pub fn classic() -> GameConfig {
    GameConfig::new(&["R", "G", "U", "Y", "K", "W"], 4, 1500).with_game_seed(12_345_677)
}

/// Small board for quick runs and smoke tests.
pub fn mini() -> GameConfig {
    GameConfig::new(&["R", "G", "B"], 3, 30)
}

pub fn preset(name: &str) -> Option<GameConfig> {
    match name {
        "classic" => Some(classic()),
        "mini" => Some(mini()),
        _ => None,
    }
}
