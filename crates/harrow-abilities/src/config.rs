//! Ability tuning.
//!
//! Per-ability timing, extent, damage and on-kill settings. Loaded from
//! TOML; missing or unreadable files fall back to defaults.

use harrow_common::{AbilityError, AbilityResult, TargetLayer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::dedup::HitPolicy;
use crate::effects::OnKill;
use crate::harvest::DEFAULT_THRESHOLD;
use crate::motion::whip::MAX_SEGMENTS;

/// Upper bound for meter charge granted per kill.
pub const MAX_CHARGE: u32 = 1_000;

/// Bind tether tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindTuning {
    /// Seconds for the tether to reach the target.
    pub extend: f32,
    /// Minimum seconds the tether stays attached.
    pub hold: f32,
    /// Seconds the target stays locked. The attached phase lasts
    /// `max(hold, bind)`.
    pub bind: f32,
    /// Seconds for the tether to return.
    pub retract: f32,
    /// Tether thickness.
    pub width: f32,
    /// Damage on catch.
    pub damage: f32,
    /// Knockback on catch.
    pub knockback: f32,
}

impl Default for BindTuning {
    fn default() -> Self {
        Self {
            extend: 0.2,
            hold: 1.0,
            bind: 2.0,
            retract: 0.25,
            width: 0.2,
            damage: 5.0,
            knockback: 0.0,
        }
    }
}

/// Whip tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhipTuning {
    /// Wind-up seconds.
    pub extend: f32,
    /// Sweep seconds.
    pub swing: f32,
    /// Recoil seconds.
    pub retract: f32,
    /// Fully extended length.
    pub max_length: f32,
    /// Peak lateral bend, as a fraction of `max_length`.
    pub curvature: f32,
    /// How far inner samples trail toward the caster during the sweep.
    pub slack: f32,
    /// Curve samples.
    pub segments: usize,
    /// Strip thickness.
    pub width: f32,
    /// Damage per hit.
    pub damage: f32,
    /// Knockback per hit.
    pub knockback: f32,
    /// On-kill reward.
    pub on_kill: OnKill,
}

impl Default for WhipTuning {
    fn default() -> Self {
        Self {
            extend: 0.12,
            swing: 0.25,
            retract: 0.15,
            max_length: 4.0,
            curvature: 0.35,
            slack: 0.3,
            segments: 12,
            width: 0.3,
            damage: 20.0,
            knockback: 6.0,
            on_kill: OnKill::harvest(0.1, 1),
        }
    }
}

/// Slash tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlashTuning {
    /// Whole sweep seconds.
    pub duration: f32,
    /// Orbit radius.
    pub radius: f32,
    /// Arc start relative to aim (degrees).
    pub start_offset_deg: f32,
    /// Swept angle (degrees).
    pub arc_deg: f32,
    /// Blade thickness.
    pub hit_radius: f32,
    /// Damage per hit.
    pub damage: f32,
    /// Knockback per hit.
    pub knockback: f32,
    /// On-kill reward.
    pub on_kill: OnKill,
}

impl Default for SlashTuning {
    fn default() -> Self {
        Self {
            duration: 0.3,
            radius: 1.8,
            start_offset_deg: 60.0,
            arc_deg: -120.0,
            hit_radius: 0.4,
            damage: 15.0,
            knockback: 4.0,
            on_kill: OnKill::harvest(0.05, 1),
        }
    }
}

/// Explosion tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionTuning {
    /// Growth seconds.
    pub duration: f32,
    /// Final radius.
    pub max_radius: f32,
    /// Damage per hit.
    pub damage: f32,
    /// Knockback per hit.
    pub knockback: f32,
    /// Repeat policy.
    pub hit_policy: HitPolicy,
    /// On-kill reward.
    pub on_kill: OnKill,
}

impl Default for ExplosionTuning {
    fn default() -> Self {
        Self {
            duration: 1.0,
            max_radius: 4.0,
            damage: 30.0,
            knockback: 8.0,
            hit_policy: HitPolicy::OncePerActivation,
            on_kill: OnKill::NONE,
        }
    }
}

/// Harvest tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestTuning {
    /// Scan radius around the invoker.
    pub range: f32,
    /// Initial shared threshold (health fraction).
    pub threshold: f32,
    /// Seconds between marking and executing.
    pub delay: f32,
    /// Fraction of each target's max health healed.
    pub heal_fraction: f32,
    /// Meter charge per executed target.
    pub charge_per_kill: u32,
}

impl Default for HarvestTuning {
    fn default() -> Self {
        Self {
            range: 8.0,
            threshold: DEFAULT_THRESHOLD,
            delay: 0.5,
            heal_fraction: 0.5,
            charge_per_kill: 1,
        }
    }
}

/// Everything the runner needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    // === Runtime ===
    /// Fixed simulation rate (ticks per second).
    pub tick_rate: u32,
    /// Event bus capacity.
    pub event_capacity: usize,
    /// Layers player abilities may affect.
    pub target_layers: TargetLayer::Flags,

    // === Abilities ===
    /// Bind tether.
    pub bind: BindTuning,
    /// Whip.
    pub whip: WhipTuning,
    /// Slash.
    pub slash: SlashTuning,
    /// Explosion.
    pub explosion: ExplosionTuning,
    /// Harvest.
    pub harvest: HarvestTuning,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            event_capacity: 1024,
            target_layers: TargetLayer::PLAYER_ABILITY,
            bind: BindTuning::default(),
            whip: WhipTuning::default(),
            slash: SlashTuning::default(),
            explosion: ExplosionTuning::default(),
            harvest: HarvestTuning::default(),
        }
    }
}

impl AbilityConfig {
    /// Load from `path`. Missing or invalid files yield defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Ability config {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::read(path) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded ability config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load ability config: {e}");
                Self::default()
            },
        }
    }

    /// Strict load: I/O and parse errors are returned.
    pub fn read<P: AsRef<Path>>(path: P) -> AbilityResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string.
    pub fn from_toml(contents: &str) -> AbilityResult<Self> {
        toml::from_str(contents).map_err(|e| AbilityError::Config(e.to_string()))
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> AbilityResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| AbilityError::Config(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved ability config to {}", path.display());
        Ok(())
    }

    /// Seconds per tick.
    #[must_use]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Clamp values to usable ranges.
    pub fn validate(&mut self) {
        // Runtime
        self.tick_rate = self.tick_rate.clamp(10, 480);
        self.event_capacity = self.event_capacity.clamp(16, 65_536);

        // Bind
        let bind = &mut self.bind;
        bind.extend = non_negative(bind.extend);
        bind.hold = non_negative(bind.hold);
        bind.bind = non_negative(bind.bind);
        bind.retract = non_negative(bind.retract);
        bind.width = non_negative(bind.width);
        bind.damage = non_negative(bind.damage);
        bind.knockback = non_negative(bind.knockback);

        // Whip
        let whip = &mut self.whip;
        whip.extend = non_negative(whip.extend);
        whip.swing = non_negative(whip.swing);
        whip.retract = non_negative(whip.retract);
        whip.max_length = non_negative(whip.max_length);
        whip.curvature = whip.curvature.clamp(-2.0, 2.0);
        whip.slack = whip.slack.clamp(0.0, 1.0);
        whip.segments = whip.segments.clamp(1, MAX_SEGMENTS);
        whip.width = non_negative(whip.width);
        whip.damage = non_negative(whip.damage);
        whip.knockback = non_negative(whip.knockback);
        clamp_on_kill(&mut whip.on_kill);

        // Slash
        let slash = &mut self.slash;
        slash.duration = non_negative(slash.duration);
        slash.radius = non_negative(slash.radius);
        slash.arc_deg = slash.arc_deg.clamp(-360.0, 360.0);
        slash.hit_radius = non_negative(slash.hit_radius);
        slash.damage = non_negative(slash.damage);
        slash.knockback = non_negative(slash.knockback);
        clamp_on_kill(&mut slash.on_kill);

        // Explosion
        let explosion = &mut self.explosion;
        explosion.duration = non_negative(explosion.duration);
        explosion.max_radius = non_negative(explosion.max_radius);
        explosion.damage = non_negative(explosion.damage);
        explosion.knockback = non_negative(explosion.knockback);
        clamp_on_kill(&mut explosion.on_kill);

        // Harvest
        let harvest = &mut self.harvest;
        harvest.range = non_negative(harvest.range);
        harvest.threshold = harvest.threshold.clamp(0.0, 1.0);
        harvest.delay = non_negative(harvest.delay);
        harvest.heal_fraction = harvest.heal_fraction.clamp(0.0, 1.0);
        harvest.charge_per_kill = harvest.charge_per_kill.min(MAX_CHARGE);
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn clamp_on_kill(on_kill: &mut OnKill) {
    on_kill.heal_fraction = on_kill.heal_fraction.clamp(0.0, 1.0);
    on_kill.shield = non_negative(on_kill.shield);
    on_kill.harvest_charge = on_kill.harvest_charge.min(MAX_CHARGE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AbilityConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.bind.extend, 0.2);
        assert_eq!(config.explosion.max_radius, 4.0);
        assert_eq!(config.harvest.threshold, 0.2);
        assert_eq!(config.target_layers, TargetLayer::PLAYER_ABILITY);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AbilityConfig::default();
        config.tick_rate = 1;
        config.whip.slack = 3.0;
        config.whip.segments = 0;
        config.bind.extend = -1.0;
        config.explosion.max_radius = f32::NAN;
        config.harvest.threshold = 1.5;
        config.slash.on_kill.heal_fraction = -0.5;
        config.whip.on_kill.harvest_charge = u32::MAX;
        config.harvest.charge_per_kill = 2_000_000_000;

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.whip.slack, 1.0);
        assert_eq!(config.whip.segments, 1);
        assert_eq!(config.bind.extend, 0.0);
        assert_eq!(config.explosion.max_radius, 0.0);
        assert_eq!(config.harvest.threshold, 1.0);
        assert_eq!(config.slash.on_kill.heal_fraction, 0.0);
        assert_eq!(config.whip.on_kill.harvest_charge, MAX_CHARGE);
        assert_eq!(config.harvest.charge_per_kill, MAX_CHARGE);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("abilities.toml");

        let mut config = AbilityConfig::default();
        config.tick_rate = 120;
        config.explosion.hit_policy = HitPolicy::OncePerFrame;
        config.whip.on_kill = OnKill::harvest(0.25, 3).with_shield(10.0);

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = AbilityConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = AbilityConfig::load_from("/nonexistent/path/abilities.toml");
        assert_eq!(config, AbilityConfig::default());
    }

    #[test]
    fn test_config_invalid_file_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "tick_rate = \"fast\"").expect("write");

        assert!(matches!(AbilityConfig::read(&path), Err(AbilityError::Config(_))));
        assert_eq!(AbilityConfig::load_from(&path), AbilityConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AbilityConfig::from_toml("[bind]\nhold = 3.0\n").expect("parse");
        assert_eq!(config.bind.hold, 3.0);
        assert_eq!(config.bind.extend, 0.2);
        assert_eq!(config.whip, WhipTuning::default());
    }

    #[test]
    fn test_tick_dt() {
        let config = AbilityConfig::default();
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < 1e-6);
    }
}
