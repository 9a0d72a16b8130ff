//! Simulation constants

use std::time::Duration;

use crate::util::vec2::Vec2;

use super::ConfigError;

/// The fixed gravitational body at the centre of the arena
#[derive(Debug, Clone, Copy)]
pub struct AttractorConfig {
    pub position: Vec2,
    /// Capture radius: projectiles at or inside this distance are destroyed
    pub radius: f32,
    pub gravitational_constant: f32,
    /// Upper bound on the per-tick pull
    pub max_force: f32,
    /// The pull only applies within `radius * attraction_radius_factor`
    pub attraction_radius_factor: f32,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            position: Vec2::new(640.0, 360.0),
            radius: 50.0,
            gravitational_constant: 10_000.0,
            max_force: 10.0,
            attraction_radius_factor: 4.0,
        }
    }
}

/// Game rules and tuning. Distances are arena units, speeds are units per tick.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub arena_width: f32,
    pub arena_height: f32,
    pub ship_width: f32,
    pub ship_height: f32,

    pub max_health: i32,
    pub damage_per_hit: i32,
    pub enemy_hit_score: i32,
    pub teammate_hit_penalty: i32,
    pub kill_score: i32,
    /// Deaths at which a player is eliminated instead of respawned
    pub max_deaths: u32,

    pub projectile_speed: f32,
    pub projectile_radius: f32,

    pub tick_interval: Duration,
    pub teleport_distance: f32,
    pub teleport_lockout: Duration,
    pub respawn_delay: Duration,

    pub attractor: AttractorConfig,

    pub max_players_per_team: usize,
    pub max_players: usize,
    pub nickname_min_len: usize,
    pub nickname_max_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        let tick_interval = Duration::from_micros(1_000_000 / 60);
        Self {
            arena_width: 1280.0,
            arena_height: 720.0,
            ship_width: 32.0,
            ship_height: 32.0,

            max_health: 100,
            damage_per_hit: 10,
            enemy_hit_score: 10,
            teammate_hit_penalty: 10,
            kill_score: 50,
            max_deaths: 3,

            projectile_speed: 8.0,
            projectile_radius: 4.0,

            tick_interval,
            teleport_distance: 200.0,
            teleport_lockout: tick_interval * 2,
            respawn_delay: Duration::from_secs(3),

            attractor: AttractorConfig::default(),

            max_players_per_team: 4,
            max_players: 8,
            nickname_min_len: 1,
            nickname_max_len: 8,
        }
    }
}

impl GameConfig {
    /// Whole ticks covering `delay`, rounded up, never less than one
    pub fn ticks_for(&self, delay: Duration) -> u64 {
        let tick = self.tick_interval.as_micros().max(1);
        let ticks = delay.as_micros().div_ceil(tick);
        (ticks as u64).max(1)
    }

    pub fn respawn_ticks(&self) -> u64 {
        self.ticks_for(self.respawn_delay)
    }

    pub fn teleport_lockout_ticks(&self) -> u64 {
        self.ticks_for(self.teleport_lockout)
    }

    /// Slack outside the arena before a projectile despawns
    pub fn projectile_padding(&self) -> f32 {
        self.projectile_radius * 4.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("tick_interval must be non-zero"));
        }
        if self.arena_width <= self.ship_width || self.arena_height <= self.ship_height {
            return Err(ConfigError::Invalid("arena must be larger than a ship"));
        }
        if self.max_health <= 0 || self.damage_per_hit <= 0 {
            return Err(ConfigError::Invalid("health and damage must be positive"));
        }
        if self.max_deaths == 0 {
            return Err(ConfigError::Invalid("max_deaths must be at least 1"));
        }
        if self.projectile_speed <= 0.0 {
            return Err(ConfigError::Invalid("projectile_speed must be positive"));
        }
        if self.max_players_per_team == 0 || self.max_players == 0 {
            return Err(ConfigError::Invalid("player caps must be positive"));
        }
        if self.nickname_min_len == 0 || self.nickname_min_len > self.nickname_max_len {
            return Err(ConfigError::Invalid("nickname length bounds are inconsistent"));
        }
        Ok(())
    }
}
