//! World state store - players and live projectiles

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::vec2::Vec2;

/// Session-scoped player identifier
pub type PlayerId = Uuid;

/// Process-unique projectile identifier
pub type ProjectileId = u64;

/// The two fixed factions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Parse the wire name of a team
    pub fn from_name(name: &str) -> Option<Team> {
        match name {
            "red" => Some(Team::Red),
            "blue" => Some(Team::Blue),
            _ => None,
        }
    }
}

/// Life-cycle state of a player still in the World.
///
/// Eliminated players are removed from the World; the match roster remembers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Health > 0, may move, shoot and teleport
    Active,
    /// Health 0, respawn timer outstanding
    Dead,
}

/// Authoritative player state
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub health: i32,
    pub score: i32,
    pub death_count: u32,
    pub status: PlayerStatus,
}

impl Player {
    pub fn new(id: PlayerId, nickname: String, team: Team, position: Vec2, max_health: i32) -> Self {
        Self {
            id,
            nickname,
            team,
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            health: max_health,
            score: 0,
            death_count: 0,
            status: PlayerStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active && self.health > 0
    }

    /// Whether `point` falls inside this player's hitbox (edges inclusive)
    pub fn hitbox_contains(&self, point: Vec2, width: f32, height: f32) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + width
            && point.y >= self.position.y
            && point.y <= self.position.y + height
    }

    pub fn hitbox_center(&self, width: f32, height: f32) -> Vec2 {
        Vec2::new(self.position.x + width / 2.0, self.position.y + height / 2.0)
    }
}

/// A live projectile
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner_id: PlayerId,
    pub position: Vec2,
    /// Per-tick displacement, always of length `projectile_speed`
    pub direction: Vec2,
}

/// Population per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamCounts {
    pub red: usize,
    pub blue: usize,
}

impl TeamCounts {
    pub fn get(&self, team: Team) -> usize {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn total(&self) -> usize {
        self.red + self.blue
    }
}

/// Canonical game state. Players are kept in id order so enumeration is deterministic.
#[derive(Debug, Default, Clone)]
pub struct World {
    pub players: BTreeMap<PlayerId, Player>,
    pub projectiles: Vec<Projectile>,
    /// Players owed in the next delta
    dirty: BTreeSet<PlayerId>,
    /// Projectiles created since the last delta
    new_projectiles: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn insert_player(&mut self, player: Player) {
        self.dirty.insert(player.id);
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        self.dirty.remove(id);
        self.players.remove(id)
    }

    pub fn mark_dirty(&mut self, id: PlayerId) {
        if self.players.contains_key(&id) {
            self.dirty.insert(id);
        }
    }

    #[cfg(test)]
    pub fn has_dirty_players(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Take the dirty set, clearing it
    pub fn take_dirty(&mut self) -> BTreeSet<PlayerId> {
        std::mem::take(&mut self.dirty)
    }

    /// Add a projectile to the live set and the pending-broadcast buffer
    pub fn spawn_projectile(
        &mut self,
        owner_id: PlayerId,
        position: Vec2,
        direction: Vec2,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);

        let projectile = Projectile {
            id,
            owner_id,
            position,
            direction,
        };
        self.new_projectiles.push(projectile.clone());
        self.projectiles.push(projectile);
        id
    }

    pub fn take_new_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.new_projectiles)
    }

    pub fn team_counts(&self) -> TeamCounts {
        let mut counts = TeamCounts::default();
        for player in self.players.values() {
            match player.team {
                Team::Red => counts.red += 1,
                Team::Blue => counts.blue += 1,
            }
        }
        counts
    }

    /// Random spawn position keeping the whole hitbox inside the arena
    pub fn random_spawn<R: Rng>(rng: &mut R, config: &GameConfig) -> Vec2 {
        let max_x = (config.arena_width - config.ship_width).max(1.0);
        let max_y = (config.arena_height - config.ship_height).max(1.0);
        Vec2::new(
            rng.gen_range(0.0..max_x).floor(),
            rng.gen_range(0.0..max_y).floor(),
        )
    }
}
