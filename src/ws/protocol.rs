//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::lifecycle::JoinError;
use crate::game::world::{PlayerStatus, ProjectileId, Team};
use crate::util::vec2::Vec2;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request admission to the arena. The team is checked on admission so that an
    /// unknown name gets a typed rejection.
    Join { nickname: String, team: String },

    /// Client-computed kinematics for the player's ship
    Move {
        x: f32,
        y: f32,
        /// Facing in radians
        angle: f32,
        velocity: Vec2,
    },

    /// Fire a projectile from (x, y) along `direction`
    Shoot { x: f32, y: f32, direction: Vec2 },

    /// Jump a fixed distance along the current facing
    Teleport,

    /// Ask for current team counts
    RequestCounts,
}

impl ClientMsg {
    /// Infrequent requests that are rate limited apart from per-frame input
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            ClientMsg::Join { .. } | ClientMsg::Teleport | ClientMsg::RequestCounts
        )
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent once after the socket opens
    Welcome { session_id: Uuid, server_time: u64 },

    /// Roster sizes, for the lobby
    PlayerCounts(PlayerCounts),

    /// Join refused; nothing changed server-side
    JoinError { reason: JoinError, message: String },

    /// Full state, sent only to a newly admitted player
    InitialState {
        your_id: Uuid,
        players: Vec<PlayerView>,
        projectiles: Vec<ProjectileView>,
    },

    /// Changes since the previous tick
    Delta(DeltaUpdate),

    /// Transient effect only
    PlayerDied { player_id: Uuid, position: Vec2 },

    RespawnPlayer { player_id: Uuid, player: PlayerView },

    /// Transient effect only
    Teleport { player_id: Uuid, target_position: Vec2 },

    GameOver { winner: Team },

    PlayerRemoved { player_id: Uuid },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCounts {
    pub red_count: usize,
    pub blue_count: usize,
    pub total_count: usize,
}

/// Player state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: Uuid,
    pub nickname: String,
    pub team: Team,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub health: i32,
    pub score: i32,
    pub death_count: u32,
    pub status: PlayerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub owner_id: Uuid,
    pub position: Vec2,
    pub direction: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovedProjectile {
    pub id: ProjectileId,
    pub position: Vec2,
}

/// Incremental tick update; empty categories are omitted on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<PlayerView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_projectiles: Vec<ProjectileView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moved_projectiles: Vec<MovedProjectile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destroyed_projectile_ids: Vec<ProjectileId>,
}

impl DeltaUpdate {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
            && self.new_projectiles.is_empty()
            && self.moved_projectiles.is_empty()
            && self.destroyed_projectile_ids.is_empty()
    }
}
