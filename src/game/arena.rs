//! The authoritative arena: one World, one tick pipeline, one outbox

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::time::unix_millis;
use crate::util::vec2::Vec2;
use crate::ws::protocol::{ClientMsg, PlayerCounts, ServerMsg};

use super::combat::CombatSystem;
use super::lifecycle::JoinError;
use super::physics::PhysicsSystem;
use super::r#match::MatchState;
use super::snapshot::SnapshotBuilder;
use super::timers::TimerTable;
use super::world::{PlayerId, Team, World};

/// Who a message is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected session, joined or not
    All,
    /// Sessions that have been admitted since connecting, including eliminated spectators
    Audience,
    /// One session
    Session(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub msg: ServerMsg,
}

/// Arena state (owned by the arena task)
pub struct Arena {
    pub(super) config: Arc<GameConfig>,
    pub(super) world: World,
    pub(super) timers: TimerTable,
    pub(super) match_state: MatchState,
    pub(super) rng: ChaCha8Rng,
    /// Sessions owed the in-game broadcast stream
    pub(super) audience: BTreeSet<Uuid>,
    snapshots: SnapshotBuilder,
    tick: u64,
    outbox: Vec<Outbound>,
}

impl Arena {
    pub fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        Self {
            config,
            world: World::new(),
            timers: TimerTable::new(),
            match_state: MatchState::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            audience: BTreeSet::new(),
            snapshots: SnapshotBuilder::new(),
            tick: 0,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[cfg(test)]
    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn player_count(&self) -> usize {
        self.world.players.len()
    }

    pub fn counts(&self) -> PlayerCounts {
        let counts = self.world.team_counts();
        PlayerCounts {
            red_count: counts.red,
            blue_count: counts.blue,
            total_count: counts.total(),
        }
    }

    pub(super) fn emit(&mut self, to: Recipient, msg: ServerMsg) {
        self.outbox.push(Outbound { to, msg });
    }

    /// Take every message produced since the last drain, in emission order
    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// A socket opened; greet it with its id and the lobby counts
    pub fn connect(&mut self, session_id: Uuid) {
        self.emit(
            Recipient::Session(session_id),
            ServerMsg::Welcome {
                session_id,
                server_time: unix_millis(),
            },
        );
        let counts = self.counts();
        self.emit(Recipient::Session(session_id), ServerMsg::PlayerCounts(counts));
    }

    /// Dispatch one inbound client event
    pub fn handle(&mut self, session_id: PlayerId, msg: ClientMsg) {
        match msg {
            ClientMsg::Join { nickname, team } => {
                let result = match Team::from_name(&team) {
                    Some(team) => self.join(session_id, &nickname, team),
                    None => Err(JoinError::InvalidTeam),
                };
                if let Err(reason) = result {
                    debug!(player_id = %session_id, reason = %reason, "Join rejected");
                    self.emit(
                        Recipient::Session(session_id),
                        ServerMsg::JoinError {
                            reason,
                            message: reason.to_string(),
                        },
                    );
                }
            }
            ClientMsg::Move {
                x,
                y,
                angle,
                velocity,
            } => self.move_player(session_id, Vec2::new(x, y), angle, velocity),
            ClientMsg::Shoot { x, y, direction } => {
                self.shoot(session_id, Vec2::new(x, y), direction);
            }
            ClientMsg::Teleport => self.teleport(session_id),
            ClientMsg::RequestCounts => {
                let counts = self.counts();
                self.emit(Recipient::Session(session_id), ServerMsg::PlayerCounts(counts));
            }
        }
    }

    /// Run one simulation step: physics, collisions, life-cycle, then the delta
    pub fn tick(&mut self) {
        self.tick += 1;

        let physics = PhysicsSystem::integrate(&mut self.world.projectiles, &self.config);
        let combat = CombatSystem::resolve(&mut self.world, &self.config);

        for death in &combat.deaths {
            self.handle_death(death);
        }
        self.fire_timers();

        if let Some(delta) = self.snapshots.build_delta(&mut self.world, &physics, &combat) {
            trace!(
                tick = self.tick,
                players = delta.players.len(),
                moved = delta.moved_projectiles.len(),
                deltas_sent = self.snapshots.deltas_sent(),
                "Delta built"
            );
            self.emit(Recipient::Audience, ServerMsg::Delta(delta));
        }
    }

    /// Deltas sent and ticks skipped for having nothing to send
    pub fn delta_stats(&self) -> (u64, u64) {
        (self.snapshots.deltas_sent(), self.snapshots.idle_ticks())
    }

    pub(super) fn snapshot_for(&self, player_id: PlayerId) -> ServerMsg {
        self.snapshots.build_snapshot(&self.world, player_id)
    }
}
