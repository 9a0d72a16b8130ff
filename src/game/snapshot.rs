//! Snapshot and delta building for network transmission

use std::collections::HashSet;

use uuid::Uuid;

use crate::ws::protocol::{DeltaUpdate, MovedProjectile, PlayerView, ProjectileView, ServerMsg};

use super::combat::CombatOutcome;
use super::physics::PhysicsOutcome;
use super::world::{Player, Projectile, ProjectileId, World};

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            nickname: p.nickname.clone(),
            team: p.team,
            position: p.position,
            angle: p.angle,
            velocity: p.velocity,
            health: p.health,
            score: p.score,
            death_count: p.death_count,
            status: p.status,
        }
    }
}

impl From<&Projectile> for ProjectileView {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            position: p.position,
            direction: p.direction,
        }
    }
}

/// Builds join-time snapshots and per-tick deltas
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    deltas_sent: u64,
    idle_ticks: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full state for a newly admitted player. Does not touch dirty state.
    pub fn build_snapshot(&self, world: &World, your_id: Uuid) -> ServerMsg {
        ServerMsg::InitialState {
            your_id,
            players: world.players.values().map(PlayerView::from).collect(),
            projectiles: world.projectiles.iter().map(ProjectileView::from).collect(),
        }
    }

    /// Everything that changed this tick, or `None` when nothing did.
    ///
    /// Drains the dirty set and the new-projectile buffer.
    pub fn build_delta(
        &mut self,
        world: &mut World,
        physics: &PhysicsOutcome,
        combat: &CombatOutcome,
    ) -> Option<DeltaUpdate> {
        let players: Vec<PlayerView> = world
            .take_dirty()
            .iter()
            .filter_map(|id| world.player(id))
            .map(PlayerView::from)
            .collect();

        let new_projectiles: Vec<ProjectileView> = world
            .take_new_projectiles()
            .iter()
            .map(ProjectileView::from)
            .collect();

        let hit: HashSet<ProjectileId> = combat.destroyed_projectiles().collect();

        // struck projectiles did not survive the tick, report them only as destroyed
        let moved_projectiles: Vec<MovedProjectile> = physics
            .moved
            .iter()
            .filter(|(id, _)| !hit.contains(id))
            .map(|(id, position)| MovedProjectile {
                id: *id,
                position: *position,
            })
            .collect();

        let destroyed_projectile_ids: Vec<ProjectileId> = physics
            .destroyed
            .iter()
            .map(|(id, _)| *id)
            .chain(combat.destroyed_projectiles())
            .collect();

        let delta = DeltaUpdate {
            players,
            new_projectiles,
            moved_projectiles,
            destroyed_projectile_ids,
        };

        if delta.is_empty() {
            self.idle_ticks += 1;
            None
        } else {
            self.deltas_sent += 1;
            Some(delta)
        }
    }

    pub fn deltas_sent(&self) -> u64 {
        self.deltas_sent
    }

    /// Ticks on which no delta was owed
    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }
}
