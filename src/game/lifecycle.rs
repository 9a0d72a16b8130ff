//! Player life-cycle: admission, kinematics, shots, teleports, death, respawn, removal

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::util::vec2::Vec2;
use crate::ws::protocol::{PlayerView, ServerMsg};

use super::arena::{Arena, Recipient};
use super::combat::Death;
use super::timers::TimerKind;
use super::world::{Player, PlayerId, PlayerStatus, ProjectileId, Team, World};

/// Why a join was refused. Serialized as a stable snake_case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinError {
    #[error("Nickname length is out of range")]
    InvalidNickname,

    #[error("Game is full")]
    GameFull,

    #[error("Team is full")]
    TeamFull,

    #[error("Unknown team")]
    InvalidTeam,

    #[error("Already in the game")]
    AlreadyJoined,

    #[error("Eliminated from the current match")]
    Eliminated,
}

impl Arena {
    /// Validate and admit a player. Rejections leave the World untouched.
    pub fn join(&mut self, id: PlayerId, nickname: &str, team: Team) -> Result<(), JoinError> {
        if self.world.player(&id).is_some() {
            return Err(JoinError::AlreadyJoined);
        }
        if self.match_state.is_eliminated(&id) {
            return Err(JoinError::Eliminated);
        }

        let len = nickname.chars().count();
        if len < self.config.nickname_min_len || len > self.config.nickname_max_len {
            return Err(JoinError::InvalidNickname);
        }

        let counts = self.world.team_counts();
        if counts.total() >= self.config.max_players {
            return Err(JoinError::GameFull);
        }
        if counts.get(team) >= self.config.max_players_per_team {
            return Err(JoinError::TeamFull);
        }

        let position = World::random_spawn(&mut self.rng, &self.config);
        let player = Player::new(id, nickname.to_string(), team, position, self.config.max_health);
        self.world.insert_player(player);
        self.match_state.record_join(team);
        self.audience.insert(id);

        info!(
            player_id = %id,
            nickname = %nickname,
            team = ?team,
            players = self.world.players.len(),
            "Player joined"
        );

        let snapshot = self.snapshot_for(id);
        self.emit(Recipient::Session(id), snapshot);
        let counts = self.counts();
        self.emit(Recipient::All, ServerMsg::PlayerCounts(counts));
        Ok(())
    }

    /// Overwrite kinematics with client-reported values
    pub fn move_player(&mut self, id: PlayerId, position: Vec2, angle: f32, velocity: Vec2) {
        if !(position.is_finite() && angle.is_finite() && velocity.is_finite()) {
            debug!(player_id = %id, "Ignoring non-finite move");
            return;
        }
        if self.timers.is_pending(id, TimerKind::TeleportUnlock) {
            return;
        }
        let Some(player) = self.world.player_mut(&id) else {
            return;
        };
        if !player.is_active() {
            return;
        }

        player.position = position;
        player.angle = angle;
        player.velocity = velocity;
        self.world.mark_dirty(id);
    }

    /// Spawn a projectile for an active player
    pub fn shoot(&mut self, id: PlayerId, origin: Vec2, direction: Vec2) -> Option<ProjectileId> {
        if !origin.is_finite() || !direction.is_finite() {
            debug!(player_id = %id, "Ignoring non-finite shot");
            return None;
        }
        if !self.world.player(&id).is_some_and(Player::is_active) {
            return None;
        }
        let Some(direction) = direction.with_length(self.config.projectile_speed) else {
            debug!(player_id = %id, "Ignoring shot without a direction");
            return None;
        };

        Some(self.world.spawn_projectile(id, origin, direction))
    }

    /// Jump a fixed distance along the current facing, then lock movement briefly
    pub fn teleport(&mut self, id: PlayerId) {
        if self.timers.is_pending(id, TimerKind::TeleportUnlock) {
            return;
        }
        let distance = self.config.teleport_distance;
        let Some(player) = self.world.player_mut(&id) else {
            return;
        };
        if !player.is_active() {
            return;
        }

        let target = player.position + Vec2::from_angle(player.angle) * distance;
        player.position = target;
        self.world.mark_dirty(id);

        let due = self.current_tick() + self.config.teleport_lockout_ticks();
        self.timers.schedule(id, TimerKind::TeleportUnlock, due);
        self.emit(
            Recipient::Audience,
            ServerMsg::Teleport {
                player_id: id,
                target_position: target,
            },
        );
    }

    /// Socket closed: drop the player and stop broadcasting to the session
    pub fn disconnect(&mut self, id: PlayerId) {
        self.audience.remove(&id);
        if self.remove_player(id).is_some() {
            info!(player_id = %id, players = self.world.players.len(), "Player disconnected");
            self.settle_match();
        }
    }

    pub(super) fn handle_death(&mut self, death: &Death) {
        self.emit(
            Recipient::Audience,
            ServerMsg::PlayerDied {
                player_id: death.player_id,
                position: death.position,
            },
        );

        if death.death_count >= self.config.max_deaths {
            self.eliminate(death.player_id);
        } else {
            let due = self.current_tick() + self.config.respawn_ticks();
            self.timers.schedule(death.player_id, TimerKind::Respawn, due);
        }
    }

    fn eliminate(&mut self, id: PlayerId) {
        if let Some(player) = self.remove_player(id) {
            self.match_state.record_elimination(id);
            info!(player_id = %id, team = ?player.team, "Player eliminated");
            self.settle_match();
        }
    }

    /// Remove from the World with all timers; announces the removal and new counts
    fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.timers.cancel_all(id);
        let player = self.world.remove_player(&id)?;

        self.emit(Recipient::Audience, ServerMsg::PlayerRemoved { player_id: id });
        let counts = self.counts();
        self.emit(Recipient::All, ServerMsg::PlayerCounts(counts));
        Some(player)
    }

    /// After a roster shrink: restart on an empty arena, otherwise look for a winner
    fn settle_match(&mut self) {
        if self.world.players.is_empty() {
            self.match_state.reset();
            return;
        }
        if let Some(winner) = self.match_state.evaluate(self.world.team_counts()) {
            self.emit(Recipient::Audience, ServerMsg::GameOver { winner });
        }
    }

    pub(super) fn fire_timers(&mut self) {
        let tick = self.current_tick();
        for (id, kind) in self.timers.take_due(tick) {
            match kind {
                TimerKind::Respawn => self.respawn(id),
                // the lockout is the pending timer itself
                TimerKind::TeleportUnlock => {}
            }
        }
    }

    fn respawn(&mut self, id: PlayerId) {
        let position = World::random_spawn(&mut self.rng, &self.config);
        let max_health = self.config.max_health;
        let Some(player) = self.world.player_mut(&id) else {
            debug!(player_id = %id, "Respawn for departed player skipped");
            return;
        };
        if player.status != PlayerStatus::Dead {
            return;
        }

        player.position = position;
        player.health = max_health;
        player.status = PlayerStatus::Active;
        let view = PlayerView::from(&*player);
        self.world.mark_dirty(id);

        self.emit(
            Recipient::Audience,
            ServerMsg::RespawnPlayer {
                player_id: id,
                player: view,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::tests::{admit, arena};
    use crate::ws::protocol::ClientMsg;
    use uuid::Uuid;

    fn shoot_at(arena: &mut Arena, shooter: PlayerId, target: PlayerId) {
        let pos = arena.world().player(&target).unwrap().position;
        arena
            .shoot(shooter, pos + Vec2::new(2.0, 10.0), Vec2::new(1.0, 0.0))
            .expect("shot should be accepted");
    }

    fn count_game_over(out: &[crate::game::arena::Outbound]) -> usize {
        out.iter()
            .filter(|o| matches!(o.msg, ServerMsg::GameOver { .. }))
            .count()
    }

    #[test]
    fn test_join_admits_and_sends_snapshot() {
        let mut arena = arena();
        let id = Uuid::new_v4();
        arena.join(id, "ace", Team::Blue).unwrap();

        let player = arena.world().player(&id).unwrap();
        assert_eq!(player.health, arena.config().max_health);
        assert_eq!(player.score, 0);
        let out = arena.drain_outbox();
        assert!(matches!(
            &out[0],
            crate::game::arena::Outbound {
                to: Recipient::Session(to),
                msg: ServerMsg::InitialState { your_id, players, .. },
            } if *to == id && *your_id == id && players.len() == 1
        ));
        assert!(out
            .iter()
            .any(|o| o.to == Recipient::All && matches!(o.msg, ServerMsg::PlayerCounts(_))));
    }

    #[test]
    fn test_long_nickname_rejected_without_mutation() {
        let mut arena = arena();
        let id = Uuid::new_v4();
        arena.handle(
            id,
            ClientMsg::Join {
                nickname: "ninechars".into(),
                team: "red".into(),
            },
        );

        assert!(arena.world().players.is_empty());
        assert_eq!(arena.counts().total_count, 0);
        let out = arena.drain_outbox();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].msg,
            ServerMsg::JoinError {
                reason: JoinError::InvalidNickname,
                message: JoinError::InvalidNickname.to_string(),
            }
        );
        assert_eq!(out[0].to, Recipient::Session(id));
    }

    #[test]
    fn test_unknown_team_gets_typed_rejection() {
        let mut arena = arena();
        let id = Uuid::new_v4();
        arena.handle(
            id,
            ClientMsg::Join {
                nickname: "ace".into(),
                team: "green".into(),
            },
        );

        assert!(arena.world().players.is_empty());
        let out = arena.drain_outbox();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, Recipient::Session(id));
        assert!(matches!(
            out[0].msg,
            ServerMsg::JoinError {
                reason: JoinError::InvalidTeam,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_nickname_rejected() {
        let mut arena = arena();
        assert_eq!(
            arena.join(Uuid::new_v4(), "", Team::Red),
            Err(JoinError::InvalidNickname)
        );
    }

    #[test]
    fn test_capacity_limits() {
        let mut arena = arena();
        for _ in 0..4 {
            arena.join(Uuid::new_v4(), "red", Team::Red).unwrap();
        }
        assert_eq!(
            arena.join(Uuid::new_v4(), "red", Team::Red),
            Err(JoinError::TeamFull)
        );
        for _ in 0..4 {
            arena.join(Uuid::new_v4(), "blue", Team::Blue).unwrap();
        }
        assert_eq!(
            arena.join(Uuid::new_v4(), "blue", Team::Blue),
            Err(JoinError::GameFull)
        );
        assert_eq!(arena.counts().total_count, 8);
    }

    #[test]
    fn test_double_join_rejected() {
        let mut arena = arena();
        let id = Uuid::new_v4();
        arena.join(id, "ace", Team::Red).unwrap();
        assert_eq!(arena.join(id, "ace", Team::Blue), Err(JoinError::AlreadyJoined));
    }

    #[test]
    fn test_move_overwrites_kinematics() {
        let mut arena = arena();
        let id = admit(&mut arena, Team::Red, Vec2::new(10.0, 10.0));
        arena.move_player(id, Vec2::new(50.0, 60.0), 1.5, Vec2::new(2.0, -1.0));

        let player = arena.world().player(&id).unwrap();
        assert_eq!(player.position, Vec2::new(50.0, 60.0));
        assert_eq!(player.angle, 1.5);
        assert_eq!(player.velocity, Vec2::new(2.0, -1.0));
    }

    #[test]
    fn test_move_with_nan_ignored() {
        let mut arena = arena();
        let id = admit(&mut arena, Team::Red, Vec2::new(10.0, 10.0));
        arena.move_player(id, Vec2::new(f32::NAN, 60.0), 0.0, Vec2::ZERO);
        assert_eq!(arena.world().player(&id).unwrap().position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_dead_player_cannot_act() {
        let mut arena = arena();
        let id = admit(&mut arena, Team::Red, Vec2::new(10.0, 10.0));
        {
            let player = arena.world.player_mut(&id).unwrap();
            player.health = 0;
            player.status = PlayerStatus::Dead;
        }
        arena.move_player(id, Vec2::new(50.0, 50.0), 0.0, Vec2::ZERO);
        assert!(arena.shoot(id, Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)).is_none());
        arena.teleport(id);
        assert_eq!(arena.world().player(&id).unwrap().position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_shot_direction_scaled_to_speed() {
        let mut arena = arena();
        let id = admit(&mut arena, Team::Red, Vec2::new(10.0, 10.0));
        arena.shoot(id, Vec2::new(20.0, 20.0), Vec2::new(0.0, 0.5)).unwrap();
        let projectile = &arena.world().projectiles[0];
        assert_eq!(projectile.owner_id, id);
        assert_eq!(projectile.direction, Vec2::new(0.0, arena.config().projectile_speed));
        assert!(arena.shoot(id, Vec2::new(20.0, 20.0), Vec2::ZERO).is_none());
    }

    #[test]
    fn test_teleport_displaces_and_locks_movement() {
        let mut arena = arena();
        let id = admit(&mut arena, Team::Red, Vec2::new(100.0, 100.0));
        arena.drain_outbox();

        arena.teleport(id);

        let target = Vec2::new(300.0, 100.0);
        assert_eq!(arena.world().player(&id).unwrap().position, target);
        assert_eq!(
            arena.drain_outbox()[0].msg,
            ServerMsg::Teleport {
                player_id: id,
                target_position: target,
            }
        );

        // stale move packet during the lockout is dropped, as is a second teleport
        arena.move_player(id, Vec2::new(105.0, 100.0), 0.0, Vec2::ZERO);
        arena.teleport(id);
        assert_eq!(arena.world().player(&id).unwrap().position, target);

        for _ in 0..arena.config().teleport_lockout_ticks() {
            arena.tick();
        }
        arena.move_player(id, Vec2::new(305.0, 100.0), 0.0, Vec2::ZERO);
        assert_eq!(
            arena.world().player(&id).unwrap().position,
            Vec2::new(305.0, 100.0)
        );
    }

    #[test]
    fn test_disconnect_cancels_timers() {
        let mut arena = arena();
        let red = admit(&mut arena, Team::Red, Vec2::new(100.0, 100.0));
        let _blue = admit(&mut arena, Team::Blue, Vec2::new(600.0, 600.0));
        arena.teleport(red);
        assert!(!arena.timers.is_empty());

        arena.disconnect(red);

        assert!(arena.timers.is_empty());
        assert!(arena.world().player(&red).is_none());
        let out = arena.drain_outbox();
        assert!(out
            .iter()
            .any(|o| o.msg == ServerMsg::PlayerRemoved { player_id: red }));
    }

    #[test]
    fn test_respawn_skipped_after_disconnect() {
        let mut arena = arena();
        let red = admit(&mut arena, Team::Red, Vec2::new(100.0, 100.0));
        let _red2 = admit(&mut arena, Team::Red, Vec2::new(900.0, 100.0));
        let blue = admit(&mut arena, Team::Blue, Vec2::new(600.0, 600.0));
        arena.world.player_mut(&red).unwrap().health = 10;
        shoot_at(&mut arena, blue, red);
        arena.tick();
        assert!(arena.timers.is_pending(red, TimerKind::Respawn));

        arena.disconnect(red);
        arena.drain_outbox();
        for _ in 0..arena.config().respawn_ticks() + 1 {
            arena.tick();
        }

        assert!(arena.world().player(&red).is_none());
        assert!(!arena
            .drain_outbox()
            .iter()
            .any(|o| matches!(o.msg, ServerMsg::RespawnPlayer { .. })));
    }

    #[test]
    fn test_final_death_eliminates_and_ends_match() {
        let mut arena = arena();
        let red = admit(&mut arena, Team::Red, Vec2::new(100.0, 100.0));
        let blue = admit(&mut arena, Team::Blue, Vec2::new(600.0, 600.0));
        {
            let player = arena.world.player_mut(&red).unwrap();
            player.health = 10;
            player.death_count = arena.config.max_deaths - 1;
        }
        arena.drain_outbox();

        shoot_at(&mut arena, blue, red);
        arena.tick();

        assert!(arena.world().player(&red).is_none());
        assert!(!arena.timers.is_pending(red, TimerKind::Respawn));
        assert_eq!(arena.match_state().winner(), Some(Team::Blue));
        let out = arena.drain_outbox();
        assert_eq!(count_game_over(&out), 1);
        assert!(out
            .iter()
            .any(|o| o.msg == ServerMsg::PlayerRemoved { player_id: red }));

        // an eliminated session may not sneak back in
        assert_eq!(arena.join(red, "again", Team::Red), Err(JoinError::Eliminated));
    }

    #[test]
    fn test_simultaneous_eliminations_end_match_once() {
        let mut arena = arena();
        let red_a = admit(&mut arena, Team::Red, Vec2::new(100.0, 100.0));
        let red_b = admit(&mut arena, Team::Red, Vec2::new(100.0, 400.0));
        let blue = admit(&mut arena, Team::Blue, Vec2::new(600.0, 600.0));
        for id in [red_a, red_b] {
            let player = arena.world.player_mut(&id).unwrap();
            player.health = 10;
            player.death_count = arena.config.max_deaths - 1;
        }
        arena.drain_outbox();

        shoot_at(&mut arena, blue, red_a);
        shoot_at(&mut arena, blue, red_b);
        arena.tick();

        assert!(arena.world().player(&red_a).is_none());
        assert!(arena.world().player(&red_b).is_none());
        assert_eq!(arena.match_state().winner(), Some(Team::Blue));
        assert_eq!(count_game_over(&arena.drain_outbox()), 1);
    }

    #[test]
    fn test_empty_arena_resets_match() {
        let mut arena = arena();
        let red = admit(&mut arena, Team::Red, Vec2::new(100.0, 100.0));
        let blue = admit(&mut arena, Team::Blue, Vec2::new(600.0, 600.0));
        arena.disconnect(red);
        assert_eq!(arena.match_state().winner(), Some(Team::Blue));

        arena.disconnect(blue);

        assert_eq!(arena.match_state().winner(), None);
        assert_eq!(arena.match_state().ever_joined().total(), 0);
    }
}
