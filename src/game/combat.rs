//! Combat system - projectile/ship hit detection, damage and scoring

use crate::config::GameConfig;
use crate::util::vec2::Vec2;

use super::world::{PlayerId, PlayerStatus, ProjectileId, Team, World};

/// A projectile that struck a ship this tick
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub projectile_id: ProjectileId,
    /// `None` when the shooter has left the arena since firing
    pub shooter_id: Option<PlayerId>,
    pub target_id: PlayerId,
    pub target_killed: bool,
}

/// A ship whose health reached zero this tick
#[derive(Debug, Clone, PartialEq)]
pub struct Death {
    pub player_id: PlayerId,
    pub team: Team,
    pub position: Vec2,
    pub death_count: u32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CombatOutcome {
    pub hits: Vec<HitResult>,
    pub deaths: Vec<Death>,
}

impl CombatOutcome {
    pub fn destroyed_projectiles(&self) -> impl Iterator<Item = ProjectileId> + '_ {
        self.hits.iter().map(|hit| hit.projectile_id)
    }
}

/// Combat system for resolving hits
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: i32, damage: i32, max_health: i32) -> (i32, bool) {
        let new_health = (current_health - damage).clamp(0, max_health);
        (new_health, new_health <= 0)
    }

    /// Score change for the shooter of a hit
    pub fn score_delta(shooter: Team, target: Team, target_killed: bool, config: &GameConfig) -> i32 {
        if shooter == target {
            -config.teammate_hit_penalty
        } else if target_killed {
            config.enemy_hit_score + config.kill_score
        } else {
            config.enemy_hit_score
        }
    }

    /// Pick the ship a projectile at `point` strikes.
    ///
    /// Candidates are living ships other than the owner whose hitbox contains the point.
    /// The nearest hitbox centre wins; equal distances go to the lowest id.
    pub fn find_target(
        world: &World,
        point: Vec2,
        owner_id: PlayerId,
        config: &GameConfig,
    ) -> Option<PlayerId> {
        let mut best: Option<(f32, PlayerId)> = None;

        // players iterate in id order, so a strict comparison keeps the lowest id on ties
        for player in world.players.values() {
            if player.id == owner_id || player.health <= 0 {
                continue;
            }
            if !player.hitbox_contains(point, config.ship_width, config.ship_height) {
                continue;
            }
            let distance = player
                .hitbox_center(config.ship_width, config.ship_height)
                .distance(point);
            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, player.id));
            }
        }

        best.map(|(_, id)| id)
    }

    /// Test every live projectile against every eligible ship, once each.
    ///
    /// Struck projectiles are removed from the live set; damaged ships and credited
    /// shooters are marked dirty. Deaths are reported for the life-cycle pass.
    pub fn resolve(world: &mut World, config: &GameConfig) -> CombatOutcome {
        let mut outcome = CombatOutcome::default();
        let projectiles = std::mem::take(&mut world.projectiles);
        let mut survivors = Vec::with_capacity(projectiles.len());

        for projectile in projectiles {
            let Some(target_id) =
                Self::find_target(world, projectile.position, projectile.owner_id, config)
            else {
                survivors.push(projectile);
                continue;
            };

            let Some(target) = world.player_mut(&target_id) else {
                survivors.push(projectile);
                continue;
            };
            let (health, killed) =
                Self::apply_damage(target.health, config.damage_per_hit, config.max_health);
            target.health = health;
            let target_team = target.team;

            if killed {
                target.death_count = (target.death_count + 1).min(config.max_deaths);
                target.status = PlayerStatus::Dead;
                outcome.deaths.push(Death {
                    player_id: target.id,
                    team: target.team,
                    position: target.position,
                    death_count: target.death_count,
                });
            }
            debug_assert!((0..=config.max_health).contains(&health));
            world.mark_dirty(target_id);

            let shooter_id = match world.player_mut(&projectile.owner_id) {
                Some(shooter) => {
                    shooter.score += Self::score_delta(shooter.team, target_team, killed, config);
                    Some(shooter.id)
                }
                None => None,
            };
            if let Some(id) = shooter_id {
                world.mark_dirty(id);
            }

            outcome.hits.push(HitResult {
                projectile_id: projectile.id,
                shooter_id,
                target_id,
                target_killed: killed,
            });
        }

        world.projectiles = survivors;
        outcome
    }
}
