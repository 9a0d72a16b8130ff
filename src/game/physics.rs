//! Projectile physics: attractor pull, constant-speed integration, culling

use crate::config::{AttractorConfig, GameConfig};
use crate::util::vec2::{distance_and_direction, Vec2};

use super::world::{Projectile, ProjectileId};

/// Why a projectile left the live set during integration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Despawn {
    OutOfBounds,
    Captured,
    /// Heading cancelled out to a zero vector
    Degenerate,
}

/// Result of one integration pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PhysicsOutcome {
    /// Removed this pass, in live-set order
    pub destroyed: Vec<(ProjectileId, Despawn)>,
    /// New position of every survivor, in live-set order
    pub moved: Vec<(ProjectileId, Vec2)>,
}

/// Physics system for the projectile set
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Pull exerted by the attractor on a body at `position`.
    ///
    /// Capped inverse-square within `radius * attraction_radius_factor`, zero outside.
    pub fn attractor_force(position: Vec2, attractor: &AttractorConfig) -> Vec2 {
        let (distance, direction) = distance_and_direction(position, attractor.position);
        if distance >= attractor.radius * attractor.attraction_radius_factor || distance == 0.0 {
            return Vec2::ZERO;
        }
        let magnitude =
            (attractor.gravitational_constant / (distance * distance)).min(attractor.max_force);
        direction * magnitude
    }

    /// Whether `position` is inside the attractor's capture radius
    pub fn is_captured(position: Vec2, attractor: &AttractorConfig) -> bool {
        position.distance(attractor.position) <= attractor.radius
    }

    /// Whether `position` is within the arena plus despawn padding
    pub fn in_bounds(position: Vec2, config: &GameConfig) -> bool {
        let pad = config.projectile_padding();
        position.x >= -pad
            && position.x <= config.arena_width + pad
            && position.y >= -pad
            && position.y <= config.arena_height + pad
    }

    /// Advance one projectile by one tick. Returns `Some(reason)` if it must be destroyed.
    pub fn step(projectile: &mut Projectile, config: &GameConfig) -> Option<Despawn> {
        let force = Self::attractor_force(projectile.position, &config.attractor);
        let steered = projectile.direction + force;

        let Some(direction) = steered.with_length(config.projectile_speed) else {
            return Some(Despawn::Degenerate);
        };
        projectile.direction = direction;
        projectile.position += direction;

        if !Self::in_bounds(projectile.position, config) {
            Some(Despawn::OutOfBounds)
        } else if Self::is_captured(projectile.position, &config.attractor) {
            Some(Despawn::Captured)
        } else {
            None
        }
    }

    /// Integrate every live projectile, dropping the ones destroyed this tick
    pub fn integrate(projectiles: &mut Vec<Projectile>, config: &GameConfig) -> PhysicsOutcome {
        let mut outcome = PhysicsOutcome::default();

        projectiles.retain_mut(|projectile| match Self::step(projectile, config) {
            Some(reason) => {
                outcome.destroyed.push((projectile.id, reason));
                false
            }
            None => {
                outcome.moved.push((projectile.id, projectile.position));
                true
            }
        });

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn projectile(id: ProjectileId, position: Vec2, direction: Vec2) -> Projectile {
        Projectile {
            id,
            owner_id: Uuid::nil(),
            position,
            direction,
        }
    }

    #[test]
    fn test_force_zero_outside_catchment() {
        let attractor = AttractorConfig::default();
        // catchment radius is 200
        let far = attractor.position + Vec2::new(250.0, 0.0);
        assert_eq!(PhysicsSystem::attractor_force(far, &attractor), Vec2::ZERO);
    }

    #[test]
    fn test_force_points_at_attractor() {
        let attractor = AttractorConfig::default();
        let pos = attractor.position + Vec2::new(100.0, 0.0);
        let force = PhysicsSystem::attractor_force(pos, &attractor);
        // 10000 / 100^2 = 1
        assert!((force.x + 1.0).abs() < 1e-5);
        assert!(force.y.abs() < 1e-5);
    }

    #[test]
    fn test_force_is_capped() {
        let attractor = AttractorConfig::default();
        let pos = attractor.position + Vec2::new(0.0, 20.0);
        let force = PhysicsSystem::attractor_force(pos, &attractor);
        assert!((force.length() - attractor.max_force).abs() < 1e-4);
    }

    #[test]
    fn test_heading_bends_and_speed_is_constant() {
        let config = GameConfig::default();
        let attractor = config.attractor;
        // 150 units above the attractor, flying right
        let start = attractor.position + Vec2::new(0.0, -150.0);
        let mut p = projectile(1, start, Vec2::new(config.projectile_speed, 0.0));

        assert_eq!(PhysicsSystem::step(&mut p, &config), None);
        assert!(p.direction.y > 0.0, "heading should bend toward the attractor");
        assert!((p.direction.length() - config.projectile_speed).abs() < 1e-4);
    }

    #[test]
    fn test_captured_inside_radius() {
        let config = GameConfig::default();
        let start = config.attractor.position + Vec2::new(55.0, 0.0);
        let mut p = projectile(1, start, Vec2::new(-config.projectile_speed, 0.0));
        assert_eq!(PhysicsSystem::step(&mut p, &config), Some(Despawn::Captured));
    }

    #[test]
    fn test_degenerate_direction_destroyed() {
        let config = GameConfig::default();
        let mut p = projectile(1, Vec2::new(10.0, 10.0), Vec2::ZERO);
        assert_eq!(PhysicsSystem::step(&mut p, &config), Some(Despawn::Degenerate));
    }

    #[test]
    fn test_out_of_bounds_uses_padding() {
        let config = GameConfig::default();
        // pad is 16: x = -10 after the step is still live, x = -20 is not
        let mut inside = projectile(1, Vec2::new(-2.0, 10.0), Vec2::new(-8.0, 0.0));
        assert_eq!(PhysicsSystem::step(&mut inside, &config), None);
        let mut outside = projectile(2, Vec2::new(-12.0, 10.0), Vec2::new(-8.0, 0.0));
        assert_eq!(
            PhysicsSystem::step(&mut outside, &config),
            Some(Despawn::OutOfBounds)
        );
    }

    #[test]
    fn test_integrate_partitions_live_set() {
        let config = GameConfig::default();
        let mut projectiles = vec![
            projectile(1, Vec2::new(10.0, 10.0), Vec2::new(8.0, 0.0)),
            projectile(2, Vec2::new(-12.0, 10.0), Vec2::new(-8.0, 0.0)),
            projectile(3, Vec2::new(100.0, 600.0), Vec2::new(0.0, 8.0)),
        ];

        let outcome = PhysicsSystem::integrate(&mut projectiles, &config);

        assert_eq!(outcome.destroyed, vec![(2, Despawn::OutOfBounds)]);
        assert_eq!(
            outcome.moved,
            vec![(1, Vec2::new(18.0, 10.0)), (3, Vec2::new(100.0, 608.0))]
        );
        assert_eq!(projectiles.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
