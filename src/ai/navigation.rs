//! Navigation capability consumed by the agent states
//!
//! States only ever say "walk toward this point" and ask "how far is left".
//! [`SteeringAgent`] is a kinematic implementation driven by an arrive
//! behaviour; engines with a real navmesh implement [`Navigator`] themselves.

use glam::{Quat, Vec3};

/// Walk-toward-point service used by the state machine
pub trait Navigator {
    /// Current world position of the agent
    fn position(&self) -> Vec3;

    /// Current orientation of the agent
    fn rotation(&self) -> Quat;

    fn set_rotation(&mut self, rotation: Quat);

    /// Start (or redirect) movement toward `target`
    fn set_destination(&mut self, target: Vec3);

    /// Drop the current destination and stop
    fn reset_path(&mut self);

    /// Distance left to the destination (0 without one)
    fn remaining_distance(&self) -> f32;

    /// Whether a requested route is still being computed
    fn path_pending(&self) -> bool {
        false
    }

    fn speed(&self) -> f32;

    fn set_speed(&mut self, speed: f32);

    /// Forward direction (negative Z in local space)
    fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }
}

/// Kinematic agent that arrives at its destination
#[derive(Debug, Clone)]
pub struct SteeringAgent {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    destination: Option<Vec3>,
    /// Maximum speed
    speed: f32,
    /// Maximum acceleration
    pub max_acceleration: f32,
    /// Slowing distance
    pub slow_radius: f32,
    /// Stopping distance
    pub stopping_distance: f32,
    /// Yaw toward the direction of travel
    pub face_movement: bool,
}

impl SteeringAgent {
    /// Create an idle agent at `position` facing -Z
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            destination: None,
            speed: 2.0,
            max_acceleration: 20.0,
            slow_radius: 1.5,
            stopping_distance: 0.05,
            face_movement: true,
        }
    }

    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Place the agent without moving through the world
    pub fn warp(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
    }

    /// Integrate one step of arrive steering
    pub fn update(&mut self, dt: f32) {
        let Some(target) = self.destination else {
            self.velocity = Vec3::ZERO;
            return;
        };

        let to_target = target - self.position;
        let distance = to_target.length();

        if distance < self.stopping_distance {
            self.velocity = Vec3::ZERO;
            return;
        }

        let target_speed = if distance > self.slow_radius {
            self.speed
        } else {
            self.speed * distance / self.slow_radius
        };
        let desired = to_target / distance * target_speed;
        let steering = (desired - self.velocity).clamp_length_max(self.max_acceleration * dt);
        self.velocity = (self.velocity + steering).clamp_length_max(self.speed);

        // Never overshoot within one step
        let step = self.velocity * dt;
        if step.length() >= distance {
            self.position = target;
            self.velocity = Vec3::ZERO;
        } else {
            self.position += step;
        }

        let flat = Vec3::new(self.velocity.x, 0.0, self.velocity.z);
        if self.face_movement && flat.length_squared() > 1e-6 {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, flat.normalize());
        }
    }
}

impl Default for SteeringAgent {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Navigator for SteeringAgent {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    fn set_destination(&mut self, target: Vec3) {
        self.destination = Some(target);
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.velocity = Vec3::ZERO;
    }

    fn remaining_distance(&self) -> f32 {
        self.destination
            .map_or(0.0, |target| target.distance(self.position))
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_arrives() {
        let mut agent = SteeringAgent::new(Vec3::ZERO);
        agent.set_speed(4.0);
        agent.set_destination(Vec3::new(6.0, 0.0, 0.0));

        for _ in 0..300 {
            agent.update(1.0 / 60.0);
        }

        assert!(agent.remaining_distance() < 0.1);
        assert!(agent.velocity.length() < 0.5);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut agent = SteeringAgent::new(Vec3::ZERO);
        agent.set_speed(3.0);
        agent.set_destination(Vec3::new(100.0, 0.0, 0.0));

        for _ in 0..120 {
            agent.update(1.0 / 60.0);
            assert!(agent.velocity.length() <= 3.0 + 1e-4);
        }
        assert!(agent.position.x > 3.0);
    }

    #[test]
    fn test_faces_direction_of_travel() {
        let mut agent = SteeringAgent::new(Vec3::ZERO);
        agent.set_destination(Vec3::new(10.0, 0.0, 0.0));
        agent.update(0.1);

        assert!(agent.forward().dot(Vec3::X) > 0.99);
    }

    #[test]
    fn test_reset_path_stops() {
        let mut agent = SteeringAgent::new(Vec3::ZERO);
        agent.set_destination(Vec3::new(10.0, 0.0, 0.0));
        agent.update(0.5);
        let stopped_at = agent.position;

        agent.reset_path();
        agent.update(0.5);

        assert_eq!(agent.position, stopped_at);
        assert_eq!(agent.remaining_distance(), 0.0);
        assert!(!agent.path_pending());
    }
}
