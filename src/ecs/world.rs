//! World wrapper around hecs

use glam::Vec3;
use hecs::Entity;

use super::components::{Name, PatrolMarker, PlayerMarker, Transform, Visible};
use crate::ai::SightTarget;
use crate::physics::LayerMask;

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Spawn a patrol point marker at `position`
    pub fn spawn_patrol_point(&mut self, position: Vec3) -> Entity {
        self.inner
            .spawn((Transform::from_position(position), PatrolMarker))
    }

    /// Spawn the player: tagged, visible on the player layer and named
    pub fn spawn_player(&mut self, position: Vec3) -> Entity {
        self.inner.spawn((
            Transform::from_position(position),
            PlayerMarker,
            Visible::default(),
            Name::new("Player"),
        ))
    }

    /// Move an entity that has a [`Transform`]
    pub fn set_position(
        &mut self,
        entity: Entity,
        position: Vec3,
    ) -> Result<(), hecs::ComponentError> {
        self.get_mut::<Transform>(entity)?.position = position;
        Ok(())
    }

    /// All patrol point markers, ordered by entity id
    #[must_use]
    pub fn patrol_points(&self) -> Vec<(Entity, Vec3)> {
        let mut points: Vec<(Entity, Vec3)> = self
            .inner
            .query::<(&Transform, &PatrolMarker)>()
            .iter()
            .map(|(entity, (transform, _))| (entity, transform.position))
            .collect();
        points.sort_by_key(|(entity, _)| entity.id());
        points
    }

    /// Position of the first entity tagged as the player
    #[must_use]
    pub fn player_position(&self) -> Option<Vec3> {
        self.inner
            .query::<(&Transform, &PlayerMarker)>()
            .iter()
            .map(|(_, (transform, _))| transform.position)
            .next()
    }

    /// Entities visible on any layer of `mask`
    #[must_use]
    pub fn sight_targets(&self, mask: LayerMask) -> Vec<SightTarget> {
        self.inner
            .query::<(&Transform, &Visible)>()
            .iter()
            .filter(|(_, (_, visible))| visible.layer.intersects(mask))
            .map(|(entity, (transform, _))| SightTarget {
                entity,
                position: transform.position,
            })
            .collect()
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_points_discovered_by_tag() {
        let mut world = World::new();
        let a = world.spawn_patrol_point(Vec3::new(1.0, 0.0, 0.0));
        world.spawn((Transform::from_position(Vec3::new(9.0, 0.0, 0.0)),));
        let b = world.spawn_patrol_point(Vec3::new(2.0, 0.0, 0.0));

        let points = world.patrol_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].0, a);
        assert_eq!(points[1].0, b);
    }

    #[test]
    fn test_player_position() {
        let mut world = World::new();
        assert!(world.player_position().is_none());

        let player = world.spawn_player(Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(world.player_position(), Some(Vec3::new(3.0, 0.0, 4.0)));

        world.set_position(player, Vec3::ONE).unwrap();
        assert_eq!(world.player_position(), Some(Vec3::ONE));
        assert_eq!(world.sight_targets(LayerMask::PLAYER)[0].entity, player);
    }

    #[test]
    fn test_sight_targets_filtered_by_layer() {
        let mut world = World::new();
        let player = world.spawn((Transform::default(), Visible::default()));
        world.spawn((
            Transform::default(),
            Visible {
                layer: LayerMask::OBSTACLE,
            },
        ));

        let targets = world.sight_targets(LayerMask::PLAYER);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].entity, player);
    }
}
