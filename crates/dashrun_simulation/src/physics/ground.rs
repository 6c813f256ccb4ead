//! RapierGroundProbe — GroundProbe через RapierContext::cast_ray

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::layers;
use crate::movement::{GroundProbe, RayHit};

/// Ray cast от имени одного игрока
///
/// - фильтр по collision groups (ground_layers из tuning)
/// - собственное тело игрока исключено
/// - луч не solid: коллайдер, внутри которого начался луч, не даёт hit на 0
/// - layers_of: membership bits задетого коллайдера (без CollisionGroups → все биты)
pub struct RapierGroundProbe<'a, 'w, F> {
    context: Option<&'a RapierContext<'w>>,
    exclude: Entity,
    layers_of: F,
}

impl<'a, 'w, F> RapierGroundProbe<'a, 'w, F>
where
    F: Fn(Entity) -> Option<u32>,
{
    pub fn new(context: Option<&'a RapierContext<'w>>, exclude: Entity, layers_of: F) -> Self {
        Self {
            context,
            exclude,
            layers_of,
        }
    }
}

impl<F> GroundProbe for RapierGroundProbe<'_, '_, F>
where
    F: Fn(Entity) -> Option<u32>,
{
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, layers: u32) -> Option<RayHit> {
        // Нет RapierContext (physics plugin не подключен) → земли нет
        let context = self.context?;

        let filter = QueryFilter::default()
            .groups(CollisionGroups::new(Group::ALL, layers::group(layers)))
            .exclude_rigid_body(self.exclude);

        let (entity, distance) = context.cast_ray(origin, direction, max_distance, false, filter)?;

        Some(RayHit {
            distance,
            layers: (self.layers_of)(entity).unwrap_or(Group::ALL.bits()),
        })
    }
}
