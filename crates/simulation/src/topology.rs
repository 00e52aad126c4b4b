//! The live entity graph.

use crate::entity::Entity;
use indexmap::IndexMap;
use loadsim_types::{EntityId, EntitySnapshot};

/// Mapping from entity id to live entity, plus the generator set.
///
/// Built once by the factory and owned by the simulator for the run's
/// lifetime; entities are mutated only through their handlers. Iteration
/// follows insertion order, which keeps generator seeding and snapshot
/// dumps deterministic.
#[derive(Debug, PartialEq)]
pub struct Topology {
    entities: IndexMap<EntityId, Entity>,
    generators: Vec<EntityId>,
}

impl Topology {
    pub(crate) fn new(entities: IndexMap<EntityId, Entity>, generators: Vec<EntityId>) -> Self {
        Self {
            entities,
            generators,
        }
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether an id resolves in this topology.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Look up an entity.
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub(crate) fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Ids flagged as traffic generators, in description order.
    pub fn generators(&self) -> &[EntityId] {
        &self.generators
    }

    /// All entity ids, in description order.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    /// Snapshot one entity's state.
    pub fn snapshot(&self, id: &EntityId) -> Option<EntitySnapshot> {
        self.entities.get(id).map(Entity::snapshot)
    }

    /// Snapshot every entity, in description order.
    pub fn snapshots(&self) -> impl Iterator<Item = (&EntityId, EntitySnapshot)> {
        self.entities.iter().map(|(id, e)| (id, e.snapshot()))
    }
}
