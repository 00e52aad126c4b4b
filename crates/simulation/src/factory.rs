//! Building a live topology from resolved description nodes.

use crate::entity::{
    DatabaseContext, DatabaseState, Entity, LinkContext, LinkState, ServiceContext, ServiceState,
};
use crate::topology::Topology;
use indexmap::IndexMap;
use loadsim_types::{EntityId, KindParseError, NodeKind, NodeSpec};
use std::collections::HashMap;
use tracing::debug;

/// Errors that abort a topology build.
///
/// Any build error aborts the entire build; no partial topology is ever
/// returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Two nodes share an id.
    #[error("duplicate entity id: {0}")]
    DuplicateId(EntityId),

    /// A link references an id that no node declares.
    #[error("link {link} references unknown endpoint {endpoint}")]
    UnknownEndpoint { link: EntityId, endpoint: EntityId },

    /// A node kind string outside the known set.
    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    /// A link is missing one of its endpoints.
    #[error("link {link} is missing its `{side}` endpoint")]
    MissingEndpoint { link: EntityId, side: &'static str },

    /// A parameter is outside its valid range, or present on the wrong
    /// node kind.
    #[error("invalid parameter on {id}: {reason}")]
    InvalidParameter { id: EntityId, reason: String },
}

impl From<KindParseError> for BuildError {
    fn from(err: KindParseError) -> Self {
        BuildError::UnknownKind(err.0)
    }
}

/// Builds a [`Topology`] from resolved description nodes.
///
/// `build` is a pure function of its input: randomness is applied during
/// simulation, never here, so building is idempotent and cacheable.
pub struct EntityFactory;

impl EntityFactory {
    /// Build a topology in three passes:
    ///
    /// 1. Validate each node and instantiate it with zeroed state, failing
    ///    on a repeated id.
    /// 2. Resolve every link's endpoints against the id map and compute
    ///    the downstream adjacency of services and databases.
    /// 3. Record the generator set, from which the simulator seeds the
    ///    initial arrivals at time zero.
    pub fn build(nodes: &[NodeSpec]) -> Result<Topology, BuildError> {
        // Pass 1: instantiate, id uniqueness.
        let mut entities: IndexMap<EntityId, Entity> = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            validate(node)?;
            if entities.contains_key(&node.id) {
                return Err(BuildError::DuplicateId(node.id.clone()));
            }
            entities.insert(node.id.clone(), instantiate(node));
        }

        // Pass 2: endpoint resolution and adjacency.
        let mut downstream: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for node in nodes {
            if node.kind != NodeKind::NetworkLink {
                continue;
            }
            let from = endpoint(node, node.from.as_ref(), "from")?;
            let to = endpoint(node, node.to.as_ref(), "to")?;
            for end in [from, to] {
                if !entities.contains_key(end) {
                    return Err(BuildError::UnknownEndpoint {
                        link: node.id.clone(),
                        endpoint: end.clone(),
                    });
                }
            }
            downstream
                .entry(from.clone())
                .or_default()
                .push(node.id.clone());
        }
        for (id, links) in downstream {
            match entities.get_mut(&id) {
                Some(Entity::Service { context, .. }) => context.downstream = links,
                Some(Entity::Database { context, .. }) => context.downstream = links,
                // A link as another link's entry point: traffic reaches the
                // downstream link through the upstream's `to`, not through
                // adjacency, so there is nothing to record.
                Some(Entity::NetworkLink { .. }) | None => {}
            }
        }

        // Pass 3: generator set, in description order. State was zeroed at
        // instantiation.
        let generators: Vec<EntityId> = nodes
            .iter()
            .filter(|n| n.generator)
            .map(|n| n.id.clone())
            .collect();

        debug!(
            num_entities = entities.len(),
            num_generators = generators.len(),
            "Built topology"
        );
        Ok(Topology::new(entities, generators))
    }
}

fn endpoint<'a>(
    node: &NodeSpec,
    end: Option<&'a EntityId>,
    side: &'static str,
) -> Result<&'a EntityId, BuildError> {
    end.ok_or_else(|| BuildError::MissingEndpoint {
        link: node.id.clone(),
        side,
    })
}

fn validate(node: &NodeSpec) -> Result<(), BuildError> {
    let invalid = |reason: String| BuildError::InvalidParameter {
        id: node.id.clone(),
        reason,
    };

    if !node.failure_prob.is_finite() || !(0.0..=1.0).contains(&node.failure_prob) {
        return Err(invalid(format!(
            "failure_prob must be in [0, 1], got {}",
            node.failure_prob
        )));
    }
    if !node.latency_mean.is_finite() || node.latency_mean < 0.0 {
        return Err(invalid(format!(
            "latency_mean must be a finite non-negative number, got {}",
            node.latency_mean
        )));
    }
    if node.kind != NodeKind::NetworkLink && (node.from.is_some() || node.to.is_some()) {
        return Err(invalid(
            "endpoints are only meaningful on network links".to_owned(),
        ));
    }
    Ok(())
}

fn instantiate(node: &NodeSpec) -> Entity {
    match node.kind {
        NodeKind::Service => Entity::Service {
            context: ServiceContext {
                capacity: node.capacity,
                latency_mean: node.latency_mean,
                failure_prob: node.failure_prob,
                downstream: Vec::new(),
            },
            state: ServiceState::default(),
        },
        NodeKind::Database => Entity::Database {
            context: DatabaseContext {
                max_connections: node.capacity,
                latency_mean: node.latency_mean,
                failure_prob: node.failure_prob,
                downstream: Vec::new(),
            },
            state: DatabaseState::default(),
        },
        NodeKind::NetworkLink => Entity::NetworkLink {
            context: LinkContext {
                // Presence is validated in pass 2; an unvalidated node
                // never leaves `build`.
                from: node.from.clone().unwrap_or_else(|| node.id.clone()),
                to: node.to.clone().unwrap_or_else(|| node.id.clone()),
                latency_mean: node.latency_mean,
                failure_prob: node.failure_prob,
            },
            state: LinkState::default(),
        },
    }
}
