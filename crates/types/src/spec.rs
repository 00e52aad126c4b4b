//! Resolved topology description nodes.
//!
//! A [`NodeSpec`] is the fully resolved form of one node of the declarative
//! infrastructure description: profile defaults and user overrides have
//! already been merged by the (external) compiler pipeline. The simulation
//! core consumes a flat list of these and never parses text itself.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kind of a topology node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Service,
    Database,
    NetworkLink,
}

/// Error returned when a kind string does not name a known node kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node kind: {0}")]
pub struct KindParseError(pub String);

impl FromStr for NodeKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SERVICE" => Ok(NodeKind::Service),
            "DATABASE" => Ok(NodeKind::Database),
            "NETWORK_LINK" => Ok(NodeKind::NetworkLink),
            other => Err(KindParseError(other.to_owned())),
        }
    }
}

/// One resolved node of the infrastructure description.
///
/// `capacity` is the maximum concurrent admissions for services (named
/// `max_connections` in database configurations, but carried in the same
/// field), `latency_mean` the mean processing or transit time in seconds,
/// and `failure_prob` the probability that an admitted or transiting unit
/// fails rather than succeeds.
///
/// `from`/`to` are required and meaningful only for network links.
/// `generator` flags a source of exogenous load: the simulation seeds an
/// initial arrival at every generator at time zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: EntityId,
    pub kind: NodeKind,
    pub capacity: u32,
    pub latency_mean: f64,
    pub failure_prob: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<EntityId>,
    #[serde(default)]
    pub generator: bool,
}

impl NodeSpec {
    /// Spec for a service node.
    pub fn service(
        id: impl Into<EntityId>,
        capacity: u32,
        latency_mean: f64,
        failure_prob: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Service,
            capacity,
            latency_mean,
            failure_prob,
            from: None,
            to: None,
            generator: false,
        }
    }

    /// Spec for a database node. `max_connections` maps onto `capacity`.
    pub fn database(
        id: impl Into<EntityId>,
        max_connections: u32,
        latency_mean: f64,
        failure_prob: f64,
    ) -> Self {
        Self {
            kind: NodeKind::Database,
            ..Self::service(id, max_connections, latency_mean, failure_prob)
        }
    }

    /// Spec for a network link between two entities.
    pub fn link(
        id: impl Into<EntityId>,
        from: impl Into<EntityId>,
        to: impl Into<EntityId>,
        latency_mean: f64,
        failure_prob: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::NetworkLink,
            capacity: 0,
            latency_mean,
            failure_prob,
            from: Some(from.into()),
            to: Some(to.into()),
            generator: false,
        }
    }

    /// Mark this node as a traffic generator.
    pub fn with_generator(mut self) -> Self {
        self.generator = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_ir_spellings() {
        assert_eq!("SERVICE".parse::<NodeKind>().unwrap(), NodeKind::Service);
        assert_eq!("DATABASE".parse::<NodeKind>().unwrap(), NodeKind::Database);
        assert_eq!(
            "NETWORK_LINK".parse::<NodeKind>().unwrap(),
            NodeKind::NetworkLink
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "LOAD_BALANCER".parse::<NodeKind>().unwrap_err();
        assert_eq!(err, KindParseError("LOAD_BALANCER".to_owned()));
    }

    #[test]
    fn test_link_spec_carries_endpoints() {
        let spec = NodeSpec::link("l0", "api", "db", 0.02, 0.0);
        assert_eq!(spec.kind, NodeKind::NetworkLink);
        assert_eq!(spec.from, Some(EntityId::from("api")));
        assert_eq!(spec.to, Some(EntityId::from("db")));
        assert!(!spec.generator);
    }

    #[test]
    fn test_generator_flag() {
        let spec = NodeSpec::service("edge", 4, 0.05, 0.0).with_generator();
        assert!(spec.generator);
    }
}
