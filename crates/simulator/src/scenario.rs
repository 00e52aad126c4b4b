//! Synthesizing a tiered topology description.

use crate::config::SimulatorConfig;
use loadsim_types::NodeSpec;

/// Build the node list for a tiered topology.
///
/// Tier 0 services are the traffic generators. Each service forwards to
/// one service in the next tier over its own link, round-robin, and the
/// last tier forwards to the databases the same way. Ids follow
/// `svc-{tier}-{index}`, `db-{index}`, and `{from}--{to}` for links.
pub fn synthesize(config: &SimulatorConfig) -> Vec<NodeSpec> {
    let mut nodes = Vec::new();

    for tier in 0..config.tiers {
        for s in 0..config.services_per_tier {
            let mut spec = NodeSpec::service(
                format!("svc-{tier}-{s}"),
                config.capacity,
                config.service_latency,
                config.service_failure_prob,
            );
            if tier == 0 {
                spec = spec.with_generator();
            }
            nodes.push(spec);
        }
    }

    for d in 0..config.databases {
        nodes.push(NodeSpec::database(
            format!("db-{d}"),
            config.db_connections,
            config.db_latency,
            config.db_failure_prob,
        ));
    }

    for tier in 0..config.tiers - 1 {
        for s in 0..config.services_per_tier {
            let from = format!("svc-{tier}-{s}");
            let to = format!("svc-{}-{}", tier + 1, s % config.services_per_tier);
            nodes.push(NodeSpec::link(
                format!("{from}--{to}"),
                from,
                to,
                config.link_latency,
                config.link_drop_prob,
            ));
        }
    }

    let last = config.tiers - 1;
    for s in 0..config.services_per_tier {
        let from = format!("svc-{last}-{s}");
        let to = format!("db-{}", s % config.databases);
        nodes.push(NodeSpec::link(
            format!("{from}--{to}"),
            from,
            to,
            config.link_latency,
            config.link_drop_prob,
        ));
    }

    nodes
}
