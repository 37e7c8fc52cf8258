//! Property-based tests for address resolution, graph building, and the
//! UE address pool.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::HashMap;

    use crate::config::{AddrConf, PathConf, ResolveTier, SmfConfig, UpNodeConf, UserPlaneConf};
    use crate::context::SmfContext;
    use crate::topology::UserPlaneTopology;
    use crate::ue_pool::{UeIpPool, UeSubnet};
    use crate::ue_route::{build_registry, UeDataPathGraph};

    fn universe(size: usize) -> UserPlaneTopology {
        UserPlaneTopology::load(&UserPlaneConf {
            up_nodes: (0..size)
                .map(|i| UpNodeConf {
                    name: format!("N{}", i),
                    node_id: Some(format!("10.100.0.{}", i + 1)),
                })
                .collect(),
            links: Vec::new(),
        })
    }

    fn paths_from_indices(paths: &[Vec<usize>]) -> Vec<PathConf> {
        paths
            .iter()
            .map(|hops| PathConf {
                upf: hops.iter().map(|i| format!("N{}", i)).collect(),
            })
            .collect()
    }

    proptest! {
        // Exactly one resolution tier is reachable, in the documented order.
        #[test]
        fn prop_resolver_tier_order(
            env_var in proptest::option::of("[A-Z_]{1,8}"),
            env_value in proptest::option::of("[a-z0-9.]{0,12}"),
            literal in proptest::option::of("[a-z0-9.]{0,12}"),
        ) {
            let conf = AddrConf { env_var: env_var.clone(), literal: literal.clone() };
            let lookup = |_: &str| env_value.clone();
            let resolved = conf.resolve_with(lookup, "prop", "127.0.0.1");

            let env_usable = env_var.is_some()
                && env_value.as_deref().is_some_and(|v| !v.is_empty());
            let literal_usable = literal.as_deref().is_some_and(|v| !v.is_empty());

            if env_usable {
                prop_assert_eq!(resolved.tier, ResolveTier::Environment);
                prop_assert_eq!(resolved.value, env_value.unwrap());
            } else if literal_usable {
                prop_assert_eq!(resolved.tier, ResolveTier::Literal);
                prop_assert_eq!(resolved.value, literal.unwrap());
            } else {
                prop_assert_eq!(resolved.tier, ResolveTier::Default);
                prop_assert_eq!(resolved.value, "127.0.0.1");
            }
        }

        // Graph building is a pure function of its inputs.
        #[test]
        fn prop_graph_build_deterministic(
            paths in proptest::collection::vec(
                proptest::collection::vec(0usize..6, 1..5),
                1..4,
            ),
        ) {
            let topology = universe(6);
            let path_confs = paths_from_indices(&paths);
            let first = UeDataPathGraph::build("imsi-prop", &path_confs, &topology);
            let second = UeDataPathGraph::build("imsi-prop", &path_confs, &topology);
            prop_assert_eq!(first, second);
        }

        // Registry building over unchanged inputs is idempotent.
        #[test]
        fn prop_registry_idempotent(
            routes in proptest::collection::vec(
                proptest::collection::vec(
                    proptest::collection::vec(0usize..6, 1..4),
                    1..3,
                ),
                1..4,
            ),
        ) {
            let topology = universe(6);
            let mut paths = HashMap::new();
            for (n, route) in routes.iter().enumerate() {
                paths.insert(format!("imsi-{}", n), paths_from_indices(route));
            }
            let first = build_registry(&paths, &topology);
            let second = build_registry(&paths, &topology);
            prop_assert_eq!(first, second);
        }

        // Successful graphs always have a single in-degree-zero node, the root.
        #[test]
        fn prop_graph_single_root(
            paths in proptest::collection::vec(
                proptest::collection::vec(0usize..6, 1..5),
                1..4,
            ),
        ) {
            let topology = universe(6);
            if let Ok(graph) = UeDataPathGraph::build("imsi-prop", &paths_from_indices(&paths), &topology) {
                let roots: Vec<_> = graph
                    .nodes()
                    .filter(|n| graph.in_degree(n) == 0)
                    .collect();
                prop_assert_eq!(roots, vec![graph.root()]);
            }
        }

        // Allocation hands out last octets that increase by exactly one.
        #[test]
        fn prop_pool_monotonic_last_octet(prefix_len in 16u8..=28, count in 1usize..40) {
            let subnet = UeSubnet::parse(&format!("10.45.0.0/{}", prefix_len)).unwrap();
            let pool = UeIpPool::new(subnet);
            let mut previous = subnet.base().octets()[3];
            for _ in 0..count {
                match pool.alloc() {
                    Ok(addr) => {
                        prop_assert_eq!(addr.octets()[3], previous + 1);
                        previous = addr.octets()[3];
                    }
                    Err(_) => break,
                }
            }
        }

        // Bootstrap always reaches Ready, whatever the subnet field holds.
        #[test]
        fn prop_bootstrap_tolerates_any_subnet(subnet in proptest::option::of("[a-z0-9./]{0,16}")) {
            let mut config = SmfConfig::default();
            config.ue_subnet = subnet;
            let (ctx, _) = SmfContext::bootstrap(&config, None);
            prop_assert!(ctx.is_ready());
        }
    }
}
