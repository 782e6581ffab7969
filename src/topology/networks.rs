// Copyright (c) 2025 - Cowboy AI, Inc.
//! Networks, Routers and the Management Allocation Pool
//!
//! # Rules
//! - Layer-2 neutron networks seed the network set; VLAN networks without a
//!   segmentation id and non flat/VLAN types are skipped
//! - A global network backing a flat neutron network takes the seed over
//!   under its own name
//! - A `default` route attaches a network to the external router
//! - Any other route is a pending edge; edges touching an external network
//!   join the external router, the rest become point-to-point routers
//! - The network matching the bare-metal subnet is the management network;
//!   its pool excludes every static server address and the gateway

use indexmap::{IndexMap, IndexSet};
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::{Add, Sub};
use tracing::{debug, info, warn};

use crate::domain::{parse_ip, DeploymentModel, IpCidr, RefKind, Route, VlanId};
use crate::errors::{TopologyError, TopologyResult};
use crate::topology::{AllocationPool, Router, VirtualNetwork};

const FLAT: &str = "flat";
const VLAN: &str = "vlan";

/// Networks and routers derived from a normalized model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkPlan {
    pub networks: IndexMap<String, VirtualNetwork>,
    pub routers: Vec<Router>,
    /// Name of the management network
    pub management: Option<String>,
}

/// Build the networks backing layer-2 neutron networks
pub fn seed_neutron_networks(
    model: &DeploymentModel,
) -> TopologyResult<IndexMap<String, VirtualNetwork>> {
    let mut seeds = IndexMap::new();

    for neutron in model.neutron_networks.values() {
        let mut network = VirtualNetwork::new(&neutron.name);
        network.external = neutron.external;
        network.cidr = neutron.cidr.clone().filter(|cidr| !cidr.is_empty());
        network.gateway = neutron.gateway.clone().filter(|gateway| !gateway.is_empty());

        if let Some(provider) = neutron.provider() {
            match provider.network_type.as_str() {
                VLAN => match provider.segmentation_id.filter(|id| *id != 0) {
                    Some(id) => network.vlan = Some(VlanId::new(id)?),
                    None => {
                        debug!("Skipping VLAN network {}: segmentation id is dynamic", neutron.name);
                        continue;
                    }
                },
                FLAT => {}
                other => {
                    debug!("Skipping {} network {}: not layer 2", other, neutron.name);
                    continue;
                }
            }
        }

        seeds.insert(network.name.clone(), network);
    }

    Ok(seeds)
}

/// Carve a single free range out of the host range of `cidr`
///
/// Reserved addresses are visited in ascending order; each one inside the
/// current range moves the nearer bound past it. Returns `None` when nothing
/// is left.
pub fn carve_allocation_pool(
    cidr: &IpCidr,
    reserved: impl IntoIterator<Item = IpAddr>,
) -> Option<AllocationPool> {
    match *cidr.as_net() {
        IpNet::V4(net) => {
            let reserved = reserved.into_iter().filter_map(|address| match address {
                IpAddr::V4(v4) => Some(u32::from(v4)),
                IpAddr::V6(_) => None,
            });
            let (start, end) =
                carve_range(u32::from(net.network()), u32::from(net.broadcast()), reserved)?;
            Some(AllocationPool(
                IpAddr::V4(Ipv4Addr::from(start)),
                IpAddr::V4(Ipv4Addr::from(end)),
            ))
        }
        IpNet::V6(net) => {
            let reserved = reserved.into_iter().filter_map(|address| match address {
                IpAddr::V6(v6) => Some(u128::from(v6)),
                IpAddr::V4(_) => None,
            });
            let (start, end) =
                carve_range(u128::from(net.network()), u128::from(net.broadcast()), reserved)?;
            Some(AllocationPool(
                IpAddr::V6(Ipv6Addr::from(start)),
                IpAddr::V6(Ipv6Addr::from(end)),
            ))
        }
    }
}

/// Host range strictly inside `network..=broadcast` minus the reserved addresses
fn carve_range<N>(network: N, broadcast: N, reserved: impl IntoIterator<Item = N>) -> Option<(N, N)>
where
    N: Copy + Ord + From<u8> + Add<Output = N> + Sub<Output = N>,
{
    let one = N::from(1);
    if broadcast - network < N::from(2) {
        return None;
    }
    let (mut start, mut end) = (network + one, broadcast - one);

    let mut reserved: Vec<N> = reserved.into_iter().collect();
    reserved.sort_unstable();
    reserved.dedup();

    for address in reserved {
        if address < start || address > end {
            continue;
        }
        if address - start < end - address {
            start = address + one;
        } else if address == start {
            return None;
        } else {
            end = address - one;
        }
    }

    Some((start, end))
}

/// Merge pending router edges into the external router or point-to-point routers
///
/// Edges with an unknown endpoint or a single endpoint are ignored. External
/// membership propagates along edges until nothing changes; each remaining
/// unordered pair yields one router, in edge order.
pub fn coalesce_routers(
    networks: &mut IndexMap<String, VirtualNetwork>,
    edges: &[(String, String)],
) -> Vec<Router> {
    let edges: Vec<(&str, &str)> = edges
        .iter()
        .filter(|(a, b)| {
            let known = a != b && networks.contains_key(a) && networks.contains_key(b);
            if !known {
                debug!("Ignoring router edge {} -> {}", a, b);
            }
            known
        })
        .map(|(a, b)| (a.as_str(), b.as_str()))
        .collect();

    loop {
        let mut changed = false;
        for (a, b) in &edges {
            let (ext_a, ext_b) = (is_external(networks, a), is_external(networks, b));
            if ext_a != ext_b {
                for name in [a, b] {
                    if let Some(network) = networks.get_mut(*name) {
                        network.external = true;
                    }
                }
                debug!("Merged {} and {} into the external router", a, b);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut seen = IndexSet::new();
    edges
        .into_iter()
        .filter(|(a, b)| !is_external(networks, a) && !is_external(networks, b))
        .filter(|(a, b)| seen.insert(if a < b { (*a, *b) } else { (*b, *a) }))
        .map(|(a, b)| Router::new(a, b))
        .collect()
}

fn is_external(networks: &IndexMap<String, VirtualNetwork>, name: &str) -> bool {
    networks.get(name).is_some_and(|network| network.external)
}

/// Derive every network, router and the management allocation pool
pub fn plan_networks(model: &DeploymentModel, clm_cidr: &IpCidr) -> TopologyResult<NetworkPlan> {
    let mut networks = seed_neutron_networks(model)?;
    let mut edges: Vec<(String, String)> = Vec::new();
    let mut management: Option<String> = None;

    for network in model.networks.values() {
        let cidr = network
            .cidr
            .as_deref()
            .filter(|cidr| !cidr.is_empty())
            .map(IpCidr::new)
            .transpose()?;
        let gateway = network
            .gateway_ip
            .as_deref()
            .filter(|gateway| !gateway.is_empty())
            .map(parse_ip)
            .transpose()?;
        let vlan = match network.vlanid {
            Some(id) if network.tagged_vlan => Some(VlanId::new(id)?),
            _ => None,
        };

        let group = network
            .network_group
            .key()
            .and_then(|key| model.network_groups.get(key));

        let mut planned = VirtualNetwork::new(&network.name);
        planned.cidr = cidr.map(|cidr| cidr.to_string());
        planned.gateway = gateway.map(|gateway| gateway.to_string());

        if let Some(group) = group {
            for neutron_name in group.neutron_networks.values() {
                let flat_seed = networks
                    .get(neutron_name)
                    .is_some_and(|seed| seed.vlan.is_none());
                if !flat_seed {
                    continue;
                }
                if let Some(mut seed) = networks.shift_remove(neutron_name) {
                    debug!("Network {} backs flat neutron network {}", network.name, neutron_name);
                    seed.name = network.name.clone();
                    planned = seed;
                    break;
                }
            }
        }

        if vlan.is_some() {
            planned.vlan = vlan;
        }

        for route in group.map(|group| group.routes.as_slice()).unwrap_or_default() {
            match route {
                Route::Default => planned.external = true,
                Route::NetworkGroup(target) => {
                    if let Some(target_group) = model.network_groups.get(target) {
                        edges.extend(
                            target_group
                                .refs
                                .get(RefKind::Networks)
                                .map(|target| (network.name.clone(), target.to_string())),
                        );
                    }
                }
                Route::NeutronNetwork(target) => {
                    edges.push((network.name.clone(), target.clone()));
                }
                Route::Unresolved(target) => {
                    debug!("Network {} ignores unresolved route {}", network.name, target);
                }
            }
        }

        if cidr.as_ref() == Some(clm_cidr) {
            if let Some(existing) = &management {
                warn!(
                    "Network {} also matches the bare-metal subnet, keeping {} as management network",
                    network.name, existing
                );
            } else {
                planned.external = true;
                planned.is_mgmt = true;
                let reserved = reserved_addresses(model, gateway)?;
                let pool = carve_allocation_pool(clm_cidr, reserved)
                    .ok_or_else(|| TopologyError::AllocationPoolExhausted(network.name.clone()))?;
                debug!(
                    "Management network {} allocation pool {} - {}",
                    network.name,
                    pool.start(),
                    pool.end()
                );
                planned.allocation_pools = Some(vec![pool]);
                management = Some(network.name.clone());
            }
        }

        networks.insert(network.name.clone(), planned);
    }

    if management.is_none() {
        warn!("No network matches the bare-metal subnet {}", clm_cidr);
    }

    let routers = coalesce_routers(&mut networks, &edges);
    info!(
        "Planned {} networks and {} routers",
        networks.len(),
        routers.len()
    );

    Ok(NetworkPlan {
        networks,
        routers,
        management,
    })
}

/// Static server addresses plus the gateway
fn reserved_addresses(
    model: &DeploymentModel,
    gateway: Option<IpAddr>,
) -> TopologyResult<Vec<IpAddr>> {
    let mut reserved = model
        .servers
        .values()
        .filter_map(|server| server.ip_addr.as_deref())
        .map(parse_ip)
        .collect::<Result<Vec<_>, _>>()?;
    reserved.extend(gateway);
    Ok(reserved)
}
