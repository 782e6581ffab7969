// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Allocation Pool Carving
//!
//! The management pool is the widest run left after trimming statically
//! assigned addresses off either end of the host range.

use cim_virt_topology::topology::carve_allocation_pool;
use cim_virt_topology::IpCidr;
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// IPv4 networks between /16 and /29 under 10.0.0.0/8
fn ipv4_network() -> impl Strategy<Value = IpCidr> {
    (any::<u16>(), 16u8..=29).prop_map(|(high, prefix)| {
        let address = IpAddr::V4(Ipv4Addr::from(0x0a00_0000 | (u32::from(high) << 8)));
        IpCidr::from_parts(address, prefix).expect("prefix within IPv4 width")
    })
}

/// Reserved addresses, mostly inside the network
fn reserved_in(cidr: IpCidr) -> impl Strategy<Value = Vec<IpAddr>> {
    let base = match cidr.network() {
        IpAddr::V4(v4) => u32::from(v4),
        IpAddr::V6(_) => 0,
    };
    let size = 1u32 << (32 - u32::from(cidr.prefix_length()));
    prop::collection::vec(0..size + 8, 0..12).prop_map(move |offsets| {
        offsets
            .into_iter()
            .map(|offset| IpAddr::V4(Ipv4Addr::from(base.wrapping_add(offset))))
            .collect()
    })
}

fn network_with_reserved() -> impl Strategy<Value = (IpCidr, Vec<IpAddr>)> {
    ipv4_network().prop_flat_map(|cidr| (Just(cidr), reserved_in(cidr)))
}

fn bits(address: IpAddr) -> u32 {
    match address {
        IpAddr::V4(v4) => u32::from(v4),
        IpAddr::V6(_) => unreachable!("IPv4 only"),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: No reserved address ends up in the pool
    #[test]
    fn prop_pool_excludes_reserved((cidr, reserved) in network_with_reserved()) {
        if let Some(pool) = carve_allocation_pool(&cidr, reserved.clone()) {
            for address in &reserved {
                prop_assert!(!pool.contains(address), "{} is reserved", address);
            }
        }
    }

    /// Property: The pool is a non-empty range of host addresses
    #[test]
    fn prop_pool_within_host_range((cidr, reserved) in network_with_reserved()) {
        if let Some(pool) = carve_allocation_pool(&cidr, reserved) {
            prop_assert!(bits(pool.start()) <= bits(pool.end()));
            prop_assert!(cidr.contains(&pool.start()));
            prop_assert!(cidr.contains(&pool.end()));
            prop_assert_ne!(pool.start(), cidr.network());
            prop_assert_ne!(pool.end(), cidr.broadcast());
        }
    }

    /// Property: Without reservations the pool spans every host address
    #[test]
    fn prop_unreserved_pool_is_full_range(cidr in ipv4_network()) {
        let pool = carve_allocation_pool(&cidr, Vec::new());

        prop_assert_eq!(pool.map(|p| p.start()), cidr.first_host());
        prop_assert_eq!(pool.map(|p| p.end()), cidr.last_host());
    }

    /// Property: Addresses outside the network never change the pool
    #[test]
    fn prop_outside_addresses_ignored((cidr, reserved) in network_with_reserved()) {
        let inside: Vec<IpAddr> = reserved.iter().copied().filter(|a| cidr.contains(a)).collect();

        prop_assert_eq!(
            carve_allocation_pool(&cidr, reserved),
            carve_allocation_pool(&cidr, inside)
        );
    }

    /// Property: Reservation order does not matter
    #[test]
    fn prop_reservation_order_irrelevant((cidr, reserved) in network_with_reserved()) {
        let mut reversed = reserved.clone();
        reversed.reverse();

        prop_assert_eq!(
            carve_allocation_pool(&cidr, reserved),
            carve_allocation_pool(&cidr, reversed)
        );
    }
}
