// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of the address and routing arithmetic behind topology
//! generation.

mod allocation_pool;
mod router_coalescing;
