// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pruner
//!
//! Removes entities nothing refers to. Each entity class must be pruned after
//! every class that can refer to it has been linked, otherwise entities whose
//! referrers are still pending look dead.

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::{Entity, RefKind, ServerGroup};

/// Remove every entity failing `keep`, returning the removed keys in order
pub fn prune_where<T>(
    entities: &mut IndexMap<String, T>,
    mut keep: impl FnMut(&str, &T) -> bool,
) -> Vec<String> {
    let mut removed = Vec::new();
    entities.retain(|key, entity| {
        let kept = keep(key, entity);
        if !kept {
            removed.push(key.clone());
        }
        kept
    });
    removed
}

/// Remove every entity whose back-references of all `kinds` are empty
pub fn prune_unreferenced<T: Entity>(
    entities: &mut IndexMap<String, T>,
    kinds: &[RefKind],
) -> Vec<String> {
    let removed = prune_where(entities, |_, entity| entity.back_refs().any_of(kinds));
    for key in &removed {
        debug!("Pruned unreferenced entity {} (needs one of {:?})", key, kinds);
    }
    removed
}

/// Forget `removed` referrers of `kind` on every entity
pub fn forget_referrers<T: Entity>(
    entities: &mut IndexMap<String, T>,
    kind: RefKind,
    removed: &[String],
) {
    for entity in entities.values_mut() {
        for key in removed {
            entity.back_refs_mut().forget(kind, key);
        }
    }
}

/// Referrers that keep a server group alive: a server placed in it, or a
/// group listing it among its children
pub const SERVER_GROUP_REFERRERS: [RefKind; 2] = [RefKind::Servers, RefKind::ServerGroupParents];

/// Prune server groups no server is placed in and no other group lists
///
/// Decided in a single pass over the recorded back-references, so a group
/// listed only by a pruned parent survives.
pub fn prune_server_groups(groups: &mut IndexMap<String, ServerGroup>) -> Vec<String> {
    let removed = prune_unreferenced(groups, &SERVER_GROUP_REFERRERS);
    for key in &removed {
        debug!("Pruned server group {}", key);
    }
    removed
}
