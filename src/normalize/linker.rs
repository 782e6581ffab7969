// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Linker
//!
//! Resolves declared identifiers into [`Link::Resolved`] references and
//! records the referrer on the target's [`BackRefs`]. Identifiers that do not
//! name an existing entity stay [`Link::Unresolved`]: a dangling reference is
//! not an error, it makes the referrer a candidate for being dropped and the
//! target a candidate for pruning.

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::{Entity, Link, RefKind};

/// Reverse reference to record on a link target
#[derive(Debug, Clone, Copy)]
pub struct BackRef<'a> {
    pub kind: RefKind,
    pub referrer: &'a str,
}

impl<'a> BackRef<'a> {
    pub fn new(kind: RefKind, referrer: &'a str) -> Self {
        Self { kind, referrer }
    }
}

/// Resolve one reference against `targets`
///
/// Returns the target key when the reference resolves. Linking an already
/// resolved reference changes nothing; a resolved reference whose target has
/// since disappeared falls back to unresolved.
pub fn link<T: Entity>(
    link: &mut Link,
    targets: &mut IndexMap<String, T>,
    back_ref: Option<BackRef<'_>>,
) -> Option<String> {
    let key = link.declared()?.to_string();

    let Some(target) = targets.get_mut(&key) else {
        if link.is_resolved() {
            debug!("Reference to {} no longer resolves", key);
        }
        *link = Link::Unresolved(Some(key));
        return None;
    };

    if let Some(back_ref) = back_ref {
        target.back_refs_mut().record(back_ref.kind, back_ref.referrer);
    }
    *link = Link::Resolved(key.clone());
    Some(key)
}

/// Resolve every reference of a list, returning how many resolved
pub fn link_all<T: Entity>(
    links: &mut [Link],
    targets: &mut IndexMap<String, T>,
    back_ref: Option<BackRef<'_>>,
) -> usize {
    links
        .iter_mut()
        .filter_map(|l| link(l, targets, back_ref))
        .count()
}

/// True when the declared identifier names an entity in `targets`
pub fn resolves<T>(link: &Link, targets: &IndexMap<String, T>) -> bool {
    link.declared().is_some_and(|key| targets.contains_key(key))
}
