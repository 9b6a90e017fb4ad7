use std::collections::{BTreeSet, HashMap};

use crate::record::ItemRecord;
use crate::scanner::LocalTitles;

/// What a sync run has to do to make the mirror match the remote collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Present remotely, absent locally. Kept in remote order.
    pub to_create: Vec<ItemRecord>,
    /// Present locally, absent remotely.
    pub to_delete: BTreeSet<String>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Diff remote items against local titles, keyed by sanitized title.
///
/// When several remote items share a key the one resolved last wins; it
/// takes the position of the first occurrence in `to_create`.
pub fn reconcile(remote: &[ItemRecord], local: &LocalTitles) -> ReconciliationPlan {
    let mut by_key: HashMap<String, usize> = HashMap::with_capacity(remote.len());
    let mut order: Vec<String> = Vec::with_capacity(remote.len());
    for (idx, item) in remote.iter().enumerate() {
        let key = item.key();
        if by_key.insert(key.clone(), idx).is_none() {
            order.push(key);
        }
    }

    let to_create = order
        .iter()
        .filter(|key| !local.contains(key))
        .map(|key| remote[by_key[key.as_str()]].clone())
        .collect();

    let to_delete = local
        .iter()
        .filter(|title| !by_key.contains_key(*title))
        .map(str::to_owned)
        .collect();

    ReconciliationPlan {
        to_create,
        to_delete,
    }
}
