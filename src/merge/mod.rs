//! Reconciles freshly fetched items with the cached set.
//!
//! Items are matched by [`Item::stable_key`]. A fresh item that matches a
//! cached one takes over the cached item's `id`; everything else comes from
//! the fresh copy. Cached items that were not matched are kept, so an entry
//! that drops out of its feed (or belongs to a source that failed this round)
//! stays visible.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::domain::{sort_newest_first, Item};

pub fn merge(previous: Vec<Item>, fresh: Vec<Item>) -> Vec<Item> {
    // Cached ids per key, in cache order. Several cached items can share a
    // key (one link in two sources, or a linkless title collision).
    let mut lookup: HashMap<&str, VecDeque<Uuid>> = HashMap::with_capacity(previous.len());
    for item in &previous {
        lookup.entry(item.stable_key()).or_default().push_back(item.id);
    }

    let mut handed_out: HashSet<Uuid> = HashSet::new();
    let mut merged = Vec::with_capacity(previous.len() + fresh.len());

    for mut item in fresh {
        // Each cached id goes to at most one fresh item.
        if let Some(id) = lookup
            .get_mut(item.stable_key())
            .and_then(VecDeque::pop_front)
        {
            handed_out.insert(id);
            item.id = id;
        }
        merged.push(item);
    }
    drop(lookup);

    let considered = previous.len();
    merged.extend(
        previous
            .into_iter()
            .filter(|item| !handed_out.contains(&item.id)),
    );

    tracing::debug!(
        "Merged {} items ({} matched, {} cached entries considered)",
        merged.len(),
        handed_out.len(),
        considered
    );

    sort_newest_first(&mut merged);
    merged
}
