//! Stable insertion into key-ordered sequences.
//!
//! Component lists and the draw list both rely on the same rule: scan to the
//! first element whose key is strictly greater and insert before it. Equal
//! keys therefore keep their insertion order, which keeps painter's-order
//! drawing stable across frames as elements come and go.

/// Insert `item` keeping `items` non-decreasing by `key`. Returns the index
/// the item landed at.
pub fn insert_sorted_stable<T, K, F>(items: &mut Vec<T>, item: T, key: F) -> usize
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let new_key = key(&item);
    let index = items
        .iter()
        .position(|existing| key(existing) > new_key)
        .unwrap_or(items.len());
    items.insert(index, item);
    index
}
