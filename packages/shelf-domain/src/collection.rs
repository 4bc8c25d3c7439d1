//! Collection hierarchy resolution.
//!
//! Collections form a forest through `parent_id`. Listing a collection includes the bookmarks of
//! every descendant, so a requested id is expanded into the closed set "self plus descendants"
//! before the store is queried.

use std::{
	collections::{HashMap, HashSet, VecDeque},
	hash::Hash,
};

use serde::Serialize;

/// Sentinel id of the synthetic root that stands for every bookmark of the user.
pub const ALL_COLLECTIONS: &str = "all";

/// Which collections a listing is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionScope<K>
where
	K: Eq + Hash,
{
	/// No collection filter; every bookmark of the user is eligible.
	All,
	/// Only bookmarks whose collection is a member of the set.
	Within(HashSet<K>),
}
impl<K> CollectionScope<K>
where
	K: Eq + Hash,
{
	pub fn admits(&self, collection_id: Option<&K>) -> bool {
		match self {
			Self::All => true,
			Self::Within(ids) => collection_id.map(|id| ids.contains(id)).unwrap_or(false),
		}
	}
}

/// Raw collection selection as it arrives from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSelector {
	All,
	Id(String),
}
impl CollectionSelector {
	/// Absent, blank, and `"all"` all select every collection.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(str::trim) {
			None | Some("") => Self::All,
			Some(value) if value.eq_ignore_ascii_case(ALL_COLLECTIONS) => Self::All,
			Some(value) => Self::Id(value.to_string()),
		}
	}
}

/// Collects `root` and every collection reachable from it through child edges.
///
/// `edges` holds `(id, parent_id)` pairs for the caller's collections only. An unknown `root`
/// yields `{root}`, which then matches no bookmark. Ids are never visited twice, so malformed
/// input containing cycles still terminates.
pub fn descendants_inclusive<K>(root: &K, edges: &[(K, Option<K>)]) -> HashSet<K>
where
	K: Eq + Hash + Clone,
{
	let children = child_map(edges);
	let mut visited = HashSet::new();
	let mut queue = VecDeque::new();

	visited.insert(root.clone());
	queue.push_back(root);

	while let Some(current) = queue.pop_front() {
		let Some(kids) = children.get(current) else {
			continue;
		};

		for kid in kids {
			if visited.insert((*kid).clone()) {
				queue.push_back(kid);
			}
		}
	}

	visited
}

/// Expands a selector into a scope. `parse_id` maps the raw id into the key type; ids it rejects
/// are unknown, so the resulting scope is empty.
pub fn resolve_scope<K, F>(
	selector: &CollectionSelector,
	edges: &[(K, Option<K>)],
	parse_id: F,
) -> CollectionScope<K>
where
	K: Eq + Hash + Clone,
	F: FnOnce(&str) -> Option<K>,
{
	match selector {
		CollectionSelector::All => CollectionScope::All,
		CollectionSelector::Id(raw) => match parse_id(raw) {
			Some(id) => CollectionScope::Within(descendants_inclusive(&id, edges)),
			None => CollectionScope::Within(HashSet::new()),
		},
	}
}

/// True when moving `collection` under `new_parent` would close a loop in the forest.
pub fn would_create_cycle<K>(collection: &K, new_parent: &K, edges: &[(K, Option<K>)]) -> bool
where
	K: Eq + Hash + Clone,
{
	collection == new_parent || descendants_inclusive(collection, edges).contains(new_parent)
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionNode<T> {
	#[serde(flatten)]
	pub item: T,
	pub children: Vec<CollectionNode<T>>,
}

/// Nests flat collections under their parents, keeping input order among siblings.
///
/// Items whose parent is missing become roots. Items caught in a cycle are emitted as roots at
/// the first member encountered, so nothing is dropped.
pub fn build_tree<T, K, FI, FP>(items: Vec<T>, id_of: FI, parent_of: FP) -> Vec<CollectionNode<T>>
where
	K: Eq + Hash + Clone,
	FI: Fn(&T) -> K,
	FP: Fn(&T) -> Option<K>,
{
	let ids: Vec<K> = items.iter().map(&id_of).collect();
	let mut children: HashMap<K, Vec<usize>> = HashMap::new();
	let mut roots = Vec::new();

	{
		let known: HashSet<&K> = ids.iter().collect();

		for (idx, item) in items.iter().enumerate() {
			match parent_of(item).filter(|parent| known.contains(parent) && parent != &ids[idx]) {
				Some(parent) => children.entry(parent).or_default().push(idx),
				None => roots.push(idx),
			}
		}
	}

	let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
	let mut out = Vec::with_capacity(roots.len());

	for idx in roots.into_iter().chain(0..ids.len()) {
		if let Some(node) = take_node(idx, &mut slots, &ids, &children) {
			out.push(node);
		}
	}

	out
}

fn take_node<T, K>(
	idx: usize,
	slots: &mut [Option<T>],
	ids: &[K],
	children: &HashMap<K, Vec<usize>>,
) -> Option<CollectionNode<T>>
where
	K: Eq + Hash,
{
	let item = slots[idx].take()?;
	let kids = children
		.get(&ids[idx])
		.map(|kids| kids.iter().filter_map(|kid| take_node(*kid, slots, ids, children)).collect())
		.unwrap_or_default();

	Some(CollectionNode { item, children: kids })
}

fn child_map<K>(edges: &[(K, Option<K>)]) -> HashMap<&K, Vec<&K>>
where
	K: Eq + Hash,
{
	let mut children: HashMap<&K, Vec<&K>> = HashMap::new();

	for (id, parent) in edges {
		if let Some(parent) = parent {
			children.entry(parent).or_default().push(id);
		}
	}

	children
}

#[cfg(test)]
mod tests {
	use super::*;

	fn edges(pairs: &[(u32, Option<u32>)]) -> Vec<(u32, Option<u32>)> {
		pairs.to_vec()
	}

	#[test]
	fn selector_treats_blank_and_all_as_unfiltered() {
		assert_eq!(CollectionSelector::parse(None), CollectionSelector::All);
		assert_eq!(CollectionSelector::parse(Some("  ")), CollectionSelector::All);
		assert_eq!(CollectionSelector::parse(Some("ALL")), CollectionSelector::All);
		assert_eq!(CollectionSelector::parse(Some(" 7 ")), CollectionSelector::Id("7".into()));
	}

	#[test]
	fn unknown_root_resolves_to_itself() {
		let set = descendants_inclusive(&42, &edges(&[(1, None), (2, Some(1))]));

		assert_eq!(set, HashSet::from([42]));
	}

	#[test]
	fn unparsable_id_yields_empty_scope() {
		let scope = resolve_scope(&CollectionSelector::Id("x".into()), &edges(&[(1, None)]), |raw| {
			raw.parse::<u32>().ok()
		});

		assert_eq!(scope, CollectionScope::Within(HashSet::new()));
		assert!(!scope.admits(Some(&1)));
		assert!(!scope.admits(None));
	}

	#[test]
	fn self_loop_terminates() {
		let set = descendants_inclusive(&1, &edges(&[(1, Some(1)), (2, Some(1))]));

		assert_eq!(set, HashSet::from([1, 2]));
	}

	#[test]
	fn cycle_detection_covers_self_and_descendants() {
		let graph = edges(&[(1, None), (2, Some(1)), (3, Some(2)), (4, None)]);

		assert!(would_create_cycle(&1, &1, &graph));
		assert!(would_create_cycle(&1, &3, &graph));
		assert!(!would_create_cycle(&3, &1, &graph));
		assert!(!would_create_cycle(&2, &4, &graph));
	}

	#[test]
	fn tree_keeps_sibling_order_and_orphans() {
		let items = vec![(1, None), (2, Some(1)), (3, Some(1)), (4, Some(99)), (5, Some(3))];
		let tree = build_tree(items, |item| item.0, |item| item.1);
		let roots: Vec<u32> = tree.iter().map(|node| node.item.0).collect();

		assert_eq!(roots, vec![1, 4]);
		assert_eq!(tree[0].children.iter().map(|node| node.item.0).collect::<Vec<_>>(), vec![2, 3]);
		assert_eq!(tree[0].children[1].children[0].item.0, 5);
	}

	#[test]
	fn tree_emits_cycle_members_once() {
		let items = vec![(1, Some(2)), (2, Some(1)), (3, None)];
		let tree = build_tree(items, |item| item.0, |item| item.1);

		fn count<T>(nodes: &[CollectionNode<T>]) -> usize {
			nodes.iter().map(|node| 1 + count(&node.children)).sum()
		}

		assert_eq!(count(&tree), 3);
	}
}
