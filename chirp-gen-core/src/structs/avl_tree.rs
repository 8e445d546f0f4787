/// Self-balancing binary search tree over a totally-ordered key type.
///
/// Supports ordered insertion and "smallest key strictly greater than a
/// probe" queries, both in O(log n). Deletion is intentionally absent;
/// no caller needs it.
///
/// # Invariants
/// - Subtree heights differ by at most 1 at every node (AVL balance).
/// - Duplicate keys are legal: an equal key descends to the right, so a
///   later insertion sorts as the greater one and successor queries stay
///   well-defined even when two keys compare equal.
#[derive(Debug)]
pub struct AvlTree<K> {
	root: Option<Box<Node<K>>>,
	len: usize,
}

#[derive(Debug)]
struct Node<K> {
	key: K,
	height: i32,
	left: Option<Box<Node<K>>>,
	right: Option<Box<Node<K>>>,
}

impl<K: Ord> AvlTree<K> {
	/// Creates an empty tree.
	pub fn new() -> Self {
		Self { root: None, len: 0 }
	}

	/// Number of stored keys, duplicates included.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Inserts a key, rebalancing on the way back up.
	pub fn insert(&mut self, key: K) {
		let root = self.root.take();
		self.root = Some(Self::insert_node(root, key));
		self.len += 1;
	}

	/// Returns the smallest stored key strictly greater than `probe`,
	/// or `None` if the probe is greater than or equal to every key.
	pub fn successor(&self, probe: &K) -> Option<&K> {
		let mut best: Option<&K> = None;
		let mut current = self.root.as_deref();

		while let Some(node) = current {
			if node.key > *probe {
				best = Some(&node.key);
				current = node.left.as_deref();
			} else {
				current = node.right.as_deref();
			}
		}

		best
	}

	fn insert_node(node: Option<Box<Node<K>>>, key: K) -> Box<Node<K>> {
		let mut node = match node {
			None => return Box::new(Node { key, height: 1, left: None, right: None }),
			Some(node) => node,
		};

		// Equal keys go right: the later insertion sorts as greater
		if key < node.key {
			node.left = Some(Self::insert_node(node.left.take(), key));
		} else {
			node.right = Some(Self::insert_node(node.right.take(), key));
		}

		Self::rebalance(node)
	}

	fn height(node: &Option<Box<Node<K>>>) -> i32 {
		node.as_ref().map_or(0, |n| n.height)
	}

	fn update_height(node: &mut Node<K>) {
		node.height = 1 + Self::height(&node.left).max(Self::height(&node.right));
	}

	fn balance_factor(node: &Node<K>) -> i32 {
		Self::height(&node.left) - Self::height(&node.right)
	}

	fn rebalance(mut node: Box<Node<K>>) -> Box<Node<K>> {
		Self::update_height(&mut node);

		let balance = Self::balance_factor(&node);
		if balance > 1 {
			// A balance factor above 1 guarantees a left child
			if Self::balance_factor(node.left.as_ref().unwrap()) < 0 {
				let left = node.left.take().unwrap();
				node.left = Some(Self::rotate_left(left));
			}
			return Self::rotate_right(node);
		}
		if balance < -1 {
			if Self::balance_factor(node.right.as_ref().unwrap()) > 0 {
				let right = node.right.take().unwrap();
				node.right = Some(Self::rotate_right(right));
			}
			return Self::rotate_left(node);
		}

		node
	}

	fn rotate_left(mut node: Box<Node<K>>) -> Box<Node<K>> {
		// The caller only rotates left when a right child exists
		let mut pivot = node.right.take().unwrap();
		node.right = pivot.left.take();
		Self::update_height(&mut node);
		pivot.left = Some(node);
		Self::update_height(&mut pivot);
		pivot
	}

	fn rotate_right(mut node: Box<Node<K>>) -> Box<Node<K>> {
		let mut pivot = node.left.take().unwrap();
		node.left = pivot.right.take();
		Self::update_height(&mut node);
		pivot.right = Some(node);
		Self::update_height(&mut pivot);
		pivot
	}

	#[cfg(test)]
	fn root_height(&self) -> i32 {
		Self::height(&self.root)
	}
}

impl<K: Ord> Default for AvlTree<K> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn successor_on_empty_tree_is_none() {
		let tree: AvlTree<u32> = AvlTree::new();
		assert!(tree.successor(&0).is_none());
	}

	#[test]
	fn successor_is_strictly_greater() {
		let mut tree = AvlTree::new();
		for key in [50, 20, 80, 10, 30, 70, 90] {
			tree.insert(key);
		}

		assert_eq!(tree.successor(&0), Some(&10));
		assert_eq!(tree.successor(&10), Some(&20));
		assert_eq!(tree.successor(&25), Some(&30));
		assert_eq!(tree.successor(&75), Some(&80));
		assert_eq!(tree.successor(&89), Some(&90));
		assert_eq!(tree.successor(&90), None);
		assert_eq!(tree.successor(&1000), None);
	}

	#[test]
	fn duplicates_keep_successor_well_defined() {
		let mut tree = AvlTree::new();
		for key in [1, 2, 2, 3] {
			tree.insert(key);
		}

		assert_eq!(tree.len(), 4);
		assert_eq!(tree.successor(&1), Some(&2));
		assert_eq!(tree.successor(&2), Some(&3));
		assert_eq!(tree.successor(&3), None);
	}

	#[test]
	fn ascending_insertions_stay_balanced() {
		let mut tree = AvlTree::new();
		let count = 1024;
		for key in 0..count {
			tree.insert(key);
		}

		// An AVL tree of n keys has height at most ~1.44 * log2(n)
		assert_eq!(tree.len(), count as usize);
		assert!(tree.root_height() <= 15, "height {} too large", tree.root_height());

		for key in 0..count - 1 {
			assert_eq!(tree.successor(&key), Some(&(key + 1)));
		}
		assert_eq!(tree.successor(&(count - 1)), None);
	}

	#[test]
	fn descending_insertions_stay_balanced() {
		let mut tree = AvlTree::new();
		for key in (0..512).rev() {
			tree.insert(key);
		}

		assert!(tree.root_height() <= 14);
		assert_eq!(tree.successor(&255), Some(&256));
	}
}
