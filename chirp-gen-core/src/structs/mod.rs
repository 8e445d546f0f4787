//! General-purpose data structures.

/// Self-balancing binary search tree with ordered successor queries.
///
/// Backs inverse-CDF sampling in the statistics module; kept generic
/// over any totally-ordered key type.
pub mod avl_tree;
