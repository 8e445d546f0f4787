use std::cmp::Ordering;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{ChirpError, Result};
use crate::structs::avl_tree::AvlTree;

/// Default tolerance on the aggregated weight of a distribution.
///
/// Weights are usually observed frequencies divided by a total, so their
/// sum carries floating-point rounding; the tolerance absorbs it while
/// still rejecting genuinely overweight event sets.
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-4;

/// Tree entry keyed by cumulative weight.
///
/// Ordering looks at the cumulative value only, so the comparison
/// contract carries no hidden shared state. Probe keys used by successor
/// queries hold no event.
#[derive(Debug)]
struct WeightedEvent<T> {
	cumulative: f64,
	event: Option<T>,
}

impl<T> PartialEq for WeightedEvent<T> {
	fn eq(&self, other: &Self) -> bool {
		self.cumulative.total_cmp(&other.cumulative) == Ordering::Equal
	}
}

impl<T> Eq for WeightedEvent<T> {}

impl<T> PartialOrd for WeightedEvent<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl<T> Ord for WeightedEvent<T> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.cumulative.total_cmp(&other.cumulative)
	}
}

/// Discrete distribution over a weighted event set.
///
/// Maintains (event, probability-weight) pairs and samples an event with
/// probability proportional to its weight via a successor query on the
/// cumulative-weight tree.
///
/// # Responsibilities
/// - Accumulate events while guarding the aggregated weight
/// - Sample events by inverse-CDF lookup
/// - Provide deterministic reseeding for reproducible runs
///
/// # Invariants
/// - Stored cumulative weights are strictly increasing in insertion order
/// - The aggregated weight never exceeds `1 + tolerance`
/// - A rejected insertion leaves the aggregated weight unchanged
///
/// # Notes
/// - An aggregated weight below 1 is a legal, incomplete distribution:
///   draws landing past the last cumulative weight return `None`, and
///   callers treat that as a valid outcome rather than an error.
/// - Not internally synchronized; a single writer fills the distribution,
///   after which concurrent reads through `sample_with` are safe.
#[derive(Debug)]
pub struct EventDistribution<T> {
	tree: AvlTree<WeightedEvent<T>>,
	aggregated: f64,
	tolerance: f64,
	rng: StdRng,
}

impl<T> EventDistribution<T> {
	/// Creates an empty distribution with the default weight tolerance.
	pub fn new() -> Self {
		Self::with_tolerance(DEFAULT_WEIGHT_TOLERANCE)
	}

	/// Creates an empty distribution with an explicit weight tolerance.
	pub fn with_tolerance(tolerance: f64) -> Self {
		Self {
			tree: AvlTree::new(),
			aggregated: 0.0,
			tolerance,
			rng: StdRng::from_rng(&mut rand::rng()),
		}
	}

	/// Number of stored events.
	pub fn len(&self) -> usize {
		self.tree.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	/// Sum of all accepted weights.
	pub fn aggregated_weight(&self) -> f64 {
		self.aggregated
	}

	/// Adds an event with the given probability weight.
	///
	/// The event is stored keyed by the new aggregated weight, so the
	/// cumulative keys grow strictly with each accepted insertion.
	///
	/// # Errors
	/// - `InvalidWeight` if `weight` is zero. Negative and non-finite
	///   weights fail the same way: they would break the strictly
	///   increasing cumulative ordering.
	/// - `ProbabilityOverflow` if the aggregated weight would pass
	///   `1 + tolerance`. The aggregate keeps its pre-call value and no
	///   partial mutation is visible.
	pub fn add_event(&mut self, event: T, weight: f64) -> Result<()> {
		if !(weight > 0.0) {
			return Err(ChirpError::InvalidWeight);
		}

		let aggregated = self.aggregated + weight;
		if aggregated > 1.0 + self.tolerance {
			return Err(ChirpError::ProbabilityOverflow { aggregated });
		}

		self.aggregated = aggregated;
		self.tree.insert(WeightedEvent { cumulative: aggregated, event: Some(event) });
		Ok(())
	}

	/// Replaces the internal random source with a deterministically
	/// seeded one, for reproducible runs.
	pub fn reseed(&mut self, seed: u64) {
		self.rng = StdRng::seed_from_u64(seed);
	}

	/// Samples an event using the internal random source.
	pub fn sample(&mut self) -> Option<&T> {
		let probe = self.rng.random_range(0.0..1.0);
		self.sample_at(probe)
	}

	/// Samples an event using a caller-supplied random source.
	pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
		self.sample_at(rng.random_range(0.0..1.0))
	}

	/// Inverse-CDF lookup at a fixed position in `[0, 1)`.
	///
	/// Returns the event whose cumulative interval contains `probe`, or
	/// `None` when the probe lands at or past the aggregated weight —
	/// the unassigned remainder of an incomplete distribution.
	pub fn sample_at(&self, probe: f64) -> Option<&T> {
		let probe = WeightedEvent { cumulative: probe, event: None };
		self.tree.successor(&probe).and_then(|hit| hit.event.as_ref())
	}
}

impl<T> Default for EventDistribution<T> {
	fn default() -> Self {
		Self::new()
	}
}
