use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;

const FIRST_DELAY_MIN: Duration = Duration::from_secs(5);
const FIRST_DELAY_SPAN: Duration = Duration::from_secs(10);

/// Jittered cadence for falling-star spawns.
///
/// The first delay is uniform in 5..15 s; later ones are `interval ± variance`.
#[derive(Clone, Debug, PartialEq)]
pub struct FallingStarSchedule {
	/// Mean gap between spawns after the first.
	pub interval: Duration,
	/// Maximum deviation either side of `interval`.
	pub variance: Duration,
	first: bool,
}

impl Default for FallingStarSchedule {
	fn default() -> Self {
		Self::new(Duration::from_secs(30), Duration::from_secs(10))
	}
}

impl FallingStarSchedule {
	/// Schedule whose first delay is still the short one.
	pub fn new(interval: Duration, variance: Duration) -> Self {
		Self {
			interval,
			variance,
			first: true,
		}
	}

	/// Delay until the next spawn.
	pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
		if std::mem::take(&mut self.first) {
			return FIRST_DELAY_MIN + FIRST_DELAY_SPAN.mul_f64(rng.gen_range(0.0f64..1.0));
		}
		let offset = self.variance.as_secs_f64() * rng.gen_range(-1.0f64..1.0);
		Duration::from_secs_f64((self.interval.as_secs_f64() + offset).max(0.0))
	}
}

/// Shared flag that tells the frame loop and its timers to stop re-arming.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
	/// A token that has not been stopped.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stops every clone.
	pub fn stop(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	/// Whether `stop` was called on any clone.
	pub fn is_stopped(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}
