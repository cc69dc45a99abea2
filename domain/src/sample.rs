//! Random display sample of the merged testimonial set.

use rand::seq::SliceRandom;
use rand::Rng;

/// Maximum number of testimonials shown while "show all" is off.
pub const DISPLAY_SAMPLE_SIZE: usize = 6;

/// Uniformly shuffle a copy of `items` and keep the first
/// `min(DISPLAY_SAMPLE_SIZE, items.len())`.
pub fn sample<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut picked = items.to_vec();
    picked.shuffle(rng);
    picked.truncate(DISPLAY_SAMPLE_SIZE);
    picked
}
