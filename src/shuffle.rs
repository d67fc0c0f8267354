use rand::seq::SliceRandom;
use rand::Rng;

/// Return a uniformly shuffled copy of `items`, leaving the input untouched.
pub fn shuffled<T: Clone>(items: &[T]) -> Vec<T> {
    let mut rng = rand::thread_rng();
    shuffled_with(items, &mut rng)
}

/// Same as [`shuffled`] but drawing from the caller's RNG (Fisher–Yates)
pub fn shuffled_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}
