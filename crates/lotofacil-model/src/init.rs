//! Parameter initialization.
//!
//! All initializers take the caller's RNG so a seeded generator reproduces the
//! same starting weights.
//!
//! - [`glorot_uniform`] for input and output kernels
//! - [`scaled_normal`] for the recurrent kernel
//! - [`zeros`] for biases

use rand::Rng;
use rand_distr::StandardNormal;

/// Creates a weight vector by applying a function to each index.
///
/// # Examples
///
/// ```
/// use lotofacil_model::init;
///
/// let weights = init::from_fn(|i| 1.0 / (i as f32 + 1.0), 3);
/// assert_eq!(weights, vec![1.0, 0.5, 1.0 / 3.0]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Samples a `fan_out × fan_in` kernel from `U(-limit, limit)` with
/// `limit = sqrt(6 / (fan_in + fan_out))`.
pub fn glorot_uniform<R>(rng: &mut R, fan_in: usize, fan_out: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    #[expect(clippy::cast_precision_loss)]
    let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    from_fn(|_| rng.random_range(-limit..=limit), fan_in * fan_out)
}

/// Samples `len` values from `N(0, std_dev²)`.
pub fn scaled_normal<R>(rng: &mut R, std_dev: f32, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.sample::<f32, _>(StandardNormal) * std_dev, len)
}

#[must_use]
pub fn zeros(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_glorot_within_limit() {
        let mut rng = Pcg32::seed_from_u64(1);
        let weights = glorot_uniform(&mut rng, 4, 2);
        let limit = 1.0_f32;
        assert_eq!(weights.len(), 8);
        assert!(weights.iter().all(|w| w.abs() <= limit));
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = glorot_uniform(&mut Pcg32::seed_from_u64(9), 5, 5);
        let b = glorot_uniform(&mut Pcg32::seed_from_u64(9), 5, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_scaled_normal_spread() {
        let mut rng = Pcg32::seed_from_u64(3);
        let values = scaled_normal(&mut rng, 0.1, 1000);
        assert!(values.iter().all(|v| v.abs() < 1.0));
    }
}
