use nalgebra::{Vector5, Vector6};
use rand::Rng;
use rand_distr::StandardNormal;

// One scalar per content attribute
pub type Attributes = Vector6<f32>;

// One scalar per reaction level
pub type Reactions = Vector5<f32>;

pub fn clamp_p(v: f32) -> f32 {
    v.max(0.).min(1.)
}

// Normal dist around `mu`, clamped to 0 to 1
pub fn normal_p_mu(mu: f32, sigma: f32, rng: &mut impl Rng) -> f32 {
    clamp_p(normal(mu, sigma, rng))
}

pub fn normal(mu: f32, sigma: f32, rng: &mut impl Rng) -> f32 {
    let z: f32 = rng.sample(StandardNormal);
    mu + sigma * z
}

// Exponentially weighted moving average,
// `alpha` is the weight on the previous value
pub fn ewma(mu: f32, prev: f32, alpha: f32) -> f32 {
    alpha * prev + (1. - alpha) * mu
}

// Scale down proportionally if the total exceeds 1
pub fn renormalize(probs: &Reactions) -> Reactions {
    let total = probs.sum();
    if total > 1. {
        probs / total
    } else {
        *probs
    }
}

pub fn mean(vals: &[f32]) -> f32 {
    vals.iter().sum::<f32>() / vals.len().max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_renormalize() {
        let probs = Reactions::new(0.5, 0.5, 0.5, 0.25, 0.25);
        let normed = renormalize(&probs);
        assert!((normed.sum() - 1.).abs() < 1e-6);
        assert!((normed[0] - 0.25).abs() < 1e-6);

        // Under 1 is left alone
        let probs = Reactions::new(0.1, 0.1, 0.1, 0.1, 0.1);
        assert_eq!(renormalize(&probs), probs);
    }

    #[test]
    fn test_ewma() {
        assert_eq!(ewma(3., 1., 1.), 1.);
        assert_eq!(ewma(3., 1., 0.), 3.);
        assert!((ewma(2., 1., 0.98) - 1.02).abs() < 1e-6);
    }

    #[test]
    fn test_normal_p_mu() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        for _ in 0..1000 {
            let v = normal_p_mu(0.9, 0.5, &mut rng);
            assert!(v >= 0. && v <= 1.);
        }
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.);
        assert_eq!(mean(&[1., 2., 3.]), 2.);
    }
}
