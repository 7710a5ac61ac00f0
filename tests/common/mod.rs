//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// Routes crate logs to the test harness; `RUST_LOG=u_profile=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `n` draws from Normal(mean, sd) via Box–Muller.
pub fn normal_sample(seed: u64, n: usize, mean: f64, sd: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen();
            mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
        })
        .collect()
}

/// `n` draws from LogNormal(mu, sigma) of the underlying normal.
pub fn lognormal_sample(seed: u64, n: usize, mu: f64, sigma: f64) -> Vec<f64> {
    normal_sample(seed, n, mu, sigma)
        .into_iter()
        .map(f64::exp)
        .collect()
}
