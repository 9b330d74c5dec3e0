//! Builtin test cases exercising the vector kernels
//!
//! Every case regenerates its inputs from the configured seed on each call,
//! so all implementations see identical data.

use crate::error::Result;
use crate::push_result;
use crate::results::TestResultsSet;
use crate::simd::{scalar_fallback, VectorKernels};
use crate::vector_type::VectorType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Prime modulus used by the modular arithmetic case
pub const MODULUS: i64 = 1_000_000_007;

/// Vector lengths covering empty tails and tails on every lane width
const LENGTHS: [usize; 5] = [1, 3, 8, 13, 33];

type CaseFn = dyn Fn(&dyn VectorKernels, &mut TestResultsSet) -> Result<()> + Send + Sync;

/// A named block of test code run once per implementation
pub struct ParityCase {
    pub name: &'static str,
    run: Box<CaseFn>,
}

impl ParityCase {
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: Fn(&dyn VectorKernels, &mut TestResultsSet) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name,
            run: Box::new(run),
        }
    }

    /// Executes the case against `kernels`, recording into `set`
    pub fn run(&self, kernels: &dyn VectorKernels, set: &mut TestResultsSet) -> Result<()> {
        (self.run)(kernels, set)
    }
}

impl std::fmt::Debug for ParityCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParityCase").field("name", &self.name).finish()
    }
}

/// The builtin cases with inputs derived from `seed`
pub fn builtin(seed: u64) -> Vec<ParityCase> {
    vec![
        ParityCase::new("modular_arithmetic", move |kernels, set| {
            modular_arithmetic(kernels, set, seed)
        }),
        ParityCase::new("float_arithmetic", move |kernels, set| {
            float_arithmetic(kernels, set, seed)
        }),
        ParityCase::new("multiply_add", move |kernels, set| {
            multiply_add(kernels, set, seed)
        }),
    ]
}

fn balanced_vec(rng: &mut ChaCha8Rng, len: usize, modulus: i64) -> Vec<i64> {
    (0..len)
        .map(|_| rng.gen_range(-(modulus / 2)..=modulus / 2))
        .collect()
}

fn f32_vec(rng: &mut ChaCha8Rng, len: usize, low: f32, high: f32) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(low..high)).collect()
}

fn modular_arithmetic(
    kernels: &dyn VectorKernels,
    set: &mut TestResultsSet,
    seed: u64,
) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for modulus in [13, MODULUS] {
        for len in LENGTHS {
            let a = balanced_vec(&mut rng, len, modulus);
            let b = balanced_vec(&mut rng, len, modulus);
            let mut out = vec![0i64; len];

            kernels.add_mod(&a, &b, modulus, &mut out)?;
            set.push_values(&out[..]);
            kernels.mul_mod(&a, &b, modulus, &mut out)?;
            set.push_values(&out[..]);
        }
    }

    for len in LENGTHS {
        let mut v: Vec<i64> = (0..len).map(|_| rng.gen()).collect();
        let w: Vec<i64> = (0..len).map(|_| rng.gen()).collect();

        push_result!(set, VectorType::Int64, 1).set_value(0, kernels.infinity_norm(&v));
        push_result!(set, VectorType::Int64, 1).set_value(0, kernels.dot_product(&v, &w)?);

        v[len / 2] = i64::MIN;
        push_result!(set, VectorType::Int64, 1).set_value(0, kernels.infinity_norm(&v));
    }
    Ok(())
}

fn float_arithmetic(kernels: &dyn VectorKernels, set: &mut TestResultsSet, seed: u64) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xf10a7);

    for len in LENGTHS {
        let a = f32_vec(&mut rng, len, -100.0, 100.0);
        let b = f32_vec(&mut rng, len, -100.0, 100.0);
        let mut out = vec![0.0f32; len];
        kernels.add_f32(&a, &b, &mut out)?;
        set.push_values(&out[..]);
    }

    // min of equal operands may pick either zero
    set.set_fp_zero_equal();
    let mut a = f32_vec(&mut rng, 29, -4.0, 4.0);
    let mut b = f32_vec(&mut rng, 29, -4.0, 4.0);
    for (x, y) in [(0.0, -0.0), (-0.0, 0.0), (1.0, 1.0), (-2.5, -2.5), (0.0, 0.0)] {
        a.push(x);
        b.push(y);
    }
    let mut out = vec![0.0f32; a.len()];
    kernels.min_f32(&a, &b, &mut out)?;
    set.push_values(&out[..]);
    set.unset_fp_zero_equal();

    // summation order differs per lane width
    set.set_precision(64);
    for len in LENGTHS {
        let v = f32_vec(&mut rng, len, 0.5, 1.0);
        set.push_values(&[kernels.sum_f32(&v)][..]);
    }
    let v = f32_vec(&mut rng, 37, 0.5, 1.0);
    set.push_values(&[kernels.sum_f32(&v)][..]);
    set.unset_precision();

    Ok(())
}

fn multiply_add(kernels: &dyn VectorKernels, set: &mut TestResultsSet, seed: u64) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xfa);
    let len = 37;
    let a = f32_vec(&mut rng, len, 1.0, 2.0);
    let b = f32_vec(&mut rng, len, 1.0, 2.0);
    let c = f32_vec(&mut rng, len, 1.0, 2.0);
    let mut out = vec![0.0f32; len];

    // fused and unfused agree within one rounding of the product
    set.set_precision(2);
    kernels.mul_add_f32(&a, &b, &c, &mut out)?;
    set.push_values(&out[..]);
    set.unset_precision();

    // a*b - round(a*b) is the exact rounding error of the product. Fused
    // kernels compute it directly, the others through a correctly rounded
    // scalar fma, so every implementation must push the same bits.
    set.sync_archs();
    let mut product = vec![0.0f32; len];
    let zero = vec![0.0f32; len];
    scalar_fallback::mul_add_f32(&a, &b, &zero, &mut product);
    let negated: Vec<f32> = product.iter().map(|p| -p).collect();
    if kernels.fuses_mul_add() {
        kernels.mul_add_f32(&a, &b, &negated, &mut out)?;
    } else {
        for (((dst, &x), &y), &z) in out.iter_mut().zip(&a).zip(&b).zip(&negated) {
            *dst = x.mul_add(y, z);
        }
    }
    set.push_values(&out[..]);
    set.sync_archs();

    Ok(())
}
