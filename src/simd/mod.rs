//! Vector kernels under differential test
//!
//! Every supported instruction set provides the same logical operations
//! through the [`VectorKernels`] trait. The scalar fallback is the reference;
//! accelerated variants process full vector lanes with intrinsics and finish
//! the tail with scalar code.
//!
//! Expected agreement with the scalar reference:
//! - Modular arithmetic, norms and dot products are bit-exact
//! - Element-wise float addition is bit-exact (IEEE-754 round to nearest)
//! - `min_f32` may differ in the sign of zero results
//! - `sum_f32` differs by summation order and needs a ULP allowance
//! - `mul_add_f32` is fused on some instruction sets and differs by a few ULP

pub mod avx2;
pub mod neon;
pub mod scalar_fallback;
pub mod sse2;

use crate::arch::Arch;
use crate::error::{check_len, Result};

/// Operations every implementation under test provides
///
/// The provided method bodies are the scalar reference. An accelerated
/// implementation overrides the operations it vectorizes and inherits the
/// reference for the rest.
pub trait VectorKernels: Sync {
    /// Code path this table belongs to
    fn arch(&self) -> Arch;

    /// Whether `mul_add_f32` rounds once (fused) instead of twice
    fn fuses_mul_add(&self) -> bool {
        false
    }

    /// Modular addition: out[i] = (a[i] + b[i]) mod modulus, balanced
    ///
    /// Inputs are expected in balanced representation, see
    /// [`scalar_fallback::balance`].
    fn add_mod(&self, a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) -> Result<()> {
        check_binary(a, b, out)?;
        scalar_fallback::add_mod(a, b, modulus, out);
        Ok(())
    }

    /// Modular multiplication with 128-bit intermediates
    fn mul_mod(&self, a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) -> Result<()> {
        check_binary(a, b, out)?;
        scalar_fallback::mul_mod(a, b, modulus, out);
        Ok(())
    }

    /// Maximum wrapping absolute value, 0 for an empty vector
    fn infinity_norm(&self, v: &[i64]) -> i64 {
        scalar_fallback::infinity_norm(v)
    }

    /// Wrapping dot product
    fn dot_product(&self, a: &[i64], b: &[i64]) -> Result<i64> {
        check_len(a.len(), b.len())?;
        Ok(scalar_fallback::dot_product(a, b))
    }

    fn add_f32(&self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        scalar_fallback::add_f32(a, b, out);
        Ok(())
    }

    /// out[i] = a[i] * b[i] + c[i]
    fn mul_add_f32(&self, a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        check_len(a.len(), c.len())?;
        scalar_fallback::mul_add_f32(a, b, c, out);
        Ok(())
    }

    fn min_f32(&self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        scalar_fallback::min_f32(a, b, out);
        Ok(())
    }

    fn sum_f32(&self, v: &[f32]) -> f32 {
        scalar_fallback::sum_f32(v)
    }
}

/// Validates the operands of an element-wise binary operation
pub(crate) fn check_binary<T>(a: &[T], b: &[T], out: &[T]) -> Result<()> {
    check_len(a.len(), b.len())?;
    check_len(a.len(), out.len())
}
