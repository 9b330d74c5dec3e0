//! NEON implementations for ARM (128-bit vectors, 2 x i64 / 4 x f32)
//!
//! NEON has no 64-bit lane multiply, so `mul_mod` and `dot_product` keep the
//! scalar reference. `vfmaq_f32` is fused, and `vminq_f32` (FMIN) treats
//! -0 as smaller than +0 and propagates NaN.

use crate::arch::Arch;
use crate::simd::VectorKernels;
#[cfg(target_arch = "aarch64")]
use crate::{
    error::{check_len, Result},
    simd::check_binary,
};

/// NEON vector width in i64 lanes
pub const NEON_I64_LANES: usize = 2;

/// NEON vector width in f32 lanes
pub const NEON_F32_LANES: usize = 4;

/// The NEON code path; NEON is mandatory on aarch64.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeonKernels;

#[cfg(target_arch = "aarch64")]
impl VectorKernels for NeonKernels {
    fn arch(&self) -> Arch {
        Arch::Neon
    }

    fn fuses_mul_add(&self) -> bool {
        true
    }

    fn add_mod(&self, a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) -> Result<()> {
        check_binary(a, b, out)?;
        // SAFETY: neon is part of the aarch64 baseline; lengths are checked.
        unsafe { imp::add_mod(a, b, modulus, out) };
        Ok(())
    }

    fn infinity_norm(&self, v: &[i64]) -> i64 {
        // SAFETY: as above.
        unsafe { imp::infinity_norm(v) }
    }

    fn add_f32(&self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        // SAFETY: as above.
        unsafe { imp::add_f32(a, b, out) };
        Ok(())
    }

    fn mul_add_f32(&self, a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        check_len(a.len(), c.len())?;
        // SAFETY: as above.
        unsafe { imp::mul_add_f32(a, b, c, out) };
        Ok(())
    }

    fn min_f32(&self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        // SAFETY: as above.
        unsafe { imp::min_f32(a, b, out) };
        Ok(())
    }

    fn sum_f32(&self, v: &[f32]) -> f32 {
        // SAFETY: as above.
        unsafe { imp::sum_f32(v) }
    }
}

#[cfg(not(target_arch = "aarch64"))]
impl VectorKernels for NeonKernels {
    fn arch(&self) -> Arch {
        Arch::Neon
    }
}

/// Scalar equivalent of FMIN for one lane
#[cfg(target_arch = "aarch64")]
fn fmin_lane(x: f32, y: f32) -> f32 {
    if x.is_nan() || y.is_nan() {
        f32::NAN
    } else if x == y {
        if x.is_sign_negative() {
            x
        } else {
            y
        }
    } else if x < y {
        x
    } else {
        y
    }
}

#[cfg(target_arch = "aarch64")]
mod imp {
    use super::{fmin_lane, NEON_F32_LANES as F32_LANES, NEON_I64_LANES as I64_LANES};
    use crate::simd::scalar_fallback;
    use std::arch::aarch64::*;

    /// Balanced modular addition, two `i64` lanes at a time
    ///
    /// # Safety
    /// - NEON must be available (always true on aarch64 Linux and macOS)
    /// - `b` and `out` must be at least as long as `a`
    ///
    /// # Mathematical Implementation
    /// Same single correction step as the scalar reference: lanes above
    /// `q/2` lose `q`, lanes below `q/2 - q + 1` gain `q`. `vbslq_s64`
    /// selects between the corrected and uncorrected sum.
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn add_mod(a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) {
        let full = a.len() - a.len() % I64_LANES;
        let half = modulus / 2;
        let q = vdupq_n_s64(modulus);
        let upper = vdupq_n_s64(half);
        let lower = vdupq_n_s64(half - modulus + 1);

        let mut i = 0;
        while i < full {
            let sum = vaddq_s64(vld1q_s64(a.as_ptr().add(i)), vld1q_s64(b.as_ptr().add(i)));
            let sum = vbslq_s64(vcgtq_s64(sum, upper), vsubq_s64(sum, q), sum);
            let sum = vbslq_s64(vcltq_s64(sum, lower), vaddq_s64(sum, q), sum);
            vst1q_s64(out.as_mut_ptr().add(i), sum);
            i += I64_LANES;
        }
        scalar_fallback::add_mod(&a[full..], &b[full..], modulus, &mut out[full..]);
    }

    /// # Safety
    /// NEON must be available.
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn infinity_norm(v: &[i64]) -> i64 {
        let full = v.len() - v.len() % I64_LANES;
        let mut max = vdupq_n_s64(0);
        let mut i = 0;
        while i < full {
            // ABS wraps on i64::MIN like `wrapping_abs`
            let abs = vabsq_s64(vld1q_s64(v.as_ptr().add(i)));
            max = vbslq_s64(vcgtq_s64(abs, max), abs, max);
            i += I64_LANES;
        }

        let mut lanes = [0i64; I64_LANES];
        vst1q_s64(lanes.as_mut_ptr(), max);
        lanes[0]
            .max(lanes[1])
            .max(scalar_fallback::infinity_norm(&v[full..]))
    }

    /// # Safety
    /// - NEON must be available
    /// - `b` and `out` must be at least as long as `a`
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn add_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % F32_LANES;
        let mut i = 0;
        while i < full {
            let sum = vaddq_f32(vld1q_f32(a.as_ptr().add(i)), vld1q_f32(b.as_ptr().add(i)));
            vst1q_f32(out.as_mut_ptr().add(i), sum);
            i += F32_LANES;
        }
        scalar_fallback::add_f32(&a[full..], &b[full..], &mut out[full..]);
    }

    /// `vfmaq_f32` rounds once, so the result matches `f32::mul_add`
    ///
    /// # Safety
    /// - NEON must be available
    /// - `b`, `c` and `out` must be at least as long as `a`
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn mul_add_f32(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % F32_LANES;
        let mut i = 0;
        while i < full {
            let va = vld1q_f32(a.as_ptr().add(i));
            let vb = vld1q_f32(b.as_ptr().add(i));
            let vc = vld1q_f32(c.as_ptr().add(i));
            vst1q_f32(out.as_mut_ptr().add(i), vfmaq_f32(vc, va, vb));
            i += F32_LANES;
        }
        for j in full..a.len() {
            out[j] = a[j].mul_add(b[j], c[j]);
        }
    }

    /// FMIN semantics: NaN propagates, -0 is less than +0
    ///
    /// # Safety
    /// - NEON must be available
    /// - `b` and `out` must be at least as long as `a`
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn min_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % F32_LANES;
        let mut i = 0;
        while i < full {
            let min = vminq_f32(vld1q_f32(a.as_ptr().add(i)), vld1q_f32(b.as_ptr().add(i)));
            vst1q_f32(out.as_mut_ptr().add(i), min);
            i += F32_LANES;
        }
        for j in full..a.len() {
            out[j] = fmin_lane(a[j], b[j]);
        }
    }

    /// # Safety
    /// NEON must be available.
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn sum_f32(v: &[f32]) -> f32 {
        let full = v.len() - v.len() % F32_LANES;
        let mut acc = vdupq_n_f32(0.0);
        let mut i = 0;
        while i < full {
            acc = vaddq_f32(acc, vld1q_f32(v.as_ptr().add(i)));
            i += F32_LANES;
        }
        let mut total = vaddvq_f32(acc);
        for &x in &v[full..] {
            total += x;
        }
        total
    }
}

#[cfg(all(test, target_arch = "aarch64"))]
mod tests {
    use super::*;

    #[test]
    fn test_min_prefers_negative_zero() {
        let a = [0.0f32, -0.0, 3.0, 0.0, 0.0];
        let b = [-0.0f32, 0.0, 2.0, -0.0, -0.0];
        let mut out = [1.0f32; 5];
        NeonKernels.min_f32(&a, &b, &mut out).unwrap();
        assert!(out[0].is_sign_negative());
        assert!(out[1].is_sign_negative());
        assert_eq!(out[2], 2.0);
        assert!(out[4].is_sign_negative());
    }

    #[test]
    fn test_infinity_norm_with_odd_length() {
        assert_eq!(NeonKernels.infinity_norm(&[1, -2, 7, 3, -8]), 8);
    }
}
