//! SSE2 implementations (128-bit vectors, 4 x f32)
//!
//! SSE2 has no 64-bit integer compare, so the modular and norm kernels use
//! the scalar reference; only the floating-point kernels are vectorized.
//! `min_f32` follows `minps` semantics: the second operand is returned when
//! the operands compare equal (so `min(+0, -0) == -0`) or either is NaN.

use crate::arch::Arch;
use crate::simd::VectorKernels;
#[cfg(target_arch = "x86_64")]
use crate::{
    error::{check_len, Result},
    simd::check_binary,
};

/// SSE2 vector width in f32 lanes
pub const SSE2_F32_LANES: usize = 4;

/// The SSE2 code path
///
/// SSE2 is part of the x86_64 baseline, so this table is always safe to use
/// on that architecture.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sse2Kernels;

#[cfg(target_arch = "x86_64")]
impl VectorKernels for Sse2Kernels {
    fn arch(&self) -> Arch {
        Arch::Sse2
    }

    fn add_f32(&self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
        check_binary(a, b, out)?;
        // SAFETY: SSE2 is always available on x86_64 and lengths are checked.
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
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { imp::sum_f32(v) }
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl VectorKernels for Sse2Kernels {
    fn arch(&self) -> Arch {
        Arch::Sse2
    }
}

/// Scalar equivalent of `minps` for one lane
#[cfg(target_arch = "x86_64")]
fn minps_lane(x: f32, y: f32) -> f32 {
    if x < y {
        x
    } else {
        y
    }
}

#[cfg(target_arch = "x86_64")]
mod imp {
    use super::{minps_lane, SSE2_F32_LANES as LANES};
    use crate::simd::scalar_fallback;
    use std::arch::x86_64::*;

    /// Element-wise `addps` over full lanes, scalar tail
    ///
    /// # Safety
    /// - `b` and `out` must be at least as long as `a`; the loads and stores
    ///   are unchecked
    ///
    /// SSE2 is part of the x86_64 baseline, so no feature check is needed.
    pub(super) unsafe fn add_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % LANES;
        let mut i = 0;
        while i < full {
            let va = _mm_loadu_ps(a.as_ptr().add(i));
            let vb = _mm_loadu_ps(b.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_add_ps(va, vb));
            i += LANES;
        }
        scalar_fallback::add_f32(&a[full..], &b[full..], &mut out[full..]);
    }

    /// Unfused: `mulps` then `addps`, matching the scalar rounding.
    ///
    /// # Safety
    /// `b`, `c` and `out` must be at least as long as `a`.
    pub(super) unsafe fn mul_add_f32(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % LANES;
        let mut i = 0;
        while i < full {
            let va = _mm_loadu_ps(a.as_ptr().add(i));
            let vb = _mm_loadu_ps(b.as_ptr().add(i));
            let vc = _mm_loadu_ps(c.as_ptr().add(i));
            let product = _mm_mul_ps(va, vb);
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_add_ps(product, vc));
            i += LANES;
        }
        scalar_fallback::mul_add_f32(&a[full..], &b[full..], &c[full..], &mut out[full..]);
    }

    /// # Safety
    /// `b` and `out` must be at least as long as `a`.
    pub(super) unsafe fn min_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % LANES;
        let mut i = 0;
        while i < full {
            let va = _mm_loadu_ps(a.as_ptr().add(i));
            let vb = _mm_loadu_ps(b.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_min_ps(va, vb));
            i += LANES;
        }
        for j in full..a.len() {
            out[j] = minps_lane(a[j], b[j]);
        }
    }

    /// Four running partial sums, combined pairwise, then the tail in order.
    ///
    /// # Safety
    /// Always sound on x86_64; `unsafe` only because of the intrinsics.
    pub(super) unsafe fn sum_f32(v: &[f32]) -> f32 {
        let full = v.len() - v.len() % LANES;
        let mut acc = _mm_setzero_ps();
        let mut i = 0;
        while i < full {
            acc = _mm_add_ps(acc, _mm_loadu_ps(v.as_ptr().add(i)));
            i += LANES;
        }
        let mut lanes = [0.0f32; LANES];
        _mm_storeu_ps(lanes.as_mut_ptr(), acc);
        let mut total = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for &x in &v[full..] {
            total += x;
        }
        total
    }
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::simd::scalar_fallback;

    #[test]
    fn test_min_returns_second_operand_for_equal_zeros() {
        let a = [0.0f32, -0.0, 1.0, 0.0, -0.0];
        let b = [-0.0f32, 0.0, 2.0, -0.0, 0.0];
        let mut out = [1.0f32; 5];
        Sse2Kernels.min_f32(&a, &b, &mut out).unwrap();

        assert!(out[0].is_sign_negative());
        assert!(out[1].is_sign_positive());
        assert_eq!(out[2], 1.0);
        // tail lane follows the same rule
        assert!(out[4].is_sign_positive());
    }

    #[test]
    fn test_sum_is_pairwise_over_lanes() {
        let v = [1.0e8f32, 1.0, -1.0e8, 1.0, 0.5];
        // lanes: (1e8 + 1) + (-1e8 + 1) rounds differently from a sequential sum
        let expected = ((1.0e8f32 + 1.0) + (-1.0e8f32 + 1.0)) + 0.5;
        assert_eq!(Sse2Kernels.sum_f32(&v), expected);
        assert_eq!(scalar_fallback::sum_f32(&v), 1.5);
    }

    #[test]
    fn test_mul_add_is_unfused() {
        let a = vec![1.0f32 + f32::EPSILON; 9];
        let b = vec![1.0f32 - f32::EPSILON; 9];
        let c = vec![-1.0f32; 9];
        let mut expected = vec![0.0f32; 9];
        let mut actual = vec![0.0f32; 9];
        scalar_fallback::mul_add_f32(&a, &b, &c, &mut expected);
        Sse2Kernels.mul_add_f32(&a, &b, &c, &mut actual).unwrap();
        assert_eq!(actual, expected);
        assert!(!Sse2Kernels.fuses_mul_add());
    }
}
