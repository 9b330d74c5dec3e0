//! AVX2 + FMA implementations (256-bit vectors, 4 x i64 / 8 x f32)
//!
//! Modular addition uses a compare-and-correct sequence instead of a
//! division, which is only valid for inputs already in balanced
//! representation. `mul_add_f32` is fused and rounds once.

use crate::arch::Arch;
use crate::simd::VectorKernels;
#[cfg(target_arch = "x86_64")]
use crate::{
    error::{check_len, Result},
    simd::check_binary,
};

/// AVX2 vector width in i64 lanes
pub const AVX2_I64_LANES: usize = 4;

/// AVX2 vector width in f32 lanes
pub const AVX2_F32_LANES: usize = 8;

/// The AVX2 + FMA code path
///
/// Cannot be constructed outside the crate: the only instance is handed out
/// by [`Arch::kernels`] after runtime detection succeeded.
#[derive(Debug)]
pub struct Avx2Kernels(());

pub(crate) static AVX2_KERNELS: Avx2Kernels = Avx2Kernels(());

#[cfg(target_arch = "x86_64")]
impl VectorKernels for Avx2Kernels {
    fn arch(&self) -> Arch {
        Arch::Avx2
    }

    fn fuses_mul_add(&self) -> bool {
        true
    }

    fn add_mod(&self, a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) -> Result<()> {
        check_binary(a, b, out)?;
        // SAFETY: instances only exist after avx2 and fma were detected.
        unsafe { imp::add_mod(a, b, modulus, out) };
        Ok(())
    }

    fn infinity_norm(&self, v: &[i64]) -> i64 {
        // SAFETY: as above.
        unsafe { imp::infinity_norm(v) }
    }

    fn dot_product(&self, a: &[i64], b: &[i64]) -> Result<i64> {
        check_len(a.len(), b.len())?;
        // SAFETY: as above.
        Ok(unsafe { imp::dot_product(a, b) })
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

#[cfg(not(target_arch = "x86_64"))]
impl VectorKernels for Avx2Kernels {
    fn arch(&self) -> Arch {
        Arch::Avx2
    }
}

#[cfg(target_arch = "x86_64")]
mod imp {
    use super::{AVX2_F32_LANES as F32_LANES, AVX2_I64_LANES as I64_LANES};
    use crate::simd::scalar_fallback;
    use std::arch::x86_64::*;

    /// Balanced modular addition, four `i64` lanes at a time
    ///
    /// # Arguments
    /// * `a`, `b` - operands in balanced representation `[-q/2, q/2]`
    /// * `modulus` - odd modulus `q`
    /// * `out` - destination, same length as `a`
    ///
    /// # Safety
    /// - The CPU must support AVX2
    /// - `b` and `out` must be at least as long as `a`
    ///
    /// # Mathematical Implementation
    /// With balanced inputs the raw sum lies in `[-q + 1, q - 1]`, so one
    /// correction step suffices:
    /// 1. `sum > q/2` selects lanes that get `q` subtracted
    /// 2. `sum < q/2 - q + 1` selects lanes that get `q` added
    ///
    /// Both masks come from `vpcmpgtq` and are applied with `vpand`, so the
    /// loop has no branches.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn add_mod(a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) {
        let full = a.len() - a.len() % I64_LANES;
        let half = modulus / 2;
        let q = _mm256_set1_epi64x(modulus);
        let upper = _mm256_set1_epi64x(half);
        let lower = _mm256_set1_epi64x(half - modulus + 1);

        let mut i = 0;
        while i < full {
            let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
            let sum = _mm256_add_epi64(va, vb);

            let too_high = _mm256_cmpgt_epi64(sum, upper);
            let sum = _mm256_sub_epi64(sum, _mm256_and_si256(too_high, q));
            let too_low = _mm256_cmpgt_epi64(lower, sum);
            let sum = _mm256_add_epi64(sum, _mm256_and_si256(too_low, q));

            _mm256_storeu_si256(out.as_mut_ptr().add(i) as *mut __m256i, sum);
            i += I64_LANES;
        }
        scalar_fallback::add_mod(&a[full..], &b[full..], modulus, &mut out[full..]);
    }

    /// Wrapping absolute values via a blend of `x` and `0 - x`
    ///
    /// # Safety
    /// The CPU must support AVX2.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn infinity_norm(v: &[i64]) -> i64 {
        let full = v.len() - v.len() % I64_LANES;
        let zero = _mm256_setzero_si256();
        let mut max = zero;

        let mut i = 0;
        while i < full {
            let x = _mm256_loadu_si256(v.as_ptr().add(i) as *const __m256i);
            let negated = _mm256_sub_epi64(zero, x);
            let is_negative = _mm256_cmpgt_epi64(zero, x);
            let abs = _mm256_blendv_epi8(x, negated, is_negative);
            let greater = _mm256_cmpgt_epi64(abs, max);
            max = _mm256_blendv_epi8(max, abs, greater);
            i += I64_LANES;
        }

        let mut lanes = [0i64; I64_LANES];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, max);
        let vector_max = lanes.iter().copied().fold(0i64, i64::max);
        vector_max.max(scalar_fallback::infinity_norm(&v[full..]))
    }

    /// 64-bit lane products from three 32x32 partial products; the high
    /// halves only matter modulo 2^64, so signed inputs wrap correctly.
    ///
    /// # Safety
    /// - The CPU must support AVX2
    /// - `b` must be at least as long as `a`
    ///
    /// # Mathematical Implementation
    /// Writing `x = xh * 2^32 + xl`, modulo 2^64:
    /// `x * y = xl * yl + ((xl * yh + xh * yl) << 32)`
    ///
    /// `xh * yh` is shifted out entirely. `vpmuludq` provides each 32x32
    /// product as a full 64-bit lane.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn dot_product(a: &[i64], b: &[i64]) -> i64 {
        let full = a.len() - a.len() % I64_LANES;
        let mut acc = _mm256_setzero_si256();

        let mut i = 0;
        while i < full {
            let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
            let a_hi = _mm256_srli_epi64(va, 32);
            let b_hi = _mm256_srli_epi64(vb, 32);

            let lo_lo = _mm256_mul_epu32(va, vb);
            let lo_hi = _mm256_mul_epu32(va, b_hi);
            let hi_lo = _mm256_mul_epu32(a_hi, vb);
            let cross = _mm256_slli_epi64(_mm256_add_epi64(lo_hi, hi_lo), 32);

            acc = _mm256_add_epi64(acc, _mm256_add_epi64(lo_lo, cross));
            i += I64_LANES;
        }

        let mut lanes = [0i64; I64_LANES];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc);
        lanes
            .iter()
            .fold(scalar_fallback::dot_product(&a[full..], &b[full..]), |sum, &x| {
                sum.wrapping_add(x)
            })
    }

    /// # Safety
    /// - The CPU must support AVX2
    /// - `b` and `out` must be at least as long as `a`
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn add_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % F32_LANES;
        let mut i = 0;
        while i < full {
            let va = _mm256_loadu_ps(a.as_ptr().add(i));
            let vb = _mm256_loadu_ps(b.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_add_ps(va, vb));
            i += F32_LANES;
        }
        scalar_fallback::add_f32(&a[full..], &b[full..], &mut out[full..]);
    }

    /// Fused multiply-add: every element is rounded once
    ///
    /// # Safety
    /// - The CPU must support AVX2 and FMA
    /// - `b`, `c` and `out` must be at least as long as `a`
    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn mul_add_f32(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % F32_LANES;
        let mut i = 0;
        while i < full {
            let va = _mm256_loadu_ps(a.as_ptr().add(i));
            let vb = _mm256_loadu_ps(b.as_ptr().add(i));
            let vc = _mm256_loadu_ps(c.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_fmadd_ps(va, vb, vc));
            i += F32_LANES;
        }
        // tail stays fused so every lane rounds the same way
        for j in full..a.len() {
            out[j] = a[j].mul_add(b[j], c[j]);
        }
    }

    /// `vminps` semantics: the second operand wins on NaN and on equal zeros
    ///
    /// # Safety
    /// - The CPU must support AVX2
    /// - `b` and `out` must be at least as long as `a`
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn min_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
        let full = a.len() - a.len() % F32_LANES;
        let mut i = 0;
        while i < full {
            let va = _mm256_loadu_ps(a.as_ptr().add(i));
            let vb = _mm256_loadu_ps(b.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_min_ps(va, vb));
            i += F32_LANES;
        }
        for j in full..a.len() {
            out[j] = if a[j] < b[j] { a[j] } else { b[j] };
        }
    }

    /// # Safety
    /// The CPU must support AVX2.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn sum_f32(v: &[f32]) -> f32 {
        let full = v.len() - v.len() % F32_LANES;
        let mut acc = _mm256_setzero_ps();
        let mut i = 0;
        while i < full {
            acc = _mm256_add_ps(acc, _mm256_loadu_ps(v.as_ptr().add(i)));
            i += F32_LANES;
        }

        let mut lanes = [0.0f32; F32_LANES];
        _mm256_storeu_ps(lanes.as_mut_ptr(), acc);
        let low = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        let high = (lanes[4] + lanes[5]) + (lanes[6] + lanes[7]);
        let mut total = low + high;
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

    fn kernels() -> Option<&'static dyn VectorKernels> {
        Arch::Avx2.kernels().ok()
    }

    #[test]
    fn test_dot_product_wraps_like_scalar() {
        let Some(kernels) = kernels() else { return };
        let a = [i64::MAX, -3, 1 << 40, i64::MIN, -(1 << 33) + 7, 5];
        let b = [2i64, -(1 << 35), 1 << 30, -1, 99, -11];
        assert_eq!(
            kernels.dot_product(&a, &b).unwrap(),
            scalar_fallback::dot_product(&a, &b)
        );
    }

    #[test]
    fn test_infinity_norm_handles_min() {
        let Some(kernels) = kernels() else { return };
        let v = [3i64, -9, 4, 1, 2];
        assert_eq!(kernels.infinity_norm(&v), 9);
        let v = [1i64, i64::MIN, 0, 0];
        assert_eq!(kernels.infinity_norm(&v), scalar_fallback::infinity_norm(&v));
    }

    #[test]
    fn test_mul_add_rounds_once() {
        let Some(kernels) = kernels() else { return };
        assert!(kernels.fuses_mul_add());

        // (1 + e)(1 - e) - 1 = -e^2, which the unfused form rounds away
        let a = vec![1.0f32 + f32::EPSILON; 9];
        let b = vec![1.0f32 - f32::EPSILON; 9];
        let c = vec![-1.0f32; 9];
        let mut out = vec![0.0f32; 9];
        kernels.mul_add_f32(&a, &b, &c, &mut out).unwrap();

        let fused = -(f32::EPSILON * f32::EPSILON);
        assert!(out.iter().all(|&v| v == fused), "{:?}", out);
        let mut unfused = vec![0.0f32; 9];
        scalar_fallback::mul_add_f32(&a, &b, &c, &mut unfused);
        assert!(unfused.iter().all(|&v| v == 0.0));
    }
}
