//! Scalar reference implementations
//!
//! These are the fallbacks used when no SIMD instruction set is available and
//! the reference every accelerated variant is compared against. They use
//! plain sequential loops so that their rounding behaviour is the textbook
//! one: one rounding per arithmetic operation, left-to-right summation.

use crate::arch::Arch;
use crate::simd::VectorKernels;

/// The portable scalar code path
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernels;

impl VectorKernels for ScalarKernels {
    fn arch(&self) -> Arch {
        Arch::Scalar
    }
}

/// Reduces `value` into balanced representation modulo `modulus`
///
/// The balanced range is `[⌊q/2⌋ - q + 1, ⌊q/2⌋]`, i.e. `[-⌊q/2⌋, ⌊q/2⌋]`
/// for odd moduli.
pub fn balance(value: i64, modulus: i64) -> i64 {
    let reduced = value.rem_euclid(modulus);
    if reduced > modulus / 2 {
        reduced - modulus
    } else {
        reduced
    }
}

/// out[i] = (a[i] + b[i]) mod modulus in balanced representation
pub fn add_mod(a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) {
    let q = modulus as i128;
    for ((dst, &x), &y) in out.iter_mut().zip(a).zip(b) {
        let reduced = (x as i128 + y as i128).rem_euclid(q) as i64;
        *dst = if reduced > modulus / 2 {
            reduced - modulus
        } else {
            reduced
        };
    }
}

/// out[i] = (a[i] * b[i]) mod modulus in balanced representation
///
/// Uses 128-bit intermediate arithmetic to prevent overflow.
pub fn mul_mod(a: &[i64], b: &[i64], modulus: i64, out: &mut [i64]) {
    let q = modulus as i128;
    for ((dst, &x), &y) in out.iter_mut().zip(a).zip(b) {
        let reduced = (x as i128 * y as i128).rem_euclid(q) as i64;
        *dst = if reduced > modulus / 2 {
            reduced - modulus
        } else {
            reduced
        };
    }
}

/// max_i |v[i]|, starting from 0; `i64::MIN` keeps its wrapping absolute value
pub fn infinity_norm(v: &[i64]) -> i64 {
    v.iter().fold(0i64, |max, &x| max.max(x.wrapping_abs()))
}

pub fn dot_product(a: &[i64], b: &[i64]) -> i64 {
    a.iter()
        .zip(b)
        .fold(0i64, |acc, (&x, &y)| acc.wrapping_add(x.wrapping_mul(y)))
}

pub fn add_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((dst, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *dst = x + y;
    }
}

/// Unfused multiply-add: the product is rounded before the addition
pub fn mul_add_f32(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
    for (((dst, &x), &y), &z) in out.iter_mut().zip(a).zip(b).zip(c) {
        *dst = x * y + z;
    }
}

/// IEEE minNum: NaN operands are ignored, the sign of a zero result is unspecified
pub fn min_f32(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((dst, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *dst = x.min(y);
    }
}

/// Left-to-right sum starting from +0.0
pub fn sum_f32(v: &[f32]) -> f32 {
    v.iter().fold(0.0f32, |acc, &x| acc + x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_balance_range() {
        assert_eq!(balance(0, 7), 0);
        assert_eq!(balance(3, 7), 3);
        assert_eq!(balance(4, 7), -3);
        assert_eq!(balance(-4, 7), 3);
        assert_eq!(balance(4, 8), 4);
        assert_eq!(balance(5, 8), -3);
    }

    #[test]
    fn test_modular_arithmetic() {
        let a = vec![1i64, 2, 3, 4, 5, 6, 7, 8];
        let b = vec![8i64, 7, 6, 5, 4, 3, 2, 1];
        let mut result = vec![0i64; 8];

        add_mod(&a, &b, 1_000_000_007, &mut result);
        assert!(result.iter().all(|&v| v == 9));

        add_mod(&[3, -3], &[1, -1], 7, &mut result[..2]);
        assert_eq!(&result[..2], &[-3, 3]);

        mul_mod(&[3, -3], &[3, 2], 7, &mut result[..2]);
        assert_eq!(&result[..2], &[2, 1]);
    }

    #[test]
    fn test_norms_and_dot_product() {
        let vector = vec![3i64, -4, 0, 5, -2];
        assert_eq!(infinity_norm(&vector), 5);
        assert_eq!(infinity_norm(&[]), 0);
        assert_eq!(infinity_norm(&[i64::MIN]), 0);

        assert_eq!(dot_product(&[1, 2, 3, 4], &[5, 6, 7, 8]), 70);
        assert_eq!(dot_product(&[i64::MAX, 1], &[2, 2]), 0);
    }

    #[test]
    fn test_float_kernels() {
        let mut out = [0.0f32; 3];
        add_f32(&[1.0, 2.0, -0.0], &[0.5, -2.0, -0.0], &mut out);
        assert_eq!(out, [1.5, 0.0, -0.0]);
        assert!(out[2].is_sign_negative());

        mul_add_f32(&[2.0, 3.0, 0.5], &[4.0, -1.0, 0.5], &[1.0, 3.0, 0.0], &mut out);
        assert_eq!(out, [9.0, 0.0, 0.25]);

        min_f32(&[1.0, f32::NAN, 5.0], &[2.0, 7.0, -5.0], &mut out);
        assert_eq!(out, [1.0, 7.0, -5.0]);

        assert_eq!(sum_f32(&[]).to_bits(), 0.0f32.to_bits());
        assert_eq!(sum_f32(&[1.0, 2.0, 3.5]), 6.5);
    }

    proptest! {
        #[test]
        fn test_balance_stays_in_range(value in any::<i64>(), modulus in 2i64..1_000_000) {
            let balanced = balance(value, modulus);
            prop_assert!(balanced <= modulus / 2);
            prop_assert!(balanced > modulus / 2 - modulus);
            prop_assert_eq!((balanced as i128 - value as i128).rem_euclid(modulus as i128), 0);
        }
    }
}
