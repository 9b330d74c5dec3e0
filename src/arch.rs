//! Implementation identities and runtime capability detection
//!
//! Each [`Arch`] names one code path producing output vectors for the same
//! logical operations. Detection queries the CPU at runtime so that a single
//! binary only exercises the accelerated paths the host can execute.

use crate::error::{ParityError, Result};
use crate::simd::{self, VectorKernels};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// Portable scalar fallback, available everywhere
    Scalar,
    /// SSE2 (128-bit vectors, 4 x f32)
    Sse2,
    /// AVX2 with FMA (256-bit vectors, 8 x f32 / 4 x i64)
    Avx2,
    /// ARM NEON (128-bit vectors, 4 x f32 / 2 x i64)
    Neon,
}

impl Arch {
    pub const ALL: [Arch; 4] = [Arch::Scalar, Arch::Sse2, Arch::Avx2, Arch::Neon];

    pub const fn name(self) -> &'static str {
        match self {
            Arch::Scalar => "scalar",
            Arch::Sse2 => "sse2",
            Arch::Avx2 => "avx2",
            Arch::Neon => "neon",
        }
    }

    /// Whether this code path can execute on the current host
    pub fn is_supported(self) -> bool {
        match self {
            Arch::Scalar => true,
            Arch::Sse2 => detect_sse2(),
            Arch::Avx2 => detect_avx2(),
            Arch::Neon => detect_neon(),
        }
    }

    /// All code paths the current host can execute, scalar first
    pub fn available() -> Vec<Arch> {
        let archs: Vec<Arch> = Arch::ALL.into_iter().filter(|a| a.is_supported()).collect();
        tracing::info!(
            archs = %archs.iter().map(|a| a.name()).collect::<Vec<_>>().join(","),
            "detected implementations"
        );
        archs
    }

    /// Kernel table for this code path
    ///
    /// # Errors
    /// [`ParityError::UnsupportedArch`] when the host lacks the instruction set.
    pub fn kernels(self) -> Result<&'static dyn VectorKernels> {
        if !self.is_supported() {
            return Err(ParityError::UnsupportedArch(self));
        }
        let kernels: &'static dyn VectorKernels = match self {
            Arch::Scalar => &simd::scalar_fallback::ScalarKernels,
            Arch::Sse2 => &simd::sse2::Sse2Kernels,
            Arch::Avx2 => &simd::avx2::AVX2_KERNELS,
            Arch::Neon => &simd::neon::NeonKernels,
        };
        Ok(kernels)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = ParityError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Arch::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParityError::UnknownArch(wanted.to_string()))
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_sse2() -> bool {
    is_x86_feature_detected!("sse2")
}

#[cfg(target_arch = "x86_64")]
fn detect_avx2() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_sse2() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_avx2() -> bool {
    false
}

#[cfg(target_arch = "aarch64")]
fn detect_neon() -> bool {
    std::arch::is_aarch64_feature_detected!("neon")
}

#[cfg(not(target_arch = "aarch64"))]
fn detect_neon() -> bool {
    false
}
