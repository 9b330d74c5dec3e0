//! Element kinds of recorded result vectors
//!
//! The element kind fixes both the byte width of each element and the
//! comparison policy applied to it: integers must match bit for bit while
//! floating-point elements may be compared with a ULP tolerance.

use byteorder::{ByteOrder, NativeEndian};
use std::fmt;

/// Types of vector elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VectorType {
    Int8 = 0,
    UInt8,
    Int16,
    UInt16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
}

impl VectorType {
    /// All element kinds in declaration order
    pub const ALL: [VectorType; 10] = [
        VectorType::Int8,
        VectorType::UInt8,
        VectorType::Int16,
        VectorType::UInt16,
        VectorType::UInt32,
        VectorType::Int32,
        VectorType::UInt64,
        VectorType::Int64,
        VectorType::Float32,
        VectorType::Float64,
    ];

    /// Size of one element in bytes
    pub const fn el_size(self) -> usize {
        match self {
            VectorType::Int8 | VectorType::UInt8 => 1,
            VectorType::Int16 | VectorType::UInt16 => 2,
            VectorType::Int32 | VectorType::UInt32 | VectorType::Float32 => 4,
            VectorType::Int64 | VectorType::UInt64 | VectorType::Float64 => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, VectorType::Float32 | VectorType::Float64)
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            VectorType::Int8 | VectorType::Int16 | VectorType::Int32 | VectorType::Int64
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            VectorType::Int8 => "int8",
            VectorType::UInt8 => "uint8",
            VectorType::Int16 => "int16",
            VectorType::UInt16 => "uint16",
            VectorType::UInt32 => "uint32",
            VectorType::Int32 => "int32",
            VectorType::UInt64 => "uint64",
            VectorType::Int64 => "int64",
            VectorType::Float32 => "float32",
            VectorType::Float64 => "float64",
        }
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A Rust scalar type that can be stored in a result vector
///
/// Elements are stored in native byte order, exactly as the implementation
/// under test produced them.
pub trait Element: Copy + sealed::Sealed {
    /// Element kind recorded for vectors of this type
    const TYPE: VectorType;

    /// Writes the element into `out`, which is exactly `TYPE.el_size()` bytes
    fn write_ne(self, out: &mut [u8]);

    /// Reads an element from exactly `TYPE.el_size()` bytes
    fn read_ne(bytes: &[u8]) -> Self;
}

impl sealed::Sealed for i8 {}
impl Element for i8 {
    const TYPE: VectorType = VectorType::Int8;

    fn write_ne(self, out: &mut [u8]) {
        out[0] = self as u8;
    }

    fn read_ne(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

impl sealed::Sealed for u8 {}
impl Element for u8 {
    const TYPE: VectorType = VectorType::UInt8;

    fn write_ne(self, out: &mut [u8]) {
        out[0] = self;
    }

    fn read_ne(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

macro_rules! impl_element {
    ($ty:ty, $kind:expr, $write:ident, $read:ident) => {
        impl sealed::Sealed for $ty {}
        impl Element for $ty {
            const TYPE: VectorType = $kind;

            fn write_ne(self, out: &mut [u8]) {
                NativeEndian::$write(out, self);
            }

            fn read_ne(bytes: &[u8]) -> Self {
                NativeEndian::$read(bytes)
            }
        }
    };
}

impl_element!(i16, VectorType::Int16, write_i16, read_i16);
impl_element!(u16, VectorType::UInt16, write_u16, read_u16);
impl_element!(i32, VectorType::Int32, write_i32, read_i32);
impl_element!(u32, VectorType::UInt32, write_u32, read_u32);
impl_element!(i64, VectorType::Int64, write_i64, read_i64);
impl_element!(u64, VectorType::UInt64, write_u64, read_u64);
impl_element!(f32, VectorType::Float32, write_f32, read_f32);
impl_element!(f64, VectorType::Float64, write_f64, read_f64);
