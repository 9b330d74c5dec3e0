//! Result recording for one test case under one implementation
//!
//! A [`TestResultsSet`] collects every output vector an implementation emits
//! while executing a test case. Results are grouped into sections separated by
//! [`TestResultsSet::sync_archs`] calls so that implementations which skip a
//! block of sub-cases stay alignable with implementations that run it.

use crate::vector_type::{Element, VectorType};
use std::panic::Location;

/// Comparison allowance attached to every recorded result
///
/// Both fields only matter for floating-point element types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tolerance {
    /// Allowed error in units in the last place; 0 requires an exact match
    pub prec_ulp: u32,
    /// Whether +0.0 and -0.0 compare equal
    pub fp_zero_eq: bool,
}

impl Tolerance {
    /// Exact comparison, +0.0 and -0.0 distinct
    pub const EXACT: Tolerance = Tolerance {
        prec_ulp: 0,
        fp_zero_eq: false,
    };

    /// The more permissive combination of two tolerances
    pub fn merge(self, other: Tolerance) -> Tolerance {
        Tolerance {
            prec_ulp: self.prec_ulp.max(other.prec_ulp),
            fp_zero_eq: self.fp_zero_eq || other.fp_zero_eq,
        }
    }
}

/// Holds one result vector
#[derive(Debug, Clone)]
pub struct VectorResult {
    ty: VectorType,
    length: usize,
    el_size: usize,
    file: &'static str,
    line: u32,
    seq: u32,
    tolerance: Tolerance,
    data: Vec<u8>,
}

impl VectorResult {
    /// Creates a zero-filled result vector of `length` elements of type `ty`
    pub fn new(
        ty: VectorType,
        length: usize,
        file: &'static str,
        line: u32,
        seq: u32,
        tolerance: Tolerance,
    ) -> Self {
        let el_size = ty.el_size();
        Self {
            ty,
            length,
            el_size,
            file,
            line,
            seq,
            tolerance,
            data: vec![0u8; el_size * length],
        }
    }

    /// Copies one element worth of bytes from `src` into slot `id`
    ///
    /// # Panics
    /// If `id` is not below the vector length or `src` holds fewer than
    /// `el_size` bytes. Both indicate a broken test, not a broken
    /// implementation.
    pub fn set(&mut self, id: usize, src: &[u8]) {
        assert!(
            id < self.length,
            "element index {} out of range for {} x {} result pushed at {}:{}",
            id,
            self.length,
            self.ty,
            self.file,
            self.line
        );
        assert!(
            src.len() >= self.el_size,
            "{} bytes supplied for a {}-byte {} element ({}:{})",
            src.len(),
            self.el_size,
            self.ty,
            self.file,
            self.line
        );
        let start = id * self.el_size;
        self.data[start..start + self.el_size].copy_from_slice(&src[..self.el_size]);
    }

    /// Typed variant of [`VectorResult::set`]
    ///
    /// # Panics
    /// If `T` does not match the element type the result was pushed with.
    pub fn set_value<T: Element>(&mut self, id: usize, value: T) {
        assert_eq!(
            T::TYPE,
            self.ty,
            "typed set on result pushed at {}:{}",
            self.file,
            self.line
        );
        let mut buf = [0u8; 8];
        value.write_ne(&mut buf[..self.el_size]);
        self.set(id, &buf[..self.el_size]);
    }

    /// Fills the whole vector from a typed slice of matching length
    pub fn fill_from<T: Element>(&mut self, values: &[T]) {
        assert_eq!(
            values.len(),
            self.length,
            "slice length does not match result pushed at {}:{}",
            self.file,
            self.line
        );
        for (id, &value) in values.iter().enumerate() {
            self.set_value(id, value);
        }
    }

    /// Raw view of the element buffer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw bytes of element `id`
    pub fn element_bytes(&self, id: usize) -> &[u8] {
        let start = id * self.el_size;
        &self.data[start..start + self.el_size]
    }

    /// Reads back element `id` as `T`
    pub fn value<T: Element>(&self, id: usize) -> T {
        assert_eq!(T::TYPE, self.ty, "typed read of a {} result", self.ty);
        T::read_ne(self.element_bytes(id))
    }

    pub fn ty(&self) -> VectorType {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn el_size(&self) -> usize {
        self.el_size
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

/// The results of one test case for a certain implementation
///
/// The results are later compared with those of other implementations and
/// all differences are assumed to be errors, except differences covered by
/// the tolerance in effect when each result was pushed.
#[derive(Debug, Clone)]
pub struct TestResultsSet {
    name: String,
    seq: u32,
    tolerance: Tolerance,
    section: usize,
    results: Vec<Vec<VectorResult>>,
}

impl TestResultsSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seq: 1,
            tolerance: Tolerance::EXACT,
            section: 0,
            results: vec![Vec::new()],
        }
    }

    /// Stores a new zero-filled result into the current group
    ///
    /// The returned reference is used to fill in the element data.
    pub fn push(
        &mut self,
        ty: VectorType,
        length: usize,
        file: &'static str,
        line: u32,
    ) -> &mut VectorResult {
        let seq = self.seq;
        self.seq += 1;
        tracing::trace!(test = %self.name, %ty, length, file, line, seq, "push");

        let group = &mut self.results[self.section];
        group.push(VectorResult::new(ty, length, file, line, seq, self.tolerance));
        let last = group.len() - 1;
        &mut group[last]
    }

    /// Pushes `values` as a complete result, recording the caller's location
    #[track_caller]
    pub fn push_values<T: Element>(&mut self, values: &[T]) -> &mut VectorResult {
        let location = Location::caller();
        let result = self.push(T::TYPE, values.len(), location.file(), location.line());
        result.fill_from(values);
        result
    }

    /// Sets the allowed error in ULPs for subsequently pushed results
    pub fn set_precision(&mut self, num_ulp: u32) {
        self.tolerance.prec_ulp = num_ulp;
    }

    pub fn unset_precision(&mut self) {
        self.tolerance.prec_ulp = 0;
    }

    /// Makes +0.0 and -0.0 compare equal for subsequently pushed results
    pub fn set_fp_zero_equal(&mut self) {
        self.tolerance.fp_zero_eq = true;
    }

    pub fn unset_fp_zero_equal(&mut self) {
        self.tolerance.fp_zero_eq = false;
    }

    /// Tolerance applied to the next pushed result
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reset_seq(&mut self) {
        self.seq = 1;
    }

    /// Starts a new result group and resets the sequence number
    ///
    /// Must be called before and after any block of pushes that some
    /// implementations may not execute, and it must be called by every
    /// implementation whether or not it ran the block.
    pub fn sync_archs(&mut self) {
        self.section += 1;
        self.results.push(Vec::new());
        self.reset_seq();
        tracing::trace!(test = %self.name, section = self.section, "sync_archs");
    }

    /// Total number of results across all groups
    pub fn num_results(&self) -> usize {
        self.results.iter().map(Vec::len).sum()
    }

    pub fn num_groups(&self) -> usize {
        self.results.len()
    }

    pub fn get_results(&self) -> &[Vec<VectorResult>] {
        &self.results
    }
}

/// Pushes a result recording the invocation site as its source location
///
/// `push_result!(set, VectorType::Float32, 4)` is shorthand for
/// `set.push(VectorType::Float32, 4, file!(), line!())`.
#[macro_export]
macro_rules! push_result {
    ($set:expr, $ty:expr, $len:expr) => {
        $set.push($ty, $len, file!(), line!())
    };
}
