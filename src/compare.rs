//! Comparison of result sets produced by two implementations
//!
//! [`compare_sets`] walks both sets group by group and position by position
//! and collects every difference into a [`ComparisonReport`]. Differences are
//! data, not errors: the only fallible step is writing the report out in
//! [`test_equal`].
//!
//! Element policy:
//! - integer elements must be bit-identical
//! - floating-point elements use the more permissive tolerance of the two
//!   results; NaN and infinities must be bit-identical, +0 and -0 are one ULP
//!   apart unless zero equality is enabled

use crate::error::Result;
use crate::results::{TestResultsSet, Tolerance, VectorResult};
use crate::vector_type::{Element, VectorType};
use std::fmt;
use std::io;

/// A decoded element, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementValue {
    Signed(i64),
    Unsigned(u64),
    F32(f32),
    F64(f64),
}

impl ElementValue {
    /// Decodes one element of kind `ty` from native-endian bytes
    pub fn decode(ty: VectorType, bytes: &[u8]) -> Self {
        match ty {
            VectorType::Int8 => ElementValue::Signed(i8::read_ne(bytes) as i64),
            VectorType::UInt8 => ElementValue::Unsigned(u8::read_ne(bytes) as u64),
            VectorType::Int16 => ElementValue::Signed(i16::read_ne(bytes) as i64),
            VectorType::UInt16 => ElementValue::Unsigned(u16::read_ne(bytes) as u64),
            VectorType::Int32 => ElementValue::Signed(i32::read_ne(bytes) as i64),
            VectorType::UInt32 => ElementValue::Unsigned(u32::read_ne(bytes) as u64),
            VectorType::Int64 => ElementValue::Signed(i64::read_ne(bytes)),
            VectorType::UInt64 => ElementValue::Unsigned(u64::read_ne(bytes)),
            VectorType::Float32 => ElementValue::F32(f32::read_ne(bytes)),
            VectorType::Float64 => ElementValue::F64(f64::read_ne(bytes)),
        }
    }
}

impl fmt::Display for ElementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementValue::Signed(v) => write!(f, "{}", v),
            ElementValue::Unsigned(v) => write!(f, "{}", v),
            ElementValue::F32(v) => write!(f, "{:?} [{:#010x}]", v, v.to_bits()),
            ElementValue::F64(v) => write!(f, "{:?} [{:#018x}]", v, v.to_bits()),
        }
    }
}

/// One differing element of a result pair
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMismatch {
    pub index: usize,
    pub a: ElementValue,
    pub b: ElementValue,
    /// Distance in ULPs, for finite floating-point elements
    pub ulps: Option<u64>,
}

/// Where a result was pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSite {
    pub seq: u32,
    pub file: &'static str,
    pub line: u32,
}

impl ResultSite {
    fn of(result: &VectorResult) -> Self {
        Self {
            seq: result.seq(),
            file: result.file(),
            line: result.line(),
        }
    }
}

impl fmt::Display for ResultSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq {} ({}:{})", self.seq, self.file, self.line)
    }
}

/// A single difference between two result sets
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The sets were split by a different number of `sync_archs` calls
    GroupCount { a_groups: usize, b_groups: usize },
    /// Both implementations ran a group but pushed a different number of results
    ///
    /// `last_common` is the last position both sides pushed (taken from `a`),
    /// `first_unmatched` the result at position `min(a_count, b_count)` on
    /// the longer side.
    ResultCount {
        group: usize,
        a_count: usize,
        b_count: usize,
        last_common: ResultSite,
        first_unmatched: ResultSite,
    },
    /// Results at the same position differ in element type or length
    Shape {
        group: usize,
        a: ResultSite,
        b: ResultSite,
        a_ty: VectorType,
        a_len: usize,
        b_ty: VectorType,
        b_len: usize,
    },
    /// Results of the same shape whose elements differ
    Value {
        group: usize,
        a: ResultSite,
        b: ResultSite,
        ty: VectorType,
        tolerance: Tolerance,
        elements: Vec<ElementMismatch>,
    },
}

/// Group left empty by one implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGroup {
    pub group: usize,
    /// Label of the implementation that left the group empty
    pub skipped_by: String,
}

/// Outcome of comparing the result sets of one test case
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub test_name: String,
    pub a_label: String,
    pub b_label: String,
    /// Number of result pairs examined element by element
    pub compared: usize,
    pub skipped_groups: Vec<SkippedGroup>,
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn write_mismatch(&self, f: &mut fmt::Formatter<'_>, mismatch: &Mismatch) -> fmt::Result {
        let (a, b) = (&self.a_label, &self.b_label);
        match mismatch {
            Mismatch::GroupCount { a_groups, b_groups } => writeln!(
                f,
                "  group count differs: {} has {}, {} has {} (sync_archs called a different number of times)",
                a, a_groups, b, b_groups
            ),
            Mismatch::ResultCount {
                group,
                a_count,
                b_count,
                last_common,
                first_unmatched,
            } => {
                let longer = if a_count > b_count { a } else { b };
                writeln!(
                    f,
                    "  group {}: result count differs: {} pushed {}, {} pushed {}",
                    group, a, a_count, b, b_count
                )?;
                writeln!(f, "    last common: {}", last_common)?;
                writeln!(f, "    first unmatched on {}: {}", longer, first_unmatched)
            }
            Mismatch::Shape {
                group,
                a: a_site,
                b: b_site,
                a_ty,
                a_len,
                b_ty,
                b_len,
            } => writeln!(
                f,
                "  group {}: shape differs: {} {} is {} x {}, {} {} is {} x {}",
                group, a, a_site, a_len, a_ty, b, b_site, b_len, b_ty
            ),
            Mismatch::Value {
                group,
                a: a_site,
                b: b_site,
                ty,
                tolerance,
                elements,
            } => {
                write!(f, "  group {}: {} {}", group, a, a_site)?;
                if a_site != b_site {
                    write!(f, " vs {} {}", b, b_site)?;
                }
                writeln!(f, ": {} {} element(s) differ", elements.len(), ty)?;
                if ty.is_float() {
                    writeln!(
                        f,
                        "    allowed: {} ulp, +0/-0 {}",
                        tolerance.prec_ulp,
                        if tolerance.fp_zero_eq { "equal" } else { "distinct" }
                    )?;
                }
                for element in elements {
                    write!(
                        f,
                        "    [{}] {}: {}  {}: {}",
                        element.index, a, element.a, b, element.b
                    )?;
                    match element.ulps {
                        Some(ulps) => writeln!(f, "  ({} ulp)", ulps)?,
                        None => writeln!(f)?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match() {
            return writeln!(
                f,
                "{}: {} vs {}: ok ({} results, {} group(s) skipped)",
                self.test_name,
                self.a_label,
                self.b_label,
                self.compared,
                self.skipped_groups.len()
            );
        }
        writeln!(
            f,
            "{}: {} vs {}: {} mismatch(es)",
            self.test_name,
            self.a_label,
            self.b_label,
            self.mismatches.len()
        )?;
        for mismatch in &self.mismatches {
            self.write_mismatch(f, mismatch)?;
        }
        Ok(())
    }
}

fn ordered_bits(bits: u64, sign: u64) -> i128 {
    if bits & sign != 0 {
        -((bits & !sign) as i128) - 1
    } else {
        bits as i128
    }
}

/// Number of representable f32 values between `a` and `b`
pub fn ulp_distance_f32(a: f32, b: f32) -> u64 {
    let sign = 1u64 << 31;
    let d = ordered_bits(a.to_bits() as u64, sign) - ordered_bits(b.to_bits() as u64, sign);
    d.unsigned_abs() as u64
}

/// Number of representable f64 values between `a` and `b`
pub fn ulp_distance_f64(a: f64, b: f64) -> u64 {
    let sign = 1u64 << 63;
    let d = ordered_bits(a.to_bits(), sign) - ordered_bits(b.to_bits(), sign);
    d.unsigned_abs() as u64
}

/// Applies the float policy; returns the verdict and the ULP distance when
/// both values are finite.
fn float_verdict(
    a_bits: u64,
    b_bits: u64,
    finite: bool,
    zeros: bool,
    distance: u64,
    tolerance: Tolerance,
) -> (bool, Option<u64>) {
    if !finite {
        return (a_bits == b_bits, None);
    }
    if zeros && tolerance.fp_zero_eq {
        return (true, Some(distance));
    }
    (distance <= tolerance.prec_ulp as u64, Some(distance))
}

/// Compares one element pair; `None` when equal under `tolerance`
fn compare_element(
    ty: VectorType,
    index: usize,
    a: &[u8],
    b: &[u8],
    tolerance: Tolerance,
) -> Option<ElementMismatch> {
    let (equal, ulps) = match ty {
        VectorType::Float32 => {
            let (x, y) = (f32::read_ne(a), f32::read_ne(b));
            float_verdict(
                x.to_bits() as u64,
                y.to_bits() as u64,
                x.is_finite() && y.is_finite(),
                x == 0.0 && y == 0.0,
                ulp_distance_f32(x, y),
                tolerance,
            )
        }
        VectorType::Float64 => {
            let (x, y) = (f64::read_ne(a), f64::read_ne(b));
            float_verdict(
                x.to_bits(),
                y.to_bits(),
                x.is_finite() && y.is_finite(),
                x == 0.0 && y == 0.0,
                ulp_distance_f64(x, y),
                tolerance,
            )
        }
        _ => (a == b, None),
    };
    if equal {
        return None;
    }
    Some(ElementMismatch {
        index,
        a: ElementValue::decode(ty, a),
        b: ElementValue::decode(ty, b),
        ulps,
    })
}

fn compare_results(group: usize, a: &VectorResult, b: &VectorResult) -> Option<Mismatch> {
    if a.ty() != b.ty() || a.len() != b.len() {
        return Some(Mismatch::Shape {
            group,
            a: ResultSite::of(a),
            b: ResultSite::of(b),
            a_ty: a.ty(),
            a_len: a.len(),
            b_ty: b.ty(),
            b_len: b.len(),
        });
    }

    let tolerance = a.tolerance().merge(b.tolerance());
    let elements: Vec<ElementMismatch> = (0..a.len())
        .filter_map(|i| {
            compare_element(a.ty(), i, a.element_bytes(i), b.element_bytes(i), tolerance)
        })
        .collect();
    if elements.is_empty() {
        return None;
    }
    Some(Mismatch::Value {
        group,
        a: ResultSite::of(a),
        b: ResultSite::of(b),
        ty: a.ty(),
        tolerance,
        elements,
    })
}

/// Compares the results two implementations produced for the same test case
///
/// The labels only name the implementations in the report; any `Display`
/// value works, an [`Arch`](crate::Arch) or a free-form variant name.
pub fn compare_sets(
    a: &TestResultsSet,
    a_label: impl fmt::Display,
    b: &TestResultsSet,
    b_label: impl fmt::Display,
) -> ComparisonReport {
    let (a_label, b_label) = (a_label.to_string(), b_label.to_string());
    tracing::debug!(test = a.name(), a = %a_label, b = %b_label, "comparing result sets");
    let mut report = ComparisonReport {
        test_name: a.name().to_string(),
        a_label,
        b_label,
        compared: 0,
        skipped_groups: Vec::new(),
        mismatches: Vec::new(),
    };

    let (a_groups, b_groups) = (a.get_results(), b.get_results());
    if a_groups.len() != b_groups.len() {
        report.mismatches.push(Mismatch::GroupCount {
            a_groups: a_groups.len(),
            b_groups: b_groups.len(),
        });
        return report;
    }

    for (group, (sect_a, sect_b)) in a_groups.iter().zip(b_groups).enumerate() {
        if sect_a.is_empty() != sect_b.is_empty() {
            let skipped_by = if sect_a.is_empty() {
                report.a_label.clone()
            } else {
                report.b_label.clone()
            };
            tracing::debug!(test = a.name(), group, skipped_by = %skipped_by, "group skipped");
            report.skipped_groups.push(SkippedGroup { group, skipped_by });
            continue;
        }
        if sect_a.len() != sect_b.len() {
            // both sections are non-empty here
            let common = sect_a.len().min(sect_b.len());
            let longer = if sect_a.len() > sect_b.len() { sect_a } else { sect_b };
            report.mismatches.push(Mismatch::ResultCount {
                group,
                a_count: sect_a.len(),
                b_count: sect_b.len(),
                last_common: ResultSite::of(&sect_a[common - 1]),
                first_unmatched: ResultSite::of(&longer[common]),
            });
            continue;
        }
        for (ra, rb) in sect_a.iter().zip(sect_b) {
            report.compared += 1;
            if let Some(mismatch) = compare_results(group, ra, rb) {
                report.mismatches.push(mismatch);
            }
        }
    }
    report
}

/// Compares two result sets, writing every mismatch to `err`
///
/// Returns `Ok(true)` when the sets are equal under their tolerances. Nothing
/// is written for equal sets.
///
/// # Errors
/// Only if writing to `err` fails.
pub fn test_equal<W: io::Write + ?Sized>(
    a: &TestResultsSet,
    a_label: impl fmt::Display,
    b: &TestResultsSet,
    b_label: impl fmt::Display,
    err: &mut W,
) -> Result<bool> {
    let report = compare_sets(a, a_label, b, b_label);
    if report.is_match() {
        return Ok(true);
    }
    tracing::warn!(
        test = %report.test_name,
        a = %report.a_label,
        b = %report.b_label,
        mismatches = report.mismatches.len(),
        "result sets differ"
    );
    write!(err, "{}", report)?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Arch;
    use crate::push_result;
    use proptest::prelude::*;

    fn float_set(values: &[f32], tolerance: Tolerance) -> TestResultsSet {
        let mut set = TestResultsSet::new("floats");
        set.set_precision(tolerance.prec_ulp);
        if tolerance.fp_zero_eq {
            set.set_fp_zero_equal();
        }
        set.push(VectorType::Float32, values.len(), "case.rs", 10)
            .fill_from(values);
        set
    }

    fn double_set(values: &[f64], tolerance: Tolerance) -> TestResultsSet {
        let mut set = TestResultsSet::new("doubles");
        set.set_precision(tolerance.prec_ulp);
        if tolerance.fp_zero_eq {
            set.set_fp_zero_equal();
        }
        set.push(VectorType::Float64, values.len(), "case.rs", 20)
            .fill_from(values);
        set
    }

    fn compare_doubles(a: &[f64], b: &[f64], tolerance: Tolerance) -> ComparisonReport {
        compare_sets(
            &double_set(a, tolerance),
            Arch::Scalar,
            &double_set(b, tolerance),
            Arch::Neon,
        )
    }

    fn compare_floats(a: &[f32], b: &[f32], tolerance: Tolerance) -> ComparisonReport {
        compare_sets(
            &float_set(a, tolerance),
            Arch::Scalar,
            &float_set(b, tolerance),
            Arch::Avx2,
        )
    }

    fn tol(prec_ulp: u32, fp_zero_eq: bool) -> Tolerance {
        Tolerance {
            prec_ulp,
            fp_zero_eq,
        }
    }

    #[test]
    fn test_ulp_distance_is_symmetric_and_crosses_zero() {
        assert_eq!(ulp_distance_f32(1.0, 1.0), 0);
        assert_eq!(ulp_distance_f32(1.0, f32::from_bits(1.0f32.to_bits() + 3)), 3);
        assert_eq!(ulp_distance_f32(0.0, -0.0), 1);
        assert_eq!(ulp_distance_f32(-0.0, 0.0), 1);
        assert_eq!(ulp_distance_f32(f32::from_bits(1), -f32::from_bits(1)), 3);
        assert_eq!(ulp_distance_f64(0.0, -0.0), 1);
        assert_eq!(ulp_distance_f64(-1.0, f64::from_bits((-1.0f64).to_bits() + 2)), 2);
    }

    #[test]
    fn test_signed_zero_needs_zero_equality_or_one_ulp() {
        assert!(!compare_floats(&[0.0], &[-0.0], tol(0, false)).is_match());
        assert!(compare_floats(&[0.0], &[-0.0], tol(0, true)).is_match());
        assert!(compare_floats(&[0.0], &[-0.0], tol(1, false)).is_match());
    }

    #[test]
    fn test_signed_zero_f64() {
        assert!(!compare_doubles(&[0.0], &[-0.0], tol(0, false)).is_match());
        assert!(compare_doubles(&[0.0], &[-0.0], tol(0, true)).is_match());
        assert!(compare_doubles(&[-0.0, 1.0], &[0.0, 1.0], tol(1, false)).is_match());

        let report = compare_doubles(&[0.0], &[-0.0], Tolerance::EXACT);
        match &report.mismatches[..] {
            [Mismatch::Value { ty, elements, .. }] => {
                assert_eq!(*ty, VectorType::Float64);
                assert_eq!(elements[0].ulps, Some(1));
                assert_eq!(elements[0].b, ElementValue::F64(-0.0));
            }
            other => panic!("unexpected mismatches {:?}", other),
        }
    }

    #[test]
    fn test_nan_f64_equal_only_when_bit_identical() {
        let quiet = f64::NAN;
        let other = f64::from_bits(quiet.to_bits() | 1);
        assert!(compare_doubles(&[quiet], &[quiet], Tolerance::EXACT).is_match());
        assert!(!compare_doubles(&[quiet], &[other], tol(u32::MAX, true)).is_match());
        assert!(!compare_doubles(&[1.0], &[quiet], tol(u32::MAX, true)).is_match());
        assert!(!compare_doubles(&[f64::NEG_INFINITY], &[f64::MIN], tol(u32::MAX, false)).is_match());
        assert!(compare_doubles(&[f64::INFINITY], &[f64::INFINITY], Tolerance::EXACT).is_match());

        let report = compare_doubles(&[quiet], &[other], tol(1000, true));
        match &report.mismatches[0] {
            Mismatch::Value { elements, .. } => assert_eq!(elements[0].ulps, None),
            other => panic!("unexpected mismatch {:?}", other),
        }
    }

    #[test]
    fn test_nan_equal_only_when_bit_identical() {
        let quiet = f32::NAN;
        let other = f32::from_bits(quiet.to_bits() | 1);
        assert!(compare_floats(&[quiet], &[quiet], Tolerance::EXACT).is_match());
        assert!(!compare_floats(&[quiet], &[other], tol(1000, true)).is_match());
        assert!(!compare_floats(&[quiet], &[1.0], tol(u32::MAX, true)).is_match());
        assert!(!compare_floats(&[f32::INFINITY], &[f32::MAX], tol(u32::MAX, false)).is_match());

        let report = compare_floats(&[quiet], &[other], tol(1000, true));
        match &report.mismatches[0] {
            Mismatch::Value { elements, .. } => assert_eq!(elements[0].ulps, None),
            other => panic!("unexpected mismatch {:?}", other),
        }
    }

    #[test]
    fn test_more_permissive_tolerance_wins() {
        let a = float_set(&[1.0], tol(0, false));
        let b = float_set(&[f32::from_bits(1.0f32.to_bits() + 2)], tol(2, false));
        assert!(compare_sets(&a, Arch::Scalar, &b, Arch::Sse2).is_match());
        assert!(compare_sets(&b, Arch::Sse2, &a, Arch::Scalar).is_match());

        let a = float_set(&[-0.0], tol(0, true));
        let b = float_set(&[0.0], tol(0, false));
        assert!(compare_sets(&a, Arch::Scalar, &b, Arch::Sse2).is_match());
    }

    #[test]
    fn test_integer_results_must_match_exactly() {
        let mut a = TestResultsSet::new("ints");
        let mut b = TestResultsSet::new("ints");
        a.set_precision(100);
        b.set_precision(100);
        a.push(VectorType::Int32, 3, "case.rs", 5).fill_from(&[1i32, -2, 3]);
        b.push(VectorType::Int32, 3, "case.rs", 5).fill_from(&[1i32, -3, 3]);

        let report = compare_sets(&a, Arch::Scalar, &b, Arch::Neon);
        assert_eq!(report.mismatches.len(), 1);
        match &report.mismatches[0] {
            Mismatch::Value { elements, .. } => {
                assert_eq!(elements.len(), 1);
                assert_eq!(elements[0].index, 1);
                assert_eq!(elements[0].a, ElementValue::Signed(-2));
                assert_eq!(elements[0].b, ElementValue::Signed(-3));
            }
            other => panic!("unexpected mismatch {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_continues_with_next_pair() {
        let mut a = TestResultsSet::new("shape");
        let mut b = TestResultsSet::new("shape");
        a.push(VectorType::Int16, 2, "case.rs", 1);
        b.push(VectorType::UInt16, 2, "case.rs", 1);
        a.push(VectorType::UInt8, 1, "case.rs", 2).set_value(0, 1u8);
        b.push(VectorType::UInt8, 1, "case.rs", 2).set_value(0, 2u8);

        let report = compare_sets(&a, Arch::Scalar, &b, Arch::Sse2);
        assert_eq!(report.compared, 2);
        assert!(matches!(report.mismatches[0], Mismatch::Shape { .. }));
        assert!(matches!(report.mismatches[1], Mismatch::Value { .. }));
    }

    #[test]
    fn test_result_count_mismatch_checks_other_groups() {
        let mut a = TestResultsSet::new("count");
        let mut b = TestResultsSet::new("count");
        a.push(VectorType::UInt8, 1, "case.rs", 1);
        a.push(VectorType::UInt8, 1, "case.rs", 2);
        b.push(VectorType::UInt8, 1, "case.rs", 1);
        a.sync_archs();
        b.sync_archs();
        a.push(VectorType::UInt8, 1, "case.rs", 3).set_value(0, 9u8);
        b.push(VectorType::UInt8, 1, "case.rs", 3);

        let report = compare_sets(&a, Arch::Scalar, &b, Arch::Avx2);
        assert_eq!(
            report.mismatches[0],
            Mismatch::ResultCount {
                group: 0,
                a_count: 2,
                b_count: 1,
                last_common: ResultSite {
                    seq: 1,
                    file: "case.rs",
                    line: 1
                },
                first_unmatched: ResultSite {
                    seq: 2,
                    file: "case.rs",
                    line: 2
                },
            }
        );
        assert!(matches!(report.mismatches[1], Mismatch::Value { group: 1, .. }));
    }

    #[test]
    fn test_result_count_report_locates_the_split() {
        let mut a = TestResultsSet::new("split");
        let mut b = TestResultsSet::new("split");
        push_result!(a, VectorType::UInt32, 2);
        push_result!(b, VectorType::UInt32, 2);
        let extra_line = line!() + 1;
        b.push_values(&[7u16][..]);

        let mut err = Vec::<u8>::new();
        assert!(!test_equal(&a, Arch::Scalar, &b, Arch::Sse2, &mut err).unwrap());
        let text = String::from_utf8(err).unwrap();
        assert!(text.contains("scalar pushed 1, sse2 pushed 2"), "{}", text);
        assert!(text.contains(file!()), "{}", text);
        assert!(text.contains("last common: seq 1"), "{}", text);
        assert!(
            text.contains(&format!("first unmatched on sse2: seq 2 ({}:{})", file!(), extra_line)),
            "{}",
            text
        );
    }

    #[test]
    fn test_free_form_labels_name_variants_of_one_arch() {
        let a = float_set(&[1.0, 2.0], Tolerance::EXACT);
        let b = float_set(&[1.0, 3.0], Tolerance::EXACT);
        let report = compare_sets(&a, "scalar-unrolled", &b, String::from("scalar-naive"));
        assert_eq!(report.a_label, "scalar-unrolled");
        assert_eq!(report.b_label, "scalar-naive");
        let text = report.to_string();
        assert!(text.contains("floats: scalar-unrolled vs scalar-naive: 1 mismatch(es)"));
        assert!(text.contains("[1] scalar-unrolled: 2.0"));
    }

    #[test]
    fn test_group_skipped_by_one_side_is_not_a_mismatch() {
        let mut a = TestResultsSet::new("skip");
        let mut b = TestResultsSet::new("skip");
        for set in [&mut a, &mut b] {
            set.push(VectorType::Int64, 1, "case.rs", 1).set_value(0, 5i64);
            set.sync_archs();
        }
        b.push(VectorType::Float32, 4, "case.rs", 7);
        a.sync_archs();
        b.sync_archs();

        let report = compare_sets(&a, Arch::Scalar, &b, Arch::Avx2);
        assert!(report.is_match(), "{}", report);
        assert_eq!(
            report.skipped_groups,
            vec![SkippedGroup {
                group: 1,
                skipped_by: "scalar".to_string()
            }]
        );
    }

    #[test]
    fn test_report_names_labels_location_and_values() {
        let report = compare_floats(&[1.0, 2.0], &[1.0, 2.5], Tolerance::EXACT);
        let text = report.to_string();
        assert!(text.contains("floats: scalar vs avx2"));
        assert!(text.contains("group 0"));
        assert!(text.contains("seq 1 (case.rs:10)"));
        assert!(text.contains("[1] scalar: 2.0 [0x40000000]  avx2: 2.5 [0x40200000]"));
    }

    #[test]
    fn test_equal_writes_only_on_mismatch() {
        let a = float_set(&[1.0], Tolerance::EXACT);
        let mut out = Vec::<u8>::new();
        assert!(test_equal(&a, Arch::Scalar, &a.clone(), Arch::Sse2, &mut out).unwrap());
        assert!(out.is_empty());

        let b = float_set(&[-1.0], Tolerance::EXACT);
        assert!(!test_equal(&a, Arch::Scalar, &b, Arch::Sse2, &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1 mismatch"));
        assert!(text.contains("sse2: -1.0"));
    }

    proptest! {
        #[test]
        fn test_ulp_boundary(start in -1.0e30f32..1.0e30, ulps in 0u32..64) {
            prop_assume!(start.is_finite());
            let ordered = ordered_bits(start.to_bits() as u64, 1 << 31) + ulps as i128;
            // map the shifted ordered value back to bits
            let bits = if ordered < 0 {
                ((-(ordered + 1)) as u32) | (1 << 31)
            } else {
                ordered as u32
            };
            let shifted = f32::from_bits(bits);
            prop_assume!(shifted.is_finite());
            prop_assert_eq!(ulp_distance_f32(start, shifted), ulps as u64);

            prop_assert!(compare_floats(&[start], &[shifted], tol(ulps, false)).is_match());
            if ulps > 0 {
                prop_assert!(!compare_floats(&[start], &[shifted], tol(ulps - 1, false)).is_match());
            }
        }

        #[test]
        fn test_ulp_boundary_f64(start in -1.0e300f64..1.0e300, ulps in 0u32..64) {
            let ordered = ordered_bits(start.to_bits(), 1 << 63) + ulps as i128;
            let bits = if ordered < 0 {
                ((-(ordered + 1)) as u64) | (1 << 63)
            } else {
                ordered as u64
            };
            let shifted = f64::from_bits(bits);
            prop_assume!(shifted.is_finite());
            prop_assert_eq!(ulp_distance_f64(start, shifted), ulps as u64);

            prop_assert!(compare_doubles(&[start], &[shifted], tol(ulps, false)).is_match());
            if ulps > 0 {
                prop_assert!(!compare_doubles(&[start], &[shifted], tol(ulps - 1, false)).is_match());
            }
        }

        #[test]
        fn test_identical_integer_sets_match(values in prop::collection::vec(any::<i64>(), 0..32)) {
            let mut a = TestResultsSet::new("same");
            a.push(VectorType::Int64, values.len(), "case.rs", 1).fill_from(&values);
            let b = a.clone();
            prop_assert!(compare_sets(&a, Arch::Scalar, &b, Arch::Avx2).is_match());
            prop_assert!(compare_sets(&b, Arch::Avx2, &a, Arch::Scalar).is_match());
        }
    }
}
