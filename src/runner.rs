//! In-process driver: runs each test case under every configured
//! implementation and compares the outcomes against the reference.

use crate::arch::Arch;
use crate::cases::ParityCase;
use crate::compare::test_equal;
use crate::config::ParityConfig;
use crate::error::{ParityError, Result};
use crate::results::TestResultsSet;
use crate::simd::VectorKernels;
use crate::suite::SeqTestSuite;
use rayon::prelude::*;
use std::io::Write;

pub struct ParityRunner {
    config: ParityConfig,
    suite: SeqTestSuite,
}

impl ParityRunner {
    /// # Errors
    /// If `config` fails [`ParityConfig::validate`].
    pub fn new(config: ParityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            suite: SeqTestSuite::new(),
        })
    }

    pub fn config(&self) -> &ParityConfig {
        &self.config
    }

    /// Tally of all test cases run so far
    pub fn suite(&self) -> SeqTestSuite {
        self.suite
    }

    /// Runs `f` once per configured implementation and compares each
    /// non-reference result set with the reference one
    ///
    /// A case that returns an error under some implementation fails; the error
    /// is written to `err` alongside any mismatch reports. One verdict is
    /// added to the suite per call.
    ///
    /// # Errors
    /// Only if writing to `err` fails.
    pub fn run_case<F, W>(&mut self, name: &str, f: F, err: &mut W) -> Result<bool>
    where
        F: Fn(&dyn VectorKernels, &mut TestResultsSet) -> Result<()> + Sync,
        W: Write + ?Sized,
    {
        let outcomes: Vec<(Arch, Result<TestResultsSet>)> = if self.config.parallel {
            self.config
                .archs
                .par_iter()
                .map(|&arch| (arch, execute(name, arch, &f)))
                .collect()
        } else {
            self.config
                .archs
                .iter()
                .map(|&arch| (arch, execute(name, arch, &f)))
                .collect()
        };

        let mut passed = true;
        for (_, outcome) in &outcomes {
            if let Err(e) = outcome {
                writeln!(err, "{}", e)?;
                passed = false;
            }
        }

        let reference = self.config.reference;
        let reference_set = outcomes
            .iter()
            .find(|(arch, _)| *arch == reference)
            .and_then(|(_, outcome)| outcome.as_ref().ok());
        if let Some(expected) = reference_set {
            for (arch, outcome) in &outcomes {
                if *arch == reference {
                    continue;
                }
                if let Ok(actual) = outcome {
                    passed &= test_equal(expected, reference, actual, *arch, err)?;
                }
            }
        }

        if !passed {
            tracing::warn!(test = name, "test case failed");
        }
        self.suite.add_result(passed);
        Ok(passed)
    }

    /// Runs every case in order and returns the resulting tally
    pub fn run_all<W>(&mut self, cases: &[ParityCase], err: &mut W) -> Result<SeqTestSuite>
    where
        W: Write + ?Sized,
    {
        for case in cases {
            self.run_case(case.name, |kernels, set| case.run(kernels, set), err)?;
        }
        tracing::info!(
            reference = %self.config.reference,
            archs = self.config.archs.len(),
            passed = self.suite.num_success(),
            failed = self.suite.num_failure(),
            "parity run finished"
        );
        Ok(self.suite)
    }
}

fn execute<F>(name: &str, arch: Arch, f: &F) -> Result<TestResultsSet>
where
    F: Fn(&dyn VectorKernels, &mut TestResultsSet) -> Result<()>,
{
    let kernels = arch.kernels()?;
    let mut set = TestResultsSet::new(name);
    f(kernels, &mut set).map_err(|e| ParityError::CaseFailed {
        case: name.to_string(),
        arch,
        reason: e.to_string(),
    })?;
    tracing::debug!(test = name, %arch, results = set.num_results(), "case executed");
    Ok(set)
}
