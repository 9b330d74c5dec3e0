use std::fmt;

/// Pass/fail tally over test cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeqTestSuite {
    num_success: u32,
    num_failure: u32,
}

impl SeqTestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, success: bool) {
        if success {
            self.num_success += 1;
        } else {
            self.num_failure += 1;
        }
    }

    pub fn num_success(&self) -> u32 {
        self.num_success
    }

    pub fn num_failure(&self) -> u32 {
        self.num_failure
    }

    pub fn total(&self) -> u32 {
        self.num_success + self.num_failure
    }

    /// True iff no failure was recorded; an empty suite succeeds
    pub fn success(&self) -> bool {
        self.num_failure == 0
    }
}

impl fmt::Display for SeqTestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} test case(s) passed, {} failed",
            self.num_success,
            self.total(),
            self.num_failure
        )
    }
}
