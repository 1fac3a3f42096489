use memora_core::models::test_result::{ApprovalState, TestResult, TestResultUpdate};

/// Outcome of an approval request.
#[derive(Debug, Clone, PartialEq)]
pub struct Approval {
    pub result: TestResult,
    /// False when the result was already approved and nothing changed.
    pub transitioned: bool,
}

impl Approval {
    /// The record-store update to persist, if any.
    pub fn update(&self) -> Option<TestResultUpdate> {
        self.transitioned.then_some(TestResultUpdate::Approved)
    }
}

/// Move a result from pending to approved.
///
/// There is no way back. Approving an approved result returns it untouched,
/// including its update timestamp.
pub fn approve(result: TestResult, now: jiff::Timestamp) -> Approval {
    match result.approval_state() {
        ApprovalState::Approved => Approval {
            result,
            transitioned: false,
        },
        ApprovalState::Pending => {
            let mut result = result;
            result.apply_update(TestResultUpdate::Approved, now);
            Approval {
                result,
                transitioned: true,
            }
        }
    }
}
