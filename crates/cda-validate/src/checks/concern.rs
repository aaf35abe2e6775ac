//! Concern entry rules (PCC TF-2 6.3.4.11).
//!
//! A concern act tracks the lifetime of a concern, not the concern itself:
//! its code must be null-flavored `NA`, and its effective time must agree with
//! its status. A completed (or aborted) concern has an end; an active (or
//! suspended) one does not.

use cda_model::{DocumentNode, NullFlavor, ValidationIssueCollection};

pub const CODE_NOT_APPLICABLE: &str = "Act must carry a code with nullFlavor = 'NA'";
pub const MISSING_EFFECTIVE_TIME: &str = "Act must carry an effective time";
pub const MISSING_LOW: &str = "Act's effectiveTime element must be populated with a Low value";
pub const MISSING_HIGH: &str = "Act's effectiveTime element must be populated with a High value when status code implies the act is completed (completed, aborted)";
pub const UNEXPECTED_HIGH: &str = "Act's effectiveTime element must not be populated with a High value when status code implies the act is still ongoing (active, suspended)";

pub fn concern_entry(node: &DocumentNode, issues: &mut ValidationIssueCollection) {
    let Some(act) = node.as_statement() else {
        return;
    };

    if let Some(code) = &act.code
        && code.null_flavor != Some(NullFlavor::NotApplicable)
    {
        issues.error(CODE_NOT_APPLICABLE);
    }

    let Some(effective_time) = act.effective_time.as_ref().filter(|time| !time.is_null()) else {
        issues.error(MISSING_EFFECTIVE_TIME);
        return;
    };

    if effective_time.low().is_none() {
        issues.warn(MISSING_LOW);
    }

    let Some(status) = act.status_code else {
        return;
    };
    if status.implies_completion() && effective_time.high().is_none() {
        issues.error(MISSING_HIGH);
    } else if status.implies_ongoing() && effective_time.high().is_some() {
        issues.error(UNEXPECTED_HIGH);
    }
}
