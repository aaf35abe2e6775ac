//! Template validation for CDA clinical statements.
//!
//! Every template processor validates its node before touching domain state.
//! Rule sets compose through [`Validator`]: shared rules run first, and once
//! any of them reports an error the template's own rules are skipped.

pub mod checks;
mod validator;

pub use validator::{Rule, Validator, render_issues};
