//! Validation rule sets.
//!
//! Each module holds the rules for one family of templates. Rules are plain
//! functions (or closures built from configuration) so processors can chain
//! them with [`crate::Validator`].

pub mod concern;
pub mod observation;
pub mod relationship;
pub mod section;
pub mod statement;
