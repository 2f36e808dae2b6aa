//! Domain layer of the bug tracker: the `Bug` entity, field and record
//! validation, input sanitization, and the intake pipeline that composes them.
//!
//! Nothing in this crate performs I/O.

pub mod bug;
pub mod error;
pub mod intake;
pub mod sanitize;
pub mod types;
pub mod validation;
