//! Row structs mapping database tables onto the domain model.

pub mod bug;
