//! Repository layer: one zero-sized struct per table, taking `&PgPool`.

pub mod bug_repo;

pub use bug_repo::BugRepo;
