//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the store backend from the rest of the application.

pub mod document;

pub use document::DocumentRepository;
