//! TreeStore integration tests
//!
//! Tests are organized by operation family; each runs against the backend
//! selected by TEST_BACKEND.

mod concurrency;
mod insertion;
mod kinds;
mod moves;
mod queries;
