//! Backend integration tests
//!
//! These exercise the `BackendImpl`/`TreeTxn` contract directly, below the
//! tree store.
