//! Crate-level retrieval tests.
