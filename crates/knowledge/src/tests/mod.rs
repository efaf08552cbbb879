//! Crate-level tests spanning corpus loading, retrieval, and runs.
