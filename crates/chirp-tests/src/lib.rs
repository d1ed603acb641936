//! Integration test crate for chirp.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the chirp crates to verify they work together.

#[cfg(test)]
mod audio;

#[cfg(test)]
mod concurrency;
