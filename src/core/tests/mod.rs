//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Keybind file parsing tests
//! - Mirror codec and serialisation tests
//! - Normalisation tests
//! - Import round-trip tests
//! - Data model serialisation tests

#[cfg(test)]
mod normalizer_tests;
#[cfg(test)]
mod parser_tests;
