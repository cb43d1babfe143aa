//! Export module tests
//!
//! Contains test suites for keybind file export:
//! - File rendering and round trips through the parser
//! - Backups, atomic commits and rollback
