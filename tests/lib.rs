//! Shared fixtures for netsonde integration tests.

pub mod test_helpers;
