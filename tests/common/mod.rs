//! Shared helpers for integration tests

pub mod fixtures;
pub mod mock_git;
pub mod mock_platform;
