//! Test helpers.

pub mod testutil;
