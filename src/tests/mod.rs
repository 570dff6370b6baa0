//! integrated tests
pub mod toolkit;

mod filename;
