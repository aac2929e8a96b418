// Common test utilities

#![allow(dead_code)]

pub mod harness;
pub mod logs;

pub use harness::*;
pub use logs::*;
