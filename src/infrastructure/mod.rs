//! Infrastructure layer - External service implementations

pub mod fossa;
pub mod logging;
pub mod storage;
