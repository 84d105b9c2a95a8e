//! Various utilities

pub mod logging;
pub mod unix;
