//! Types with custom serde implementations, for config files.

pub mod regex;
