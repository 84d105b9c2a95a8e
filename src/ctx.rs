//! A shorter way to add error context information when using the `anyhow` crate.
//!
//! Instead of `.with_context(|| anyhow!("while doing {}", 1 + 1))`, this allows writing
//! `.map_err(ctx!("while doing {}", 1 + 1))`.

#[macro_export]
macro_rules! ctx {
    ($fmt:tt) => {
        |e| anyhow::Error::from(e).context(format!($fmt))
    };
    ($fmt:tt, $($arg:tt)*) => {
        |e| anyhow::Error::from(e).context(format!($fmt, $($arg)*))
    };
}
