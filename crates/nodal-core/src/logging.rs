//! Optional structured logging for the graph and layout crates.
//!
//! With the `tracing` feature, [`debug!`](crate::debug) and
//! [`trace!`](crate::trace) are the `tracing` macros. Without it they expand
//! to nothing, so layout passes log without `cfg` attributes at call sites.
//! The engine crate depends on `tracing` directly and does not go through here.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards its arguments; `tracing` is off.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments; `tracing` is off.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_accept_structured_fields() {
        let moved = 3_usize;
        let label = "group";
        crate::debug!(moved, "pass finished");
        crate::trace!(group = %label, dx = 1.5, "group pushed");
        let _ = (moved, label);
    }
}
