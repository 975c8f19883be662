//! Logging abstraction
//!
//! Crate-internal macros that work across targets:
//! - Embedded (`defmt` feature): forwards to defmt
//! - Host tests: uses `println!`
//! - Otherwise: no-op
//!
//! Format strings must stay within the subset defmt and `core::fmt` share
//! (`{}`, `{:?}`, `{:#x}`).

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::warn!($($arg)*);

        #[cfg(test)]
        println!("[WARN] {}", format!($($arg)*));
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::debug!($($arg)*);

        #[cfg(test)]
        println!("[DEBUG] {}", format!($($arg)*));
    }};
}

macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(all(feature = "defmt", not(test)))]
        ::defmt::trace!($($arg)*);

        #[cfg(test)]
        println!("[TRACE] {}", format!($($arg)*));
    }};
}
