//! Fixed-capacity, allocation-free text buffers with UTF-8 aware in-place
//! editing.
//!
//! The crate operates on caller-owned byte storage: a [`TextBuf`] borrows a
//! mutable byte slice and edits it in place, never allocating and never
//! writing at or past the slice's end. After every operation the content is
//! NUL-terminated at its current length, so the storage can be handed to
//! C-string consumers as-is.
//!
//! Content is *conventionally* UTF-8: editing keeps valid input valid (or
//! says where it doesn't), and [`sanitize`](TextBuf::sanitize) repairs
//! arbitrary byte soup in place. Capacity exhaustion is a soft failure —
//! operations truncate and re-terminate rather than erroring, which suits
//! the monitoring-style embedded use this crate targets. Callers that need
//! overflow visibility use the `try_` variants instead.
//!
//! ```
//! use textbuf::TextBuf;
//!
//! let mut storage = [0u8; 32];
//! let mut buf = TextBuf::new(&mut storage);
//! buf.append(b"temp=");
//! buf.append_float(25.37, 1);
//! assert_eq!(buf.as_str(), Some("temp=25.4"));
//! assert_eq!(buf.char_count(), 9);
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod ascii;
mod buf;
mod error;
pub mod fmt;
pub mod index;
pub mod num;
mod pattern;
pub mod search;
pub mod token;
pub mod utf8;


pub use buf::TextBuf;
pub use error::CapacityError;
pub use fmt::Arg;
pub use pattern::Matcher;
pub use token::Token;

/// Macro to build a fixed-size `[Arg; N]` array from a heterogeneous list of
/// format arguments.
///
/// ```rust
/// # use textbuf::{args, TextBuf};
/// let mut storage = [0u8; 64];
/// let mut buf = TextBuf::new(&mut storage);
/// buf.append_format("%s=%d (%04X)", &args!["span", -3, 0xBEEFu32]);
/// assert_eq!(buf.as_str(), Some("span=-3 (BEEF)"));
/// ```
#[macro_export]
macro_rules! args {
    ( $( $elem:expr ),* $(,)? ) => {{
        use $crate::fmt::ArgFrom;
        [$($crate::Arg::from_arg($elem)),*]
    }};
}
