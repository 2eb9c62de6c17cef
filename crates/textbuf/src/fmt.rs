//! A restricted, allocation-free printf-style formatting interpreter.
//!
//! [`TextBuf::append_format`] consumes a format string and a positional
//! argument list, strictly left to right. Rust has no C varargs, so the
//! argument stream is reified as a slice of [`Arg`] nodes, most conveniently
//! built with the [`args!`](crate::args) macro.
//!
//! Supported directives: `%s` (`(null)` for [`Arg::Null`]), `%d`/`%ld`,
//! `%u`/`%lu`, `%x`/`%X`/`%lx`/`%lX`, `%f` (two decimals unless `%.Nf`),
//! `%c` and `%%`. A leading `0` flag selects zero padding and a digit run
//! sets the minimum field width. Anything unrecognized is emitted verbatim
//! rather than treated as an error, and so is any directive left over once
//! the argument list is exhausted.

use bstr::ByteSlice;

use crate::{TextBuf, ascii};

/// One positional argument for [`TextBuf::append_format`].
///
/// The directive decides the rendering; numeric variants coerce freely
/// (`%d` happily prints an [`Arg::Uint`]), matching the loose typing of the
/// C varargs contract without its undefined behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    /// A borrowed string for `%s`.
    Str(&'a str),
    /// The null-pointer stand-in: `%s` renders it as `(null)`.
    Null,
    /// A signed integer for `%d`.
    Int(i64),
    /// An unsigned integer for `%u`/`%x`/`%X`.
    Uint(u64),
    /// A float for `%f`.
    Float(f64),
    /// A single character for `%c`.
    Char(char),
}

impl Arg<'_> {
    fn as_int(self) -> i64 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        match self {
            Arg::Int(i) => i,
            Arg::Uint(u) => u as i64,
            Arg::Float(f) => f as i64,
            Arg::Char(c) => i64::from(c as u32),
            Arg::Str(_) | Arg::Null => 0,
        }
    }

    fn as_uint(self) -> u64 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        match self {
            Arg::Int(i) => i as u64,
            Arg::Uint(u) => u,
            Arg::Float(f) => f as u64,
            Arg::Char(c) => u64::from(c as u32),
            Arg::Str(_) | Arg::Null => 0,
        }
    }

    fn as_float(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        match self {
            Arg::Int(i) => i as f64,
            Arg::Uint(u) => u as f64,
            Arg::Float(f) => f,
            Arg::Char(c) => f64::from(c as u32),
            Arg::Str(_) | Arg::Null => 0.0,
        }
    }

    fn as_char(self) -> Option<char> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        match self {
            Arg::Char(c) => Some(c),
            Arg::Int(i) => Some(char::from(i as u8)),
            Arg::Uint(u) => Some(char::from(u as u8)),
            Arg::Float(_) | Arg::Str(_) | Arg::Null => None,
        }
    }
}

/// Conversion helper behind the [`args!`](crate::args) macro.
#[doc(hidden)]
pub trait ArgFrom<'a, T> {
    /// Wraps `value` in the matching [`Arg`] variant.
    fn from_arg(value: T) -> Arg<'a>;
}

macro_rules! impl_int_arg_from {
    ($($t:ty),+) => {
        $(
            impl<'a> ArgFrom<'a, $t> for Arg<'a> {
                fn from_arg(value: $t) -> Arg<'a> {
                    Arg::Int(i64::from(value))
                }
            }
        )+
    };
}
impl_int_arg_from!(i8, i16, i32, i64);

macro_rules! impl_uint_arg_from {
    ($($t:ty),+) => {
        $(
            impl<'a> ArgFrom<'a, $t> for Arg<'a> {
                fn from_arg(value: $t) -> Arg<'a> {
                    Arg::Uint(u64::from(value))
                }
            }
        )+
    };
}
impl_uint_arg_from!(u8, u16, u32, u64);

impl<'a> ArgFrom<'a, f32> for Arg<'a> {
    fn from_arg(value: f32) -> Arg<'a> {
        Arg::Float(f64::from(value))
    }
}

impl<'a> ArgFrom<'a, f64> for Arg<'a> {
    fn from_arg(value: f64) -> Arg<'a> {
        Arg::Float(value)
    }
}

impl<'a> ArgFrom<'a, char> for Arg<'a> {
    fn from_arg(value: char) -> Arg<'a> {
        Arg::Char(value)
    }
}

impl<'a> ArgFrom<'a, &'a str> for Arg<'a> {
    fn from_arg(value: &'a str) -> Arg<'a> {
        Arg::Str(value)
    }
}

impl<'a> ArgFrom<'a, Option<&'a str>> for Arg<'a> {
    fn from_arg(value: Option<&'a str>) -> Arg<'a> {
        value.map_or(Arg::Null, Arg::Str)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value)
    }
}

impl From<i64> for Arg<'_> {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<u64> for Arg<'_> {
    fn from(value: u64) -> Self {
        Arg::Uint(value)
    }
}

impl From<f64> for Arg<'_> {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Char(value)
    }
}

impl TextBuf<'_> {
    /// Interprets `format` against `fmt_args` and appends the rendering.
    /// Returns the new length.
    ///
    /// Literal runs between directives are located with a scan to the next
    /// `%` and appended as one block. Each recognized directive consumes
    /// exactly one argument (except `%%`); once the argument stream runs
    /// dry the rest of the directives appear verbatim in the output, as
    /// does an incomplete trailing directive.
    #[allow(clippy::too_many_lines)]
    pub fn append_format(&mut self, format: &str, fmt_args: &[Arg<'_>]) -> usize {
        let bytes = format.as_bytes();
        let mut p = 0;
        let mut args_iter = fmt_args.iter().copied();
        while p < bytes.len() {
            match bytes[p..].find_byte(b'%') {
                Some(0) => {}
                Some(run) => {
                    self.append(&bytes[p..p + run]);
                    p += run;
                }
                None => {
                    self.append(&bytes[p..]);
                    break;
                }
            }
            let directive_start = p;
            p += 1;
            if p >= bytes.len() {
                // Trailing lone '%' renders nothing.
                break;
            }

            let mut pad = b' ';
            let mut width = 0usize;
            let mut precision: Option<usize> = None;
            if bytes[p] == b'0' {
                pad = b'0';
                p += 1;
            }
            while p < bytes.len() && ascii::is_digit(bytes[p]) {
                // Pathological widths stop growing at three digits.
                if width < 100 {
                    width = width * 10 + usize::from(bytes[p] - b'0');
                }
                p += 1;
            }
            if p < bytes.len() && bytes[p] == b'.' {
                p += 1;
                let mut prec = 0usize;
                while p < bytes.len() && ascii::is_digit(bytes[p]) {
                    if prec < 100 {
                        prec = prec * 10 + usize::from(bytes[p] - b'0');
                    }
                    p += 1;
                }
                precision = Some(prec);
            }
            if p >= bytes.len() {
                // Format string ended inside the directive: emit it as-is.
                self.append(&bytes[directive_start..]);
                break;
            }

            // `l` is a width modifier only; our arguments are 64-bit
            // already, so it just selects the same rendering.
            let mut kind = bytes[p];
            if kind == b'l' {
                match bytes.get(p + 1) {
                    Some(&(long_kind @ (b'd' | b'u' | b'x' | b'X'))) => {
                        kind = long_kind;
                        p += 1;
                    }
                    _ => {
                        // Bare `l`: swallowed, the next byte is literal.
                        p += 1;
                        continue;
                    }
                }
            }

            match kind {
                b'%' => {
                    self.append(b"%");
                }
                b's' => match args_iter.next() {
                    Some(Arg::Str(s)) => {
                        self.append(s.as_bytes());
                    }
                    Some(_) => {
                        self.append(b"(null)");
                    }
                    None => {
                        self.append(&bytes[directive_start..=p]);
                    }
                },
                b'd' => match args_iter.next() {
                    Some(arg) => {
                        self.append_int(arg.as_int(), width, pad);
                    }
                    None => {
                        self.append(&bytes[directive_start..=p]);
                    }
                },
                b'u' => match args_iter.next() {
                    Some(arg) => {
                        self.append_uint(arg.as_uint(), width, pad);
                    }
                    None => {
                        self.append(&bytes[directive_start..=p]);
                    }
                },
                b'x' | b'X' => match args_iter.next() {
                    Some(arg) => {
                        self.append_hex(arg.as_uint(), width, pad, kind == b'X');
                    }
                    None => {
                        self.append(&bytes[directive_start..=p]);
                    }
                },
                b'f' => match args_iter.next() {
                    Some(arg) => {
                        self.append_float(arg.as_float(), precision.unwrap_or(2));
                    }
                    None => {
                        self.append(&bytes[directive_start..=p]);
                    }
                },
                b'c' => match args_iter.next() {
                    Some(arg) => {
                        if let Some(c) = arg.as_char() {
                            self.push_char(c);
                        }
                    }
                    None => {
                        self.append(&bytes[directive_start..=p]);
                    }
                },
                unknown => {
                    // Unrecognized directive: emit `%` and the byte itself.
                    self.append(b"%");
                    self.append(&[unknown]);
                }
            }
            p += 1;
        }
        self.len()
    }
}
