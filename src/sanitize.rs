//! ASCII-only renderings of arbitrary text for logs and file names.

use std::borrow::Cow;
use std::fmt::Display;
use std::path::Path;

const FILENAME_KEEP_CHARS: [char; 3] = [' ', '.', '_'];

/// Input accepted by [`to_safe_print`] and [`to_safe_filename`].
#[derive(Debug, Clone)]
pub enum Printable<'a> {
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
}

impl Printable<'static> {
    /// Wraps any displayable value using its default textual representation.
    pub fn display<T: Display + ?Sized>(value: &T) -> Self {
        Printable::Text(Cow::Owned(value.to_string()))
    }
}

impl<'a> From<&'a str> for Printable<'a> {
    fn from(value: &'a str) -> Self {
        Printable::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Printable<'a> {
    fn from(value: &'a String) -> Self {
        Printable::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Printable<'static> {
    fn from(value: String) -> Self {
        Printable::Text(Cow::Owned(value))
    }
}

impl<'a> From<&'a [u8]> for Printable<'a> {
    fn from(value: &'a [u8]) -> Self {
        Printable::Bytes(Cow::Borrowed(value))
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Printable<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Printable::Bytes(Cow::Borrowed(value.as_slice()))
    }
}

impl<'a> From<&'a Vec<u8>> for Printable<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Printable::Bytes(Cow::Borrowed(value.as_slice()))
    }
}

impl<'a> From<&'a Path> for Printable<'a> {
    fn from(value: &'a Path) -> Self {
        Printable::Text(value.to_string_lossy())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonAsciiMode {
    Escape,
    Drop,
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if byte < 0x7f {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("\\x{byte:02x}"));
        }
    }
    out
}

fn encode_ascii(text: &str, mode: NonAsciiMode) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        if mode == NonAsciiMode::Drop {
            continue;
        }
        let code = u32::from(ch);
        if code <= 0xff {
            out.push_str(&format!("\\x{code:02x}"));
        } else if code <= 0xffff {
            out.push_str(&format!("\\u{code:04x}"));
        } else {
            out.push_str(&format!("\\U{code:08x}"));
        }
    }
    out
}

fn render(thing: Printable<'_>, mode: NonAsciiMode) -> String {
    match thing {
        // Raw bytes are always escaped, even when non-ASCII text would be dropped.
        Printable::Bytes(bytes) => escape_bytes(&bytes),
        Printable::Text(text) => encode_ascii(&text, mode),
    }
}

/// Renders any text or byte input as pure ASCII for diagnostics.
///
/// Bytes at or above `0x7f` become `\xHH`; non-ASCII characters become
/// `\xHH`, `\uHHHH` or `\UHHHHHHHH` depending on their code point.
pub fn to_safe_print<'a>(thing: impl Into<Printable<'a>>) -> String {
    render(thing.into(), NonAsciiMode::Escape)
}

/// Reduces any text or byte input to ASCII letters, digits, space, period and
/// underscore, with trailing whitespace removed.
pub fn to_safe_filename<'a>(thing: impl Into<Printable<'a>>) -> String {
    let printable = render(thing.into(), NonAsciiMode::Drop);
    printable
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || FILENAME_KEEP_CHARS.contains(ch))
        .collect::<String>()
        .trim_end()
        .to_string()
}
