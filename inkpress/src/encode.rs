//! `Encoder` impls for every object type. Each impl keeps `encoded_len` and
//! `write_to` in exact agreement; the save passes depend on that to size the
//! output buffer up front.

mod array;
mod dictionary;
mod name;
mod object;
mod stream;
mod string;
mod xref;

/// The crate's one encoder: plain, uncompressed object syntax.
pub struct PdfEncoder;

/// Regular characters may appear in a name unescaped: printable, not a
/// delimiter, not whitespace, not the `#` escape character itself.
pub(crate) fn is_regular(c: u8) -> bool {
    matches!(c, b'!'..=b'~')
        && !matches!(
            c,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        )
}
