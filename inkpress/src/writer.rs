/// Byte sink the encoders write into.
///
/// The whole crate sizes its output before writing, so a sink never needs to
/// report errors; it only appends and tells the caller how far it has come.
pub trait Writer {
    fn write(&mut self, buf: &[u8]);

    /// Number of bytes written so far.
    fn position(&self) -> usize;
}

impl Writer for Vec<u8> {
    fn write(&mut self, buf: &[u8]) {
        self.extend_from_slice(buf);
    }

    fn position(&self) -> usize {
        self.len()
    }
}

/// Exact serialization contract.
///
/// `encoded_len` must return precisely the number of bytes `write_to` emits
/// for the same value. The save passes rely on this to allocate the output
/// buffer once, with no resizing and no bounds slack.
pub trait Encoder<O> {
    fn encoded_len(o: &O) -> usize;
    fn write_to(o: &O, writer: &mut dyn Writer);
}
