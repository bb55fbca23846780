use crate::{
    encode::PdfEncoder,
    pdf::Stream,
    writer::{Encoder, Writer},
};

const START_STREAM: &[u8] = b"\nstream\n";
const END_STREAM: &[u8] = b"\nendstream";

impl Encoder<Stream> for PdfEncoder {
    fn encoded_len(s: &Stream) -> usize {
        Self::encoded_len(&s.dictionary) + START_STREAM.len() + s.data.len() + END_STREAM.len()
    }

    fn write_to(s: &Stream, writer: &mut dyn Writer) {
        Self::write_to(&s.dictionary, writer);
        writer.write(START_STREAM);
        writer.write(&s.data);
        writer.write(END_STREAM);
    }
}
