use crate::{
    encode::PdfEncoder,
    pdf::Array,
    writer::{Encoder, Writer},
};

impl Encoder<Array> for PdfEncoder {
    fn encoded_len(array: &Array) -> usize {
        // brackets, items, one separator between each pair of items
        2 + array.iter().map(Self::encoded_len).sum::<usize>() + array.len().saturating_sub(1)
    }

    fn write_to(array: &Array, writer: &mut dyn Writer) {
        writer.write(b"[");
        for (i, item) in array.iter().enumerate() {
            if i != 0 {
                writer.write(b" ");
            }
            Self::write_to(item, writer);
        }
        writer.write(b"]");
    }
}
