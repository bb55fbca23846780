use crate::{
    encode::PdfEncoder,
    pdf::Dictionary,
    writer::{Encoder, Writer},
};

impl Encoder<Dictionary> for PdfEncoder {
    fn encoded_len(o: &Dictionary) -> usize {
        // 2 bytes for start and end each.
        let mut size = 4;
        size += o
            .iter()
            .map(|(n, o)| Self::encoded_len(n) + Self::encoded_len(o))
            .sum::<usize>();

        // For N entries we need N delimiters between key and value. We also need one
        // delimiter for each pair (N - 1). This leads to 2 * N - 1.
        size += (o.len() * 2).saturating_sub(1);

        size
    }

    fn write_to(o: &Dictionary, writer: &mut dyn Writer) {
        writer.write(b"<<");
        let mut is_first = true;
        for (key, value) in o.iter() {
            if !is_first {
                writer.write(b" ");
            }
            Self::write_to(key, writer);
            writer.write(b" ");
            Self::write_to(value, writer);
            is_first = false
        }
        writer.write(b">>");
    }
}
