use crate::{
    encode::{is_regular, PdfEncoder},
    pdf::Name,
    writer::{Encoder, Writer},
};

impl Encoder<Name> for PdfEncoder {
    fn encoded_len(n: &Name) -> usize {
        n.iter().map(|c| if is_regular(*c) { 1 } else { 3 }).sum::<usize>() + 1
    }

    fn write_to(n: &Name, writer: &mut dyn Writer) {
        let mut last_write = 0;
        writer.write(b"/");
        for (index, &c) in n.iter().enumerate() {
            if !is_regular(c) {
                writer.write(&n[last_write..index]);
                last_write = index + 1;
                writer.write(b"#");
                writer.write(hex::encode(c.to_be_bytes()).as_bytes())
            }
        }
        writer.write(&n[last_write..]);
    }
}
