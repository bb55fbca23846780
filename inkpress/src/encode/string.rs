use crate::{
    encode::PdfEncoder,
    pdf::PdfString,
    writer::{Encoder, Writer},
};

/// Flags every byte that needs a backslash escape: backslashes themselves,
/// and every parenthesis without a partner. Pairing is decided with a stack
/// of opening-paren indices, so a matched pair stays unescaped even when an
/// unmatched paren sits next to it.
fn needs_escape(str: &PdfString) -> Vec<bool> {
    let mut escape = vec![false; str.len()];
    let mut open_indices = Vec::new();
    for (index, char) in str.iter().enumerate() {
        match char {
            b'\\' => escape[index] = true,
            b'(' => open_indices.push(index),
            b')' => {
                if open_indices.pop().is_none() {
                    escape[index] = true;
                }
            }
            _ => {}
        }
    }
    // opening parens left on the stack found no partner
    for index in open_indices {
        escape[index] = true;
    }
    escape
}

impl Encoder<PdfString> for PdfEncoder {
    fn encoded_len(str: &PdfString) -> usize {
        let escaped = needs_escape(str).into_iter().filter(|&e| e).count();
        // two additional bytes for the opening and closing parenthesis
        str.len() + escaped + 2
    }

    fn write_to(str: &PdfString, writer: &mut dyn Writer) {
        let escape = needs_escape(str);

        writer.write(&b"("[..]);
        let mut last_written_index = 0;
        for index in 0..str.len() {
            if escape[index] {
                writer.write(&str[last_written_index..index]);
                writer.write(&br"\"[..]);
                last_written_index = index;
            }
        }
        writer.write(&str[last_written_index..]);
        writer.write(&b")"[..]);
    }
}
