use crate::{
    encode::PdfEncoder,
    pdf::{XrefEntry, XrefSection},
    writer::{Encoder, Writer},
};

/// Fixed width of one textual table entry: 10-digit offset, space, 5-digit
/// generation, space, `n`/`f`, space, newline.
const ENTRY_LEN: usize = 20;

impl Encoder<XrefSection> for PdfEncoder {
    fn encoded_len(section: &XrefSection) -> usize {
        let mut size = 5; // "xref\n"
        for subsection in section.subsections() {
            let first = subsection[0].number();
            size += first.to_string().len() + 1 + subsection.len().to_string().len() + 1;
            size += subsection.len() * ENTRY_LEN;
        }
        size
    }

    fn write_to(section: &XrefSection, writer: &mut dyn Writer) {
        log::trace!("write xref table");

        writer.write(b"xref\n");
        for subsection in section.subsections() {
            let first = subsection[0].number();
            writer.write(format!("{} {}\n", first, subsection.len()).as_bytes());
            for entry in subsection {
                let line = match entry {
                    XrefEntry::Used {
                        generation, offset, ..
                    } => format!("{:010} {:05} n \n", offset, generation),
                    XrefEntry::Free {
                        generation,
                        next_free,
                        ..
                    } => format!("{:010} {:05} f \n", next_free, generation),
                    XrefEntry::InStream { .. } => {
                        // only cross-reference streams can address into object
                        // streams; the flat writer never produces this kind
                        unreachable!("compressed entry in a textual xref table")
                    }
                };
                writer.write(line.as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::Reference;

    use super::*;

    #[test]
    fn one_live_one_deleted_entry() {
        // one live object at offset 21, one deleted object chained to the
        // list end; the sentinel points at the deleted object
        let mut section = XrefSection::standard();
        section.add_entry(Reference::new(1, 0), 21);
        section.add_deleted_entry(Reference::new(2, 1), 0);

        let encoded_len = PdfEncoder::encoded_len(&section);
        let mut out = Vec::new();
        PdfEncoder::write_to(&section, &mut out);

        let expected = b"xref\n\
                         0 3\n\
                         0000000002 65535 f \n\
                         0000000021 00000 n \n\
                         0000000000 00001 f \n";
        assert_eq!(
            out,
            expected,
            "expected:\n{}got:\n{}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&out)
        );
        assert_eq!(encoded_len, out.len());
    }

    #[test]
    fn gap_filled_section_renders_one_subsection() {
        let mut section = XrefSection::standard();
        section.add_entry(Reference::new(1, 0), 10);
        section.add_entry(Reference::new(2, 0), 20);
        section.add_entry(Reference::new(5, 0), 50);
        section.add_entry(Reference::new(6, 0), 60);
        section.fill_gaps();

        let encoded_len = PdfEncoder::encoded_len(&section);
        let mut out = Vec::new();
        PdfEncoder::write_to(&section, &mut out);

        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("xref\n0 7\n"), "got:\n{text}");
        assert_eq!(text.matches('\n').count(), 2 + 7);
        assert_eq!(encoded_len, out.len());
    }

    #[test]
    fn split_subsections_render_two_headers() {
        let mut section = XrefSection::standard();
        section.add_entry(Reference::new(1, 0), 10);
        section.add_entry(Reference::new(5, 0), 50);

        let encoded_len = PdfEncoder::encoded_len(&section);
        let mut out = Vec::new();
        PdfEncoder::write_to(&section, &mut out);

        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("xref\n0 2\n"));
        assert!(text.contains("\n5 1\n"), "got:\n{text}");
        assert_eq!(encoded_len, out.len());
    }
}
