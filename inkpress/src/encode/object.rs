use crate::{
    encode::PdfEncoder,
    pdf::Object,
    writer::{Encoder, Writer},
};

const TRUE_OBJECT: &str = "true";
const FALSE_OBJECT: &str = "false";
const NULL_OBJECT: &str = "null";

/// One formatting for reals in both passes; `f32`'s `Display` is already
/// shortest-roundtrip and deterministic.
fn fmt_real(v: f32) -> String {
    format!("{}", v)
}

impl Encoder<Object> for PdfEncoder {
    fn encoded_len(obj: &Object) -> usize {
        match obj {
            Object::String(str) => Self::encoded_len(str),
            Object::HexString(bytes) => 2 + bytes.len() * 2,
            Object::Real(v) => fmt_real(*v).len(),
            Object::Integer(i) => i.to_string().len(),
            Object::Bool(true) => TRUE_OBJECT.len(),
            Object::Bool(false) => FALSE_OBJECT.len(),
            Object::Name(n) => Self::encoded_len(n),
            Object::Array(a) => Self::encoded_len(a),
            Object::Dictionary(d) => Self::encoded_len(d),
            Object::Stream(s) => Self::encoded_len(s),
            Object::Reference(r) => {
                r.number.to_string().len() + r.generation.to_string().len() + 3
            }
            Object::Null => NULL_OBJECT.len(),
        }
    }

    fn write_to(obj: &Object, writer: &mut dyn Writer) {
        match obj {
            Object::String(str) => Self::write_to(str, writer),
            Object::HexString(bytes) => {
                writer.write(b"<");
                writer.write(hex::encode(&bytes[..]).as_bytes());
                writer.write(b">");
            }
            Object::Real(v) => writer.write(fmt_real(*v).as_bytes()),
            Object::Integer(i) => writer.write(i.to_string().as_bytes()),
            Object::Bool(true) => writer.write(TRUE_OBJECT.as_bytes()),
            Object::Bool(false) => writer.write(FALSE_OBJECT.as_bytes()),
            Object::Name(n) => Self::write_to(n, writer),
            Object::Array(a) => Self::write_to(a, writer),
            Object::Dictionary(d) => Self::write_to(d, writer),
            Object::Stream(s) => Self::write_to(s, writer),
            Object::Reference(r) => {
                writer.write(r.number.to_string().as_bytes());
                writer.write(b" ");
                writer.write(r.generation.to_string().as_bytes());
                writer.write(b" R");
            }
            Object::Null => writer.write(NULL_OBJECT.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::{Name, PdfString, Reference};

    use super::*;

    fn roundtrip_len(obj: &Object) -> Vec<u8> {
        let encoded_len = PdfEncoder::encoded_len(obj);
        let mut out = Vec::new();
        PdfEncoder::write_to(obj, &mut out);
        assert_eq!(encoded_len, out.len(), "length mismatch for {obj}");
        out
    }

    #[test]
    fn scalars() {
        assert_eq!(roundtrip_len(&Object::Integer(0)), b"0");
        assert_eq!(roundtrip_len(&Object::Integer(-42)), b"-42");
        assert_eq!(roundtrip_len(&Object::Bool(true)), b"true");
        assert_eq!(roundtrip_len(&Object::Bool(false)), b"false");
        assert_eq!(roundtrip_len(&Object::Null), b"null");
        assert_eq!(roundtrip_len(&Object::Real(1.5)), b"1.5");
    }

    #[test]
    fn reference() {
        assert_eq!(
            roundtrip_len(&Object::Reference(Reference::new(12, 3))),
            b"12 3 R"
        );
    }

    #[test]
    fn hex_string() {
        assert_eq!(
            roundtrip_len(&Object::HexString(b"\x01\xff".as_slice().into())),
            b"<01ff>"
        );
    }

    #[test]
    fn name_and_string_dispatch() {
        assert_eq!(roundtrip_len(&Object::from(Name::from_str("Type"))), b"/Type");
        assert_eq!(
            roundtrip_len(&Object::from(PdfString::from_str("hi"))),
            b"(hi)"
        );
    }
}
