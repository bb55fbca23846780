use super::{Bytes, Dictionary, Name, Object, Reference};

pub const TRAILER: &[u8] = b"trailer";
pub const K_SIZE: &[u8] = b"Size";
pub const K_PREVIOUS: &[u8] = b"Prev";
pub const K_ENCRYPT: &[u8] = b"Encrypt";
pub const K_ROOT: &[u8] = b"Root";
pub const K_INFO: &[u8] = b"Info";
pub const K_ID: &[u8] = b"ID";

/// The trailer of one save, built fresh from the context's bookkeeping on
/// every pass. `previous` is only set for incremental (chained) saves.
#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    /// Highest object number used in the document, plus one.
    pub size: usize,

    /// Byte offset of the previous cross-reference section.
    pub previous: Option<usize>,

    /// Reference to the document catalog.
    pub root: Reference,

    /// Reference to the encryption dictionary.
    pub encrypt: Option<Reference>,

    /// Reference to the document information dictionary.
    pub info: Option<Reference>,

    /// File identifier pair.
    pub id: Option<[Bytes; 2]>,
}

impl From<Trailer> for Dictionary {
    fn from(trailer: Trailer) -> Self {
        let mut dict = Dictionary::with_capacity(6);
        dict.insert(Name::from(K_SIZE), Object::from(trailer.size));
        dict.insert(Name::from(K_ROOT), Object::Reference(trailer.root));

        if let Some(info) = trailer.info {
            dict.insert(Name::from(K_INFO), Object::Reference(info));
        }

        if let Some(enc) = trailer.encrypt {
            dict.insert(Name::from(K_ENCRYPT), Object::Reference(enc));
        }

        if let Some([id0, id1]) = trailer.id {
            dict.insert(
                Name::from(K_ID),
                Object::Array(vec![Object::HexString(id0), Object::HexString(id1)].into()),
            );
        }

        if let Some(prev) = trailer.previous {
            dict.insert(Name::from(K_PREVIOUS), Object::from(prev));
        }

        dict
    }
}
