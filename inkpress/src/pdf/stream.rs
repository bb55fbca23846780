use super::{Bytes, Dictionary, Name, Object};

pub const K_LENGTH: &[u8] = b"Length";
pub const K_FILTER: &[u8] = b"Filter";
pub const K_TYPE: &[u8] = b"Type";
pub const FLATE_DECODE: &str = "FlateDecode";

/// A stream object: dictionary plus raw data.
///
/// The `/Length` entry always mirrors `data.len()`; every mutation goes
/// through [`Stream::set_data`] so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dictionary: Dictionary,
    pub data: Bytes,
}

impl Stream {
    pub fn new(mut dictionary: Dictionary, data: Vec<u8>) -> Self {
        dictionary.insert(Name::from(K_LENGTH), Object::from(data.len()));
        Stream {
            dictionary,
            data: data.into(),
        }
    }

    /// Replace the payload and keep `/Length` in sync.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dictionary
            .insert(Name::from(K_LENGTH), Object::from(data.len()));
        self.data = data.into();
    }

    pub fn has_filter(&self) -> bool {
        self.dictionary.contains_key(K_FILTER)
    }

    pub fn set_filter_flate(&mut self) {
        self.dictionary
            .insert(Name::from(K_FILTER), Object::from(Name::from_str(FLATE_DECODE)));
    }

    /// The `/Type` name, if the dictionary carries one.
    pub fn type_name(&self) -> Option<&Name> {
        self.dictionary.get(K_TYPE).and_then(Object::name)
    }
}
