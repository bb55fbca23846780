use std::collections::BTreeMap;

use crate::{
    pdf::{Bytes, Object, Reference},
    snapshot::Snapshot,
};

/// Per-object encryption collaborator. The writer calls it with the number
/// and generation of the object whose stream data is being transformed.
pub trait Security {
    fn encrypt(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8>;
}

struct Slot {
    generation: u16,
    object: Object,
}

/// The indirect object graph: owns every indirect object, hands out
/// reference numbers, and carries the trailer bookkeeping the writers read.
///
/// Enumeration order is ascending object number, which is what keeps the
/// cross-reference insertion on its fast path during a save.
#[derive(Default)]
pub struct ObjectContext {
    objects: BTreeMap<u32, Slot>,
    largest_object_number: u32,
    /// Reference to the document catalog.
    pub root: Option<Reference>,
    /// Reference to the document information dictionary.
    pub info: Option<Reference>,
    /// Reference to the encryption dictionary.
    pub encrypt: Option<Reference>,
    /// File identifier pair for the trailer.
    pub id: Option<[Bytes; 2]>,
    security: Option<Box<dyn Security>>,
    loaded_len: usize,
    last_xref_offset: usize,
}

impl std::fmt::Debug for ObjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContext")
            .field("objects", &self.objects.len())
            .field("largest_object_number", &self.largest_object_number)
            .field("root", &self.root)
            .finish()
    }
}

impl ObjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new, previously unused reference.
    pub fn next_ref(&mut self) -> Reference {
        self.largest_object_number += 1;
        Reference::new(self.largest_object_number, 0)
    }

    /// Put an object at an already allocated reference.
    pub fn register(&mut self, r: Reference, object: Object) {
        self.largest_object_number = self.largest_object_number.max(r.number);
        self.objects.insert(
            r.number,
            Slot {
                generation: r.generation,
                object,
            },
        );
    }

    /// Allocate a reference and register the object under it.
    pub fn assign(&mut self, object: Object) -> Reference {
        let r = self.next_ref();
        self.register(r, object);
        r
    }

    /// Retract a reference, dropping its object if one was registered. Used
    /// to undo bookkeeping references after a compressed save.
    pub fn delete(&mut self, r: Reference) -> Option<Object> {
        self.objects.remove(&r.number).map(|slot| slot.object)
    }

    pub fn get(&self, r: Reference) -> Option<&Object> {
        self.objects.get(&r.number).map(|slot| &slot.object)
    }

    pub fn get_mut(&mut self, r: Reference) -> Option<&mut Object> {
        self.objects.get_mut(&r.number).map(|slot| &mut slot.object)
    }

    /// The canonical reference for an object number, with its registered
    /// generation.
    pub fn reference(&self, number: u32) -> Option<Reference> {
        self.objects
            .get(&number)
            .map(|slot| Reference::new(number, slot.generation))
    }

    /// Reverse lookup by content equality.
    pub fn ref_of(&self, obj: &Object) -> Option<Reference> {
        self.objects
            .iter()
            .find(|(_, slot)| &slot.object == obj)
            .map(|(&number, slot)| Reference::new(number, slot.generation))
    }

    /// All (reference, object) pairs in ascending object-number order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Reference, &Object)> {
        self.objects
            .iter()
            .map(|(&number, slot)| (Reference::new(number, slot.generation), &slot.object))
    }

    pub(crate) fn object_numbers(&self) -> Vec<u32> {
        self.objects.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn largest_object_number(&self) -> u32 {
        self.largest_object_number
    }

    /// Rewind the high-water mark, e.g. after retracting bookkeeping
    /// references.
    pub fn set_largest_object_number(&mut self, number: u32) {
        self.largest_object_number = number;
    }

    pub fn set_security(&mut self, security: Box<dyn Security>) {
        self.security = Some(security);
    }

    pub fn has_security(&self) -> bool {
        self.security.is_some()
    }

    /// Record where the previously serialized form of this document ends and
    /// where its index starts. Whatever loaded the document sets this; a
    /// snapshot taken afterwards drives incremental saves against it.
    pub fn set_loaded(&mut self, loaded_len: usize, last_xref_offset: usize) {
        self.loaded_len = loaded_len;
        self.last_xref_offset = last_xref_offset;
    }

    pub fn loaded_len(&self) -> usize {
        self.loaded_len
    }

    pub fn last_xref_offset(&self) -> usize {
        self.last_xref_offset
    }

    /// Begin tracking an editable session against the current document
    /// state.
    pub fn take_snapshot(&self) -> Snapshot {
        Snapshot::incremental(
            self.loaded_len,
            self.last_xref_offset,
            self.largest_object_number,
        )
    }

    /// The stream object at `r` with its data run through the security
    /// transform, if security is configured and `r` is an unencrypted
    /// stream. Returns a transformed copy; the stored object keeps its
    /// plaintext, so a later save encrypts the same input again instead of
    /// double-encrypting. The encryption dictionary itself is never
    /// encrypted.
    pub(crate) fn encrypted_copy(&self, r: Reference) -> Option<Object> {
        let security = self.security.as_ref()?;
        if self.encrypt == Some(r) {
            return None;
        }
        match self.get(r) {
            Some(Object::Stream(stream)) => {
                let mut stream = stream.clone();
                let data = security.encrypt(r.number, r.generation, &stream.data);
                stream.set_data(data);
                Some(Object::Stream(stream))
            }
            _ => None,
        }
    }

    /// Encrypt loose bytes on behalf of an object that is not registered in
    /// the graph (object-stream containers during a compressed save).
    pub(crate) fn encrypt_data(&self, r: Reference, data: Vec<u8>) -> Vec<u8> {
        match &self.security {
            Some(security) => security.encrypt(r.number, r.generation, &data),
            None => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Dictionary, Name, Stream};

    struct Xor(u8);

    impl Security for Xor {
        fn encrypt(&self, _number: u32, _generation: u16, data: &[u8]) -> Vec<u8> {
            data.iter().map(|b| b ^ self.0).collect()
        }
    }

    #[test]
    fn assign_allocates_ascending_numbers() {
        let mut ctx = ObjectContext::new();
        let a = ctx.assign(Object::Integer(1));
        let b = ctx.assign(Object::Integer(2));

        assert_eq!(a, Reference::new(1, 0));
        assert_eq!(b, Reference::new(2, 0));
        assert_eq!(ctx.largest_object_number(), 2);
        assert_eq!(ctx.get(a), Some(&Object::Integer(1)));
    }

    #[test]
    fn delete_retracts_and_rewind_restores_numbering() {
        let mut ctx = ObjectContext::new();
        ctx.assign(Object::Integer(1));
        let before = ctx.largest_object_number();

        let extra = ctx.next_ref();
        assert_eq!(extra.number, 2);
        ctx.delete(extra);
        ctx.set_largest_object_number(before);

        assert_eq!(ctx.next_ref().number, 2);
    }

    #[test]
    fn ref_of_finds_by_content() {
        let mut ctx = ObjectContext::new();
        let dict = Dictionary::from([(Name::from_str("K"), Object::Integer(5))]);
        let r = ctx.assign(Object::Dictionary(dict.clone()));

        assert_eq!(ctx.ref_of(&Object::Dictionary(dict)), Some(r));
        assert_eq!(ctx.ref_of(&Object::Integer(42)), None);
    }

    #[test]
    fn encrypted_copy_leaves_the_stored_stream_alone() {
        let mut ctx = ObjectContext::new();
        let r = ctx.assign(Object::Stream(Stream::new(
            Dictionary::new(),
            b"abc".to_vec(),
        )));
        assert!(ctx.encrypted_copy(r).is_none());

        ctx.set_security(Box::new(Xor(0xff)));
        let copy = ctx.encrypted_copy(r).expect("stream copy");
        match &copy {
            Object::Stream(s) => {
                assert_eq!(&s.data[..], &[b'a' ^ 0xff, b'b' ^ 0xff, b'c' ^ 0xff])
            }
            other => panic!("unexpected object {other:?}"),
        }
        // the graph keeps the plaintext, so a second copy sees the same
        // input and comes out identical
        assert_eq!(ctx.encrypted_copy(r), Some(copy));
        match ctx.get(r) {
            Some(Object::Stream(s)) => assert_eq!(&s.data[..], b"abc"),
            other => panic!("unexpected object {other:?}"),
        }

        // the encryption dictionary itself is exempt
        ctx.encrypt = Some(r);
        assert!(ctx.encrypted_copy(r).is_none());
    }

    #[test]
    fn enumerate_yields_ascending_numbers() {
        let mut ctx = ObjectContext::new();
        ctx.register(Reference::new(5, 0), Object::Null);
        ctx.register(Reference::new(2, 0), Object::Null);
        ctx.register(Reference::new(9, 1), Object::Null);

        let numbers: Vec<u32> = ctx.enumerate().map(|(r, _)| r.number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);
        assert_eq!(ctx.reference(9), Some(Reference::new(9, 1)));
        assert_eq!(ctx.largest_object_number(), 9);
    }
}
