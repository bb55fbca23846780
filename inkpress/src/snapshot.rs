use fnv::FnvHashSet;

use crate::{context::ObjectContext, error::WriteError, pdf::Object, pdf::Reference};

/// Decides which objects a save must write.
///
/// `Full` is the default for ordinary saves and accepts everything; its
/// mutation methods fail with [`WriteError::FullSnapshotMutation`] because
/// marking objects on it is a caller bug. `Incremental` is taken from a
/// loaded document and accepts only objects that were explicitly marked or
/// created after the snapshot.
///
/// A snapshot is consumed by exactly one save; `save_incremental` takes it
/// by value so reuse does not compile.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Full,
    Incremental {
        /// Byte length of the previously serialized document.
        pdf_size: usize,
        /// Offset of the previous cross-reference section.
        prev_start_xref: usize,
        /// Highest object number known when the snapshot was taken. Anything
        /// above it is new and always saved.
        last_object_number: u32,
        /// Object numbers explicitly marked for saving.
        changed: FnvHashSet<u32>,
        /// Deleted references in marking order; the writer chains the free
        /// list through this order.
        deleted: Vec<Reference>,
        /// Dedupe set for `deleted`, keyed by object number only.
        deleted_numbers: FnvHashSet<u32>,
    },
}

impl Snapshot {
    pub fn full() -> Self {
        Snapshot::Full
    }

    pub fn incremental(pdf_size: usize, prev_start_xref: usize, last_object_number: u32) -> Self {
        Snapshot::Incremental {
            pdf_size,
            prev_start_xref,
            last_object_number,
            changed: FnvHashSet::default(),
            deleted: Vec::new(),
            deleted_numbers: FnvHashSet::default(),
        }
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self, Snapshot::Incremental { .. })
    }

    /// Byte length of the base document, 0 for full saves of new documents.
    pub fn pdf_size(&self) -> usize {
        match self {
            Snapshot::Full => 0,
            Snapshot::Incremental { pdf_size, .. } => *pdf_size,
        }
    }

    /// Offset of the previous index, 0 for full saves of new documents.
    pub fn prev_start_xref(&self) -> usize {
        match self {
            Snapshot::Full => 0,
            Snapshot::Incremental {
                prev_start_xref, ..
            } => *prev_start_xref,
        }
    }

    /// Must this object number be written by the current save?
    pub fn should_save(&self, number: u32) -> bool {
        match self {
            Snapshot::Full => true,
            Snapshot::Incremental {
                last_object_number,
                changed,
                ..
            } => number > *last_object_number || changed.contains(&number),
        }
    }

    pub fn mark_ref_for_save(&mut self, r: Reference) -> Result<(), WriteError> {
        match self {
            Snapshot::Full => Err(WriteError::FullSnapshotMutation),
            Snapshot::Incremental { changed, .. } => {
                changed.insert(r.number);
                Ok(())
            }
        }
    }

    pub fn mark_refs_for_save(&mut self, refs: &[Reference]) -> Result<(), WriteError> {
        for &r in refs {
            self.mark_ref_for_save(r)?;
        }
        Ok(())
    }

    /// Resolve an object back to its reference and mark it. Objects without
    /// an assigned reference are silently skipped.
    pub fn mark_obj_for_save(
        &mut self,
        ctx: &ObjectContext,
        obj: &Object,
    ) -> Result<(), WriteError> {
        match ctx.ref_of(obj) {
            Some(r) => self.mark_ref_for_save(r),
            None => Ok(()),
        }
    }

    pub fn mark_objs_for_save(
        &mut self,
        ctx: &ObjectContext,
        objs: &[Object],
    ) -> Result<(), WriteError> {
        for obj in objs {
            self.mark_obj_for_save(ctx, obj)?;
        }
        Ok(())
    }

    /// Record a deletion. A second deletion of the same object number is a
    /// no-op; deduplication is keyed by number alone.
    pub fn mark_deleted_ref(&mut self, r: Reference) -> Result<(), WriteError> {
        match self {
            Snapshot::Full => Err(WriteError::FullSnapshotMutation),
            Snapshot::Incremental {
                deleted,
                deleted_numbers,
                ..
            } => {
                if deleted_numbers.insert(r.number) {
                    deleted.push(r);
                }
                Ok(())
            }
        }
    }

    pub fn mark_deleted_obj(&mut self, ctx: &ObjectContext, obj: &Object) -> Result<(), WriteError> {
        match ctx.ref_of(obj) {
            Some(r) => self.mark_deleted_ref(r),
            None => Ok(()),
        }
    }

    pub fn deleted_count(&self) -> usize {
        match self {
            Snapshot::Full => 0,
            Snapshot::Incremental { deleted, .. } => deleted.len(),
        }
    }

    /// Positional accessor into the deleted list. The writer uses index
    /// `i + 1` to chain each free entry to its successor.
    pub fn deleted_ref(&self, index: usize) -> Option<Reference> {
        match self {
            Snapshot::Full => None,
            Snapshot::Incremental { deleted, .. } => deleted.get(index).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_snapshot_saves_everything() {
        let snapshot = Snapshot::full();
        assert!(snapshot.should_save(0));
        assert!(snapshot.should_save(1));
        assert!(snapshot.should_save(u32::MAX));
    }

    #[test]
    fn full_snapshot_rejects_marking() {
        let mut snapshot = Snapshot::full();
        assert_eq!(
            snapshot.mark_ref_for_save(Reference::new(1, 0)),
            Err(WriteError::FullSnapshotMutation)
        );
        assert_eq!(
            snapshot.mark_deleted_ref(Reference::new(1, 0)),
            Err(WriteError::FullSnapshotMutation)
        );
    }

    #[test]
    fn incremental_saves_marked_and_new_objects() {
        // scenario: one mutated object, everything above the last known
        // number is new and saved regardless of marking
        let mut snapshot = Snapshot::incremental(1000, 900, 7);
        snapshot.mark_ref_for_save(Reference::new(3, 0)).unwrap();

        assert!(snapshot.should_save(3));
        assert!(!snapshot.should_save(2));
        assert!(!snapshot.should_save(7));
        assert!(snapshot.should_save(8));
        assert!(snapshot.should_save(100));
    }

    #[test]
    fn deletion_dedupes_by_number() {
        let mut snapshot = Snapshot::incremental(0, 0, 10);
        snapshot.mark_deleted_ref(Reference::new(4, 0)).unwrap();
        snapshot.mark_deleted_ref(Reference::new(2, 1)).unwrap();
        // same number again, different generation: still a no-op
        snapshot.mark_deleted_ref(Reference::new(4, 2)).unwrap();

        assert_eq!(snapshot.deleted_count(), 2);
        assert_eq!(snapshot.deleted_ref(0), Some(Reference::new(4, 0)));
        assert_eq!(snapshot.deleted_ref(1), Some(Reference::new(2, 1)));
        assert_eq!(snapshot.deleted_ref(2), None);
    }
}
