use super::Reference;

/// Type number of a free entry in a cross-reference stream.
pub const XREF_FREE: u8 = 0;
/// Type number of a used (uncompressed) entry in a cross-reference stream.
pub const XREF_USED: u8 = 1;
/// Type number of an entry stored inside an object stream.
pub const XREF_IN_STREAM: u8 = 2;

/// Generation number of the object-0 sentinel and of synthesized free slots.
pub const FREE_SENTINEL_GEN: u16 = 65535;

/// One record of the cross-reference section.
///
/// `Used` and `Free` address objects by byte offset respectively free-list
/// successor; `InStream` addresses an object by its containing object stream
/// and position within it. The textual table only ever renders the first two
/// kinds; cross-reference streams render all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrefEntry {
    Free {
        number: usize,
        generation: u16,
        /// Object number of the next free entry, 0 at the end of the chain.
        next_free: usize,
    },
    Used {
        number: usize,
        generation: u16,
        offset: usize,
    },
    InStream {
        number: usize,
        /// Object number of the containing object stream.
        container: usize,
        /// 0-based position inside the container.
        index: usize,
    },
}

impl XrefEntry {
    pub fn number(&self) -> usize {
        match self {
            XrefEntry::Free { number, .. } => *number,
            XrefEntry::Used { number, .. } => *number,
            XrefEntry::InStream { number, .. } => *number,
        }
    }

    pub fn type_num(&self) -> u8 {
        match self {
            XrefEntry::Free { .. } => XREF_FREE,
            XrefEntry::Used { .. } => XREF_USED,
            XrefEntry::InStream { .. } => XREF_IN_STREAM,
        }
    }

    /// Second and third column of the stream encoding for this entry.
    pub(crate) fn wide_fields(&self) -> (u64, u64) {
        match self {
            XrefEntry::Free {
                generation,
                next_free,
                ..
            } => (*next_free as u64, *generation as u64),
            XrefEntry::Used {
                generation, offset, ..
            } => (*offset as u64, *generation as u64),
            XrefEntry::InStream {
                container, index, ..
            } => (*container as u64, *index as u64),
        }
    }
}

/// The cross-reference section of one save: an ordered list of subsections,
/// each holding entries with exactly contiguous object numbers.
///
/// Insertion is optimized for the common case of ascending object numbers
/// (one pass over the object graph) by caching the subsection that grew
/// last. Anything else falls back to a linear scan over the subsections,
/// which is fine because out-of-order insertions (mostly deleted entries)
/// are rare relative to the total object count.
#[derive(Debug, Clone, PartialEq)]
pub struct XrefSection {
    subsections: Vec<Vec<XrefEntry>>,
    active: usize,
}

impl XrefSection {
    /// A section with no entries at all. Only useful for output paths that
    /// build their own index.
    pub fn empty() -> Self {
        XrefSection {
            subsections: Vec::new(),
            active: 0,
        }
    }

    /// A section pre-seeded with the object-0 sentinel. Its `next_free`
    /// field is the head of the free-list chain, 0 while no object has been
    /// deleted.
    pub fn standard() -> Self {
        XrefSection {
            subsections: vec![vec![XrefEntry::Free {
                number: 0,
                generation: FREE_SENTINEL_GEN,
                next_free: 0,
            }]],
            active: 0,
        }
    }

    /// Record a live object at its byte offset.
    pub fn add_entry(&mut self, r: Reference, offset: usize) {
        self.add(XrefEntry::Used {
            number: r.number as usize,
            generation: r.generation,
            offset,
        });
    }

    /// Record a deleted object. `r.generation` must already be the bumped
    /// post-deletion generation; `next_free` is the object number of the
    /// next entry in the free list, 0 at the end of the chain.
    pub fn add_deleted_entry(&mut self, r: Reference, next_free: usize) {
        if r.number != 0 {
            self.patch_free_head(r.number as usize);
        }
        self.add(XrefEntry::Free {
            number: r.number as usize,
            generation: r.generation,
            next_free,
        });
    }

    /// Record an object that lives inside an object stream.
    pub fn add_in_stream_entry(&mut self, r: Reference, container: usize, index: usize) {
        self.add(XrefEntry::InStream {
            number: r.number as usize,
            container,
            index,
        });
    }

    /// Point the object-0 sentinel at the head of the free list. The
    /// smallest deleted object number wins, so insertion order of deleted
    /// entries does not matter for the head.
    fn patch_free_head(&mut self, number: usize) {
        if let Some(XrefEntry::Free {
            number: 0,
            next_free,
            ..
        }) = self.subsections.first_mut().and_then(|s| s.first_mut())
        {
            if *next_free == 0 || number < *next_free {
                *next_free = number;
            }
        }
    }

    fn add(&mut self, entry: XrefEntry) {
        if self.subsections.is_empty() {
            self.subsections.push(vec![entry]);
            self.active = 0;
            return;
        }

        // Fast path: the entry extends the subsection that grew last and no
        // later subsection exists that it could belong to instead.
        let last_number = self.subsections[self.active]
            .last()
            .map(XrefEntry::number)
            .unwrap_or(0);
        if entry.number() == last_number + 1 && self.active == self.subsections.len() - 1 {
            self.subsections[self.active].push(entry);
            return;
        }

        self.insert_out_of_order(entry);
    }

    fn insert_out_of_order(&mut self, entry: XrefEntry) {
        let number = entry.number();
        for i in 0..self.subsections.len() {
            let first = self.subsections[i][0].number();
            let last = self.subsections[i]
                .last()
                .map(XrefEntry::number)
                .unwrap_or(first);

            if number + 1 == first {
                self.subsections[i].insert(0, entry);
                self.active = i;
                return;
            }
            if number >= first && number <= last {
                // Falls inside the range. A duplicate number is a caller bug
                // and simply lands before the first greater entry.
                let pos = self.subsections[i]
                    .iter()
                    .position(|e| e.number() > number)
                    .unwrap_or(self.subsections[i].len());
                self.subsections[i].insert(pos, entry);
                self.active = i;
                return;
            }
            if number == last + 1 {
                self.subsections[i].push(entry);
                self.active = i;
                return;
            }
            if number < first {
                self.subsections.insert(i, vec![entry]);
                self.active = i;
                return;
            }
        }
        self.subsections.push(vec![entry]);
        self.active = self.subsections.len() - 1;
    }

    /// Coalesce all subsections into one spanning `[0, highest]`, standing
    /// in free entries for never-assigned object numbers. Idempotent; a
    /// section that already has a single subsection is left untouched.
    ///
    /// Some consumers invalidate embedded signatures when an incremental
    /// update's index is split into many subsections, so a single contiguous
    /// run is the safe shape.
    pub fn fill_gaps(&mut self) {
        if self.subsections.len() <= 1 {
            return;
        }

        let highest = self.highest_number();
        let mut by_number = std::collections::BTreeMap::new();
        for entry in self.subsections.drain(..).flatten() {
            by_number.insert(entry.number(), entry);
        }

        let mut merged = Vec::with_capacity(highest + 1);
        for number in 0..=highest {
            merged.push(by_number.remove(&number).unwrap_or(XrefEntry::Free {
                number,
                generation: FREE_SENTINEL_GEN,
                next_free: 0,
            }));
        }
        self.subsections = vec![merged];
        self.active = 0;
    }

    pub fn highest_number(&self) -> usize {
        self.subsections
            .last()
            .and_then(|s| s.last())
            .map(XrefEntry::number)
            .unwrap_or(0)
    }

    pub fn entry_count(&self) -> usize {
        self.subsections.iter().map(Vec::len).sum()
    }

    pub fn subsections(&self) -> impl Iterator<Item = &[XrefEntry]> {
        self.subsections.iter().map(Vec::as_slice)
    }

    /// Look up the entry for an object number.
    pub fn entry(&self, number: usize) -> Option<&XrefEntry> {
        for subsection in &self.subsections {
            let first = subsection.first()?.number();
            if number >= first && number < first + subsection.len() {
                // Contiguous numbering makes the position a plain delta, but
                // duplicate insertions may have shifted entries, so check.
                return subsection.iter().find(|e| e.number() == number);
            }
        }
        None
    }

    /// Walk the free list from the object-0 sentinel, following each free
    /// entry's `next_free` as "next object number". Returns the visited
    /// object numbers in chain order, the terminating 0 excluded. The walk
    /// stops early if it hits a non-free entry or revisits a number, so a
    /// broken chain surfaces as a short walk, not an infinite loop.
    pub fn free_chain(&self) -> Vec<usize> {
        let mut visited = Vec::new();
        let mut next = match self.entry(0) {
            Some(XrefEntry::Free { next_free, .. }) => *next_free,
            _ => return visited,
        };
        while next != 0 && visited.len() < self.entry_count() {
            match self.entry(next) {
                Some(XrefEntry::Free { next_free, .. }) => {
                    visited.push(next);
                    next = *next_free;
                }
                _ => break,
            }
        }
        visited
    }
}
