use std::fmt::Display;

/// An indirect reference: object number plus generation.
///
/// Plain `Copy` value semantics; two references with equal fields are the
/// same value, so no interning pool is needed. Allocation bookkeeping (next
/// free number, high-water mark) lives on the owning context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub number: u32,
    pub generation: u16,
}

impl Reference {
    pub const fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    /// The reference this slot carries once the object is deleted: same
    /// number, generation bumped by one so stale references are detectable.
    /// Saturates at 65535, the largest generation an entry can hold; a slot
    /// at the ceiling is never reused.
    pub fn next_generation(self) -> Self {
        Self {
            number: self.number,
            generation: self.generation.saturating_add(1),
        }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_bump_saturates_at_the_ceiling() {
        assert_eq!(Reference::new(4, 0).next_generation(), Reference::new(4, 1));
        assert_eq!(
            Reference::new(4, 65535).next_generation(),
            Reference::new(4, 65535)
        );
    }
}
