//! The save engine: a two-pass serialization that first computes the exact
//! output size while building the cross-reference section, then fills one
//! buffer of that size. Two index strategies share the machinery here: the
//! classic flat table (`table`) and the compressed cross-reference stream
//! with object bundling (`stream`).

use std::io::Write as _;

use flate2::{write::ZlibEncoder, Compression};

use crate::{
    context::ObjectContext,
    error::WriteError,
    pdf::{stream::K_TYPE, Object, Reference, XrefSection},
    snapshot::Snapshot,
    writer::{Encoder, Writer},
    PdfEncoder,
};

mod stream;
mod table;

/// File header written by full saves. Incremental saves never re-emit it.
pub const HEADER: &[u8] = b"%PDF-1.7\n%\xb5\xed\xae\xfb\n\n";

/// Streams below this size are never compressed; the filter overhead would
/// outgrow the savings.
pub(crate) const MIN_COMPRESS_LEN: usize = 64;

/// Knobs for one save operation.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Try to flate-compress filterless raw streams, keeping the compressed
    /// form only when it is strictly smaller.
    pub compress_streams: bool,
    /// Bundle ordinary objects into object streams and emit a compressed
    /// cross-reference stream instead of the flat table.
    pub use_object_streams: bool,
    /// Coalesce the cross-reference section into one contiguous subsection
    /// before writing it.
    pub fill_xref_gaps: bool,
    /// How many objects the sizing pass handles between two yield points.
    /// 0 disables yielding.
    pub objects_per_tick: usize,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            compress_streams: false,
            use_object_streams: false,
            fill_xref_gaps: false,
            objects_per_tick: 50,
        }
    }
}

/// Serialize the whole object graph.
pub fn save(ctx: &mut ObjectContext, options: &SaveOptions) -> Result<Vec<u8>, WriteError> {
    dispatch(ctx, &Snapshot::full(), options, &mut Tick::disabled())
}

/// Like [`save`], yielding to `on_tick` every `objects_per_tick` objects so
/// a cooperative host can interleave other work during large saves.
pub fn save_with_tick(
    ctx: &mut ObjectContext,
    options: &SaveOptions,
    on_tick: &mut dyn FnMut(),
) -> Result<Vec<u8>, WriteError> {
    dispatch(
        ctx,
        &Snapshot::full(),
        options,
        &mut Tick::every(options.objects_per_tick, on_tick),
    )
}

/// Serialize only the delta against the snapshot's base document. The result
/// contains no byte of the original `[0, pdf_size)` range; callers append it
/// to the original bytes themselves. The snapshot is consumed: it is only
/// valid for exactly one save.
pub fn save_incremental(
    ctx: &mut ObjectContext,
    snapshot: Snapshot,
    options: &SaveOptions,
) -> Result<Vec<u8>, WriteError> {
    dispatch(ctx, &snapshot, options, &mut Tick::disabled())
}

/// [`save_incremental`] with a cooperative yield hook.
pub fn save_incremental_with_tick(
    ctx: &mut ObjectContext,
    snapshot: Snapshot,
    options: &SaveOptions,
    on_tick: &mut dyn FnMut(),
) -> Result<Vec<u8>, WriteError> {
    dispatch(
        ctx,
        &snapshot,
        options,
        &mut Tick::every(options.objects_per_tick, on_tick),
    )
}

fn dispatch(
    ctx: &mut ObjectContext,
    snapshot: &Snapshot,
    options: &SaveOptions,
    tick: &mut Tick,
) -> Result<Vec<u8>, WriteError> {
    log::debug!(
        "save: incremental={} object_streams={} objects={}",
        snapshot.is_incremental(),
        options.use_object_streams,
        ctx.len()
    );
    if options.use_object_streams {
        stream::serialize(ctx, snapshot, options, tick)
    } else {
        table::serialize(ctx, snapshot, options, tick)
    }
}

/// Cooperative yield counter for the sizing pass.
pub(crate) struct Tick<'a> {
    every: usize,
    seen: usize,
    hook: Option<&'a mut dyn FnMut()>,
}

impl<'a> Tick<'a> {
    pub(crate) fn disabled() -> Self {
        Tick {
            every: 0,
            seen: 0,
            hook: None,
        }
    }

    pub(crate) fn every(every: usize, hook: &'a mut dyn FnMut()) -> Self {
        Tick {
            every,
            seen: 0,
            hook: Some(hook),
        }
    }

    pub(crate) fn bump(&mut self) {
        self.seen += 1;
        if self.every != 0 && self.seen % self.every == 0 {
            if let Some(hook) = self.hook.as_mut() {
                hook();
            }
        }
    }
}

pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    // writing into a Vec cannot fail; fall back to the input untouched so
    // the caller sees a "compression did not help" outcome
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .unwrap_or_else(|_| data.to_vec())
}

/// Size trade-off only, never semantic: skip streams that already declare a
/// filter, skip tiny streams, and keep the original if flate does not
/// strictly shrink it.
pub(crate) fn maybe_compress(r: Reference, stream: &mut crate::pdf::Stream) {
    if stream.has_filter() || stream.data.len() < MIN_COMPRESS_LEN {
        return;
    }
    let compressed = deflate(&stream.data);
    if compressed.len() < stream.data.len() {
        log::trace!(
            "compress {}: {} -> {} bytes",
            r,
            stream.data.len(),
            compressed.len()
        );
        stream.set_data(compressed);
        stream.set_filter_flate();
    }
}

/// Index structures left over from a previous save of the same graph. A full
/// save rebuilds its own index, so these must not be re-serialized. Detected
/// by type, not by object number.
pub(crate) fn is_stale_index_object(obj: &Object) -> bool {
    match obj.stream().and_then(|s| s.type_name()) {
        Some(name) => name.as_bytes() == b"XRef" || name.as_bytes() == b"ObjStm",
        None => false,
    }
}

/// Signature dictionaries must stay directly addressable for byte-range
/// checks, so the bundling writer leaves them out of object streams.
pub(crate) fn is_signature_dict(obj: &Object) -> bool {
    obj.dictionary()
        .and_then(|d| d.get(K_TYPE))
        .and_then(Object::name)
        .map(|n| n.as_bytes() == b"Sig")
        .unwrap_or(false)
}

/// `"<num> <gen> obj\n" + content + "\nendobj\n\n"`.
pub(crate) fn framed_len(r: Reference, obj: &Object) -> usize {
    r.number.to_string().len()
        + 1
        + r.generation.to_string().len()
        + 5
        + PdfEncoder::encoded_len(obj)
        + 9
}

pub(crate) fn write_framed(r: Reference, obj: &Object, writer: &mut dyn Writer) {
    writer.write(r.number.to_string().as_bytes());
    writer.write(b" ");
    writer.write(r.generation.to_string().as_bytes());
    writer.write(b" obj\n");
    PdfEncoder::write_to(obj, writer);
    writer.write(b"\nendobj\n\n");
}

/// `"startxref\n<offset>\n%%EOF\n"`.
pub(crate) fn footer_len(start_xref: usize) -> usize {
    10 + start_xref.to_string().len() + 7
}

pub(crate) fn write_footer(start_xref: usize, writer: &mut dyn Writer) {
    writer.write(b"startxref\n");
    writer.write(start_xref.to_string().as_bytes());
    writer.write(b"\n%%EOF\n");
}

/// Convert the snapshot's deleted list into free entries. Each entry points
/// at the following deleted object number (0 for the last), with the
/// generation bumped by one so dangling references at the old generation are
/// detectably stale.
pub(crate) fn add_deleted_entries(snapshot: &Snapshot, xref: &mut XrefSection) {
    for i in 0..snapshot.deleted_count() {
        let Some(r) = snapshot.deleted_ref(i) else {
            continue;
        };
        let next = snapshot
            .deleted_ref(i + 1)
            .map(|n| n.number as usize)
            .unwrap_or(0);
        xref.add_deleted_entry(r.next_generation(), next);
    }
}

/// One admitted object of the sizing pass.
pub(crate) struct Saveable {
    pub r: Reference,
    /// Skipped as a stale index structure. Tracked for the trailer size
    /// adjustment; stale objects produce no entry and no bytes.
    pub stale: bool,
    /// Encrypted copy of the stream at `r`, computed once so both passes
    /// serialize the same bytes. The stored object stays plaintext.
    pub encrypted: Option<Object>,
}

impl Saveable {
    /// The object the writers must serialize for this entry: the encrypted
    /// copy when security produced one, the stored object otherwise.
    pub(crate) fn object<'a>(&'a self, ctx: &'a ObjectContext) -> Option<&'a Object> {
        match &self.encrypted {
            Some(obj) => Some(obj),
            None => ctx.get(self.r),
        }
    }
}

/// Walk the graph once: apply the snapshot filter, drop stale index
/// structures (full saves only), run the compression heuristic, take
/// encrypted copies where security applies, and yield at the configured
/// rate. The accepted references come back in ascending object-number
/// order.
pub(crate) fn collect_saveable(
    ctx: &mut ObjectContext,
    snapshot: &Snapshot,
    options: &SaveOptions,
    tick: &mut Tick,
) -> Vec<Saveable> {
    let mut out = Vec::new();
    for number in ctx.object_numbers() {
        let Some(r) = ctx.reference(number) else {
            continue;
        };
        if !snapshot.should_save(number) {
            continue;
        }

        let mut stale = false;
        if !snapshot.is_incremental() {
            if let Some(obj) = ctx.get(r) {
                stale = is_stale_index_object(obj);
            }
        }

        let mut encrypted = None;
        if !stale {
            if options.compress_streams {
                if let Some(Object::Stream(s)) = ctx.get_mut(r) {
                    maybe_compress(r, s);
                }
            }
            encrypted = ctx.encrypted_copy(r);
        }

        out.push(Saveable {
            r,
            stale,
            encrypted,
        });
        tick.bump();
    }
    out
}

/// Trailer `Size`: highest object number plus one, minus one again if the
/// highest-numbered object was the skipped stale index structure and is thus
/// absent from this save.
pub(crate) fn trailer_size(ctx: &ObjectContext, saveable: &[Saveable]) -> usize {
    let largest = ctx.largest_object_number() as usize;
    let stale_max = saveable
        .iter()
        .filter(|s| s.stale)
        .map(|s| s.r.number as usize)
        .max();
    if stale_max == Some(largest) {
        largest
    } else {
        largest + 1
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::{Dictionary, Name, Stream};

    use super::*;

    #[test]
    fn small_streams_are_left_alone() {
        // scenario: 40 bytes is below the minimum threshold
        let mut s = Stream::new(Dictionary::new(), vec![b'a'; 40]);
        maybe_compress(Reference::new(1, 0), &mut s);

        assert_eq!(s.data.len(), 40);
        assert!(!s.has_filter());
    }

    #[test]
    fn repetitive_streams_shrink_and_get_a_filter() {
        let mut s = Stream::new(Dictionary::new(), vec![b'a'; 500]);
        maybe_compress(Reference::new(1, 0), &mut s);

        assert!(s.data.len() < 500);
        assert!(s.has_filter());
        assert_eq!(
            s.dictionary.get(b"Length"),
            Some(&Object::Integer(s.data.len() as i64))
        );
    }

    #[test]
    fn filtered_streams_are_never_recompressed() {
        let mut dict = Dictionary::new();
        dict.insert(Name::from_str("Filter"), Object::from(Name::from_str("DCTDecode")));
        let mut s = Stream::new(dict, vec![b'a'; 500]);
        maybe_compress(Reference::new(1, 0), &mut s);

        assert_eq!(s.data.len(), 500);
        assert_eq!(
            s.dictionary.get(b"Filter"),
            Some(&Object::Name(Name::from_str("DCTDecode")))
        );
    }

    #[test]
    fn stale_index_objects_are_detected_by_type() {
        let mut dict = Dictionary::new();
        dict.insert(Name::from_str("Type"), Object::from(Name::from_str("XRef")));
        assert!(is_stale_index_object(&Object::Stream(Stream::new(
            dict.clone(),
            vec![]
        ))));

        let mut dict = Dictionary::new();
        dict.insert(Name::from_str("Type"), Object::from(Name::from_str("ObjStm")));
        assert!(is_stale_index_object(&Object::Stream(Stream::new(dict, vec![]))));

        assert!(!is_stale_index_object(&Object::Stream(Stream::new(
            Dictionary::new(),
            vec![]
        ))));
        // a plain dictionary with /Type /XRef is not a stream and stays
        let mut dict = Dictionary::new();
        dict.insert(Name::from_str("Type"), Object::from(Name::from_str("XRef")));
        assert!(!is_stale_index_object(&Object::Dictionary(dict)));
    }

    #[test]
    fn tick_fires_at_the_configured_rate() {
        let mut fired = 0;
        let mut hook = || fired += 1;
        let mut tick = Tick::every(2, &mut hook);
        for _ in 0..5 {
            tick.bump();
        }
        drop(tick);
        assert_eq!(fired, 2);
    }

    #[test]
    fn framing_matches_its_length() {
        let r = Reference::new(12, 0);
        let obj = Object::Integer(7);
        let mut out = Vec::new();
        write_framed(r, &obj, &mut out);
        assert_eq!(&out[..], b"12 0 obj\n7\nendobj\n\n");
        assert_eq!(framed_len(r, &obj), out.len());
    }

    #[test]
    fn footer_matches_its_length() {
        let mut out = Vec::new();
        write_footer(1234, &mut out);
        assert_eq!(&out[..], b"startxref\n1234\n%%EOF\n");
        assert_eq!(footer_len(1234), out.len());
    }
}
