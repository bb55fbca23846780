//! The bundling writer: ordinary objects grouped into object streams, the
//! index emitted as one flate-compressed cross-reference stream instead of a
//! flat table. Bookkeeping references allocated for the containers and the
//! index stream are retracted once the buffer exists, so a following save
//! starts from a clean numbering state.

use crate::{
    context::ObjectContext,
    error::WriteError,
    pdf::{Array, Dictionary, Name, Object, Reference, Stream, Trailer, XrefSection},
    snapshot::Snapshot,
    writer::{Encoder, Writer},
    PdfEncoder,
};

use super::{
    add_deleted_entries, collect_saveable, deflate, footer_len, framed_len, is_signature_dict,
    maybe_compress, write_footer, write_framed, SaveOptions, Saveable, Tick, HEADER,
};

/// Bundle size for object streams.
const OBJECTS_PER_STREAM: usize = 50;

/// Objects that must keep their own byte offset and stay out of any object
/// stream: the encryption dictionary, streams, placeholders, the document
/// root, anything with a non-zero generation, and signature dictionaries.
fn must_stay_direct(ctx: &ObjectContext, r: Reference, obj: &Object) -> bool {
    r.generation != 0
        || Some(r) == ctx.encrypt
        || Some(r) == ctx.root
        || matches!(obj, Object::Stream(_) | Object::Null)
        || is_signature_dict(obj)
}

pub(super) fn serialize(
    ctx: &mut ObjectContext,
    snapshot: &Snapshot,
    options: &SaveOptions,
    tick: &mut Tick,
) -> Result<Vec<u8>, WriteError> {
    let incremental = snapshot.is_incremental();
    let base = snapshot.pdf_size();
    let largest_before = ctx.largest_object_number();

    let saveable = collect_saveable(ctx, snapshot, options, tick);

    let mut direct: Vec<&Saveable> = Vec::new();
    let mut bucketed: Vec<Reference> = Vec::new();
    for s in saveable.iter().filter(|s| !s.stale) {
        let Some(obj) = s.object(ctx) else { continue };
        if must_stay_direct(ctx, s.r, obj) {
            direct.push(s);
        } else {
            bucketed.push(s.r);
        }
    }

    // every container consumes a fresh reference number with no meaning in
    // the logical document; all of them are retracted again below
    let mut extra_refs: Vec<Reference> = Vec::new();
    let mut containers: Vec<(Reference, Object)> = Vec::new();
    let mut in_stream: Vec<(Reference, Reference, usize)> = Vec::new();
    for group in bucketed.chunks(OBJECTS_PER_STREAM) {
        let container_ref = ctx.next_ref();
        extra_refs.push(container_ref);

        let mut header = String::new();
        let mut bodies: Vec<u8> = Vec::new();
        for &r in group {
            let Some(obj) = ctx.get(r) else { continue };
            header.push_str(&format!("{} {} ", r.number, bodies.len()));
            PdfEncoder::write_to(obj, &mut bodies);
            bodies.write(b"\n");
        }
        let first = header.len();
        let mut data = header.into_bytes();
        data.extend_from_slice(&bodies);

        let dict = Dictionary::from([
            (Name::from_str("Type"), Object::from(Name::from_str("ObjStm"))),
            (Name::from_str("N"), Object::from(group.len())),
            (Name::from_str("First"), Object::from(first)),
        ]);
        let mut stream = Stream::new(dict, data);
        if options.compress_streams {
            maybe_compress(container_ref, &mut stream);
        }
        if ctx.has_security() {
            let data = ctx.encrypt_data(container_ref, stream.data.to_vec());
            stream.set_data(data);
        }

        for (index, &r) in group.iter().enumerate() {
            in_stream.push((r, container_ref, index));
        }
        containers.push((container_ref, Object::Stream(stream)));
    }

    // sizing pass over everything that gets its own offset
    let mut offset = if incremental { base } else { HEADER.len() };
    let mut used: Vec<(Reference, usize)> = Vec::new();
    for s in &direct {
        let Some(obj) = s.object(ctx) else { continue };
        used.push((s.r, offset));
        offset += framed_len(s.r, obj);
    }
    for (r, obj) in &containers {
        used.push((*r, offset));
        offset += framed_len(*r, obj);
    }

    let xref_ref = ctx.next_ref();
    extra_refs.push(xref_ref);
    let start_xref = offset;
    used.push((xref_ref, start_xref));

    // both lists are ascending by object number, so a merge keeps the
    // section insertion on its fast path
    let mut xref = XrefSection::standard();
    let (mut ui, mut si) = (0, 0);
    while ui < used.len() || si < in_stream.len() {
        let take_used = match (used.get(ui), in_stream.get(si)) {
            (Some(u), Some(s)) => u.0.number < s.0.number,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if take_used {
            let (r, at) = used[ui];
            xref.add_entry(r, at);
            ui += 1;
        } else {
            let (r, container, index) = in_stream[si];
            xref.add_in_stream_entry(r, container.number as usize, index);
            si += 1;
        }
    }
    add_deleted_entries(snapshot, &mut xref);
    if options.fill_xref_gaps {
        xref.fill_gaps();
    }

    // the index stream itself: entry rows in the narrowest widths that fit,
    // flate-compressed, trailer fields folded into its dictionary
    let prev = snapshot.prev_start_xref();
    let trailer = Trailer {
        size: ctx.largest_object_number() as usize + 1,
        previous: (incremental && prev != 0).then_some(prev),
        root: ctx.root.ok_or(WriteError::MissingRoot)?,
        encrypt: ctx.encrypt,
        info: ctx.info,
        id: ctx.id.clone(),
    };
    let (widths, rows) = encode_rows(&xref);
    let mut dict: Dictionary = trailer.into();
    dict.insert(Name::from_str("Type"), Object::from(Name::from_str("XRef")));
    dict.insert(
        Name::from_str("W"),
        Object::from(Array::from_iter(widths.iter().map(|&w| Object::from(w)))),
    );
    dict.insert(Name::from_str("Index"), Object::from(index_array(&xref)));
    dict.insert(
        Name::from_str("Filter"),
        Object::from(Name::from_str("FlateDecode")),
    );
    // readers locate and decode this stream before any decryption can be
    // set up, so it is deflated but never encrypted
    let xref_obj = Object::Stream(Stream::new(dict, deflate(&rows)));

    let total = (start_xref - base) + framed_len(xref_ref, &xref_obj) + footer_len(start_xref);

    // materialize pass
    let mut out: Vec<u8> = Vec::with_capacity(total);
    if !incremental {
        out.write(HEADER);
    }
    for s in &direct {
        let Some(obj) = s.object(ctx) else { continue };
        write_framed(s.r, obj, &mut out);
    }
    for (r, obj) in &containers {
        write_framed(*r, obj, &mut out);
    }
    write_framed(xref_ref, &xref_obj, &mut out);
    write_footer(start_xref, &mut out);

    if out.len() != total {
        return Err(WriteError::SizeMismatch {
            expected: total,
            actual: out.len(),
        });
    }

    // retract the bookkeeping references so the next save starts clean
    for r in extra_refs {
        ctx.delete(r);
    }
    ctx.set_largest_object_number(largest_before);

    Ok(out)
}

/// Smallest number of big-endian bytes that can hold `max`.
fn byte_width(max: u64) -> usize {
    (((64 - max.leading_zeros()) + 7) / 8).max(1) as usize
}

/// Serialize all entries as fixed-width binary rows. Field widths are
/// computed from the maximum values actually used.
fn encode_rows(xref: &XrefSection) -> ([usize; 3], Vec<u8>) {
    let mut max = [0u64; 3];
    for subsection in xref.subsections() {
        for entry in subsection {
            let (f2, f3) = entry.wide_fields();
            max[0] = max[0].max(entry.type_num() as u64);
            max[1] = max[1].max(f2);
            max[2] = max[2].max(f3);
        }
    }
    let widths = [
        byte_width(max[0]),
        byte_width(max[1]),
        byte_width(max[2]),
    ];

    let mut rows = Vec::with_capacity(xref.entry_count() * (widths[0] + widths[1] + widths[2]));
    for subsection in xref.subsections() {
        for entry in subsection {
            let (f2, f3) = entry.wide_fields();
            for (value, width) in [(entry.type_num() as u64, widths[0]), (f2, widths[1]), (f3, widths[2])] {
                rows.extend_from_slice(&value.to_be_bytes()[8 - width..]);
            }
        }
    }
    (widths, rows)
}

/// `[first count ...]` pairs, one per subsection.
fn index_array(xref: &XrefSection) -> Array {
    let mut index = Array::new();
    for subsection in xref.subsections() {
        index.push(Object::from(subsection[0].number()));
        index.push(Object::from(subsection.len()));
    }
    index
}

#[cfg(test)]
mod tests {
    use crate::{pdf::XrefSection, save};

    use super::*;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn document() -> ObjectContext {
        let mut ctx = ObjectContext::new();
        let catalog = ctx.assign(Object::Dictionary(Dictionary::from([
            (Name::from_str("Type"), Object::from(Name::from_str("Catalog"))),
            (Name::from_str("Pages"), Object::Reference(Reference::new(2, 0))),
        ])));
        ctx.assign(Object::Dictionary(Dictionary::from([
            (Name::from_str("Type"), Object::from(Name::from_str("Pages"))),
            (Name::from_str("Count"), Object::Integer(1)),
        ])));
        ctx.assign(Object::Dictionary(Dictionary::from([(
            Name::from_str("Type"),
            Object::from(Name::from_str("Page")),
        )])));
        ctx.assign(Object::Stream(Stream::new(
            Dictionary::new(),
            b"0 0 m 10 10 l S".to_vec(),
        )));
        ctx.root = Some(catalog);
        ctx
    }

    fn options() -> SaveOptions {
        SaveOptions {
            use_object_streams: true,
            ..SaveOptions::default()
        }
    }

    #[test]
    fn bundles_ordinary_objects_and_writes_an_index_stream() {
        let mut ctx = document();
        let out = save::save(&mut ctx, &options()).unwrap();

        // the root and the content stream keep their own offsets
        assert!(find(&out, b"1 0 obj\n").is_some());
        assert!(find(&out, b"4 0 obj\n").is_some());
        // the pages and page dictionaries land inside a container
        assert!(find(&out, b"2 0 obj\n").is_none());
        assert!(find(&out, b"3 0 obj\n").is_none());
        assert!(find(&out, b"/ObjStm").is_some());
        assert!(find(&out, b"/XRef").is_some());
        // no flat table anywhere
        assert!(find(&out, b"\nxref\n").is_none());
        assert!(find(&out, b"trailer\n<<").is_none());
    }

    #[test]
    fn container_header_lists_numbers_and_offsets() {
        let mut ctx = document();
        let out = save::save(&mut ctx, &options()).unwrap();

        // two bucketed objects: "2 0 3 <offset> " pairs ahead of the bodies
        let at = find(&out, b"/ObjStm").expect("container dict");
        assert!(find(&out[at..], b"/N 2").is_some());
        assert!(find(&out[at..], b"2 0 3 ").is_some());
    }

    #[test]
    fn startxref_points_at_the_index_stream() {
        let mut ctx = document();
        let out = save::save(&mut ctx, &options()).unwrap();

        let start = find(&out, b"startxref\n").unwrap() + 10;
        let end = start + out[start..].iter().position(|&c| c == b'\n').unwrap();
        let start_xref: usize = std::str::from_utf8(&out[start..end]).unwrap().parse().unwrap();

        // the index stream got the highest bookkeeping number: 4 document
        // objects plus one container
        assert_eq!(&out[start_xref..start_xref + 8], b"6 0 obj\n");
    }

    #[test]
    fn bookkeeping_references_are_retracted() {
        let mut ctx = document();
        assert_eq!(ctx.largest_object_number(), 4);

        let first = save::save(&mut ctx, &options()).unwrap();
        assert_eq!(ctx.largest_object_number(), 4);
        assert_eq!(ctx.len(), 4);

        // a second save starts from the same numbering and produces the
        // same bytes
        let second = save::save(&mut ctx, &options()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_bundled_saves_with_security_are_identical() {
        struct Xor;

        impl crate::context::Security for Xor {
            fn encrypt(&self, number: u32, _generation: u16, data: &[u8]) -> Vec<u8> {
                data.iter().map(|b| b ^ number as u8).collect()
            }
        }

        let mut ctx = document();
        ctx.set_security(Box::new(Xor));

        let first = save::save(&mut ctx, &options()).unwrap();
        let second = save::save(&mut ctx, &options()).unwrap();
        assert_eq!(first, second);
        // the content stream is carried as ciphertext
        assert!(find(&first, b"0 0 m 10 10 l S").is_none());
    }

    #[test]
    fn non_zero_generations_stay_direct() {
        let mut ctx = document();
        ctx.register(Reference::new(9, 2), Object::Integer(1));
        let out = save::save(&mut ctx, &options()).unwrap();
        assert!(find(&out, b"9 2 obj\n").is_some());
    }

    #[test]
    fn signature_dicts_stay_direct() {
        let mut ctx = document();
        let sig = ctx.assign(Object::Dictionary(Dictionary::from([(
            Name::from_str("Type"),
            Object::from(Name::from_str("Sig")),
        )])));
        let out = save::save(&mut ctx, &options()).unwrap();
        assert!(find(&out, format!("{} 0 obj\n", sig.number).as_bytes()).is_some());
    }

    #[test]
    fn incremental_bundled_save_chains_to_the_base() {
        let mut ctx = document();
        let base = save::save(&mut ctx, &SaveOptions::default()).unwrap();
        ctx.set_loaded(base.len(), 17);
        let mut snapshot = ctx.take_snapshot();

        let r2 = ctx.reference(2).unwrap();
        snapshot.mark_ref_for_save(r2).unwrap();
        let delta = save::save_incremental(&mut ctx, snapshot, &options()).unwrap();

        assert!(!delta.starts_with(HEADER));
        assert!(find(&delta, b"/Prev 17").is_some());
        assert!(find(&delta, b"/ObjStm").is_some());
        // offsets are absolute: the container marker position plus the base
        // length must match its recorded offset, which exceeds the base
        assert!(find(&delta, b"1 0 obj\n").is_none());
    }

    #[test]
    fn minimal_widths_fit_the_maxima() {
        assert_eq!(byte_width(0), 1);
        assert_eq!(byte_width(2), 1);
        assert_eq!(byte_width(255), 1);
        assert_eq!(byte_width(256), 2);
        assert_eq!(byte_width(65535), 2);
        assert_eq!(byte_width(65536), 3);
    }

    #[test]
    fn rows_use_computed_widths() {
        let mut xref = XrefSection::standard();
        xref.add_entry(Reference::new(1, 0), 300);
        xref.add_in_stream_entry(Reference::new(2, 0), 5, 1);

        let (widths, rows) = encode_rows(&xref);
        // type fits one byte, offsets up to 300 need two, the sentinel
        // generation 65535 forces two for the third field
        assert_eq!(widths, [1, 2, 2]);
        assert_eq!(rows.len(), 3 * 5);
        let expected: Vec<u8> = vec![
            0, 0, 0, 255, 255, // sentinel: free, next 0, gen 65535
            1, 1, 44, 0, 0, // used at offset 300
            2, 0, 5, 0, 1, // in container 5, index 1
        ];
        assert_eq!(rows, expected);

        let index = index_array(&xref);
        let mut out = Vec::new();
        PdfEncoder::write_to(&Object::Array(index), &mut out);
        assert_eq!(&out[..], b"[0 3]");
    }
}
