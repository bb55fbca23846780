//! The classic writer: objects, a flat `xref` table, a trailer dictionary
//! and the `startxref` footer.

use crate::{
    context::ObjectContext,
    error::WriteError,
    pdf::{trailer::TRAILER, Dictionary, Trailer, XrefSection},
    snapshot::Snapshot,
    writer::{Encoder, Writer},
    PdfEncoder,
};

use super::{
    add_deleted_entries, collect_saveable, footer_len, framed_len, trailer_size, write_footer,
    write_framed, SaveOptions, Tick, HEADER,
};

pub(super) fn serialize(
    ctx: &mut ObjectContext,
    snapshot: &Snapshot,
    options: &SaveOptions,
    tick: &mut Tick,
) -> Result<Vec<u8>, WriteError> {
    let incremental = snapshot.is_incremental();
    let base = snapshot.pdf_size();

    // sizing pass: offsets are absolute file positions, so an incremental
    // save starts counting at the end of the base document
    let mut offset = if incremental { base } else { HEADER.len() };
    let mut xref = XrefSection::standard();

    let saveable = collect_saveable(ctx, snapshot, options, tick);
    for s in saveable.iter().filter(|s| !s.stale) {
        let Some(obj) = s.object(ctx) else { continue };
        xref.add_entry(s.r, offset);
        offset += framed_len(s.r, obj);
    }

    add_deleted_entries(snapshot, &mut xref);
    if options.fill_xref_gaps {
        xref.fill_gaps();
    }

    let prev = snapshot.prev_start_xref();
    let trailer = Trailer {
        size: trailer_size(ctx, &saveable),
        previous: (incremental && prev != 0).then_some(prev),
        root: ctx.root.ok_or(WriteError::MissingRoot)?,
        encrypt: ctx.encrypt,
        info: ctx.info,
        id: ctx.id.clone(),
    };
    let trailer_dict: Dictionary = trailer.into();

    let start_xref = offset;
    let total = offset - base
        + PdfEncoder::encoded_len(&xref)
        + TRAILER.len()
        + 1
        + PdfEncoder::encoded_len(&trailer_dict)
        + 1
        + footer_len(start_xref);

    // materialize pass: one allocation, no resizing
    let mut out: Vec<u8> = Vec::with_capacity(total);
    if !incremental {
        out.write(HEADER);
    }
    for s in saveable.iter().filter(|s| !s.stale) {
        let Some(obj) = s.object(ctx) else { continue };
        write_framed(s.r, obj, &mut out);
    }
    PdfEncoder::write_to(&xref, &mut out);
    out.write(TRAILER);
    out.write(b"\n");
    PdfEncoder::write_to(&trailer_dict, &mut out);
    out.write(b"\n");
    write_footer(start_xref, &mut out);

    if out.len() != total {
        return Err(WriteError::SizeMismatch {
            expected: total,
            actual: out.len(),
        });
    }
    Ok(out)
}
