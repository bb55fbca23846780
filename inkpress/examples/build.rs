use std::{fs::File, io::Write, path::PathBuf};

use inkpress::{
    pdf::{Array, Dictionary, Name, Object, Reference, Stream},
    ObjectContext, SaveOptions,
};

/// Build a one-page document, save it, then append an incremental update.
pub fn main() {
    env_logger::init();
    let out_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("out.pdf"));

    let mut ctx = ObjectContext::new();
    let catalog = ctx.assign(Object::Dictionary(Dictionary::from([
        (Name::from_str("Type"), Object::from(Name::from_str("Catalog"))),
        (Name::from_str("Pages"), Object::Reference(Reference::new(2, 0))),
    ])));
    ctx.assign(Object::Dictionary(Dictionary::from([
        (Name::from_str("Type"), Object::from(Name::from_str("Pages"))),
        (
            Name::from_str("Kids"),
            Object::Array(Array::from(vec![Object::Reference(Reference::new(3, 0))])),
        ),
        (Name::from_str("Count"), Object::Integer(1)),
    ])));
    ctx.assign(Object::Dictionary(Dictionary::from([
        (Name::from_str("Type"), Object::from(Name::from_str("Page"))),
        (Name::from_str("Parent"), Object::Reference(Reference::new(2, 0))),
        (
            Name::from_str("Contents"),
            Object::Reference(Reference::new(4, 0)),
        ),
    ])));
    let contents = ctx.assign(Object::Stream(Stream::new(
        Dictionary::new(),
        b"0 0 m 100 100 l S\n".repeat(16),
    )));
    ctx.root = Some(catalog);

    log::debug!("full save");
    let options = SaveOptions {
        compress_streams: true,
        ..SaveOptions::default()
    };
    let base = inkpress::save(&mut ctx, &options).expect("full save");

    log::debug!("incremental save after one edit");
    ctx.set_loaded(base.len(), 0);
    let mut snapshot = ctx.take_snapshot();
    *ctx.get_mut(contents).expect("contents object") = Object::Stream(Stream::new(
        Dictionary::new(),
        b"0 0 m 50 50 l S\n".to_vec(),
    ));
    snapshot
        .mark_ref_for_save(contents)
        .expect("incremental snapshot");
    let delta =
        inkpress::save_incremental(&mut ctx, snapshot, &options).expect("incremental save");

    let mut file = File::create(&out_path).expect("Could not create out file");
    file.write_all(&base).expect("Could not write out file");
    file.write_all(&delta).expect("Could not write out file");
    log::info!(
        "wrote {} + {} bytes to {}",
        base.len(),
        delta.len(),
        out_path.display()
    );
}
