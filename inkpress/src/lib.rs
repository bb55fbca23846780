//! Build PDF object graphs in memory and serialize them with byte-exact
//! layout guarantees.
//!
//! The engine computes the exact output size before allocating the buffer,
//! supports the classic flat cross-reference table as well as compressed
//! cross-reference streams with object bundling, and can serialize
//! incremental deltas that leave every byte of a previously saved document
//! untouched (so signatures over those bytes stay valid).
//!
//! ```
//! use inkpress::{pdf::{Dictionary, Name, Object}, ObjectContext, SaveOptions};
//!
//! let mut ctx = ObjectContext::new();
//! let catalog = ctx.assign(Object::Dictionary(Dictionary::from([(
//!     Name::from_str("Type"),
//!     Object::from(Name::from_str("Catalog")),
//! )])));
//! ctx.root = Some(catalog);
//!
//! let bytes = inkpress::save(&mut ctx, &SaveOptions::default()).unwrap();
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! ```

pub mod context;
mod encode;
mod error;
pub mod pdf;
pub mod save;
pub mod snapshot;
pub mod writer;

pub use context::{ObjectContext, Security};
pub use encode::PdfEncoder;
pub use error::WriteError;
pub use save::{
    save, save_incremental, save_incremental_with_tick, save_with_tick, SaveOptions,
};
pub use snapshot::Snapshot;
