//! Document model declarations and the mapping between model field names
//! and stored field names.

mod document;
mod field_map;
mod spec;

pub use document::{
    decode_document, encode_document, from_stored, to_stored, DocumentModel, RawDocument,
};
pub use field_map::{FieldMap, ID_FIELD};
pub use spec::{FieldSpec, IndexAnnotation, IndexModel, ModelSpec};
