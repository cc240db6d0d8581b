use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlyError>;

#[derive(Debug, Error, PartialEq)]
pub enum PlyError {
    #[error("No end_header found in the first {0} bytes")]
    MissingHeaderEnd(usize),

    #[error("Header is not valid text")]
    InvalidHeaderText,

    #[error("Unsupported ply format: {0}")]
    UnsupportedFormat(String),

    #[error("Header declares no vertex element")]
    MissingVertexCount,

    #[error("Invalid vertex count: {0:?}")]
    InvalidVertexCount(String),

    #[error("Unsupported vertex property {name:?} of type {ty:?}, only float properties are supported")]
    UnsupportedProperty { ty: String, name: String },

    #[error("Element {0:?} is stored ahead of the vertex element")]
    ElementBeforeVertex(String),

    #[error("Duplicate vertex property {0:?}")]
    DuplicateProperty(String),

    #[error("Payload truncated: expected {expected} bytes, found {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    #[error("{values} values do not split into records of {width}")]
    PartialRecord { values: usize, width: usize },

    #[error("Required property {0:?} is missing")]
    MissingProperty(&'static str),

    #[error("Splat {index} has a non-finite {field}")]
    NonFinite { index: usize, field: String },
}
