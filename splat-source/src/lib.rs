mod error;
mod source;

pub use error::SourceError;
pub use source::*;
