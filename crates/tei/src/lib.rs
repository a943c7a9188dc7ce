//! TEI document model, assembly from OCR text and XML output
//!
//! A page becomes `TEI > text > body` with one `div` per text region, in
//! reading order. Inside a division the first non-empty OCR line is the
//! direct text content and every following line is an `<lb/>` whose tail is
//! the line prefixed by a single space:
//!
//! ```xml
//! <div>First line<lb/> Second line<lb/> Third line</div>
//! ```
//!
//! # Example
//! ```
//! use pagetext_tei::assemble;
//!
//! let doc = assemble(&["Hello\n\nWorld\n"]);
//! let xml = doc.to_xml_string().unwrap();
//! assert!(xml.contains("<div>Hello<lb/> World</div>"));
//! ```

pub mod assembler;
pub mod model;
pub mod serializer;

pub use assembler::assemble;
pub use model::{Division, LineBreak, TeiDocument};

use std::path::PathBuf;
use thiserror::Error;

/// Namespace of the `TEI` root element
pub const TEI_NAMESPACE: &str = "http://www.tei-c.org/ns/1.0";

/// Errors from serializing or writing a document
#[derive(Debug, Error)]
pub enum TeiError {
    #[error("XML serialization failed: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to move output into place at {path}: {error}")]
    Persist { path: PathBuf, error: String },
}

impl From<quick_xml::Error> for TeiError {
    fn from(err: quick_xml::Error) -> Self {
        TeiError::Xml(err.to_string())
    }
}
