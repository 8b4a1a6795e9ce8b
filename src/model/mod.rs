//! Data model for outline reconstruction.
//!
//! Outline types describe the bookmark tree, page types carry the two
//! extraction views of a page, and document types are the serialized output.

mod diagnostic;
mod document;
mod outline;
mod page;

pub use diagnostic::Diagnostic;
pub use document::{ParsedDocument, PdfMetadata, Section, SectionMetadata};
pub use outline::{NodeId, OutlineEntry, OutlineNode, OutlineTree, ResolvedRange};
pub use page::{BBox, PageContent, PageLine, TableRegion};
