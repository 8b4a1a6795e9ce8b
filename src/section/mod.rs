//! Outline reconstruction and section assembly.
//!
//! The pipeline runs in a fixed order: [`build_tree`] turns flat bookmarks
//! into a tree, [`resolve_boundaries`] gives every node its page range, and
//! [`SectionAssembler`] reads each node's text out of extracted pages.

mod assembler;
mod boundary;
mod matcher;
mod tree;

pub use assembler::{AssembledSection, SectionAssembler, SectionWindow, StopCut};
pub use boundary::{next_boundary, resolve_boundaries};
pub use matcher::{best_match, normalize_title, NormalizedTitleMatcher, TitleMatcher};
pub use tree::build_tree;
