//! PDF document access using lopdf.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::{detect_header_from_bytes, detect_header_from_path};
use crate::error::{Error, Result};
use crate::model::{Diagnostic, OutlineEntry, PageContent};

use super::extract::{PageExtractor, PageSource};
use super::layout::{LayoutAnalyzer, PageLayout};
use super::options::{ErrorMode, ParseOptions};

/// Nesting cap for outline walks; deeper levels are assumed to be cycles.
const MAX_OUTLINE_DEPTH: usize = 64;

/// Safety limit on siblings at one outline level.
const MAX_SIBLINGS: usize = 10_000;

/// Bookmarks read from a document plus anything skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct OutlineRead {
    /// Flat entries in declaration order
    pub entries: Vec<OutlineEntry>,
    /// `MissingDestination` for every bookmark that was dropped
    pub diagnostics: Vec<Diagnostic>,
}

/// An open PDF document.
///
/// Owns the lopdf handle; dropping the parser releases it.
pub struct PdfParser {
    doc: LopdfDocument,
    options: ParseOptions,
    page_ids: Vec<ObjectId>,
    extractor: PageExtractor,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF
        detect_header_from_path(path)?;

        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc, options)
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_header_from_bytes(data)?;

        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc, options)
    }

    fn from_document(doc: LopdfDocument, options: ParseOptions) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(Error::Corrupted("document has no pages".to_string()));
        }

        log::debug!("opened PDF {} with {} pages", doc.version, page_ids.len());

        let extractor = PageExtractor::new(&options);
        Ok(Self {
            doc,
            options,
            page_ids,
            extractor,
        })
    }

    /// Options this parser was opened with.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// The `/Title` entry of the document information dictionary.
    pub fn info_title(&self) -> Option<String> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        let info_dict = match info {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };
        get_string_from_dict(info_dict, b"Title")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Interpret one page into spans and rules.
    pub fn page_layout(&self, page_index: usize) -> Result<PageLayout> {
        let page_id = self
            .page_ids
            .get(page_index)
            .ok_or(Error::PageOutOfRange(page_index, self.page_ids.len()))?;
        LayoutAnalyzer::new(&self.doc).page_layout(*page_id)
    }

    /// Read the bookmark tree as flat entries in declaration order.
    ///
    /// Depth is 1 for top-level bookmarks. Bookmarks whose destination does
    /// not resolve to a page are dropped (their children are kept) unless the
    /// parser is in strict mode, where they are an error.
    pub fn outline_entries(&self) -> Result<OutlineRead> {
        let mut read = OutlineRead::default();

        let first = self
            .doc
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Outlines").ok())
            .and_then(|outlines| self.resolve_dict(outlines))
            .and_then(|outlines| outlines.get(b"First").ok())
            .and_then(|first| first.as_reference().ok());

        let Some(first) = first else {
            return Ok(read);
        };

        let page_numbers: HashMap<ObjectId, usize> = self
            .page_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        let mut walk = OutlineWalk {
            parser: self,
            page_numbers: &page_numbers,
            visited: HashSet::new(),
            read: &mut read,
        };
        walk.siblings(first, 1)?;

        log::debug!(
            "read {} outline entries ({} dropped)",
            read.entries.len(),
            read.diagnostics.len()
        );
        Ok(read)
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(obj).and_then(|o| o.as_dict().ok())
    }

    /// Resolve a destination object to a 0-based page index.
    fn resolve_destination(&self, dest: &Object, pages: &HashMap<ObjectId, usize>) -> Option<usize> {
        self.resolve_destination_at(dest, pages, 0)
    }

    fn resolve_destination_at(
        &self,
        dest: &Object,
        pages: &HashMap<ObjectId, usize>,
        hops: usize,
    ) -> Option<usize> {
        // Named destinations may point at other names
        if hops > 8 {
            return None;
        }
        match self.resolve(dest)? {
            Object::Array(arr) => match arr.first()? {
                Object::Reference(page_ref) => pages.get(page_ref).copied(),
                // Some producers write the page number instead of a reference
                Object::Integer(n) => usize::try_from(*n).ok().filter(|n| *n < self.page_ids.len()),
                _ => None,
            },
            // `<< /D [...] >>` form used by named-destination values
            Object::Dictionary(d) => self.resolve_destination_at(d.get(b"D").ok()?, pages, hops + 1),
            Object::String(bytes, _) | Object::Name(bytes) => {
                let target = self.named_destination(bytes)?;
                self.resolve_destination_at(target, pages, hops + 1)
            }
            _ => None,
        }
    }

    /// Look up a named destination in `/Names` → `/Dests`, then `/Dests`.
    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.doc.catalog().ok()?;

        let from_tree = catalog
            .get(b"Names")
            .ok()
            .and_then(|names| self.resolve_dict(names))
            .and_then(|names| names.get(b"Dests").ok())
            .and_then(|dests| self.resolve_dict(dests))
            .and_then(|tree| self.lookup_name_tree(tree, name, 0));

        from_tree.or_else(|| {
            catalog
                .get(b"Dests")
                .ok()
                .and_then(|dests| self.resolve_dict(dests))
                .and_then(|dests| dests.get(name).ok())
        })
    }

    fn lookup_name_tree<'a>(&'a self, node: &'a Dictionary, name: &[u8], depth: usize) -> Option<&'a Object> {
        if depth > MAX_OUTLINE_DEPTH {
            return None;
        }

        if let Ok(Object::Array(pairs)) = node.get(b"Names") {
            for pair in pairs.chunks(2) {
                if let [Object::String(key, _), value] = pair {
                    if key.as_slice() == name {
                        return Some(value);
                    }
                }
            }
        }

        if let Ok(Object::Array(kids)) = node.get(b"Kids") {
            for kid in kids {
                if let Some(found) = self
                    .resolve_dict(kid)
                    .and_then(|kid| self.lookup_name_tree(kid, name, depth + 1))
                {
                    return Some(found);
                }
            }
        }

        None
    }
}

/// State for one walk over the outline item graph.
struct OutlineWalk<'a> {
    parser: &'a PdfParser,
    page_numbers: &'a HashMap<ObjectId, usize>,
    visited: HashSet<ObjectId>,
    read: &'a mut OutlineRead,
}

impl OutlineWalk<'_> {
    /// Walk a `/First` → `/Next` sibling chain at `depth`.
    fn siblings(&mut self, first: ObjectId, depth: usize) -> Result<()> {
        if depth > MAX_OUTLINE_DEPTH {
            log::warn!("outline nesting exceeds {} levels, truncated", MAX_OUTLINE_DEPTH);
            return Ok(());
        }

        let mut current = Some(first);
        let mut count = 0;

        while let Some(item_id) = current {
            // Circular reference protection
            if !self.visited.insert(item_id) || count >= MAX_SIBLINGS {
                break;
            }
            count += 1;

            let Ok(item) = self.parser.doc.get_dictionary(item_id) else {
                break;
            };

            let title = get_string_from_dict(item, b"Title")
                .map(|t| t.trim().to_string())
                .unwrap_or_default();

            match self.destination(item) {
                Some(page) => self.read.entries.push(OutlineEntry::new(title, depth, page)),
                None if self.parser.options.error_mode == ErrorMode::Strict => {
                    return Err(Error::InvalidOutline(format!(
                        "bookmark '{}' has no resolvable destination",
                        title
                    )));
                }
                None => {
                    log::warn!("bookmark '{}' has no resolvable destination, skipped", title);
                    self.read
                        .diagnostics
                        .push(Diagnostic::MissingDestination { title, depth });
                }
            }

            if let Ok(Object::Reference(child)) = item.get(b"First") {
                self.siblings(*child, depth + 1)?;
            }

            current = match item.get(b"Next") {
                Ok(Object::Reference(next)) => Some(*next),
                _ => None,
            };
        }

        Ok(())
    }

    /// `/Dest` first, then a GoTo `/A` action.
    fn destination(&self, item: &Dictionary) -> Option<usize> {
        if let Ok(dest) = item.get(b"Dest") {
            if let Some(page) = self.parser.resolve_destination(dest, self.page_numbers) {
                return Some(page);
            }
        }

        let action = item.get(b"A").ok().and_then(|a| self.parser.resolve_dict(a))?;
        let is_goto = matches!(action.get(b"S"), Ok(Object::Name(s)) if s.as_slice() == b"GoTo");
        if !is_goto {
            return None;
        }
        self.parser
            .resolve_destination(action.get(b"D").ok()?, self.page_numbers)
    }
}

impl PageSource for PdfParser {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn extract_page(&self, page_index: usize) -> Result<PageContent> {
        let layout = self.page_layout(page_index)?;
        Ok(self.extractor.extract(&layout, page_index))
    }
}

/// Helper to get a string from a PDF dictionary.
///
/// Handles UTF-16BE (with BOM), UTF-8 and falls back to Latin-1.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"Annual Report"), "Annual Report");

        let mut utf16 = vec![0xFE, 0xFF];
        for unit in "年度报告".encode_utf16() {
            utf16.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_pdf_string(&utf16), "年度报告");
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let result = PdfParser::from_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_get_string_from_dict() {
        let mut dict = Dictionary::new();
        dict.set("Title", Object::string_literal("Report"));
        dict.set("Kind", Object::Name(b"Annual".to_vec()));
        assert_eq!(get_string_from_dict(&dict, b"Title").as_deref(), Some("Report"));
        assert_eq!(get_string_from_dict(&dict, b"Kind").as_deref(), Some("Annual"));
        assert_eq!(get_string_from_dict(&dict, b"Missing"), None);
    }
}
