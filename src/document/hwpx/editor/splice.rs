//! Splice tier: edit cell text directly in the raw section text
//!
//! Balanced `tbl` / `tr` / `tc` spans are located with tag patterns scoped to
//! the parent span, outer to inner and left to right. Each scope owns a
//! [`ScopeSplicer`] whose running delta maps spans computed on the unedited
//! scope text onto the text as it is being rewritten.

use once_cell::sync::Lazy;
use quick_xml::escape::{partial_escape, unescape};
use regex::Regex;
use std::ops::Range;
use thiserror::Error;

use super::TableEdits;
use crate::document::models::TableGrid;

/// Namespace prefix (with colon) of the first table tag in a section
static TABLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z_][\w.\-]*:)?tbl[\s/>]").unwrap());

/// Any markup inside element content: CDATA, comment, processing instruction or tag
static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>|<!--.*?-->|<\?.*?\?>|<(/)?[^>]*?(/)?>").unwrap()
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpliceError {
    #[error("unbalanced <{0}> tags")]
    Unbalanced(String),
}

/// A balanced element found in a scope; offsets are relative to that scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElementSpan {
    pub(crate) outer: Range<usize>,
    /// Content between the tags, `None` for a self-closing element
    pub(crate) inner: Option<Range<usize>>,
}

/// Open, close and self-closing tags for one qualified element name
struct TagPattern {
    name: String,
    regex: Regex,
}

impl TagPattern {
    fn new(prefix: &str, local: &str) -> Self {
        let name = format!("{prefix}{local}");
        let regex = Regex::new(&format!(r"<(/)?{}(\s[^>]*?)?(/)?>", regex::escape(&name)))
            .expect("escaped tag name is a valid pattern");
        Self { name, regex }
    }

    /// Top-level balanced elements inside `scope`, in order
    fn spans(&self, scope: &str) -> Result<Vec<ElementSpan>, SpliceError> {
        let mut spans = Vec::new();
        let mut depth = 0usize;
        let mut open = 0..0;

        for caps in self.regex.captures_iter(scope) {
            let Some(tag) = caps.get(0) else { continue };
            let closing = caps.get(1).is_some();
            let self_closing = caps.get(3).is_some();

            if closing {
                if depth == 0 {
                    return Err(SpliceError::Unbalanced(self.name.clone()));
                }
                depth -= 1;
                if depth == 0 {
                    spans.push(ElementSpan {
                        outer: open.start..tag.end(),
                        inner: Some(open.end..tag.start()),
                    });
                }
            } else if self_closing {
                if depth == 0 {
                    spans.push(ElementSpan {
                        outer: tag.range(),
                        inner: None,
                    });
                }
            } else {
                if depth == 0 {
                    open = tag.range();
                }
                depth += 1;
            }
        }

        if depth != 0 {
            return Err(SpliceError::Unbalanced(self.name.clone()));
        }
        Ok(spans)
    }

    fn contains_open_tag(&self, scope: &str) -> bool {
        self.regex
            .captures_iter(scope)
            .any(|caps| caps.get(1).is_none())
    }
}

/// Rewrites one scope's text in increasing span order.
///
/// Spans are always the ones computed on the unedited scope; `delta` is the
/// accumulated length change of the splices already applied in this scope.
pub(crate) struct ScopeSplicer {
    text: String,
    delta: isize,
    last_end: usize,
}

impl ScopeSplicer {
    pub(crate) fn new(original: &str) -> Self {
        Self {
            text: original.to_string(),
            delta: 0,
            last_end: 0,
        }
    }

    pub(crate) fn splice(&mut self, span: Range<usize>, replacement: &str) {
        debug_assert!(span.start >= self.last_end, "spans must be spliced in order");
        let start = shift(span.start, self.delta);
        let end = shift(span.end, self.delta);
        self.text.replace_range(start..end, replacement);
        self.delta += replacement.len() as isize - span.len() as isize;
        self.last_end = span.end;
    }

    pub(crate) fn finish(self) -> String {
        self.text
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    offset.saturating_add_signed(delta)
}

/// Tag patterns for one section, built from the prefix its tables use
pub(crate) struct SectionPatterns {
    prefix: String,
    table: TagPattern,
    row: TagPattern,
    cell: TagPattern,
    text: TagPattern,
    run: TagPattern,
}

impl SectionPatterns {
    /// `None` when the section has no table tags at all
    pub(crate) fn detect(xml: &str) -> Option<Self> {
        let prefix = TABLE_PREFIX
            .captures(xml)?
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        Some(Self {
            table: TagPattern::new(&prefix, "tbl"),
            row: TagPattern::new(&prefix, "tr"),
            cell: TagPattern::new(&prefix, "tc"),
            text: TagPattern::new(&prefix, "t"),
            run: TagPattern::new(&prefix, "run"),
            prefix,
        })
    }

    /// Number of row-bearing tables in `scope`, nested ones included
    fn count_tables(&self, scope: &str) -> Result<usize, SpliceError> {
        let mut count = 0;
        for span in self.table.spans(scope)? {
            let Some(inner) = span.inner else { continue };
            let content = &scope[inner];
            if self.has_cell_row(content)? {
                count += 1;
            }
            count += self.count_tables(content)?;
        }
        Ok(count)
    }

    /// True when some row in `scope` holds at least one cell
    fn has_cell_row(&self, scope: &str) -> Result<bool, SpliceError> {
        for span in self.row.spans(scope)? {
            if let Some(inner) = span.inner {
                if self.cell.contains_open_tag(&scope[inner]) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Outcome of splicing one section
pub(crate) struct SplicedSection {
    pub(crate) text: String,
    pub(crate) table_count: usize,
    pub(crate) edits: TableEdits,
}

/// Apply the targets to a section's raw text, starting at global table `base`.
///
/// Tables that contain another table are left as they are but still counted,
/// so numbering stays aligned with the reader.
pub(crate) fn splice_section(
    xml: &str,
    targets: &[TableGrid],
    base: usize,
) -> Result<SplicedSection, SpliceError> {
    let Some(patterns) = SectionPatterns::detect(xml) else {
        return Ok(SplicedSection {
            text: xml.to_string(),
            table_count: 0,
            edits: TableEdits::default(),
        });
    };

    let mut section = ScopeSplicer::new(xml);
    let mut edits = TableEdits::default();
    let mut next_index = base;

    for span in patterns.table.spans(xml)? {
        let Some(inner) = span.inner.clone() else { continue };
        let content = &xml[inner];

        let nested = patterns.count_tables(content)?;
        if nested > 0 {
            log::debug!("leaving table with {nested} nested tables untouched");
            if patterns.has_cell_row(content)? {
                next_index += 1;
            }
            next_index += nested;
            continue;
        }
        if !patterns.has_cell_row(content)? {
            continue;
        }

        let index = next_index;
        next_index += 1;
        let Some(target) = targets.get(index) else { continue };

        let table_text = &xml[span.outer.clone()];
        let (rewritten, written) = splice_table(&patterns, table_text, target)?;
        edits.tables_matched += 1;
        edits.cells_written += written;
        if written > 0 {
            section.splice(span.outer, &rewritten);
        }
    }

    Ok(SplicedSection {
        text: section.finish(),
        table_count: next_index - base,
        edits,
    })
}

fn splice_table(
    patterns: &SectionPatterns,
    table_text: &str,
    target: &TableGrid,
) -> Result<(String, usize), SpliceError> {
    let mut table = ScopeSplicer::new(table_text);
    let mut written = 0;

    let mut target_rows = target.rows.iter();
    for row_span in patterns.row.spans(table_text)? {
        let row_text = &table_text[row_span.outer.clone()];
        let cells = patterns.cell.spans(row_text)?;
        if cells.is_empty() {
            continue;
        }
        let Some(target_row) = target_rows.next() else {
            break;
        };

        let mut row = ScopeSplicer::new(row_text);
        let mut row_written = 0;
        for (cell_span, value) in cells.into_iter().zip(target_row) {
            let Some(inner) = cell_span.inner else { continue };
            if let Some(new_inner) = splice_cell(patterns, &row_text[inner.clone()], value)? {
                row.splice(inner, &new_inner);
                row_written += 1;
            }
        }

        if row_written > 0 {
            table.splice(row_span.outer, &row.finish());
            written += row_written;
        }
    }

    Ok((table.finish(), written))
}

/// New cell content, or `None` when the cell needs no change or has no
/// place to hold text
pub(crate) fn splice_cell(
    patterns: &SectionPatterns,
    cell: &str,
    value: &str,
) -> Result<Option<String>, SpliceError> {
    let escaped = partial_escape(value);
    let text_name = &patterns.text.name;

    if let Some(span) = patterns.text.spans(cell)?.into_iter().next() {
        let mut out = ScopeSplicer::new(cell);
        match span.inner {
            Some(inner) => {
                if direct_text(&cell[inner.clone()]) == value {
                    return Ok(None);
                }
                out.splice(inner, &escaped);
            }
            None => {
                // `<t/>` already reads as empty
                if value.is_empty() {
                    return Ok(None);
                }
                let open = expand_open_tag(&cell[span.outer.clone()]);
                out.splice(span.outer, &format!("{open}{escaped}</{text_name}>"));
            }
        }
        return Ok(Some(out.finish()));
    }

    if value.is_empty() {
        return Ok(None);
    }

    let runs = patterns.run.spans(cell)?;
    let run_name = &patterns.run.name;

    if let Some(span) = runs.iter().find(|s| s.inner.is_none()) {
        let open = expand_open_tag(&cell[span.outer.clone()]);
        let mut out = ScopeSplicer::new(cell);
        out.splice(
            span.outer.clone(),
            &format!("{open}<{text_name}>{escaped}</{text_name}></{run_name}>"),
        );
        return Ok(Some(out.finish()));
    }

    if let Some(span) = runs
        .iter()
        .find(|s| s.inner.as_ref().is_some_and(|inner| inner.is_empty()))
    {
        let at = span.inner.as_ref().map_or(span.outer.end, |inner| inner.start);
        let mut out = ScopeSplicer::new(cell);
        out.splice(at..at, &format!("<{text_name}>{escaped}</{text_name}>"));
        return Ok(Some(out.finish()));
    }

    log::debug!("cell has no {}t or {}run element to hold text", patterns.prefix, patterns.prefix);
    Ok(None)
}

/// Character data directly inside an element's content, unescaped; text
/// of nested elements is not included
fn direct_text(content: &str) -> String {
    let mut text = String::new();
    let mut depth = 0usize;
    let mut last = 0;

    for caps in MARKUP.captures_iter(content) {
        let Some(markup) = caps.get(0) else { continue };
        if depth == 0 {
            push_unescaped(&mut text, &content[last..markup.start()]);
        }
        last = markup.end();

        if let Some(cdata) = caps.get(1) {
            if depth == 0 {
                text.push_str(cdata.as_str());
            }
            continue;
        }
        let tag = markup.as_str();
        if tag.starts_with("<!--") || tag.starts_with("<?") {
            continue;
        }
        if caps.get(2).is_some() {
            depth = depth.saturating_sub(1);
        } else if caps.get(3).is_none() {
            depth += 1;
        }
    }
    if depth == 0 {
        push_unescaped(&mut text, &content[last..]);
    }
    text
}

fn push_unescaped(text: &mut String, raw: &str) {
    match unescape(raw) {
        Ok(unescaped) => text.push_str(&unescaped),
        Err(_) => text.push_str(raw),
    }
}

/// `<a x="1"/>` or `<a x="1" />` becomes `<a x="1">`
fn expand_open_tag(tag: &str) -> String {
    let body = tag.trim_end_matches('>').trim_end_matches('/').trim_end();
    format!("{body}>")
}
