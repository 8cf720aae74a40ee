//! Placeholder substitution engine for rich subjects

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::notification::RichParameters;

use super::resolver::resolve;
use super::types::{Color, NameScan, StyledRun};

/// Upper bound on replacements per template when names are rescanned
const MAX_RESCAN_SUBSTITUTIONS: usize = 256;

/// Replaces `{key}` tokens with rich object names and emits styled runs
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutionEngine {
    emphasis: Color,
    name_scan: NameScan,
}

impl SubstitutionEngine {
    /// Create an engine that draws substituted names in `emphasis`
    pub fn new(emphasis: Color) -> Self {
        Self {
            emphasis,
            name_scan: NameScan::default(),
        }
    }

    /// Set where scanning resumes after a replacement
    pub fn with_name_scan(mut self, name_scan: NameScan) -> Self {
        self.name_scan = name_scan;
        self
    }

    pub fn name_scan(&self) -> NameScan {
        self.name_scan
    }

    /// Substitute every resolvable placeholder in `template`.
    ///
    /// Resolved tokens become bold runs in the emphasis colour; unresolved
    /// tokens stay as literal text. An opening brace without a closing one
    /// ends the scan. The returned runs partition the resolved string and are
    /// never empty, except for the single run produced by an empty template.
    pub fn substitute(&self, template: &str, params: &RichParameters) -> Vec<StyledRun> {
        let mut text = template.to_string();
        let mut spans: Vec<Range<usize>> = Vec::new();
        let mut cursor = 0;
        let mut substitutions = 0;

        while let Some(open) = find_grapheme(&text, cursor, "{") {
            let Some(close) = find_grapheme(&text, open + 1, "}") else {
                break;
            };
            let end = close + 1;

            let Some(object) = resolve(&text[open + 1..close], params) else {
                cursor = end;
                continue;
            };

            let name = object.name.as_str();
            text.replace_range(open..end, name);
            splice_spans(&mut spans, open..end, name.len());
            spans.push(open..open + name.len());
            substitutions += 1;

            cursor = match self.name_scan {
                NameScan::Skip => open + name.len(),
                NameScan::Rescan => {
                    if substitutions >= MAX_RESCAN_SUBSTITUTIONS {
                        tracing::warn!(
                            substitutions,
                            "Placeholder rescan limit reached, leaving remaining tokens literal"
                        );
                        break;
                    }
                    open
                }
            };
        }

        build_runs(&text, spans, self.emphasis)
    }
}

/// Substitute with the default engine (black emphasis, names not rescanned)
pub fn substitute(template: &str, params: &RichParameters) -> Vec<StyledRun> {
    SubstitutionEngine::default().substitute(template, params)
}

/// Byte offset of the first grapheme equal to `target` at or after `from`
fn find_grapheme(text: &str, from: usize, target: &str) -> Option<usize> {
    text.grapheme_indices(true)
        .skip_while(|(idx, _)| *idx < from)
        .find(|(_, grapheme)| *grapheme == target)
        .map(|(idx, _)| idx)
}

/// Re-map styled spans after `replaced` was overwritten by `new_len` bytes.
///
/// Parts of a span covered by the replaced range are dropped; the remainder
/// keeps its style and is shifted by the length delta.
fn splice_spans(spans: &mut Vec<Range<usize>>, replaced: Range<usize>, new_len: usize) {
    let shift = |pos: usize| pos - replaced.end + replaced.start + new_len;

    let mut spliced = Vec::with_capacity(spans.len() + 1);
    for span in spans.drain(..) {
        if span.start < replaced.start {
            spliced.push(span.start..span.end.min(replaced.start));
        }
        if span.end > replaced.end {
            spliced.push(shift(span.start.max(replaced.end))..shift(span.end));
        }
    }
    spliced.retain(|span| !span.is_empty());
    *spans = spliced;
}

fn build_runs(text: &str, mut spans: Vec<Range<usize>>, emphasis: Color) -> Vec<StyledRun> {
    spans.retain(|span| !span.is_empty());
    spans.sort_by_key(|span| span.start);

    let mut runs = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;
    for span in spans {
        if span.start > cursor {
            runs.push(StyledRun::plain(&text[cursor..span.start]));
        }
        runs.push(StyledRun::emphasized(&text[span.clone()], emphasis));
        cursor = span.end;
    }
    if cursor < text.len() || runs.is_empty() {
        runs.push(StyledRun::plain(&text[cursor..]));
    }

    runs
}
