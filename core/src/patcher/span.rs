//! # Function Span Resolver
//!
//! The textual extent of one named function: from its definition keyword to the
//! next sibling definition, or to the end of the buffer.

use crate::error::{AppError, AppResult};
use crate::patcher::common::next_char_boundary;
use std::ops::Range;

/// Half-open byte range `[start, end)` over a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpan {
    /// Offset of the definition keyword.
    pub start: usize,
    /// Offset of the next sibling definition, or the buffer length.
    pub end: usize,
}

impl FunctionSpan {
    /// The span as a range, for slicing.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `offset` lies inside the span.
    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }
}

/// Resolves the span of the function whose definition keyword sequence is
/// `definition`.
///
/// `siblings` are the keyword sequences that open the next top-level
/// definition (e.g. `"\nasync def "` and `"\ndef "`). All of them are searched
/// so a synchronous sibling after an asynchronous target still ends the span.
pub fn resolve_span<S: AsRef<str>>(
    buffer: &str,
    definition: &str,
    siblings: &[S],
) -> AppResult<FunctionSpan> {
    let start = buffer
        .find(definition)
        .ok_or_else(|| AppError::TargetFunctionNotFound(definition.to_string()))?;

    let from = next_char_boundary(buffer, start);
    let end = siblings
        .iter()
        .filter_map(|k| {
            let keyword: &str = k.as_ref();
            if keyword.is_empty() {
                return None;
            }
            buffer[from..].find(keyword).map(|i| from + i)
        })
        .filter(|&pos| pos > start)
        .min()
        .unwrap_or(buffer.len());

    tracing::debug!(definition, start, end, "function span resolved");
    Ok(FunctionSpan { start, end })
}
