//! # Body-Scoped Call Injection
//!
//! Rewrites one return statement inside a [`FunctionSpan`] so it first invokes
//! the inserted function. Bytes outside the span are never touched.

use crate::patcher::common::{already_applied, detect_indent, reindent};
use crate::patcher::report::StageOutcome;
use crate::patcher::span::FunctionSpan;
use regex::Regex;

/// A return-statement rewrite scoped to one function body.
#[derive(Debug, Clone)]
pub struct CallEdit {
    /// Matches the return of the named result, e.g. `return {"data": all_models}`.
    pub return_pattern: Regex,
    /// Text whose presence in the span means the call is already injected.
    pub call_marker: String,
    /// Replacement for the matched return. Lines after the first are indented
    /// like the matched line.
    pub replacement: String,
    /// Fragments that, when all present in a body without a pattern match,
    /// point at a return we could not safely rewrite.
    pub loose_hints: Vec<String>,
}

/// Applies `edit` inside `span` only.
///
/// Returns the (possibly unchanged) buffer and the outcome. Only the first match
/// in the span is substituted.
pub fn apply_call_edit(buffer: &str, span: FunctionSpan, edit: &CallEdit) -> (String, StageOutcome) {
    let body = &buffer[span.range()];

    let Some(found) = edit.return_pattern.find(body) else {
        let loose_match =
            !edit.loose_hints.is_empty() && edit.loose_hints.iter().all(|h| body.contains(h.as_str()));
        tracing::warn!(loose_match, "return pattern not found in target function");
        return (
            buffer.to_string(),
            StageOutcome::ReturnPatternNotFound { loose_match },
        );
    };

    let start = span.start + found.start();
    let end = span.start + found.end();
    let indent = detect_indent(buffer, start);

    let marker_present = already_applied(body, &edit.call_marker)
        || indent.is_some_and(|i| already_applied(body, &reindent(&edit.call_marker, i)));
    if marker_present {
        tracing::warn!(marker = %edit.call_marker, "call already present, skipping");
        return (buffer.to_string(), StageOutcome::AlreadyPresent);
    }

    // A return sharing its line with other code (`if x: return ...`) has no
    // indentation to give the following replacement lines.
    let indent = match indent {
        Some(i) => i,
        None if !edit.replacement.contains('\n') => "",
        None => {
            tracing::warn!(offset = start, "return is not at line start, cannot rewrite safely");
            return (
                buffer.to_string(),
                StageOutcome::ReturnPatternNotFound { loose_match: true },
            );
        }
    };
    let replacement = reindent(&edit.replacement, indent);

    let mut out = String::with_capacity(buffer.len() + replacement.len());
    out.push_str(&buffer[..start]);
    out.push_str(&replacement);
    out.push_str(&buffer[end..]);

    tracing::info!(offset = start, "call injected into target function");
    (out, StageOutcome::Applied)
}
