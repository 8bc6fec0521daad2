//! # Anchor Locator
//!
//! Finds the offset before which the new definition is spliced in. An [`Anchor`]
//! is an ordered list of tiers, narrowest first. The first tier that matches
//! wins; when none does the run stops with [`AppError::AnchorNotFound`].

use crate::error::{AppError, AppResult};
use crate::patcher::common::{line_start, snap_to_line_start};
use regex::Regex;

/// Top-level statements that end the search for a handler's decorator.
const TOP_LEVEL_BREAKS: [&str; 3] = ["\ndef ", "\nasync def ", "\nclass "];

/// One strategy for locating the insertion point.
#[derive(Debug, Clone)]
pub enum AnchorTier {
    /// Start of the first regex match.
    ///
    /// Compile with `(?s)` so `.` crosses line boundaries.
    Pattern(Regex),

    /// Literal search for a definition, then a reverse scan for the decorator
    /// line that precedes it.
    DecoratedDefinition {
        /// Definition keyword sequence, e.g. `async def model_info_v1(`.
        definition: String,
        /// Decorator prefix, e.g. `@router.get`.
        decorator: String,
    },
}

impl AnchorTier {
    /// Name used in logs and in [`AppError::AnchorNotFound`].
    pub fn name(&self) -> &'static str {
        match self {
            AnchorTier::Pattern(_) => "pattern",
            AnchorTier::DecoratedDefinition { .. } => "decorated_definition",
        }
    }

    /// Returns the insertion offset, or `None` if this tier does not match.
    pub fn locate(&self, buffer: &str) -> Option<usize> {
        match self {
            AnchorTier::Pattern(re) => re
                .find(buffer)
                .map(|m| decorator_stack_start(buffer, snap_to_line_start(buffer, m.start()))),
            AnchorTier::DecoratedDefinition {
                definition,
                decorator,
            } => locate_decorated(buffer, definition, decorator)
                .map(|offset| decorator_stack_start(buffer, offset)),
        }
    }
}

/// Walks back from the line starting at `offset` over the decorators stacked
/// directly above it, bracketed continuation lines included.
fn decorator_stack_start(buffer: &str, offset: usize) -> usize {
    let mut start = offset;
    if line_start(buffer, start) != start {
        return start;
    }

    'stack: loop {
        let mut cursor = start;
        let mut depth: i32 = 0;
        while cursor > 0 {
            let prev_start = line_start(buffer, cursor - 1);
            let line = &buffer[prev_start..cursor - 1];
            depth += bracket_delta(line);
            if depth <= 0 {
                if line.trim_start().starts_with('@') {
                    start = prev_start;
                    continue 'stack;
                }
                break 'stack;
            }
            cursor = prev_start;
        }
        break;
    }
    start
}

/// Closing minus opening brackets: positive while scanning upward inside a call.
fn bracket_delta(line: &str) -> i32 {
    line.chars().fold(0, |acc, c| match c {
        ')' | ']' => acc + 1,
        '(' | '[' => acc - 1,
        _ => acc,
    })
}

fn locate_decorated(buffer: &str, definition: &str, decorator: &str) -> Option<usize> {
    let def_pos = buffer.find(definition)?;
    let dec_pos = buffer[..def_pos].rfind(decorator)?;

    // A decorator separated from the handler by another top-level statement
    // belongs to something else.
    let between = &buffer[line_start(buffer, dec_pos)..def_pos];
    if TOP_LEVEL_BREAKS.iter().any(|k| between.contains(k)) {
        return None;
    }

    Some(snap_to_line_start(buffer, dec_pos))
}

/// A located anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit {
    /// Byte offset in the buffer.
    pub offset: usize,
    /// Index of the tier that matched (0 is the primary).
    pub tier: usize,
    /// Name of the tier that matched.
    pub tier_name: &'static str,
}

impl AnchorHit {
    /// Whether a fallback tier produced this hit.
    pub fn is_fallback(&self) -> bool {
        self.tier > 0
    }
}

/// Ordered anchor strategies, first match wins.
#[derive(Debug, Clone)]
pub struct Anchor {
    tiers: Vec<AnchorTier>,
}

impl Anchor {
    /// Builds an anchor from tiers, tried in the given order.
    pub fn new(tiers: Vec<AnchorTier>) -> Self {
        Self { tiers }
    }

    /// The common shape: a structural regex, then the decorator fallback.
    pub fn two_tier(primary: Regex, definition: &str, decorator: &str) -> Self {
        Self::new(vec![
            AnchorTier::Pattern(primary),
            AnchorTier::DecoratedDefinition {
                definition: definition.to_string(),
                decorator: decorator.to_string(),
            },
        ])
    }

    /// The configured tiers.
    pub fn tiers(&self) -> &[AnchorTier] {
        &self.tiers
    }

    /// Tries every tier in order.
    pub fn locate(&self, buffer: &str) -> AppResult<AnchorHit> {
        for (idx, tier) in self.tiers.iter().enumerate() {
            match tier.locate(buffer) {
                Some(offset) => {
                    tracing::debug!(tier = tier.name(), offset, "anchor located");
                    return Ok(AnchorHit {
                        offset,
                        tier: idx,
                        tier_name: tier.name(),
                    });
                }
                None => tracing::debug!(tier = tier.name(), "anchor tier missed"),
            }
        }

        Err(AppError::AnchorNotFound {
            tiers: self.tiers.iter().map(|t| t.name().to_string()).collect(),
        })
    }
}
