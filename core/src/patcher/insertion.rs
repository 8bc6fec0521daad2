use crate::error::AppResult;
use crate::patcher::anchor::{Anchor, AnchorHit};
use crate::patcher::common::already_applied;
use crate::patcher::report::StageOutcome;

/// Separator placed between the inserted block and the anchored content.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Splices `block` in front of `offset`: `buffer[..offset] + block + "\n\n" + buffer[offset..]`.
pub fn insert_block(buffer: &str, offset: usize, block: &str) -> String {
    let mut out = String::with_capacity(buffer.len() + block.len() + BLOCK_SEPARATOR.len());
    out.push_str(&buffer[..offset]);
    out.push_str(block);
    out.push_str(BLOCK_SEPARATOR);
    out.push_str(&buffer[offset..]);
    out
}

/// Inserts the definition block before the anchor unless `marker` is already present.
///
/// The anchor is only searched when an insertion is needed, so an already
/// patched buffer never fails on a missing anchor.
pub fn insert_definition(
    buffer: &str,
    marker: &str,
    anchor: &Anchor,
    block: &str,
) -> AppResult<(String, StageOutcome, Option<AnchorHit>)> {
    if already_applied(buffer, marker) {
        tracing::info!(marker, "definition already present, skipping insertion");
        return Ok((buffer.to_string(), StageOutcome::AlreadyPresent, None));
    }

    let hit = anchor.locate(buffer)?;
    let out = insert_block(buffer, hit.offset, block);
    tracing::info!(offset = hit.offset, tier = hit.tier_name, "definition inserted");
    Ok((out, StageOutcome::Applied, Some(hit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::anchor::AnchorTier;
    use regex::Regex;

    fn anchor() -> Anchor {
        Anchor::new(vec![AnchorTier::DecoratedDefinition {
            definition: "def handler(".into(),
            decorator: "@app.get".into(),
        }])
    }

    #[test]
    fn test_insert_block() {
        assert_eq!(insert_block("ab", 1, "X"), "aX\n\nb");
        assert_eq!(insert_block("ab", 0, "X"), "X\n\nab");
    }

    #[test]
    fn test_insert_definition_before_decorator() {
        let buf = "import os\n\n@app.get(\"/\")\ndef handler():\n    pass\n";
        let (out, outcome, hit) =
            insert_definition(buf, "def _helper(", &anchor(), "def _helper():\n    pass").unwrap();
        assert_eq!(outcome, StageOutcome::Applied);
        assert_eq!(hit.map(|h| h.tier), Some(0));
        assert_eq!(
            out,
            "import os\n\ndef _helper():\n    pass\n\n@app.get(\"/\")\ndef handler():\n    pass\n"
        );
    }

    #[test]
    fn test_insert_definition_skips_when_marker_present() {
        let buf = "def _helper():\n    pass\n";
        // Anchor would fail, but the guard short-circuits first.
        let none = Anchor::new(vec![AnchorTier::Pattern(Regex::new("absent").unwrap())]);
        let (out, outcome, hit) = insert_definition(buf, "def _helper(", &none, "unused").unwrap();
        assert_eq!(out, buf);
        assert_eq!(outcome, StageOutcome::AlreadyPresent);
        assert!(hit.is_none());
    }
}
