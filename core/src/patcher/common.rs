//! Buffer helpers shared by the patch stages.

/// Idempotency guard: literal substring search for a patch marker.
pub fn already_applied(buffer: &str, marker: &str) -> bool {
    !marker.is_empty() && buffer.contains(marker)
}

/// Byte offset of the start of the line containing `offset`.
pub(crate) fn line_start(buffer: &str, offset: usize) -> usize {
    buffer[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Moves `offset` back to its line start when only blanks precede it on that line.
pub(crate) fn snap_to_line_start(buffer: &str, offset: usize) -> usize {
    let start = line_start(buffer, offset);
    if is_blank(&buffer[start..offset]) {
        start
    } else {
        offset
    }
}

/// The leading whitespace of the line containing `offset`, or `None` when
/// something other than blanks precedes `offset` on that line.
pub(crate) fn detect_indent(buffer: &str, offset: usize) -> Option<&str> {
    let start = line_start(buffer, offset);
    let prefix = &buffer[start..offset];
    is_blank(prefix).then_some(prefix)
}

/// Prefixes every line after the first with `indent`. Empty lines stay empty.
pub(crate) fn reindent(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + indent.len() * 4);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

/// Index of the character boundary following `offset`.
pub(crate) fn next_char_boundary(buffer: &str, offset: usize) -> usize {
    buffer[offset..]
        .chars()
        .next()
        .map_or(buffer.len(), |c| offset + c.len_utf8())
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t')
}
