//! Escaping for text placed inside display markup.

/// Appends `s` to `out` with `&`, `<` and `>` replaced by entities.
pub(crate) fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        push_escaped(out, c);
    }
}

/// Returns `c` as markup-safe text.
pub(crate) fn escape_char(c: char) -> String {
    let mut out = String::with_capacity(4);
    push_escaped(&mut out, c);
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        c => out.push(c),
    }
}
