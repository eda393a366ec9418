//! HTML entity escaping for text content.

/// Escape the characters that can break out of HTML text or attribute context.
///
/// `& < > " ' /` become `&amp; &lt; &gt; &quot; &#x27; &#x2F;`. There is no
/// paired unescape: escaping an already escaped string escapes its `&` again.
pub fn escape_special_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}
