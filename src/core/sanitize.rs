// src/core/sanitize.rs

/// Decode the HTML entities that show up in calendar/altseason markup.
/// Named: nbsp, amp, lt, gt, quot, apos, minus, ndash, mdash, thinsp. Numeric: `&#NNN;` / `&#xHH;`.
/// Unknown entities are kept verbatim.
pub fn normalize_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // entity names are short; don't scan past a reasonable bound
        let semi = tail.char_indices()
            .take(12)
            .find(|&(_, c)| c == ';')
            .map(|(i, _)| i);
        match semi.and_then(|i| decode_entity(&tail[1..i]).map(|c| (i, c))) {
            Some((i, ch)) => {
                out.push(ch);
                rest = &tail[i + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let ch = match name {
        "nbsp" => '\u{00A0}',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "minus" => '\u{2212}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "thinsp" => '\u{2009}',
        _ => return None,
    };
    Some(ch)
}

/// Collapse whitespace runs (NBSP and narrow NBSP included) into one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Lowercase + collapsed whitespace; the form label matching works on.
pub fn fold(s: &str) -> String {
    normalize_ws(s).to_lowercase()
}

/// Escape text for chat HTML markup (`<b>`, `<i>`, `<code>`, `<pre>`, `<a>`).
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(normalize_entities("1&nbsp;234"), "1\u{A0}234");
        assert_eq!(normalize_entities("a &amp; b &#8722;3 &#x25;"), "a & b \u{2212}3 %");
        assert_eq!(normalize_entities("AT&T &bogus; x"), "AT&T &bogus; x");
    }

    #[test]
    fn ws_collapses_nbsp() {
        assert_eq!(normalize_ws("  1\u{A0}\u{A0}234 \n K "), "1 234 K");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
