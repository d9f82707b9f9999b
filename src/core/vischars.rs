// src/core/vischars.rs
// Visible-text character iterator over an HTML document.
// Tags become a single separator space, <script>/<style> bodies are dropped,
// entities are decoded, whitespace runs collapse to one ' '.

use super::sanitize::decode_entity;

pub struct VisChars<'a> {
    s: &'a str,
    b: &'a [u8],
    i: usize,
    n: usize,
    // last emitted char was a space (or nothing emitted yet)
    spaced: bool,
}

impl<'a> VisChars<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, b: s.as_bytes(), i: 0, n: s.len(), spaced: true }
    }

    /// Called when current byte is '<'. A script/style opener also skips the element body.
    #[inline]
    fn skip_tag(&mut self) {
        let start = self.i;
        self.i += 1;
        let mut in_s = false; // '
        let mut in_d = false; // "
        while self.i < self.n {
            match self.b[self.i] {
                b'\'' if !in_d => in_s = !in_s,
                b'"'  if !in_s => in_d = !in_d,
                b'>' if !in_s && !in_d => { self.i += 1; break; }
                _ => {}
            }
            self.i += 1;
        }
        let tag = &self.b[start + 1..self.i.min(self.n)];
        for raw in ["script", "style"] {
            if starts_with_ci(tag, raw.as_bytes()) && boundary(tag.get(raw.len())) {
                self.skip_raw_body(raw);
                break;
            }
        }
    }

    fn skip_raw_body(&mut self, name: &str) {
        let close = format!("</{name}");
        let needle = close.as_bytes();
        while self.i + needle.len() <= self.n {
            if self.b[self.i..self.i + needle.len()].eq_ignore_ascii_case(needle) {
                // leave the closing tag for skip_tag
                return;
            }
            self.i += 1;
        }
        self.i = self.n;
    }

    /// Called when current byte is '&'. Decodes a known entity, else yields '&' as text.
    #[inline]
    fn entity(&mut self) -> char {
        let rest = &self.s[self.i..];
        if let Some(semi) = rest.bytes().take(12).position(|c| c == b';') {
            if let Some(ch) = decode_entity(&rest[1..semi]) {
                self.i += semi + 1;
                return ch;
            }
        }
        self.i += 1;
        '&'
    }

    #[inline]
    fn next_char(&mut self) -> Option<char> {
        let ch = self.s[self.i..].chars().next()?;
        self.i += ch.len_utf8();
        Some(ch)
    }
}

fn starts_with_ci(hay: &[u8], pat: &[u8]) -> bool {
    hay.len() >= pat.len() && hay[..pat.len()].eq_ignore_ascii_case(pat)
}

fn boundary(b: Option<&u8>) -> bool {
    matches!(b, None | Some(b'>' | b' ' | b'\t' | b'\r' | b'\n' | b'/'))
}

impl Iterator for VisChars<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while self.i < self.n {
            let ch = match self.b[self.i] {
                b'<' => { self.skip_tag(); ' ' }
                b'&' => self.entity(),
                _ => self.next_char()?,
            };
            if ch.is_whitespace() {
                if self.spaced { continue; }
                self.spaced = true;
                return Some(' ');
            }
            self.spaced = false;
            return Some(ch);
        }
        None
    }
}

/// Whole visible text of a document, whitespace-collapsed.
pub fn visible_text(html: &str) -> String {
    let mut out: String = VisChars::new(html).collect();
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_separate_words_and_scripts_vanish() {
        let html = "<h1>Altcoin Season Index</h1><script>var x = 99;</script><p>Now:<b>57</b></p>";
        assert_eq!(visible_text(html), "Altcoin Season Index Now: 57");
    }

    #[test]
    fn entities_decode() {
        assert_eq!(visible_text("<td>1&nbsp;234&amp;5</td>"), "1 234&5");
        assert_eq!(visible_text("AT&T"), "AT&T");
    }

    #[test]
    fn style_with_attributes_is_skipped() {
        let html = "<STYLE type=\"text/css\">td{color:red}</STYLE>Hi";
        assert_eq!(visible_text(html), "Hi");
    }
}
