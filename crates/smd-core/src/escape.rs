//! HTML escaping for literal text.

use std::io::{self, Write};

use memchr::memchr3;

/// Length of the entity token (`&amp;`, `&#123;`) at the start of `text`,
/// or 0 if there is none.
///
/// A token is `&`, one or more ASCII letters, digits or `#`, then `;`.
#[inline]
pub fn entity_len(text: &[u8]) -> usize {
    if text.first() != Some(&b'&') {
        return 0;
    }
    let body = text[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'#')
        .count();
    if body > 0 && text.get(1 + body) == Some(&b';') {
        body + 2
    } else {
        0
    }
}

/// Write `text` with `<`, `>` and `&` replaced by entities.
///
/// An `&` that already starts an entity token is copied as-is, so text
/// that was escaped once is not escaped again.
pub fn write_escaped<W: Write + ?Sized>(out: &mut W, text: &[u8]) -> io::Result<()> {
    let mut rest = text;
    while let Some(i) = memchr3(b'<', b'>', b'&', rest) {
        out.write_all(&rest[..i])?;
        let skip = match rest[i] {
            b'<' => {
                out.write_all(b"&lt;")?;
                1
            }
            b'>' => {
                out.write_all(b"&gt;")?;
                1
            }
            _ => match entity_len(&rest[i..]) {
                0 => {
                    out.write_all(b"&amp;")?;
                    1
                }
                n => {
                    out.write_all(&rest[i..i + n])?;
                    n
                }
            },
        };
        rest = &rest[i + skip..];
    }
    out.write_all(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(text: &str) -> String {
        let mut out = Vec::new();
        write_escaped(&mut out, text.as_bytes()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escaped("a < b > c"), "a &lt; b &gt; c");
        assert_eq!(escaped("fish & chips"), "fish &amp; chips");
    }

    #[test]
    fn entity_tokens_pass_through() {
        assert_eq!(escaped("&amp; &lt; &#169; &copy;"), "&amp; &lt; &#169; &copy;");
        assert_eq!(escaped("&; & x;"), "&amp;; &amp; x;");
    }

    #[test]
    fn escaping_is_idempotent() {
        let once = escaped("<a href> & more");
        assert_eq!(escaped(&once), once);
    }

    #[test]
    fn entity_len_requires_body_and_semicolon() {
        assert_eq!(entity_len(b"&amp;x"), 5);
        assert_eq!(entity_len(b"&amp x;"), 0);
        assert_eq!(entity_len(b"&;"), 0);
        assert_eq!(entity_len(b"x"), 0);
    }
}
