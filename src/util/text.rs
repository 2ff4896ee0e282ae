use std::borrow::Cow;

use htmlescape::decode_html;

/// Longest named entity in the HTML5 table is 33 bytes including `&` and `;`.
const MAX_ENTITY_LEN: usize = 40;

/// Decodes HTML character references in feed text, exactly once.
///
/// Named (`&amp;`), decimal (`&#39;`) and hex (`&#x27;`) references are
/// replaced. The output is never rescanned, so `&amp;amp;` becomes `&amp;`
/// rather than `&`. Ampersands that do not start a recognised reference are
/// kept literally (`AT&T`), matching how browsers treat them.
///
/// Returns `Cow::Borrowed` when the input contains no `&` at all.
///
/// # Examples
///
/// ```
/// use gator::util::unescape_html;
///
/// assert_eq!(unescape_html("Tom &amp; Jerry"), "Tom & Jerry");
/// assert_eq!(unescape_html("&amp;amp;"), "&amp;");
/// assert_eq!(unescape_html("AT&T &lt;3"), "AT&T <3");
/// ```
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    if let Ok(decoded) = decode_html(input) {
        return Cow::Owned(decoded);
    }

    // A stray `&` fails the whole-string decode; fall back to one reference at a time
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&end| end < MAX_ENTITY_LEN)
            .and_then(|end| decode_html(&candidate[..=end]).ok().map(|d| (d, end)));
        match decoded {
            Some((text, end)) => {
                out.push_str(&text);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// SEC-001: Strip terminal control characters and ANSI escape sequences.
///
/// Feed titles and descriptions are remote input printed straight to the
/// terminal by `browse`, `feeds` and `following`. Removes C0 controls other
/// than tab, newline and carriage return, DEL, CSI sequences (`ESC [` up to a
/// final byte in `0x40..=0x7E`), OSC sequences (`ESC ]` up to BEL or `ESC \`),
/// and bare ESC.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_stripped(c: char) -> bool {
        c == '\x7f' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r'))
    }

    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_stripped(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unescape_single_pass() {
        assert_eq!(unescape_html("&amp;amp;"), "&amp;");
        assert_eq!(unescape_html("&amp;lt;b&amp;gt;"), "&lt;b&gt;");
    }

    #[test]
    fn test_unescape_numeric_references() {
        assert_eq!(unescape_html("it&#8217;s"), "it\u{2019}s");
        assert_eq!(unescape_html("it&#x27;s"), "it's");
        assert_eq!(unescape_html("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn test_unescape_keeps_stray_ampersands() {
        assert_eq!(unescape_html("Q&A: &quot;why&quot;"), "Q&A: \"why\"");
        assert_eq!(unescape_html("trailing &"), "trailing &");
        assert_eq!(unescape_html("&notanentity; &amp;"), "&notanentity; &");
    }

    #[test]
    fn test_unescape_clean_text_borrowed() {
        assert!(matches!(unescape_html("plain title"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "line1\nline2\ttabbed\r\nwindows";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_control_chars_removes_controls() {
        assert_eq!(
            strip_control_chars("he\x00ll\x07o\x08 w\x0bor\x0cld\x7f!"),
            "hello world!"
        );
    }

    #[test]
    fn test_strip_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(
            strip_control_chars("\x1b]0;malicious title\x07safe"),
            "safe"
        );
        assert_eq!(
            strip_control_chars("\x1b]0;malicious title\x1b\\safe"),
            "safe"
        );
        assert_eq!(strip_control_chars("before\x1bafter"), "beforeafter");
    }

    proptest! {
        #[test]
        fn prop_text_without_ampersand_unchanged(s in "[^&]{0,64}") {
            prop_assert_eq!(unescape_html(&s), s.as_str());
        }
    }
}
