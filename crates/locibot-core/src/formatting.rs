use std::sync::OnceLock;

use regex::Regex;

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Characters that a backslash turns into literal text.
const ESCAPABLE: [char; 4] = ['_', '*', '`', '['];

fn link_re() -> &'static Regex {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    // [text](url), no nested brackets, surrounding blanks in the url dropped.
    LINK_RE.get_or_init(|| {
        Regex::new(r"\[([^\]]+)\]\(\s*([^)\s][^)]*?)\s*\)").expect("valid regex")
    })
}

/// Convert Telegram's legacy Markdown (`*bold*`, `_italic_`, `` `code` ``,
/// `[text](url)`) to Telegram-compatible HTML.
///
/// Unpaired markers are kept as literal text instead of being rejected, and
/// `\_`, `\*`, `` \` `` and `\[` produce the bare marker.
pub fn convert_markdown_to_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let mut last = 0;

    for caps in link_re().captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        // `\[x](y)` is literal text.
        if input[..whole.start()].ends_with('\\') {
            continue;
        }
        out.push_str(&convert_spans(&input[last..whole.start()]));
        out.push_str(&format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(&caps[2]),
            escape_html(&unescape(&caps[1]))
        ));
        last = whole.end();
    }
    out.push_str(&convert_spans(&input[last..]));

    out
}

/// Bold, italic and inline code; everything else is escaped.
fn convert_spans(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if chars.get(i + 1).is_some_and(|n| ESCAPABLE.contains(n)) => {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '*' | '_' | '`' => {
                if let Some(end) = find_closing(&chars, i + 1, c) {
                    let inner: String = chars[i + 1..end].iter().collect();
                    let (open, close, inner) = match c {
                        '*' => ("<b>", "</b>", unescape(&inner)),
                        '_' => ("<i>", "</i>", unescape(&inner)),
                        _ => ("<code>", "</code>", inner),
                    };
                    out.push_str(open);
                    out.push_str(&escape_html(&inner));
                    out.push_str(close);
                    i = end + 1;
                    continue;
                }
                out.push(c);
            }
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
        i += 1;
    }

    out
}

/// First unescaped `marker` at or after `from` (`from` is always >= 1).
fn find_closing(chars: &[char], from: usize, marker: char) -> Option<usize> {
    let end = (from..chars.len()).find(|&j| chars[j] == marker && chars[j - 1] != '\\')?;
    // Empty spans (`**`) are left as literal text.
    if end == from {
        return None;
    }
    Some(end)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPABLE.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
