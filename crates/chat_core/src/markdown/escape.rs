/// Escape text for embedding in HTML element content.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for ch in unsafe_text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for use inside a quoted HTML attribute; newlines survive as `&#10;`.
pub fn escape_html_attribute(unsafe_text: &str) -> String {
    escape_html(unsafe_text)
        .replace('\n', "&#10;")
        .replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_ampersand_first() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_escape_html_attribute_newlines() {
        assert_eq!(escape_html_attribute("a\r\n<b>"), "a&#10;&lt;b&gt;");
    }
}
