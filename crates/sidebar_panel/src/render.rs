//! HTML fragments for the chat panel

use chat_core::markdown::{escape_html, escape_html_attribute, extract, CodeBlock, Segment};
use chat_core::{ConversationTurn, Role};

/// Render one turn. System turns are never shown.
pub fn render_turn(turn: &ConversationTurn) -> Option<String> {
    if turn.role == Role::System {
        return None;
    }
    let mut html = format!("<div class=\"message {}\">", turn.role);
    match turn.role {
        Role::Assistant => render_reply(&turn.content, &mut html),
        _ => html.push_str(&render_prose(&turn.content)),
    }
    html.push_str("</div>");
    Some(html)
}

pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    turns.iter().filter_map(render_turn).collect::<Vec<_>>().join("\n")
}

fn render_reply(content: &str, html: &mut String) {
    let extraction = extract(content);
    for segment in extraction.segments() {
        match segment {
            Segment::Text(text) => html.push_str(&render_prose(text)),
            Segment::Code(block) => html.push_str(&render_code_block(block)),
        }
    }
}

fn render_prose(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn render_code_block(block: &CodeBlock) -> String {
    let language = escape_html(&block.language);
    let data = escape_html_attribute(&block.code);
    format!(
        concat!(
            "<div class=\"code-block-container\">",
            "<div class=\"code-block-header\">",
            "<span class=\"code-language\">{lang}</span>",
            "<button class=\"copy-button\" data-code=\"{data}\">Copy</button>",
            "<button class=\"insert-button\" data-code=\"{data}\">Insert</button>",
            "</div>",
            "<pre><code class=\"language-{lang}\">{code}</code></pre>",
            "</div>"
        ),
        lang = language,
        data = data,
        code = escape_html(&block.code),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prose_is_escaped() {
        let html = render_turn(&ConversationTurn::user("a < b & \"c\"\nnext")).unwrap();
        assert_eq!(
            html,
            "<div class=\"message user\">a &lt; b &amp; &quot;c&quot;<br>next</div>"
        );
    }

    #[test]
    fn test_system_turn_hidden() {
        assert!(render_turn(&ConversationTurn::system("preamble")).is_none());
    }

    #[test]
    fn test_user_fences_are_not_expanded() {
        let html = render_turn(&ConversationTurn::user("```rs\nfn x() {}\n```")).unwrap();
        assert!(!html.contains("code-block-container"));
    }

    #[test]
    fn test_assistant_code_block() {
        let reply = "Try this:\n```Rust\nif a < b {\n    go();\n}\n```\nDone.";
        let html = render_turn(&ConversationTurn::assistant(reply)).unwrap();

        assert!(html.starts_with("<div class=\"message assistant\">Try this:<br>"));
        assert!(html.contains("<span class=\"code-language\">rust</span>"));
        assert!(html.contains("<code class=\"language-rust\">if a &lt; b {\n    go();\n}</code>"));
        assert!(html.contains("data-code=\"if a &lt; b {&#10;    go();&#10;}\""));
        assert!(html.ends_with("<br>Done.</div>"));
    }

    #[test]
    fn test_untagged_fence_is_plaintext() {
        let html = render_turn(&ConversationTurn::assistant("```\nx\n```")).unwrap();
        assert!(html.contains("language-plaintext"));
    }

    #[test]
    fn test_transcript_joins_visible_turns() {
        let turns = vec![
            ConversationTurn::system("hidden"),
            ConversationTurn::user("q"),
            ConversationTurn::assistant("a"),
        ];
        assert_eq!(
            render_transcript(&turns),
            "<div class=\"message user\">q</div>\n<div class=\"message assistant\">a</div>"
        );
    }
}
