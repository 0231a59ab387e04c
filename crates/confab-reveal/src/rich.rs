//! Markdown rendering for rich-text reveal.
//!
//! Partial markdown parses to broken structure, so the whole document is
//! rendered up front. Every block element and every word inside it becomes a
//! numbered reveal unit; the scheduler then makes a growing prefix of units
//! visible. Units are numbered in document order, so a block always reveals
//! no later than its first word.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Fully rendered HTML with reveal-unit annotations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichContent {
    pub html: String,
    pub unit_count: usize,
}

/// Render markdown to annotated HTML.
pub fn prepare(markdown: &str) -> RichContent {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
    let mut r = Renderer::default();
    for event in parser {
        r.handle(event);
    }
    RichContent {
        html: r.html,
        unit_count: r.units,
    }
}

#[derive(Default)]
struct Renderer {
    html: String,
    units: usize,
    in_code_block: bool,
}

impl Renderer {
    fn unit_attrs(&mut self) -> String {
        let n = self.units;
        self.units += 1;
        format!(" class=\"reveal-unit\" data-unit=\"{}\"", n)
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let attrs = self.unit_attrs();
                self.html.push_str(&format!(
                    "<span{}><code>{}</code></span>",
                    attrs,
                    escape_html(&code)
                ));
            }
            Event::SoftBreak => self.html.push('\n'),
            Event::HardBreak => self.html.push_str("<br />"),
            Event::Rule => {
                let attrs = self.unit_attrs();
                self.html.push_str(&format!("<hr{} />", attrs));
            }
            // Raw HTML in assistant markdown is not trusted.
            Event::Html(_) | Event::InlineHtml(_) => {}
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                let attrs = self.unit_attrs();
                self.html.push_str(&format!("<p{}>", attrs));
            }
            Tag::Heading { level, .. } => {
                let attrs = self.unit_attrs();
                self.html
                    .push_str(&format!("<{}{}>", heading_tag(level), attrs));
            }
            Tag::BlockQuote(_) => {
                let attrs = self.unit_attrs();
                self.html.push_str(&format!("<blockquote{}>", attrs));
            }
            Tag::CodeBlock(kind) => {
                self.in_code_block = true;
                let attrs = self.unit_attrs();
                match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        self.html.push_str(&format!(
                            "<pre{}><code class=\"language-{}\">",
                            attrs,
                            escape_html(&lang)
                        ));
                    }
                    _ => self.html.push_str(&format!("<pre{}><code>", attrs)),
                }
            }
            Tag::List(Some(start)) => {
                let attrs = self.unit_attrs();
                if start == 1 {
                    self.html.push_str(&format!("<ol{}>", attrs));
                } else {
                    self.html
                        .push_str(&format!("<ol start=\"{}\"{}>", start, attrs));
                }
            }
            Tag::List(None) => {
                let attrs = self.unit_attrs();
                self.html.push_str(&format!("<ul{}>", attrs));
            }
            Tag::Item => {
                let attrs = self.unit_attrs();
                self.html.push_str(&format!("<li{}>", attrs));
            }
            Tag::Emphasis => self.html.push_str("<em>"),
            Tag::Strong => self.html.push_str("<strong>"),
            Tag::Strikethrough => self.html.push_str("<del>"),
            Tag::Link { dest_url, .. } => {
                self.html
                    .push_str(&format!("<a href=\"{}\">", escape_html(&dest_url)));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.html.push_str("</p>"),
            TagEnd::Heading(level) => {
                self.html.push_str(&format!("</{}>", heading_tag(level)));
            }
            TagEnd::BlockQuote(_) => self.html.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.html.push_str("</code></pre>");
            }
            TagEnd::List(true) => self.html.push_str("</ol>"),
            TagEnd::List(false) => self.html.push_str("</ul>"),
            TagEnd::Item => self.html.push_str("</li>"),
            TagEnd::Emphasis => self.html.push_str("</em>"),
            TagEnd::Strong => self.html.push_str("</strong>"),
            TagEnd::Strikethrough => self.html.push_str("</del>"),
            TagEnd::Link => self.html.push_str("</a>"),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            // The enclosing pre block is the reveal unit; preserve its
            // whitespace untouched.
            self.html.push_str(&escape_html(text));
            return;
        }
        for token in crate::token::split_preserving_whitespace(text) {
            if token.chars().all(char::is_whitespace) {
                self.html.push_str(&token);
            } else {
                let attrs = self.unit_attrs();
                self.html
                    .push_str(&format!("<span{}>{}</span>", attrs, escape_html(&token)));
            }
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
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
    fn test_paragraph_units() {
        let content = prepare("hello brave world");
        // One paragraph block plus three word units.
        assert_eq!(content.unit_count, 4);
        assert!(content.html.starts_with("<p class=\"reveal-unit\" data-unit=\"0\">"));
        assert!(content
            .html
            .contains("<span class=\"reveal-unit\" data-unit=\"1\">hello</span>"));
        assert!(content.html.ends_with("</p>"));
    }

    #[test]
    fn test_unit_numbering_is_sequential() {
        let content = prepare("# Title\n\nbody text");
        for n in 0..content.unit_count {
            assert!(content.html.contains(&format!("data-unit=\"{}\"", n)));
        }
    }

    #[test]
    fn test_heading_levels() {
        let content = prepare("## Section");
        assert!(content.html.contains("<h2 class=\"reveal-unit\""));
        assert!(content.html.ends_with("</h2>"));
    }

    #[test]
    fn test_code_block_is_single_unit() {
        let content = prepare("```rust\nlet x = 1;\nlet y = 2;\n```");
        // The pre block is one unit; code text is not word-wrapped.
        assert_eq!(content.unit_count, 1);
        assert!(content.html.contains("<code class=\"language-rust\">"));
        assert!(content.html.contains("let x = 1;\nlet y = 2;\n"));
    }

    #[test]
    fn test_inline_styles_are_not_units() {
        let content = prepare("some *emphatic* text");
        assert!(content.html.contains("<em>"));
        assert!(!content.html.contains("<em class"));
        // p + three words.
        assert_eq!(content.unit_count, 4);
    }

    #[test]
    fn test_list_items_are_units() {
        let content = prepare("- one\n- two");
        assert!(content.html.contains("<ul class=\"reveal-unit\""));
        // ul + 2 li + 2 words.
        assert_eq!(content.unit_count, 5);
    }

    #[test]
    fn test_link_href_escaped() {
        let content = prepare("[go](https://example.test/?a=1&b=2)");
        assert!(content
            .html
            .contains("<a href=\"https://example.test/?a=1&amp;b=2\">"));
    }

    #[test]
    fn test_text_is_escaped() {
        let content = prepare("a <b> c");
        assert!(content.html.contains("&lt;b&gt;"));
        assert!(!content.html.contains("<b>"));
    }

    #[test]
    fn test_raw_html_dropped() {
        let content = prepare("before\n\n<script>alert(1)</script>\n\nafter");
        assert!(!content.html.contains("<script>"));
    }

    #[test]
    fn test_empty_input() {
        let content = prepare("");
        assert_eq!(content.unit_count, 0);
        assert!(content.html.is_empty());
    }

    #[test]
    fn test_whitespace_between_words_preserved() {
        let content = prepare("one two");
        assert!(content.html.contains("</span> <span"));
    }
}
