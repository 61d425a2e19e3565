//! 题目正文的 Markdown 渲染

use pulldown_cmark::{html, Event, Options, Parser, TagEnd};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// 渲染为 HTML
pub fn render_markdown(content: &str) -> String {
    let parser = Parser::new_ext(content, options());
    let mut html_output = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// 提取纯文本摘要，超过 `max_chars` 时截断并追加省略号
pub fn plain_excerpt(content: &str, max_chars: usize) -> String {
    let mut text = String::new();
    for event in Parser::new_ext(content, options()) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock) => {
                text.push(' ')
            }
            _ => {}
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let mut excerpt: String = collapsed.chars().take(max_chars).collect();
    excerpt.truncate(excerpt.trim_end().len());
    excerpt.push('…');
    excerpt
}
