use pulldown_cmark::{html, Event, Options, Parser};

/// Renders a chat answer to HTML. Single newlines become `<br />` so
/// answers keep their line structure in the chat bubble.
pub fn render_markdown(content: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(content, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut rendered = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    rendered
}
