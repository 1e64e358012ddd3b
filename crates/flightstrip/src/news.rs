//! Markdown rendering for news articles.
//!
//! Article bodies are Markdown written by operators. Rendering goes through
//! pulldown-cmark with tables and strikethrough enabled; the event stream is
//! rewritten before it reaches the HTML writer so raw HTML is shown as text
//! and script-bearing link targets never survive.

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::model::NewsArticle;

/// URL schemes that are replaced with `#` in links and images.
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "data:", "vbscript:"];

/// Render Markdown to sanitized HTML.
///
/// Single newlines inside a paragraph become line breaks.
#[must_use]
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(source, options).map(sanitize);

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Render a whole article: the title as an escaped `<h1>`, then the body.
#[must_use]
pub fn render_article(article: &NewsArticle) -> String {
    let heading = [
        Event::Start(Tag::Heading {
            level: HeadingLevel::H1,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        }),
        Event::Text(CowStr::Borrowed(article.title.as_str())),
        Event::End(TagEnd::Heading(HeadingLevel::H1)),
    ];

    let mut out = String::new();
    html::push_html(&mut out, heading.into_iter());
    out.push_str(&render_markdown(&article.content));
    out
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::SoftBreak => Event::HardBreak,
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: neutralize(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: neutralize(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn neutralize(url: CowStr<'_>) -> CowStr<'_> {
    if is_blocked(&url) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Whether `url` uses a blocked scheme, ignoring case and embedded
/// whitespace or control characters.
fn is_blocked(url: &str) -> bool {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect();
    BLOCKED_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}
