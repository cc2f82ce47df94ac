//! Markdown rendering for assistant messages.
//!
//! Assistant replies arrive as markdown.  The session controller re-renders
//! the whole accumulated text on every token, so renderers must be pure and
//! idempotent: the same input always yields the same output.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// Converts markdown into HTML that is safe to insert into a document.
pub trait MarkdownRenderer: Send + Sync {
    /// Render `markdown` to sanitized HTML.
    fn render(&self, markdown: &str) -> String;
}

/// Markdown renderer backed by pulldown-cmark.
///
/// Raw HTML embedded in the markdown is escaped and shown as text, and links
/// or images whose destination uses a scriptable scheme are neutralized, so
/// the output never carries executable content.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    options: Options,
}

impl HtmlRenderer {
    /// Creates a renderer with tables, strikethrough and task lists enabled.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for HtmlRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options).map(sanitize_event);
        let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut out, parser);
        out
    }
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(tag) => Event::Start(sanitize_tag(tag)),
        Event::End(tag) => Event::End(sanitize_tag(tag)),
        other => other,
    }
}

fn sanitize_tag(tag: Tag<'_>) -> Tag<'_> {
    match tag {
        Tag::Link(kind, dest, title) => Tag::Link(kind, sanitize_url(dest), title),
        Tag::Image(kind, dest, title) => Tag::Image(kind, sanitize_url(dest), title),
        other => other,
    }
}

fn sanitize_url(dest: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&dest) {
        dest
    } else {
        CowStr::Borrowed("#")
    }
}

/// Returns false for destinations that would run script when followed.
pub fn is_safe_url(dest: &str) -> bool {
    // Browsers ignore ASCII whitespace and control characters inside the scheme.
    let scheme: String = dest
        .chars()
        .take_while(|c| *c != ':' && *c != '/' && *c != '?' && *c != '#')
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if !dest.contains(':') {
        return true;
    }
    !matches!(scheme.as_str(), "javascript" | "vbscript" | "data")
}
