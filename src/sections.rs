//! Header-based segmentation of a finished job-fit report.
//!
//! A job-fit analysis is streamed as one markdown document with `## ` level
//! headers.  Once it is complete, the strengths and weaknesses sections are
//! pulled out and laid side by side while everything else renders in order.

use crate::render::MarkdownRenderer;

/// One `## ` section of a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header text with surrounding whitespace removed.
    pub title: String,
    /// Everything after the header line, up to the next `## ` header.
    pub body: String,
}

/// A markdown document split at its `## ` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    /// Text before the first header.
    pub intro: String,
    /// Sections in document order.
    pub sections: Vec<Section>,
}

impl Sections {
    /// Returns the first section whose title contains any of `needles`, ignoring case.
    pub fn find(&self, needles: &[&str]) -> Option<&Section> {
        self.sections.iter().find(|section| {
            let title = section.title.to_lowercase();
            needles.iter().any(|needle| title.contains(needle))
        })
    }
}

/// Split `markdown` at every line that begins with `## `.
///
/// A later section with the same title as an earlier one replaces it in place.
pub fn split_sections(markdown: &str) -> Sections {
    let mut out = Sections::default();
    let mut current: Option<Section> = None;

    for line in markdown.split_inclusive('\n') {
        if let Some(header) = line.strip_prefix("## ") {
            if let Some(section) = current.take() {
                push_section(&mut out.sections, section);
            }
            current = Some(Section {
                title: header.trim().to_string(),
                body: String::new(),
            });
        } else if let Some(section) = current.as_mut() {
            section.body.push_str(line);
        } else {
            out.intro.push_str(line);
        }
    }
    if let Some(section) = current.take() {
        push_section(&mut out.sections, section);
    }
    out
}

fn push_section(sections: &mut Vec<Section>, section: Section) {
    match sections.iter_mut().find(|s| s.title == section.title) {
        Some(existing) => existing.body = section.body,
        None => sections.push(section),
    }
}

const STRENGTH_KEYS: &[&str] = &["strength", "pros"];
const WEAKNESS_KEYS: &[&str] = &["weakness", "cons"];

/// Render a finished job-fit report.
///
/// The intro renders first.  When the report has both a strengths section and
/// a weaknesses section they render as a pair of cards, and the remaining
/// sections follow in document order with their headers restored.
pub fn layout_fit_report(markdown: &str, renderer: &dyn MarkdownRenderer) -> String {
    let sections = split_sections(markdown);
    let mut html = renderer.render(&sections.intro);

    let strengths = sections.find(STRENGTH_KEYS);
    let weaknesses = sections.find(WEAKNESS_KEYS);
    let paired = match (strengths, weaknesses) {
        (Some(s), Some(w)) if s.title != w.title => {
            html.push_str("<div class=\"fit-cards-row\">");
            push_card(&mut html, "fit-card-strengths", s, renderer);
            push_card(&mut html, "fit-card-weaknesses", w, renderer);
            html.push_str("</div>");
            Some((s.title.as_str(), w.title.as_str()))
        }
        _ => None,
    };

    for section in &sections.sections {
        if let Some((s, w)) = paired
            && (section.title == s || section.title == w)
        {
            continue;
        }
        html.push_str(&renderer.render(&format!("## {}\n{}", section.title, section.body)));
    }
    html
}

fn push_card(html: &mut String, class: &str, section: &Section, renderer: &dyn MarkdownRenderer) {
    html.push_str(&format!(
        "<div class=\"fit-card {class}\"><div class=\"fit-card-header\">{}</div><div class=\"fit-card-body\">{}</div></div>",
        escape_text(&section.title),
        renderer.render(&section.body),
    ));
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HtmlRenderer;

    const REPORT: &str = "Intro line.\n\n## Overall Assessment\nSolid.\n\n## Strengths & Pros\n- Rust\n\n## Weaknesses & Cons\n- No Go\n\n## Verdict\nGood Fit\n";

    #[test]
    fn split_keeps_intro_and_order() {
        let sections = split_sections(REPORT);
        assert_eq!(sections.intro, "Intro line.\n\n");
        let titles: Vec<&str> = sections.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Overall Assessment",
                "Strengths & Pros",
                "Weaknesses & Cons",
                "Verdict"
            ]
        );
        assert_eq!(sections.sections[3].body, "Good Fit\n");
    }

    #[test]
    fn split_ignores_deeper_headers() {
        let sections = split_sections("### not a split\n## Real\nbody");
        assert_eq!(sections.intro, "### not a split\n");
        assert_eq!(sections.sections.len(), 1);
        assert_eq!(sections.sections[0].body, "body");
    }

    #[test]
    fn split_header_without_body() {
        let sections = split_sections("## Verdict");
        assert_eq!(sections.sections[0].title, "Verdict");
        assert_eq!(sections.sections[0].body, "");
    }

    #[test]
    fn duplicate_titles_keep_last_body() {
        let sections = split_sections("## A\none\n## B\ntwo\n## A\nthree\n");
        assert_eq!(sections.sections.len(), 2);
        assert_eq!(sections.sections[0].body, "three\n");
    }

    #[test]
    fn find_is_case_insensitive() {
        let sections = split_sections("## PROS\nx\n## cons\ny\n");
        assert_eq!(sections.find(STRENGTH_KEYS).unwrap().title, "PROS");
        assert_eq!(sections.find(WEAKNESS_KEYS).unwrap().title, "cons");
    }

    #[test]
    fn layout_pairs_strengths_and_weaknesses() {
        let html = layout_fit_report(REPORT, &HtmlRenderer::new());
        let cards = html.find("fit-cards-row").unwrap();
        let overall = html.find("Overall Assessment").unwrap();
        let verdict = html.find("<h2>Verdict</h2>").unwrap();
        assert!(cards < overall && overall < verdict);
        assert!(html.contains("Strengths &amp; Pros"));
        assert!(!html.contains("<h2>Strengths"));
    }

    #[test]
    fn layout_without_pair_renders_sections_in_order() {
        let html = layout_fit_report("## Strengths\n- a\n## Verdict\nok\n", &HtmlRenderer::new());
        assert!(!html.contains("fit-cards-row"));
        assert!(html.contains("<h2>Strengths</h2>"));
        assert!(html.find("<h2>Strengths</h2>").unwrap() < html.find("<h2>Verdict</h2>").unwrap());
    }
}
