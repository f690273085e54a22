// src/format/html.rs
//! HTML fragment -> styled spans.
//!
//! Feed descriptions are arbitrary and often broken HTML. Parsing goes through
//! html5ever's recovering tree builder (via `scraper`), so there is no error
//! path here: anything that cannot be read as markup ends up as literal text.

use scraper::{ElementRef, Html, Node};

/// Tags that end the current line before and after their content.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "tr",
    "table", "section", "article", "header", "footer",
];

/// Tags dropped together with everything inside them.
const SKIPPED_TAGS: &[&str] = &["script", "style", "head", "template", "noscript"];

/// Link targets Telegram accepts in an inline link.
const LINK_SCHEMES: &[&str] = &["http://", "https://", "tg://", "mailto:"];

/// When a line is cut, look this far back for a sentence end or a space.
const CUT_BACKOFF_CHARS: usize = 300;

pub const ELLIPSIS: &str = "…";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub link: Option<String>,
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
        }
    }
}

pub type Line = Vec<Span>;

/// Parsed description: non-empty lines of non-empty spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredText {
    pub lines: Vec<Line>,
}

impl StructuredText {
    pub fn parse(html: &str) -> Self {
        if html.trim().is_empty() {
            return Self::default();
        }
        let doc = Html::parse_fragment(html);
        let mut builder = Builder::default();
        builder.walk(doc.root_element(), &Style::default());
        builder.finish()
    }

    pub fn first_line_text(&self) -> Option<String> {
        self.lines.first().map(|l| line_text(l))
    }

    /// Lines flattened to text, joined with `\n`.
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| line_text(l))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain-text length in chars, newlines included.
    pub fn char_count(&self) -> usize {
        let text: usize = self.lines.iter().map(|l| line_chars(l)).sum();
        text + self.lines.len().saturating_sub(1)
    }

    /// Copy cut down to at most `max_chars` plain-text chars plus an ellipsis.
    pub fn truncated(&self, max_chars: usize) -> StructuredText {
        if self.char_count() <= max_chars {
            return self.clone();
        }

        let mut lines: Vec<Line> = Vec::new();
        let mut budget = max_chars;
        for line in &self.lines {
            let separator = usize::from(!lines.is_empty());
            let len = line_chars(line);
            if len + separator <= budget {
                budget -= len + separator;
                lines.push(line.clone());
                continue;
            }

            let keep = budget.saturating_sub(separator);
            let cut = cut_line(line, keep);
            if !cut.is_empty() {
                lines.push(cut);
            }
            break;
        }

        match lines.last_mut() {
            Some(last) => push_span(last, ELLIPSIS, &Style::default()),
            None => lines.push(vec![Span::plain(ELLIPSIS)]),
        }
        StructuredText { lines }
    }
}

/// Plain text of an HTML fragment, one line per block.
pub fn to_plain_text(html: &str) -> String {
    StructuredText::parse(html).to_plain_text()
}

pub fn line_text(line: &[Span]) -> String {
    line.iter().map(|s| s.text.as_str()).collect()
}

fn line_chars(line: &[Span]) -> usize {
    line.iter().map(|s| s.text.chars().count()).sum()
}

/// Keep roughly `keep` chars of `line`, preferring to stop after a `.` or at a
/// space in the last stretch before the limit.
fn cut_line(line: &[Span], keep: usize) -> Line {
    let chars: Vec<char> = line_text(line).chars().collect();
    let mut cut = keep.min(chars.len());
    let floor = cut.saturating_sub(CUT_BACKOFF_CHARS);
    if let Some(pos) = (floor..cut).rev().find(|&i| chars[i] == '.') {
        cut = pos + 1;
    } else if let Some(pos) = (floor..cut).rev().find(|&i| chars[i].is_whitespace()) {
        cut = pos;
    }

    let mut out: Line = Vec::new();
    let mut left = cut;
    for span in line {
        if left == 0 {
            break;
        }
        let n = span.text.chars().count();
        if n <= left {
            out.push(span.clone());
            left -= n;
        } else {
            out.push(Span {
                text: span.text.chars().take(left).collect(),
                style: span.style.clone(),
            });
            left = 0;
        }
    }
    normalize_line(out)
}

fn push_span(line: &mut Line, text: &str, style: &Style) {
    if text.is_empty() {
        return;
    }
    match line.last_mut() {
        Some(last) if last.style == *style => last.text.push_str(text),
        _ => line.push(Span {
            text: text.to_string(),
            style: style.clone(),
        }),
    }
}

/// Collapse whitespace across span borders, trim the line, demote
/// whitespace-only spans to plain, merge equal neighbours.
fn normalize_line(line: Line) -> Line {
    let mut out: Line = Vec::with_capacity(line.len());
    let mut prev_space = true;
    for span in line {
        let mut text = String::with_capacity(span.text.len());
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !prev_space {
                    text.push(' ');
                }
                prev_space = true;
            } else {
                text.push(ch);
                prev_space = false;
            }
        }
        let style = if text.trim().is_empty() {
            Style::default()
        } else {
            span.style
        };
        push_span(&mut out, &text, &style);
    }

    while let Some(last) = out.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
        if last.text.is_empty() {
            out.pop();
        } else {
            break;
        }
    }
    out
}

#[derive(Default)]
struct Builder {
    lines: Vec<Line>,
    current: Line,
}

impl Builder {
    fn walk(&mut self, el: ElementRef<'_>, style: &Style) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, style),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.element(child_el, style);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>, style: &Style) {
        let name = el.value().name();
        match name {
            "br" => self.break_line(),
            _ if SKIPPED_TAGS.contains(&name) => {}
            _ if BLOCK_TAGS.contains(&name) => {
                self.break_line();
                self.walk(el, style);
                self.break_line();
            }
            _ => {
                let inner = inline_style(&el, style);
                self.walk(el, &inner);
            }
        }
    }

    fn push_text(&mut self, text: &str, style: &Style) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            push_span(&mut self.current, piece, style);
        }
    }

    fn break_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let line = normalize_line(std::mem::take(&mut self.current));
        if !line.is_empty() {
            self.lines.push(line);
        }
    }

    fn finish(mut self) -> StructuredText {
        self.break_line();
        StructuredText { lines: self.lines }
    }
}

fn inline_style(el: &ElementRef<'_>, parent: &Style) -> Style {
    let mut style = parent.clone();
    match el.value().name() {
        "b" | "strong" => style.bold = true,
        "i" | "em" => style.italic = true,
        // An inner link never overrides the outer one.
        "a" if style.link.is_none() => {
            style.link = el
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| is_linkable(href))
                .map(str::to_string);
        }
        _ => {}
    }
    style
}

fn is_linkable(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    LINK_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) && !href.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> Span {
        Span {
            text: text.into(),
            style: Style {
                bold: true,
                ..Style::default()
            },
        }
    }

    #[test]
    fn paragraphs_and_breaks_become_lines() {
        let st = StructuredText::parse("<p>One</p><p>Two<br>Three</p>");
        assert_eq!(st.to_plain_text(), "One\nTwo\nThree");
    }

    #[test]
    fn inline_styles_are_tracked() {
        let st = StructuredText::parse("<b>Hi</b> there <a href=\"https://x.io\">link</a>");
        assert_eq!(st.lines.len(), 1);
        let line = &st.lines[0];
        assert_eq!(line[0], bold("Hi"));
        assert_eq!(line[1], Span::plain(" there "));
        assert_eq!(line[2].style.link.as_deref(), Some("https://x.io"));
    }

    #[test]
    fn unclosed_tag_keeps_text() {
        let st = StructuredText::parse("<b>never closed <i>and nested");
        assert_eq!(st.to_plain_text(), "never closed and nested");
        assert!(st.lines[0].iter().all(|s| s.style.bold));
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        let st = StructuredText::parse("a < b and c > d");
        assert_eq!(st.to_plain_text(), "a < b and c > d");
    }

    #[test]
    fn whitespace_collapses_and_blank_lines_drop() {
        let st = StructuredText::parse("<p>  a \t  b </p><p>   </p>\n\n<div> c</div>");
        assert_eq!(st.to_plain_text(), "a b\nc");
    }

    #[test]
    fn scripts_are_dropped_and_unknown_tags_unwrapped() {
        let st = StructuredText::parse("<span>keep</span><script>drop()</script> <u>me</u>");
        assert_eq!(st.to_plain_text(), "keep me");
    }

    #[test]
    fn relative_and_script_links_are_unwrapped() {
        let st = StructuredText::parse("<a href=\"/rel\">a</a> <a href=\"javascript:x()\">b</a>");
        assert!(st.lines[0].iter().all(|s| s.style.link.is_none()));
    }

    #[test]
    fn whitespace_only_styled_span_is_plain() {
        let st = StructuredText::parse("a<b> </b>b");
        assert_eq!(st.lines[0], vec![Span::plain("a b")]);
    }

    #[test]
    fn truncation_backs_off_to_sentence_end() {
        let st = StructuredText::parse("First sentence. Second sentence runs long");
        let cut = st.truncated(25);
        assert_eq!(cut.to_plain_text(), format!("First sentence.{ELLIPSIS}"));
    }

    #[test]
    fn truncation_is_noop_when_short() {
        let st = StructuredText::parse("<p>a</p><p>b</p>");
        assert_eq!(st.char_count(), 3);
        assert_eq!(st.truncated(3), st);
    }
}
