// src/format/markdown.rs
//! Telegram MarkdownV2 emission.
//!
//! Two escaping rules apply: ordinary text escapes every reserved character,
//! while a link target inside `(...)` only escapes `)` and `\`.

use super::html::{Span, Style, StructuredText};

/// `parse_mode` value for the Bot API.
pub const PARSE_MODE: &str = "MarkdownV2";

pub const RESERVED_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

const LINK_TARGET_RESERVED: &[char] = &[')', '\\'];

pub fn escape_text(s: &str) -> String {
    escape_with(s, RESERVED_CHARS)
}

pub fn escape_link_target(url: &str) -> String {
    escape_with(url, LINK_TARGET_RESERVED)
}

fn escape_with(s: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        if reserved.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `*text*` around plain text.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape_text(text))
}

/// `[label](url)` around plain label text.
pub fn link(label: &str, url: &str) -> String {
    format!("[{}]({})", escape_text(label), escape_link_target(url))
}

/// Markup opened around a span, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mark {
    Bold,
    Italic,
    Link(String),
}

fn marks(style: &Style) -> Vec<Mark> {
    let mut out = Vec::with_capacity(3);
    if style.bold {
        out.push(Mark::Bold);
    }
    if style.italic {
        out.push(Mark::Italic);
    }
    if let Some(url) = &style.link {
        out.push(Mark::Link(url.clone()));
    }
    out
}

fn open(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Bold => out.push('*'),
        Mark::Italic => out.push('_'),
        Mark::Link(_) => out.push('['),
    }
}

fn close(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Bold => out.push('*'),
        Mark::Italic => out.push('_'),
        Mark::Link(url) => {
            out.push_str("](");
            out.push_str(&escape_link_target(url));
            out.push(')');
        }
    }
}

/// Render one line. Marks are kept as a stack so that consecutive spans
/// sharing a style stay inside one entity, and everything is closed at the
/// end of the line.
pub fn render_line(line: &[Span]) -> String {
    let mut out = String::new();
    let mut stack: Vec<Mark> = Vec::new();
    for span in line {
        let wanted = marks(&span.style);
        let shared = stack
            .iter()
            .zip(&wanted)
            .take_while(|(a, b)| a == b)
            .count();
        while stack.len() > shared {
            if let Some(mark) = stack.pop() {
                close(&mut out, &mark);
            }
        }
        for mark in &wanted[shared..] {
            open(&mut out, mark);
            stack.push(mark.clone());
        }
        out.push_str(&escape_text(&span.text));
    }
    while let Some(mark) = stack.pop() {
        close(&mut out, &mark);
    }
    out
}

pub fn render(text: &StructuredText) -> String {
    text.lines
        .iter()
        .map(|line| render_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}
