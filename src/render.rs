//! HTML rendering of committed turns.
//!
//! Sources are numbered from 1 in the order they were handed to the summarizer, and
//! each list item carries `id="source-i"` so the `[i]` markers the model writes link
//! back to it. Rendering only reads the stored turn.

use crate::models::{SearchResult, Turn};

/// Element id of the `index`-th (1-based) source.
pub fn source_anchor_id(index: usize) -> String {
    format!("source-{}", index)
}

/// Inline citation the model is asked to emit for the `index`-th (1-based) source.
pub fn citation_marker(index: usize) -> String {
    format!(
        "<sup><strong><a href=\"#{}\">[{}]</a></strong></sup>",
        source_anchor_id(index),
        index
    )
}

pub fn render_sources(sources: &[SearchResult]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let items = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let index = i + 1;
            let summary = if source.summary.is_empty() {
                String::new()
            } else {
                format!("<div class=\"source-summary\">{}</div>", escape_html(&source.summary))
            };
            format!(
                "<li id=\"{}\"><span>[{}]</span> <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>{}</li>",
                source_anchor_id(index),
                index,
                escape_html(&source.url),
                escape_html(&source.title),
                summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("<h3>Sources</h3>\n<ul>\n{}\n</ul>", items)
}

/// The answer is model-produced HTML and is embedded as is.
pub fn render_turn(turn: &Turn) -> String {
    let sources = render_sources(&turn.sources);
    format!(
        "<section class=\"turn\">\n<div class=\"question\">Q: {}</div>\n<div class=\"answer\">{}</div>\n{}\n</section>",
        escape_html(&turn.question),
        turn.answer,
        sources
    )
}

/// Newest turn first, the way the conversation is displayed.
pub fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .rev()
        .map(render_turn)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
