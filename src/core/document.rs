//! Head injection for the browser variants.
//!
//! `options.baseUrl` and `options.css` have to land inside `<head>` so the
//! browser applies them before layout. Documents arrive in every shape, from
//! full pages to bare fragments, so the insertion point is searched for in
//! order of preference:
//!
//! 1. right before `</head>` (but not `</header>`)
//! 2. a fresh `<head>` right after the `<html ...>` open tag
//! 3. a fresh `<head>` right after `<!DOCTYPE ...>`
//! 4. a fresh `<head>` at the very start

use crate::domain::options::RenderOptions;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head[\s>]").expect("static regex"));

/// Trimmed text of the first `<title>`, if it has any.
pub fn document_title(html: &str) -> Option<String> {
    title_of(&Html::parse_document(html))
}

pub fn title_of(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

pub fn prepare_html(html: &str, options: &RenderOptions) -> String {
    let injection = head_injection(options);
    if injection.is_empty() {
        return html.to_string();
    }

    if let Some(found) = HEAD_CLOSE.find(html) {
        let pos = found.start();
        tracing::debug!(position = pos, "Injecting into existing <head>");
        return splice(html, pos, &injection);
    }

    // ASCII lowercasing keeps byte offsets intact.
    let lower = html.to_ascii_lowercase();
    let wrapped = format!("<head>{}</head>", injection);
    let pos = after_open_tag(&lower, "<html")
        .or_else(|| after_open_tag(&lower, "<!doctype"))
        .unwrap_or(0);
    tracing::debug!(position = pos, "Document has no <head>; inserting one");
    splice(html, pos, &wrapped)
}

fn head_injection(options: &RenderOptions) -> String {
    let mut out = String::new();
    if let Some(base) = &options.base_url {
        out.push_str(&format!("<base href=\"{}\">", escape_attribute(base)));
    }
    if let Some(css) = options.css.as_deref().filter(|css| !css.trim().is_empty()) {
        out.push_str("<style>");
        out.push_str(&escape_style(css));
        out.push_str("</style>");
    }
    out
}

fn after_open_tag(lower: &str, tag: &str) -> Option<usize> {
    let start = lower.find(tag)?;
    lower[start..].find('>').map(|end| start + end + 1)
}

fn splice(html: &str, pos: usize, insert: &str) -> String {
    let mut out = String::with_capacity(html.len() + insert.len());
    out.push_str(&html[..pos]);
    out.push_str(insert);
    out.push_str(&html[pos..]);
    out
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Keeps user CSS from closing the `<style>` element early.
fn escape_style(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let lower = css.to_ascii_lowercase();
    let mut last = 0;
    for (idx, _) in lower.match_indices("</style") {
        out.push_str(&css[last..idx]);
        out.push_str("<\\/style");
        last = idx + "</style".len();
    }
    out.push_str(&css[last..]);
    out
}
