//! Flattens an HTML body into a list of styled text blocks.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

const SKIPPED: [&str; 5] = ["script", "style", "head", "template", "noscript"];

/// Elements that end the running paragraph without styling their content.
const CONTAINERS: [&str; 20] = [
    "div", "section", "article", "header", "footer", "main", "nav", "aside", "ul", "ol",
    "table", "thead", "tbody", "tfoot", "tr", "figure", "form", "dl", "dt", "dd",
];

const LIST_INDENT: f32 = 18.0;
const QUOTE_INDENT: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `h1`..`h6`
    Heading(u8),
    Body,
    Strong,
    Code,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text {
        style: BlockStyle,
        /// Left indent in points.
        indent: f32,
        /// Hard lines; `<br>` and `pre` newlines split them.
        lines: Vec<String>,
    },
    Rule,
}

#[derive(Debug, Clone, Copy)]
struct Context {
    style: BlockStyle,
    indent: f32,
    preformatted: bool,
}

enum List {
    Bullets,
    Numbered(u32),
}

struct Walker {
    blocks: Vec<Block>,
    buffer: String,
    lists: Vec<List>,
    /// List marker waiting for the first non-empty block inside its `li`.
    pending_marker: Option<String>,
}

pub fn extract_blocks(document: &Html) -> Vec<Block> {
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut walker = Walker {
        blocks: Vec::new(),
        buffer: String::new(),
        lists: Vec::new(),
        pending_marker: None,
    };
    let context = Context {
        style: BlockStyle::Body,
        indent: 0.0,
        preformatted: false,
    };
    walker.children(root, context);
    walker.flush(context);
    walker.blocks
}

impl Walker {
    fn children(&mut self, element: ElementRef<'_>, context: Context) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text, context),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child, context);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>, outer: Context) {
        let name = element.value().name();
        if SKIPPED.contains(&name) {
            return;
        }

        let inner = match name {
            "br" => {
                self.buffer.push('\n');
                return;
            }
            "hr" => {
                self.flush(outer);
                self.blocks.push(Block::Rule);
                return;
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Context {
                style: BlockStyle::Heading(name.as_bytes()[1] - b'0'),
                ..outer
            },
            "p" | "td" => Context {
                style: BlockStyle::Body,
                ..outer
            },
            "th" => Context {
                style: BlockStyle::Strong,
                ..outer
            },
            "li" => Context {
                style: BlockStyle::Body,
                indent: outer.indent + LIST_INDENT,
                ..outer
            },
            "blockquote" => Context {
                indent: outer.indent + QUOTE_INDENT,
                ..outer
            },
            "pre" => Context {
                style: BlockStyle::Code,
                preformatted: true,
                ..outer
            },
            "ul" | "ol" => {
                self.flush(outer);
                self.lists.push(if name == "ol" {
                    List::Numbered(start_number(element))
                } else {
                    List::Bullets
                });
                self.children(element, outer);
                self.flush(outer);
                self.lists.pop();
                return;
            }
            _ if CONTAINERS.contains(&name) => {
                self.flush(outer);
                self.children(element, outer);
                self.flush(outer);
                return;
            }
            // inline
            _ => {
                self.children(element, outer);
                return;
            }
        };

        self.flush(outer);
        if name == "li" {
            self.pending_marker = Some(self.next_marker());
        }
        self.children(element, inner);
        self.flush(inner);
        if name == "li" {
            self.pending_marker = None;
        }
    }

    fn next_marker(&mut self) -> String {
        match self.lists.last_mut() {
            Some(List::Numbered(n)) => {
                let marker = format!("{}. ", n);
                *n = n.saturating_add(1);
                marker
            }
            Some(List::Bullets) | None => "\u{2022} ".to_string(),
        }
    }

    fn text(&mut self, text: &str, context: Context) {
        if context.preformatted {
            self.buffer.push_str(text);
        } else {
            self.buffer
                .extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
        }
    }

    fn flush(&mut self, context: Context) {
        let raw = std::mem::take(&mut self.buffer);
        let mut lines = if context.preformatted {
            preformatted_lines(&raw)
        } else {
            collapsed_lines(&raw)
        };
        if lines.is_empty() {
            return;
        }
        if let Some(marker) = self.pending_marker.take() {
            lines[0].insert_str(0, &marker);
        }
        self.blocks.push(Block::Text {
            style: context.style,
            indent: context.indent,
            lines,
        });
    }
}

fn start_number(element: ElementRef<'_>) -> u32 {
    element
        .value()
        .attr("start")
        .and_then(|start| start.trim().parse().ok())
        .unwrap_or(1)
}

/// Collapses whitespace runs; only the `\n`s inserted for `<br>` survive.
fn collapsed_lines(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    trim_blank_edges(&mut lines);
    lines
}

fn preformatted_lines(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    // A newline right after `<pre>` is not content.
    let raw = raw.strip_prefix('\n').unwrap_or(raw);
    let mut lines: Vec<String> = raw
        .lines()
        .map(|line| line.replace('\t', "    ").trim_end().to_string())
        .collect();
    trim_blank_edges(&mut lines);
    lines
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| line.is_empty()).count();
    lines.drain(..leading);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(html: &str) -> Vec<Block> {
        extract_blocks(&Html::parse_document(html))
    }

    fn text(style: BlockStyle, indent: f32, lines: &[&str]) -> Block {
        Block::Text {
            style,
            indent,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let result = blocks(
            "<html><head><title>T</title><style>p{}</style></head>\
             <body><h1>Title</h1><p>First   para\n graph</p><h3>Sub</h3></body></html>",
        );
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Heading(1), 0.0, &["Title"]),
                text(BlockStyle::Body, 0.0, &["First para graph"]),
                text(BlockStyle::Heading(3), 0.0, &["Sub"]),
            ]
        );
    }

    #[test]
    fn test_loose_text_becomes_paragraphs() {
        let result = blocks("before <b>bold</b> after<div>inside</div>tail");
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Body, 0.0, &["before bold after"]),
                text(BlockStyle::Body, 0.0, &["inside"]),
                text(BlockStyle::Body, 0.0, &["tail"]),
            ]
        );
    }

    #[test]
    fn test_skipped_elements() {
        let result = blocks(
            "<p>keep</p><script>var x = 1;</script><noscript>no</noscript>\
             <template><p>hidden</p></template>",
        );
        assert_eq!(result, vec![text(BlockStyle::Body, 0.0, &["keep"])]);
    }

    #[test]
    fn test_lists_get_markers_and_indent() {
        let result = blocks(
            "<ul><li>one</li><li>two<ol start=\"3\"><li>inner</li><li>next</li></ol></li></ul>",
        );
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Body, 18.0, &["\u{2022} one"]),
                text(BlockStyle::Body, 18.0, &["\u{2022} two"]),
                text(BlockStyle::Body, 36.0, &["3. inner"]),
                text(BlockStyle::Body, 36.0, &["4. next"]),
            ]
        );
    }

    #[test]
    fn test_marker_joins_nested_block() {
        let result = blocks(
            "<ul>\n  <li>\n    <p>item</p>\n    <p>more</p>\n  </li>\n  <li><h3>Heading item</h3></li>\n</ul>",
        );
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Body, 18.0, &["\u{2022} item"]),
                text(BlockStyle::Body, 18.0, &["more"]),
                text(BlockStyle::Heading(3), 18.0, &["\u{2022} Heading item"]),
            ]
        );
    }

    #[test]
    fn test_ordered_list_start_at_u32_max() {
        let result = blocks("<ol start=\"4294967295\"><li>a</li><li>b</li></ol>");
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Body, 18.0, &["4294967295. a"]),
                text(BlockStyle::Body, 18.0, &["4294967295. b"]),
            ]
        );
    }

    #[test]
    fn test_line_breaks_and_rules() {
        let result = blocks("<p>a<br>b<br><br>c</p><hr><blockquote>quoted</blockquote>");
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Body, 0.0, &["a", "b", "", "c"]),
                Block::Rule,
                text(BlockStyle::Body, 24.0, &["quoted"]),
            ]
        );
    }

    #[test]
    fn test_preformatted_keeps_whitespace() {
        let result = blocks("<pre>\nfn main() {\n    run();\n}\n</pre>");
        assert_eq!(
            result,
            vec![text(
                BlockStyle::Code,
                0.0,
                &["fn main() {", "    run();", "}"]
            )]
        );
    }

    #[test]
    fn test_table_cells() {
        let result = blocks("<table><tr><th>Name</th><td>Value</td></tr></table>");
        assert_eq!(
            result,
            vec![
                text(BlockStyle::Strong, 0.0, &["Name"]),
                text(BlockStyle::Body, 0.0, &["Value"]),
            ]
        );
    }

    #[test]
    fn test_empty_body() {
        assert!(blocks("<html><body>  </body></html>").is_empty());
    }
}
