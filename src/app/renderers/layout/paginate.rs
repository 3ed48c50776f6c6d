use super::blocks::{Block, BlockStyle};
use super::metrics::{encode_win_ansi, Font};

pub const LINE_HEIGHT: f32 = 1.4;
pub const BLOCK_SPACING: f32 = 0.6;
const HEADING_SIZES: [f32; 6] = [24.0, 20.0, 16.0, 14.0, 13.0, 12.0];

/// Page size and margins, all in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl PageGeometry {
    fn content_width(&self) -> f32 {
        self.width - self.left - self.right
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Text {
        font: Font,
        size: f32,
        x: f32,
        /// Baseline.
        y: f32,
        text: Vec<u8>,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub marks: Vec<Mark>,
}

pub fn style_font(style: BlockStyle, body_size: f32) -> (Font, f32) {
    match style {
        BlockStyle::Heading(level) => {
            let index = (level.clamp(1, 6) - 1) as usize;
            (Font::Bold, HEADING_SIZES[index])
        }
        BlockStyle::Body => (Font::Regular, body_size),
        BlockStyle::Strong => (Font::Bold, body_size),
        BlockStyle::Code => (Font::Mono, body_size),
    }
}

struct Cursor {
    geometry: PageGeometry,
    pages: Vec<Page>,
    /// Top of the next line.
    y: f32,
}

impl Cursor {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.height - geometry.top,
        }
    }

    /// Moves to a fresh page when `height` does not fit above the bottom
    /// margin. An empty page always accepts.
    fn reserve(&mut self, height: f32) {
        if self.y - height < self.geometry.bottom && !self.page_is_empty() {
            self.pages.push(Page::default());
            self.y = self.geometry.height - self.geometry.top;
        }
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().is_none_or(|page| page.marks.is_empty())
    }

    fn push(&mut self, mark: Mark) {
        if let Some(page) = self.pages.last_mut() {
            page.marks.push(mark);
        }
    }
}

/// Greedy line filling, one block after another, breaking pages when the
/// next line would cross the bottom margin. Always yields at least one page.
pub fn paginate(blocks: &[Block], geometry: PageGeometry, body_size: f32) -> Vec<Page> {
    let mut cursor = Cursor::new(geometry);

    for block in blocks {
        match block {
            Block::Rule => {
                let height = body_size;
                cursor.reserve(height);
                let y = cursor.y - height / 2.0;
                cursor.push(Mark::Rule {
                    x1: geometry.left,
                    x2: geometry.width - geometry.right,
                    y,
                });
                cursor.y -= height + body_size * BLOCK_SPACING;
            }
            Block::Text {
                style,
                indent,
                lines,
            } => {
                let (font, size) = style_font(*style, body_size);
                let line_height = size * LINE_HEIGHT;
                let available = (geometry.content_width() - indent).max(size);
                let x = geometry.left + indent;

                for line in lines {
                    let encoded = encode_win_ansi(line);
                    let wrapped = if *style == BlockStyle::Code {
                        wrap_chars(&encoded, font, size, available)
                    } else {
                        wrap_words(&encoded, font, size, available)
                    };
                    for text in wrapped {
                        // Blank lines are dropped at the top of a page.
                        if text.is_empty() && cursor.page_is_empty() {
                            continue;
                        }
                        cursor.reserve(line_height);
                        let baseline = cursor.y - size;
                        cursor.y -= line_height;
                        if !text.is_empty() {
                            cursor.push(Mark::Text {
                                font,
                                size,
                                x,
                                y: baseline,
                                text,
                            });
                        }
                    }
                }
                cursor.y -= size * BLOCK_SPACING;
            }
        }
    }

    cursor.pages
}

/// Splits on spaces; a word wider than the line is broken by characters.
pub fn wrap_words(text: &[u8], font: Font, size: f32, width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for word in text.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
        let mut candidate = current.clone();
        if !candidate.is_empty() {
            candidate.push(b' ');
        }
        candidate.extend_from_slice(word);

        if font.text_width(&candidate, size) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if font.text_width(word, size) <= width {
            current = word.to_vec();
        } else {
            let mut pieces = wrap_chars(word, font, size, width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Breaks wherever the next character would overflow, keeping spaces.
pub fn wrap_chars(text: &[u8], font: Font, size: f32, width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut current_width = 0.0;

    for &byte in text {
        let glyph = font.glyph_width(byte) as f32 * size / 1000.0;
        if current_width + glyph > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        current.push(byte);
        current_width += glyph;
    }
    lines.push(current);
    lines
}
