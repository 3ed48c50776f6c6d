//! Browser-free rendering: HTML is reduced to text blocks and typeset
//! directly with the standard PDF fonts.

pub mod blocks;
pub mod metrics;
pub mod paginate;

use self::blocks::extract_blocks;
use self::metrics::Font;
use self::paginate::{paginate, Mark, Page, PageGeometry};
use crate::core::document::title_of;
use crate::core::pdf::PdfBuilder;
use crate::domain::model::{RenderJob, RenderedDocument};
use crate::domain::options::{Length, RenderOptions};
use crate::domain::ports::Renderer;
use crate::utils::error::Result;
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, StringFormat};
use scraper::Html;

const DEFAULT_FILENAME: &str = "document.pdf";
const DEFAULT_MARGIN_PT: f64 = 50.0;
const RULE_GRAY: f32 = 0.6;
const RULE_WIDTH: f32 = 0.75;

pub struct LayoutRenderer {
    /// Body size when the request does not set `fontSize`.
    font_size: f32,
}

impl LayoutRenderer {
    pub fn new(font_size: f32) -> Self {
        Self { font_size }
    }

    pub fn render_pdf(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let document = Html::parse_document(html);
        let title = title_of(&document);
        let blocks = extract_blocks(&document);

        let body_size = options.font_size.unwrap_or(self.font_size);
        let geometry = geometry(options);
        let pages = paginate(&blocks, geometry, body_size);
        tracing::debug!(
            blocks = blocks.len(),
            pages = pages.len(),
            "Text layout finished"
        );

        let mut builder = PdfBuilder::new();
        let fonts = font_dictionary(&mut builder);
        for page in &pages {
            let resources = dictionary! { "Font" => fonts.clone() };
            builder.add_page(geometry.width, geometry.height, resources, page_content(page))?;
        }
        builder.finish(title.as_deref(), chrono::Utc::now())
    }
}

#[async_trait]
impl Renderer for LayoutRenderer {
    fn name(&self) -> &'static str {
        "layout"
    }

    async fn render(&self, job: &RenderJob) -> Result<RenderedDocument> {
        let pdf = self.render_pdf(&job.html, &job.options)?;
        Ok(RenderedDocument::pdf(
            pdf,
            job.options.filename_or(DEFAULT_FILENAME),
        ))
    }
}

fn geometry(options: &RenderOptions) -> PageGeometry {
    let (width, height) = options.page_size();
    let margins = options.margins_or(Length::from_points(DEFAULT_MARGIN_PT));
    PageGeometry {
        width: width.points() as f32,
        height: height.points() as f32,
        top: margins.top.points() as f32,
        right: margins.right.points() as f32,
        bottom: margins.bottom.points() as f32,
        left: margins.left.points() as f32,
    }
}

/// One shared Type 1 font object per face, referenced from every page.
fn font_dictionary(builder: &mut PdfBuilder) -> Dictionary {
    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let id = builder.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), id);
    }
    fonts
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::new();
    for mark in &page.marks {
        match mark {
            Mark::Text {
                font,
                size,
                x,
                y,
                text,
            } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), (*size).into()],
                ));
                operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(text.clone(), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            Mark::Rule { x1, x2, y } => {
                operations.extend([
                    Operation::new("q", vec![]),
                    Operation::new("G", vec![RULE_GRAY.into()]),
                    Operation::new("w", vec![RULE_WIDTH.into()]),
                    Operation::new("m", vec![(*x1).into(), (*y).into()]),
                    Operation::new("l", vec![(*x2).into(), (*y).into()]),
                    Operation::new("S", vec![]),
                    Operation::new("Q", vec![]),
                ]);
            }
        }
    }
    Content { operations }
}
