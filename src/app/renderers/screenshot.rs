//! Screenshot-to-PDF: capture the whole page as one PNG, then slice it into
//! page-sized image XObjects.

use crate::adapters::browser::{with_session, BrowserSettings, LaunchProfile};
use crate::core::document::{document_title, prepare_html};
use crate::core::pdf::PdfBuilder;
use crate::domain::model::{RenderJob, RenderedDocument};
use crate::domain::options::{Length, RenderOptions};
use crate::domain::ports::Renderer;
use crate::utils::error::{PdfError, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{imageops, ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Stream};
use std::io::Write;

/// A4 at 96 dpi.
pub const VIEWPORT_WIDTH: u32 = 794;
pub const VIEWPORT_HEIGHT: u32 = 1123;
const DEFAULT_DEVICE_SCALE_FACTOR: f64 = 1.5;
const DEFAULT_FILENAME: &str = "document.pdf";
const DEFAULT_MARGIN_MM: f64 = 10.0;

pub struct ScreenshotRenderer {
    settings: BrowserSettings,
}

impl ScreenshotRenderer {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Renderer for ScreenshotRenderer {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    async fn render(&self, job: &RenderJob) -> Result<RenderedDocument> {
        let html = prepare_html(&job.html, &job.options);
        let viewport = Viewport {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            device_scale_factor: Some(
                job.options
                    .device_scale_factor
                    .unwrap_or(DEFAULT_DEVICE_SCALE_FACTOR),
            ),
            ..Default::default()
        };

        let png = with_session(
            &self.settings,
            LaunchProfile::Standard,
            Some(viewport),
            &html,
            |page| async move {
                let params = ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build();
                Ok(page.screenshot(params).await?)
            },
        )
        .await?;
        tracing::debug!(bytes = png.len(), "Full-page screenshot captured");

        let title = document_title(&job.html);
        let pdf = paginate_screenshot(&png, &job.options, title.as_deref())?;
        Ok(RenderedDocument::pdf(
            pdf,
            job.options.filename_or(DEFAULT_FILENAME),
        ))
    }
}

/// Lays a PNG out over as many pages as it needs. The image is scaled to the
/// printable width; each page shows the next printable-height slice.
pub fn paginate_screenshot(
    png: &[u8],
    options: &RenderOptions,
    title: Option<&str>,
) -> Result<Vec<u8>> {
    let image = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgb8();
    let (image_width, image_height) = image.dimensions();
    if image_width == 0 || image_height == 0 {
        return Err(PdfError::Layout {
            message: "screenshot is empty".to_string(),
        });
    }

    let (page_width, page_height) = options.page_size();
    let margins = options.margins_or(Length::from_mm(DEFAULT_MARGIN_MM));
    let (page_width, page_height) = (page_width.points(), page_height.points());
    let printable_width = page_width - margins.left.points() - margins.right.points();
    let printable_height = page_height - margins.top.points() - margins.bottom.points();

    // Points per screenshot pixel.
    let scale = printable_width / image_width as f64;
    let slice_pixels = ((printable_height / scale).floor() as u32).max(1);
    let page_count = image_height.div_ceil(slice_pixels);

    let mut builder = PdfBuilder::new();
    for index in 0..page_count {
        let top = index * slice_pixels;
        let height = slice_pixels.min(image_height - top);
        let slice = imageops::crop_imm(&image, 0, top, image_width, height).to_image();
        let image_id = builder.add_object(image_xobject(&slice)?);

        let drawn_height = height as f64 * scale;
        let x = margins.left.points();
        let y = page_height - margins.top.points() - drawn_height;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        (printable_width as f32).into(),
                        0.into(),
                        0.into(),
                        (drawn_height as f32).into(),
                        (x as f32).into(),
                        (y as f32).into(),
                    ],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let resources = dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        };
        builder.add_page(page_width as f32, page_height as f32, resources, content)?;
    }

    tracing::debug!(
        pages = page_count,
        image_width,
        image_height,
        "Screenshot paginated"
    );
    builder.finish(title, chrono::Utc::now())
}

fn image_xobject(slice: &RgbImage) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(slice.as_raw())?;
    let data = encoder.finish()?;

    let dict: Dictionary = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => slice.width() as i64,
        "Height" => slice.height() as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    Ok(Stream::new(dict, data).with_compression(false))
}
