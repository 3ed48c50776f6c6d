//! Minimal PDF document assembly on top of `lopdf`: a page tree, per-page
//! resources and content, and the Info dictionary.

use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub const PRODUCER: &str = concat!("pdf-endpoints ", env!("CARGO_PKG_VERSION"));

pub struct PdfBuilder {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        // Reserved now, written in `finish` once every kid is known.
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        self.document.add_object(object)
    }

    pub fn add_page(
        &mut self,
        width: f32,
        height: f32,
        resources: Dictionary,
        content: Content,
    ) -> Result<ObjectId> {
        let content_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), content.encode()?));
        let resources_id = self.document.add_object(resources);
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        self.page_ids.push(page_id);
        Ok(page_id)
    }

    pub fn finish(mut self, title: Option<&str>, created: DateTime<Utc>) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.page_ids.iter().copied().map(Object::Reference).collect();
        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });

        let mut info = dictionary! {
            "Producer" => text_string(PRODUCER),
            "CreationDate" => Object::String(
                created.format("D:%Y%m%d%H%M%SZ").to_string().into_bytes(),
                StringFormat::Literal,
            ),
        };
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            info.set("Title", text_string(title));
        }
        let info_id = self.document.add_object(info);

        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

/// PDF text string: plain bytes for ASCII, UTF-16BE with BOM otherwise.
pub fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
