//! Single-page PDF canvas on top of `lopdf`.
//!
//! Callers place things in points from the top-left corner; the canvas
//! flips y into PDF space.
//! Text is set in the standard Type1 Helvetica with `/WinAnsiEncoding`.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, StringFormat, Stream};
use thiserror::Error;

use crate::layout::font_metrics::{FontMetricTable, PageConfig, SizedFont, TextMeasure};
use crate::render::header_image::HeaderImage;

const FONT_RESOURCE: &str = "F1";
const IMAGE_RESOURCE: &str = "Im1";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF library error: {0}")]
    PdfLib(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for RenderError {
    fn from(e: lopdf::Error) -> Self {
        RenderError::PdfLib(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Accumulates drawing operations for one page, then serializes a document.
pub struct PdfCanvas {
    page: PageConfig,
    font: &'static FontMetricTable,
    operations: Vec<Operation>,
    image: Option<(u32, u32, Vec<u8>)>,
}

impl PdfCanvas {
    pub fn new(page: PageConfig, font: &'static FontMetricTable) -> Self {
        Self {
            page,
            font,
            operations: Vec::new(),
            image: None,
        }
    }

    pub fn font_at(&self, size_pt: f32) -> SizedFont {
        self.font.at_size(size_pt)
    }

    /// Draws `text` with its baseline at `y` (from the top). `x` is the left
    /// edge, the centre, or the right edge depending on `align`.
    pub fn text(&mut self, text: &str, x: f32, y: f32, size_pt: f32, align: Align) {
        if text.is_empty() {
            return;
        }
        let width = self.font_at(size_pt).measure(text);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        let pdf_y = self.page.height_pt - y;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), size_pt.into()]),
            Operation::new("Td", vec![left.into(), pdf_y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Places the image with its top-left corner at (`x`, `y`), scaled to the given box.
    /// Only one image per page is supported; a second call replaces the first.
    pub fn image(&mut self, image: &HeaderImage, x: f32, y: f32, width: f32, height: f32) {
        self.image = Some((image.width, image.height, image.data.clone()));
        let pdf_y = self.page.height_pt - y - height;
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    x.into(),
                    pdf_y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Builds the document and returns the serialized PDF bytes.
    pub fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.font.base_font,
            "Encoding" => "WinAnsiEncoding",
        });

        let mut resources = dictionary! {
            "Font" => dictionary! { FONT_RESOURCE => font_id },
        };
        if let Some((width, height, data)) = self.image {
            let image_stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                data,
            );
            let image_id = doc.add_object(image_stream);
            resources.set("XObject", dictionary! { IMAGE_RESOURCE => image_id });
        }
        let resources_id = doc.add_object(resources);

        let content = Content {
            operations: self.operations,
        };
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&content.encode()?)?;
        let compressed = encoder.finish()?;
        let content_id = doc.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            compressed,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                self.page.width_pt.into(),
                self.page.height_pt.into(),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        Ok(out)
    }
}

/// Encodes text for a `/WinAnsiEncoding` font.
///
/// Latin-1 (which covers Portuguese) maps byte-for-byte; anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
