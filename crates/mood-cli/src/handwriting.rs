//! Handwritten page reading
//!
//! The recognition model reads one line at a time, so a page is cut into
//! equal horizontal strips, each strip is recognized on its own, and the
//! results are joined with spaces.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

use mood_core::{Error, Result, TextExtractor};

/// Strip count used for uploaded pages
pub const PAGE_SECTIONS: u32 = 26;

/// Strips larger than this are scaled down, keeping their aspect ratio
const MAX_SECTION_WIDTH: u32 = 512;
const MAX_SECTION_HEIGHT: u32 = 64;

/// Cuts a page into strips and runs each through a text extractor
#[derive(Debug, Clone, Copy)]
pub struct HandwritingReader {
    sections: u32,
}

impl HandwritingReader {
    pub fn new(sections: u32) -> Self {
        Self {
            sections: sections.max(1),
        }
    }

    /// Read a whole image as a single line
    pub fn single_line() -> Self {
        Self::new(1)
    }

    pub fn page() -> Self {
        Self::new(PAGE_SECTIONS)
    }

    pub fn sections(&self) -> u32 {
        self.sections
    }

    /// Extract the text of an encoded image
    pub async fn read<E: TextExtractor + ?Sized>(&self, extractor: &E, image: &[u8]) -> Result<String> {
        if self.sections == 1 {
            return extractor.extract_text(image).await;
        }

        let strips = split_into_lines(image, self.sections)?;
        let mut lines = Vec::with_capacity(strips.len());
        for (index, strip) in strips.iter().enumerate() {
            let text = extractor.extract_text(strip).await?;
            debug!(section = index, text = %text, "recognized section");
            lines.push(text);
        }

        Ok(lines.join(" "))
    }
}

impl Default for HandwritingReader {
    fn default() -> Self {
        Self::page()
    }
}

/// Cut an encoded image into `sections` equal-height strips, re-encoded as PNG.
///
/// Leftover rows at the bottom are dropped. Images shorter than `sections`
/// rows are returned as a single strip.
pub fn split_into_lines(image: &[u8], sections: u32) -> Result<Vec<Vec<u8>>> {
    let page = image::load_from_memory(image)
        .map_err(|e| Error::InvalidInput(format!("Could not decode image: {}", e)))?;
    let page = DynamicImage::ImageRgb8(page.to_rgb8());

    let (width, height) = (page.width(), page.height());
    let sections = sections.max(1);
    if height < sections {
        return Ok(vec![encode_png(&shrink(page))?]);
    }

    let section_height = height / sections;
    (0..sections)
        .map(|index| {
            let strip = page.crop_imm(0, index * section_height, width, section_height);
            encode_png(&shrink(strip))
        })
        .collect()
}

/// Scale down to fit the strip bounds; never enlarges
fn shrink(image: DynamicImage) -> DynamicImage {
    if image.width() <= MAX_SECTION_WIDTH && image.height() <= MAX_SECTION_HEIGHT {
        return image;
    }
    image.resize(MAX_SECTION_WIDTH, MAX_SECTION_HEIGHT, FilterType::Lanczos3)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::Other(format!("Could not encode image section: {}", e)))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 128]));
        encode_png(&DynamicImage::ImageRgb8(image)).unwrap()
    }

    struct CountingExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextExtractor for CountingExtractor {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn extract_text(&self, image: &[u8]) -> Result<String> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            let decoded = image::load_from_memory(image).unwrap();
            Ok(format!("line{}:{}x{}", index, decoded.width(), decoded.height()))
        }

        fn model_id(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_split_into_equal_strips() {
        let strips = split_into_lines(&png(10, 53), 26).unwrap();

        assert_eq!(strips.len(), 26);
        for strip in &strips {
            let decoded = image::load_from_memory(strip).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (10, 2));
        }
    }

    #[test]
    fn test_short_image_is_one_strip() {
        let strips = split_into_lines(&png(8, 5), 26).unwrap();
        assert_eq!(strips.len(), 1);
    }

    #[test]
    fn test_wide_strips_are_shrunk() {
        let strips = split_into_lines(&png(1024, 20), 2).unwrap();
        let decoded = image::load_from_memory(&strips[0]).unwrap();

        assert_eq!(decoded.width(), 512);
        assert_eq!(decoded.height(), 5);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            split_into_lines(b"definitely not an image", 26),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_page_text_is_joined() {
        let extractor = CountingExtractor {
            calls: AtomicUsize::new(0),
        };
        let text = HandwritingReader::new(3).read(&extractor, &png(4, 9)).await.unwrap();

        assert_eq!(text, "line0:4x3 line1:4x3 line2:4x3");
    }

    #[tokio::test]
    async fn test_single_line_passes_image_through() {
        let extractor = CountingExtractor {
            calls: AtomicUsize::new(0),
        };
        let text = HandwritingReader::single_line()
            .read(&extractor, &png(600, 80))
            .await
            .unwrap();

        assert_eq!(text, "line0:600x80");
    }
}
