//! Image anchoring
//!
//! Images are one-cell anchored: top-left corner on the target cell with
//! zero offset, extent from the declared pixel size. Existing drawings on
//! the sheet are left alone.

use tracing::debug;
use umya_spreadsheet::structs::drawing::spreadsheet::MarkerType;
use umya_spreadsheet::structs::Image;
use umya_spreadsheet::Worksheet;

use crate::domain::{CellRef, ImagePayload, ImageSize};

/// Where and how large an image is placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnchor {
    pub sheet: String,
    pub cell: CellRef,
    pub size: ImageSize,
}

impl ImageAnchor {
    pub fn new(sheet: impl Into<String>, cell: CellRef, size: ImageSize) -> Self {
        Self {
            sheet: sheet.into(),
            cell,
            size,
        }
    }

    /// Copies the payload bytes into the sheet's media and anchors them
    pub fn attach(&self, sheet: &mut Worksheet, payload: &ImagePayload) {
        let mut marker = MarkerType::default();
        marker.set_coordinate(self.cell.to_string());

        let mut image = Image::default();
        image.new_image_with_dimensions(
            self.size.height,
            self.size.width,
            &payload.media_name(),
            payload.bytes().to_vec(),
            marker,
        );
        sheet.add_image(image);

        debug!(
            sheet = %self.sheet,
            cell = %self.cell,
            width = self.size.width,
            height = self.size.height,
            "image anchored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TINY_PNG;

    #[test]
    fn attach_adds_image_at_cell() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        let payload = ImagePayload::new(TINY_PNG.to_vec(), ImageSize::new(80, 60)).unwrap();

        ImageAnchor::new("Sheet1", "C4".parse().unwrap(), payload.size()).attach(sheet, &payload);

        let images = sheet.get_image_collection();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].get_coordinate(), "C4");
    }

    #[test]
    fn attaching_keeps_existing_images() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        let payload = ImagePayload::new(TINY_PNG.to_vec(), ImageSize::new(80, 60)).unwrap();

        ImageAnchor::new("Sheet1", "A1".parse().unwrap(), payload.size()).attach(sheet, &payload);
        ImageAnchor::new("Sheet1", "F10".parse().unwrap(), payload.size()).attach(sheet, &payload);

        let coords: Vec<String> = sheet
            .get_image_collection()
            .iter()
            .map(|img| img.get_coordinate())
            .collect();
        assert_eq!(coords, vec!["A1", "F10"]);
    }
}
