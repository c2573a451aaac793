//! Splitting an image into an N×M grid of tiles for sequential posting.
//!
//! Tiles are equally sized: `floor(width / cols)` by `floor(height / rows)`
//! pixels. Remainder pixels along the right and bottom edges are dropped.
//! Every tile is re-encoded as JPEG and the tiles are returned in row-major
//! order, which is the order they are meant to be posted in.

use crate::schema::GridSize;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageReader, codecs::jpeg::JpegEncoder};
use serde::Serialize;
use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// JPEG quality used for every tile.
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct GridPiece {
    /// 1-based position in posting order.
    pub index: u32,
    /// 1-based, counted from the top.
    pub row: u32,
    /// 1-based, counted from the left.
    pub column: u32,
    /// JPEG-encoded tile.
    pub bytes: Vec<u8>,
}

impl GridPiece {
    pub fn filename(&self) -> String {
        format!("grid-piece-{}.jpg", self.index)
    }

    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSplit {
    pub size: GridSize,
    pub piece_width: u32,
    pub piece_height: u32,
    pub pieces: Vec<GridPiece>,
}

/// Summary of a split that is worth persisting; the tile bytes are not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    pub grid_size: GridSize,
    pub pieces: u32,
    pub piece_width: u32,
    pub piece_height: u32,
}

impl GridSplit {
    pub fn summary(&self) -> GridSummary {
        GridSummary {
            grid_size: self.size,
            pieces: self.pieces.len() as u32,
            piece_width: self.piece_width,
            piece_height: self.piece_height,
        }
    }
}

/// Decodes `bytes` as an image and cuts it into `size.cols() × size.rows()` tiles.
pub fn split_image(bytes: &[u8], size: GridSize) -> Result<GridSplit, GridError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    split(&img, size)
}

fn split(img: &DynamicImage, size: GridSize) -> Result<GridSplit, GridError> {
    let (cols, rows) = (size.cols(), size.rows());
    let piece_width = img.width() / cols;
    let piece_height = img.height() / rows;

    if piece_width == 0 || piece_height == 0 {
        return Err(GridError::TooSmall {
            width: img.width(),
            height: img.height(),
            size,
        });
    }

    let mut pieces = Vec::with_capacity(size.pieces() as usize);
    for row in 0..rows {
        for column in 0..cols {
            let tile = img
                .crop_imm(column * piece_width, row * piece_height, piece_width, piece_height)
                .to_rgb8();

            let mut bytes = Vec::new();
            JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&tile)?;

            pieces.push(GridPiece {
                index: row * cols + column + 1,
                row: row + 1,
                column: column + 1,
                bytes,
            });
        }
    }

    Ok(GridSplit {
        size,
        piece_width,
        piece_height,
        pieces,
    })
}

/// Writes every tile of `split` into `dir` (created if missing) and returns the paths.
pub fn write_pieces(split: &GridSplit, dir: &Path) -> Result<Vec<PathBuf>, GridError> {
    fs::create_dir_all(dir)?;

    split
        .pieces
        .iter()
        .map(|piece| {
            let path = dir.join(piece.filename());
            fs::write(&path, &piece.bytes)?;
            Ok(path)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("image is {width}x{height} px, too small for a {size} grid")]
    TooSmall {
        width: u32,
        height: u32,
        size: GridSize,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, ImageFormat, Rgb};
    use tempfile::TempDir;

    /// A PNG whose left half is red and right half is blue.
    fn two_tone_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([255u8, 0, 0])
            } else {
                Rgb([0u8, 0, 255])
            }
        });

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_split_three_by_three() {
        let split = split_image(&two_tone_png(300, 200), GridSize::ThreeByThree).unwrap();

        assert_eq!(9, split.pieces.len());
        assert_eq!((100, 66), (split.piece_width, split.piece_height));
        assert_eq!(
            (1..=9).collect::<Vec<_>>(),
            split.pieces.iter().map(|p| p.index).collect::<Vec<_>>()
        );
        assert_eq!((1, 1), (split.pieces[0].row, split.pieces[0].column));
        assert_eq!((2, 3), (split.pieces[5].row, split.pieces[5].column));
        assert_eq!((3, 3), (split.pieces[8].row, split.pieces[8].column));

        for piece in &split.pieces {
            let decoded = image::load_from_memory(&piece.bytes).unwrap();
            assert_eq!((100, 66), decoded.dimensions());
        }
    }

    #[test]
    fn test_split_preserves_layout() {
        let split = split_image(&two_tone_png(200, 100), GridSize::TwoByTwo).unwrap();

        let left = image::load_from_memory(&split.pieces[0].bytes)
            .unwrap()
            .to_rgb8();
        let right = image::load_from_memory(&split.pieces[1].bytes)
            .unwrap()
            .to_rgb8();

        let Rgb([r, _, b]) = *left.get_pixel(50, 25);
        assert!(r > 200 && b < 60, "left tile should be red, got {r},{b}");
        let Rgb([r, _, b]) = *right.get_pixel(50, 25);
        assert!(b > 200 && r < 60, "right tile should be blue, got {r},{b}");
    }

    #[test]
    fn test_split_strips() {
        let bytes = two_tone_png(90, 90);

        let vertical = split_image(&bytes, GridSize::OneByThree).unwrap();
        assert_eq!((90, 30), (vertical.piece_width, vertical.piece_height));
        assert_eq!(3, vertical.pieces.len());

        let horizontal = split_image(&bytes, GridSize::ThreeByOne).unwrap();
        assert_eq!((30, 90), (horizontal.piece_width, horizontal.piece_height));
    }

    #[test]
    fn test_split_errors() {
        let result = split_image(&two_tone_png(2, 2), GridSize::ThreeByThree);
        assert!(matches!(
            result,
            Err(GridError::TooSmall {
                width: 2,
                height: 2,
                ..
            })
        ));

        assert!(matches!(
            split_image(b"definitely not an image", GridSize::TwoByTwo),
            Err(GridError::Image(_))
        ));
    }

    #[test]
    fn test_piece_naming_and_summary() {
        let split = split_image(&two_tone_png(40, 40), GridSize::TwoByTwo).unwrap();

        assert_eq!("grid-piece-4.jpg", split.pieces[3].filename());
        assert!(split.pieces[0].data_url().starts_with("data:image/jpeg;base64,/9j/"));
        assert_eq!(
            serde_json::json!({
                "gridSize": "2x2",
                "pieces": 4,
                "pieceWidth": 20,
                "pieceHeight": 20
            }),
            serde_json::to_value(split.summary()).unwrap()
        );
    }

    #[test]
    fn test_write_pieces() {
        let tmp_dir = TempDir::new().unwrap();
        let out = tmp_dir.path().join("tiles");
        let split = split_image(&two_tone_png(60, 60), GridSize::ThreeByThree).unwrap();

        let paths = write_pieces(&split, &out).unwrap();

        assert_eq!(9, paths.len());
        assert_eq!(out.join("grid-piece-1.jpg"), paths[0]);
        assert!(paths.iter().all(|p| p.exists()));
    }
}
