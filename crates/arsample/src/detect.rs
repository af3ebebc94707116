use crate::{core, vision};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the `image`-based helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error(transparent)]
    Layout(#[from] core::ImageLayoutError),

    #[error(transparent)]
    EdgeDetect(#[from] vision::EdgeDetectError),
}

/// Convert an `image::GrayImage` into the lightweight `arsample-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    let width = img.width() as usize;
    core::GrayImageView {
        width,
        height: img.height() as usize,
        stride: width,
        data: img.as_raw(),
    }
}

fn to_image(gray: core::GrayImage) -> Result<::image::GrayImage, DetectError> {
    let expected = gray.width * gray.height;
    let got = gray.data.len();
    ::image::GrayImage::from_raw(gray.width as u32, gray.height as u32, gray.data)
        .ok_or(DetectError::InvalidGrayBuffer { expected, got })
}

/// Sobel edge strength of a gray image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_edges_image(
    img: &::image::GrayImage,
    params: &vision::SobelParams,
) -> Result<::image::GrayImage, DetectError> {
    to_image(vision::sobel_edges(&gray_view(img), params)?)
}

/// Luminance of an RGBA image, alpha ignored.
pub fn rgba_to_gray_image(img: &::image::RgbaImage) -> Result<::image::GrayImage, DetectError> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let view = vision::RgbaImageView::packed(width, height, img.as_raw())?;
    to_image(vision::rgba_to_gray(&view)?)
}
