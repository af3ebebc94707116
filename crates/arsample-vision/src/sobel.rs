//! Binary Sobel edge strength over single-channel camera images.
//!
//! Kernels:
//!
//! ```text
//! Gx: -1 0 1     Gy:  1  2  1
//!     -2 0 2          0  0  0
//!     -1 0 1         -1 -2 -1
//! ```
//!
//! A pixel is an edge when `Gx² + Gy² > threshold`. The one-pixel border is
//! never evaluated and stays 0.

use arsample_core::{GrayImage, GrayImageView, ImageLayoutError};
use log::trace;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default squared-gradient threshold.
pub const SOBEL_EDGE_THRESHOLD: u32 = 128 * 128;

#[derive(thiserror::Error, Debug)]
pub enum EdgeDetectError {
    #[error("invalid camera image layout: {0}")]
    Layout(#[from] ImageLayoutError),
}

/// Parameters of the edge classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SobelParams {
    /// Squared gradient magnitude above which a pixel is an edge.
    pub threshold: u32,
    /// Output value for edge pixels.
    pub edge_value: u8,
    /// Output value for interior non-edge pixels.
    pub flat_value: u8,
}

impl Default for SobelParams {
    fn default() -> Self {
        Self {
            threshold: SOBEL_EDGE_THRESHOLD,
            edge_value: 0xFF,
            flat_value: 0x1F,
        }
    }
}

/// Edge detector that keeps its output buffer between frames.
#[derive(Clone, Debug)]
pub struct EdgeDetector {
    params: SobelParams,
    output: GrayImage,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::with_params(SobelParams::default())
    }

    pub fn with_params(params: SobelParams) -> Self {
        Self {
            params,
            output: GrayImage::new(0, 0),
        }
    }

    pub fn params(&self) -> &SobelParams {
        &self.params
    }

    /// Run the detector on `src` and return the packed `width * height` result.
    ///
    /// The returned image borrows the detector's buffer; it is reallocated
    /// only when the frame size changes. Views whose fields disagree with
    /// their buffer are rejected.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = src.width, height = src.height))
    )]
    pub fn detect(&mut self, src: &GrayImageView<'_>) -> Result<&GrayImage, EdgeDetectError> {
        src.validate()?;
        if self.output.width != src.width || self.output.height != src.height {
            trace!("edge buffer resized to {}x{}", src.width, src.height);
            self.output = GrayImage::new(src.width, src.height);
        }
        sobel_into(src, &self.params, &mut self.output);
        Ok(&self.output)
    }

    /// Like [`EdgeDetector::detect`], for a raw luminance plane as handed
    /// over by the camera (`stride` bytes per row).
    pub fn detect_raw(
        &mut self,
        data: &[u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<&GrayImage, EdgeDetectError> {
        let view = GrayImageView::with_stride(width, height, stride, data)?;
        self.detect(&view)
    }
}

/// One-shot edge detection into a fresh image.
pub fn sobel_edges(
    src: &GrayImageView<'_>,
    params: &SobelParams,
) -> Result<GrayImage, EdgeDetectError> {
    src.validate()?;
    let mut out = GrayImage::new(src.width, src.height);
    sobel_into(src, params, &mut out);
    Ok(out)
}

fn sobel_into(src: &GrayImageView<'_>, params: &SobelParams, out: &mut GrayImage) {
    debug_assert_eq!(out.data.len(), src.width * src.height);
    let (w, h) = (src.width, src.height);
    out.data.fill(0);
    if w < 3 || h < 3 {
        return;
    }

    let threshold = params.threshold as i64;
    for y in 1..h - 1 {
        let above = src.row(y - 1);
        let row = src.row(y);
        let below = src.row(y + 1);
        let out_row = &mut out.data[y * w..(y + 1) * w];

        for x in 1..w - 1 {
            let a00 = above[x - 1] as i32;
            let a01 = above[x] as i32;
            let a02 = above[x + 1] as i32;
            let a10 = row[x - 1] as i32;
            let a12 = row[x + 1] as i32;
            let a20 = below[x - 1] as i32;
            let a21 = below[x] as i32;
            let a22 = below[x + 1] as i32;

            let gx = -a00 - 2 * a10 - a20 + a02 + 2 * a12 + a22;
            let gy = a00 + 2 * a01 + a02 - a20 - 2 * a21 - a22;
            let magnitude_sq = (gx * gx + gy * gy) as i64;

            out_row[x] = if magnitude_sq > threshold {
                params.edge_value
            } else {
                params.flat_value
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(img: &GrayImage) -> GrayImageView<'_> {
        img.view()
    }

    fn step_image(w: usize, h: usize, split: usize) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in 0..h {
            for x in split..w {
                img.data[y * w + x] = 255;
            }
        }
        img
    }

    #[test]
    fn constant_image_has_no_edges_and_zero_border() {
        let img = GrayImage {
            width: 6,
            height: 5,
            data: vec![90; 30],
        };
        let out = sobel_edges(&packed(&img), &SobelParams::default()).expect("edges");
        for y in 0..5 {
            for x in 0..6 {
                let border = x == 0 || y == 0 || x == 5 || y == 4;
                let expected = if border { 0 } else { 0x1F };
                assert_eq!(out.get(x, y), expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn vertical_step_marks_both_adjacent_columns() {
        let img = step_image(8, 6, 4);
        let out = sobel_edges(&packed(&img), &SobelParams::default()).expect("edges");
        for y in 1..5 {
            assert_eq!(out.get(2, y), 0x1F);
            assert_eq!(out.get(3, y), 0xFF);
            assert_eq!(out.get(4, y), 0xFF);
            assert_eq!(out.get(5, y), 0x1F);
        }
    }

    #[test]
    fn weak_gradient_stays_below_threshold() {
        // Step of 30: |gx| = 4 * 30 = 120, squared 14400 <= 16384.
        let mut img = GrayImage::new(5, 5);
        for y in 0..5 {
            for x in 3..5 {
                img.data[y * 5 + x] = 30;
            }
        }
        let out = sobel_edges(&packed(&img), &SobelParams::default()).expect("edges");
        assert!(out.data.iter().all(|&v| v == 0 || v == 0x1F));

        let sensitive = SobelParams {
            threshold: 100,
            ..SobelParams::default()
        };
        let out = sobel_edges(&packed(&img), &sensitive).expect("edges");
        assert_eq!(out.get(2, 2), 0xFF);
    }

    #[test]
    fn row_padding_does_not_change_result() {
        let img = step_image(7, 5, 3);
        let stride = 10;
        let mut padded = vec![0xAAu8; stride * 5];
        for y in 0..5 {
            padded[y * stride..y * stride + 7].copy_from_slice(&img.data[y * 7..(y + 1) * 7]);
        }
        let view = GrayImageView::with_stride(7, 5, stride, &padded).expect("layout");

        let expected = sobel_edges(&packed(&img), &SobelParams::default()).expect("edges");
        let got = sobel_edges(&view, &SobelParams::default()).expect("edges");
        assert_eq!(got, expected);
        assert_eq!(got.data.len(), 35);
    }

    #[test]
    fn tiny_images_are_all_zero() {
        let img = GrayImage {
            width: 2,
            height: 7,
            data: vec![200; 14],
        };
        let out = sobel_edges(&packed(&img), &SobelParams::default()).expect("edges");
        assert!(out.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn detector_reuses_buffer_and_follows_size_changes() {
        let mut detector = EdgeDetector::new();
        let a = step_image(8, 6, 4);
        let first = detector.detect(&packed(&a)).expect("edges").clone();
        assert_eq!((first.width, first.height), (8, 6));

        let b = step_image(5, 4, 2);
        let second = detector.detect(&packed(&b)).expect("edges").clone();
        assert_eq!((second.width, second.height), (5, 4));

        let again = detector.detect(&packed(&a)).expect("edges").clone();
        assert_eq!(again, first);
    }

    #[test]
    fn inconsistent_image_is_rejected_instead_of_read_out_of_bounds() {
        let img = GrayImage {
            width: 8,
            height: 8,
            data: vec![0; 10],
        };
        let err = sobel_edges(&img.view(), &SobelParams::default()).unwrap_err();
        assert!(matches!(
            err,
            EdgeDetectError::Layout(ImageLayoutError::BufferTooSmall {
                expected: 64,
                got: 10
            })
        ));

        let mut detector = EdgeDetector::new();
        let view = GrayImageView {
            width: 6,
            height: 4,
            stride: 3,
            data: &img.data,
        };
        assert!(matches!(
            detector.detect(&view),
            Err(EdgeDetectError::Layout(ImageLayoutError::StrideTooSmall { .. }))
        ));
    }

    #[test]
    fn raw_plane_with_short_buffer_is_rejected() {
        let mut detector = EdgeDetector::new();
        let data = vec![0u8; 10 * 3 + 8];
        let err = detector.detect_raw(&data, 8, 5, 10).unwrap_err();
        assert!(matches!(
            err,
            EdgeDetectError::Layout(ImageLayoutError::BufferTooSmall { .. })
        ));

        let err = detector.detect_raw(&data, 8, 2, 4).unwrap_err();
        assert!(matches!(
            err,
            EdgeDetectError::Layout(ImageLayoutError::StrideTooSmall { .. })
        ));

        let out = detector.detect_raw(&data, 8, 4, 10).expect("valid layout");
        assert_eq!(out.data.len(), 32);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: SobelParams = serde_json::from_str(r#"{"threshold": 400}"#).expect("parse");
        assert_eq!(params.threshold, 400);
        assert_eq!(params.edge_value, 0xFF);
        assert_eq!(params.flat_value, 0x1F);
    }
}
