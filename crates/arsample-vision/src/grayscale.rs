use arsample_core::{check_layout, GrayImage, ImageLayoutError};

/// Luma weights applied to R, G and B.
pub const LUMA_WEIGHTS: [f32; 3] = [0.213, 0.715, 0.072];

const BYTES_PER_RGBA_PIXEL: usize = 4;

/// Borrowed RGBA_8888 image with `stride` bytes per row.
#[derive(Clone, Copy, Debug)]
pub struct RgbaImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> RgbaImageView<'a> {
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self, ImageLayoutError> {
        check_layout(width, height, stride, BYTES_PER_RGBA_PIXEL, data.len())?;
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn packed(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageLayoutError> {
        Self::new(width, height, width.saturating_mul(BYTES_PER_RGBA_PIXEL), data)
    }
}

/// Convert an RGBA image to packed grayscale. Alpha is ignored and the
/// weighted sum is truncated.
pub fn rgba_to_gray(src: &RgbaImageView<'_>) -> Result<GrayImage, ImageLayoutError> {
    check_layout(
        src.width,
        src.height,
        src.stride,
        BYTES_PER_RGBA_PIXEL,
        src.data.len(),
    )?;
    let mut out = GrayImage::new(src.width, src.height);
    let [wr, wg, wb] = LUMA_WEIGHTS;
    for y in 0..src.height {
        let row = &src.data[y * src.stride..y * src.stride + src.width * BYTES_PER_RGBA_PIXEL];
        let out_row = &mut out.data[y * src.width..(y + 1) * src.width];
        for (dst, px) in out_row.iter_mut().zip(row.chunks_exact(BYTES_PER_RGBA_PIXEL)) {
            let luma = wr * px[0] as f32 + wg * px[1] as f32 + wb * px[2] as f32;
            *dst = luma as u8;
        }
    }
    Ok(out)
}
