/// Errors raised when a raw pixel buffer does not match its declared layout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageLayoutError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("row stride {stride} is smaller than the row size {row_bytes}")]
    StrideTooSmall { stride: usize, row_bytes: usize },

    #[error("image buffer too small (expected at least {expected} bytes, got {got})")]
    BufferTooSmall { expected: usize, got: usize },
}

/// Borrowed single-channel 8-bit image.
///
/// Rows start every `stride` bytes; only the first `width` bytes of a row
/// are pixels. Camera images frequently carry row padding, so the stride is
/// kept separate from the width.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> GrayImageView<'a> {
    /// View over a tightly packed buffer (`stride == width`).
    pub fn packed(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageLayoutError> {
        Self::with_stride(width, height, width, data)
    }

    /// View over a buffer with `stride` bytes per row.
    pub fn with_stride(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self, ImageLayoutError> {
        check_layout(width, height, stride, 1, data.len())?;
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Re-check the layout of a view assembled from its public fields.
    pub fn validate(&self) -> Result<(), ImageLayoutError> {
        check_layout(self.width, self.height, self.stride, 1, self.data.len())
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Pixel row `y` without padding.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }
}

/// Owned, tightly packed single-channel 8-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Validate that a buffer of `len` bytes can hold `height` rows of `width`
/// pixels of `bytes_per_pixel` bytes with the given row `stride`.
///
/// The last row does not need to be padded out to the full stride.
pub fn check_layout(
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
    len: usize,
) -> Result<(), ImageLayoutError> {
    let Some(row_bytes) = width.checked_mul(bytes_per_pixel) else {
        return Err(ImageLayoutError::InvalidDimensions { width, height });
    };
    if stride < row_bytes {
        return Err(ImageLayoutError::StrideTooSmall { stride, row_bytes });
    }
    if width == 0 || height == 0 {
        return Ok(());
    }
    let expected = stride
        .checked_mul(height - 1)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(ImageLayoutError::InvalidDimensions { width, height })?;
    if len < expected {
        return Err(ImageLayoutError::BufferTooSmall { expected, got: len });
    }
    Ok(())
}
