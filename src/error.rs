/// Errors returned by the image containers, labelling and metrics passes.
#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum Error {
    /// Image with zero width or height.
    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    /// Raw buffer length does not match `width * height * channels`.
    #[error("data length ({0}) does not match the image size ({1})")]
    DataLengthMismatch(usize, usize),

    /// Source and destination images have different shapes.
    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// The operation requires a single channel image.
    #[error("expected a single channel image, got {0} channels")]
    ChannelCount(usize),

    /// Pixel coordinates outside the image.
    #[error("indices ({0}, {1}) out of bounds")]
    IndicesOutOfBounds(usize, usize),

    /// The label table reached its configured capacity.
    #[error("label table exhausted, no more than {0} provisional labels allowed")]
    LabelsExhausted(u32),

    /// A label does not fit into an 8-bit raster.
    #[error("label {0} does not fit into an 8-bit raster")]
    LabelOverflow(u32),
}
