//! Grayscale to binary mask conversion, the usual step before labelling.

use crate::arrays::RasterImage;
use crate::error::Error;
use log::debug;

fn check_gray_pair(src: &RasterImage, dst: &RasterImage) -> Result<(), Error> {
    src.check_single_channel()?;
    dst.check_single_channel()?;
    if src.size() != dst.size() {
        return Err(Error::DimensionMismatch {
            expected: src.size(),
            found: dst.size(),
        });
    }
    Ok(())
}

/// Pixels below `threshold` become 0, the rest 255. `dst` is marked as a two level image.
pub fn gray_to_binary(
    src: &RasterImage,
    dst: &mut RasterImage,
    threshold: u8,
) -> Result<(), Error> {
    check_gray_pair(src, dst)?;
    dst.data
        .iter_mut()
        .zip(src.data.iter())
        .for_each(|(d, s)| *d = if *s < threshold { 0 } else { 255 });
    dst.levels = 2;
    Ok(())
}

/// Like [`gray_to_binary`] with the mean intensity of `src` as threshold.
///
/// The comparison is made against the exact mean, a pixel equal to the truncated mean of a
/// non-integer average is background.
pub fn gray_to_binary_global_mean(
    src: &RasterImage,
    dst: &mut RasterImage,
) -> Result<(), Error> {
    check_gray_pair(src, dst)?;
    let sum: u64 = src.data.iter().map(|v| *v as u64).sum();
    let count = src.data.len() as u64;
    debug!("global mean threshold {}", sum as f64 / count as f64);
    // v < sum / count  <=>  v * count < sum
    dst.data
        .iter_mut()
        .zip(src.data.iter())
        .for_each(|(d, s)| *d = if (*s as u64) * count < sum { 0 } else { 255 });
    dst.levels = 2;
    Ok(())
}
