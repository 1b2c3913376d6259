//! Overlays of blob metrics on raster images.

use crate::arrays::RasterImage;
use crate::blob::Blob;
use crate::error::Error;

/// Half length of the centre of gravity cross arms.
const CROSS_ARM: usize = 3;

fn check_inside(image: &RasterImage, x: usize, y: usize) -> Result<(), Error> {
    if x >= image.width || y >= image.height {
        return Err(Error::IndicesOutOfBounds(x, y));
    }
    Ok(())
}

/// Draws the outline of the blob's bounding box with `value` in every channel.
///
/// Blobs with an empty box draw nothing.
pub fn draw_bounding_box(image: &mut RasterImage, blob: &Blob, value: u8) -> Result<(), Error> {
    if blob.width == 0 || blob.height == 0 {
        return Ok(());
    }
    let (left, top, right, bottom) = (blob.x, blob.y, blob.right(), blob.bottom());
    check_inside(image, right, bottom)?;
    for x in left..=right {
        image.get_pixel_mut(x, top).fill(value);
        image.get_pixel_mut(x, bottom).fill(value);
    }
    for y in top..=bottom {
        image.get_pixel_mut(left, y).fill(value);
        image.get_pixel_mut(right, y).fill(value);
    }
    Ok(())
}

/// Draws a cross centred on the blob's centroid, clipped to its bounding box.
pub fn draw_center_of_gravity(
    image: &mut RasterImage,
    blob: &Blob,
    value: u8,
) -> Result<(), Error> {
    if blob.width == 0 || blob.height == 0 {
        return Ok(());
    }
    check_inside(image, blob.right(), blob.bottom())?;
    check_inside(image, blob.xc, blob.yc)?;
    let x_min = blob.xc.saturating_sub(CROSS_ARM).max(blob.x);
    let x_max = (blob.xc + CROSS_ARM).min(blob.right());
    let y_min = blob.yc.saturating_sub(CROSS_ARM).max(blob.y);
    let y_max = (blob.yc + CROSS_ARM).min(blob.bottom());
    for y in y_min..=y_max {
        image.get_pixel_mut(blob.xc, y).fill(value);
    }
    for x in x_min..=x_max {
        image.get_pixel_mut(x, blob.yc).fill(value);
    }
    Ok(())
}
