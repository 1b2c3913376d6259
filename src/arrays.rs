use crate::error::Error;
use aligned_vec::{AVec, ConstAlign};
use std::ops::{Index, IndexMut};

const ALIGN: usize = 64;

#[derive(Debug)]
pub struct Array2D<T> {
    pub data: AVec<T, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
}

impl<T> Array2D<T> {
    pub fn from_slice(data: &[T], width: usize, height: usize) -> Result<Self, Error>
    where
        T: Clone,
    {
        if data.len() != width * height {
            return Err(Error::DataLengthMismatch(data.len(), width * height));
        }
        Ok(Self {
            width,
            height,
            data: AVec::from_slice(ALIGN, data),
        })
    }

    pub fn from_fill(value: T, width: usize, height: usize) -> Self
    where
        T: Clone + Copy,
    {
        let data: AVec<T, ConstAlign<ALIGN>> =
            AVec::from_iter(ALIGN, (0..width * height).map(|_| value));
        Self {
            width,
            height,
            data,
        }
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value)
    }
    #[inline(always)]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
    #[inline(always)]
    pub fn get_row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.height);
        &self.data[(self.width * row)..(self.width * row + self.width)]
    }
    #[inline(always)]
    pub fn get_row_mut(&mut self, row: usize) -> &mut [T] {
        debug_assert!(row < self.height);
        &mut self.data[(self.width * row)..(self.width * row + self.width)]
    }
    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        self.width * y + x
    }
    pub fn get_x_y_index(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }
    /// Bounds-checked element access.
    pub fn get(&self, x: usize, y: usize) -> Result<&T, Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndicesOutOfBounds(x, y));
        }
        Ok(&self.data[self.width * y + x])
    }
    /// Bounds-checked mutable element access.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Result<&mut T, Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndicesOutOfBounds(x, y));
        }
        let idx = self.width * y + x;
        Ok(&mut self.data[idx])
    }
}
impl<T> Index<(usize, usize)> for Array2D<T> {
    type Output = T;
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[self.get_index(x, y)]
    }
}
impl<T> IndexMut<(usize, usize)> for Array2D<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        let idx = self.get_index(x, y);
        &mut self.data[idx]
    }
}

/// Single channel image of canonical blob labels, 0 is background.
///
/// Labels are stored as `u32`, so the number of blobs is bounded by the image area only.
/// Use [`LabelImage::to_raster`] to hand the result to code expecting 8-bit rasters.
pub type LabelImage = Array2D<u32>;

impl Array2D<u32> {
    /// Empty (all background) label image.
    pub fn new_labels(width: usize, height: usize) -> Result<LabelImage, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize { width, height });
        }
        Ok(Array2D::from_fill(0u32, width, height))
    }

    /// Widens an 8-bit single channel raster holding labels.
    pub fn from_raster(image: &RasterImage) -> Result<LabelImage, Error> {
        image.check_single_channel()?;
        let mut labels = Self::new_labels(image.width, image.height)?;
        for y in 0..image.height {
            labels
                .get_row_mut(y)
                .iter_mut()
                .zip(image.get_row(y))
                .for_each(|(label, byte)| *label = *byte as u32);
        }
        Ok(labels)
    }

    /// Narrows the labels into an 8-bit single channel raster.
    ///
    /// Fails with [`Error::LabelOverflow`] on the first label above 255.
    pub fn to_raster(&self) -> Result<RasterImage, Error> {
        if let Some(label) = self.data.iter().find(|label| **label > u8::MAX as u32) {
            return Err(Error::LabelOverflow(*label));
        }
        RasterImage::from_iter(
            self.data.iter().map(|label| *label as u8),
            self.width,
            self.height,
            1,
            u8::MAX as u32,
        )
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|label| **label != 0).count()
    }
}

/// Interleaved 8-bit raster image.
///
/// Binary masks and grayscale images use one channel, RGB uses three. `levels` is carried
/// along for downstream writers and is not interpreted here.
#[derive(Debug)]
pub struct RasterImage {
    pub data: AVec<u8, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub levels: u32,
    pub bytes_per_line: usize,
}

impl RasterImage {
    fn check_shape(width: usize, height: usize, channels: usize) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize { width, height });
        }
        if channels == 0 {
            return Err(Error::ChannelCount(channels));
        }
        Ok(())
    }

    /// Zero filled image.
    pub fn new(width: usize, height: usize, channels: usize, levels: u32) -> Result<Self, Error> {
        Self::check_shape(width, height, channels)?;
        Ok(Self {
            data: AVec::from_iter(ALIGN, (0..width * height * channels).map(|_| 0u8)),
            width,
            height,
            channels,
            levels,
            bytes_per_line: width * channels,
        })
    }

    pub fn from_raw_slice(
        data: &[u8],
        width: usize,
        height: usize,
        channels: usize,
        levels: u32,
    ) -> Result<Self, Error> {
        Self::check_shape(width, height, channels)?;
        if data.len() != width * height * channels {
            return Err(Error::DataLengthMismatch(
                data.len(),
                width * height * channels,
            ));
        }
        Ok(Self {
            data: AVec::from_slice(ALIGN, data),
            width,
            height,
            channels,
            levels,
            bytes_per_line: width * channels,
        })
    }

    pub fn from_iter<I>(
        iter: I,
        width: usize,
        height: usize,
        channels: usize,
        levels: u32,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = u8>,
    {
        Self::check_shape(width, height, channels)?;
        let data = AVec::from_iter(ALIGN, iter);
        if data.len() != width * height * channels {
            return Err(Error::DataLengthMismatch(
                data.len(),
                width * height * channels,
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            levels,
            bytes_per_line: width * channels,
        })
    }

    pub(crate) fn check_single_channel(&self) -> Result<(), Error> {
        if self.channels != 1 {
            return Err(Error::ChannelCount(self.channels));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
    #[inline(always)]
    pub fn get_row(&self, row: usize) -> &[u8] {
        debug_assert!(row < self.height);
        &self.data[(self.bytes_per_line * row)..(self.bytes_per_line * (row + 1))]
    }
    #[inline(always)]
    pub fn get_row_mut(&mut self, row: usize) -> &mut [u8] {
        debug_assert!(row < self.height);
        &mut self.data[(self.bytes_per_line * row)..(self.bytes_per_line * (row + 1))]
    }
    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        self.bytes_per_line * y + x * self.channels
    }
    #[inline(always)]
    pub fn get_pixel(&self, x: usize, y: usize) -> &[u8] {
        let idx = self.get_index(x, y);
        &self.data[idx..idx + self.channels]
    }
    #[inline(always)]
    pub fn get_pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let idx = self.get_index(x, y);
        let channels = self.channels;
        &mut self.data[idx..idx + channels]
    }
    /// Bounds-checked pixel access.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[u8], Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndicesOutOfBounds(x, y));
        }
        Ok(self.get_pixel(x, y))
    }
    /// Bounds-checked mutable pixel access.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Result<&mut [u8], Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndicesOutOfBounds(x, y));
        }
        Ok(self.get_pixel_mut(x, y))
    }
    /// Number of bytes that are not zero.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| **v != 0).count()
    }
}
impl Index<(usize, usize)> for RasterImage {
    type Output = [u8];
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        self.get_pixel(x, y)
    }
}
