use ndarray::ArrayView3;

use crate::shared::bounding_box::PixelRect;

/// A single video/image frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; analysis and swapping
/// treat pixel data as opaque RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Wraps a decoded RGB image as a frame with the given index.
    pub fn from_rgb_image(image: image::RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    /// `None` for empty or non-RGB frames.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.channels != 3 || self.is_empty() {
            return None;
        }
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `rect` into a new frame.
    ///
    /// The rectangle is clipped to the frame; a rectangle that falls
    /// entirely outside yields an empty (0x0) frame.
    pub fn crop(&self, rect: &PixelRect) -> Frame {
        let x1 = rect.x.min(self.width) as usize;
        let y1 = rect.y.min(self.height) as usize;
        let x2 = rect.x.saturating_add(rect.width).min(self.width) as usize;
        let y2 = rect.y.saturating_add(rect.height).min(self.height) as usize;

        let channels = self.channels as usize;
        let row_len = self.width as usize * channels;
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            let start = row * row_len + x1 * channels;
            let end = row * row_len + x2 * channels;
            data.extend_from_slice(&self.data[start..end]);
        }

        Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        )
    }

    /// Writes `patch` into this frame with its top-left corner at `(x, y)`.
    ///
    /// Pixels that fall outside the frame are dropped. Channel counts must
    /// match; mismatched patches are ignored.
    pub fn paste(&mut self, patch: &Frame, x: u32, y: u32) {
        if patch.channels != self.channels {
            return;
        }
        let channels = self.channels as usize;
        let copy_w = patch.width.min(self.width.saturating_sub(x)) as usize;
        let copy_h = patch.height.min(self.height.saturating_sub(y)) as usize;
        if copy_w == 0 || copy_h == 0 {
            return;
        }
        let dst_row_len = self.width as usize * channels;
        let src_row_len = patch.width as usize * channels;

        for row in 0..copy_h {
            let dst = (y as usize + row) * dst_row_len + x as usize * channels;
            let src = row * src_row_len;
            self.data[dst..dst + copy_w * channels]
                .copy_from_slice(&patch.data[src..src + copy_w * channels]);
        }
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
