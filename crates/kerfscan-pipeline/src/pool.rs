//! Pre-allocated grayscale buffer pool for the tick driver.
//!
//! The grayscale conversion is the largest per-tick intermediate. For
//! a fixed-resolution stream, pooling that buffer removes the per-tick
//! allocation; the remaining `imageproc` stages allocate internally
//! and are outside the pool's reach.
//!
//! [`BufferPool::acquire`] hands out a [`PooledImage`] guard that
//! returns its buffer to the pool on drop, so release is guaranteed on
//! every exit path of a tick, including abandoned ones.

use std::ops::{Deref, DerefMut};

use image::GrayImage;

/// A pool of reusable grayscale buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Vec<GrayImage>,
}

impl BufferPool {
    /// Create an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self { free: Vec::new() }
    }

    /// Number of buffers currently parked in the pool.
    #[must_use]
    pub const fn idle(&self) -> usize {
        self.free.len()
    }

    /// Acquire a buffer with the given dimensions.
    ///
    /// Reuses a parked buffer when one matches; otherwise (first tick,
    /// or a stream resolution change) a fresh buffer is allocated.
    /// Contents are whatever the previous tick left behind -- callers
    /// overwrite every pixel.
    pub fn acquire(&mut self, width: u32, height: u32) -> PooledImage<'_> {
        let image = match self.free.pop() {
            Some(buf) if buf.dimensions() == (width, height) => buf,
            _ => GrayImage::new(width, height),
        };
        PooledImage { image, pool: self }
    }
}

/// Scoped handle to a pooled buffer; returns it to the pool on drop.
#[derive(Debug)]
pub struct PooledImage<'a> {
    image: GrayImage,
    pool: &'a mut BufferPool,
}

impl Deref for PooledImage<'_> {
    type Target = GrayImage;

    fn deref(&self) -> &GrayImage {
        &self.image
    }
}

impl DerefMut for PooledImage<'_> {
    fn deref_mut(&mut self) -> &mut GrayImage {
        &mut self.image
    }
}

impl Drop for PooledImage<'_> {
    fn drop(&mut self) {
        let image = std::mem::replace(&mut self.image, GrayImage::new(0, 0));
        self.pool.free.push(image);
    }
}
