//! # Double-Buffered Pixel Surface
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────┐
//!                    │         FrameBuffer         │
//!                    │                             │
//!                    │  ┌─────────┐  ┌─────────┐   │
//!                    │  │  FRONT  │  │  BACK   │   │
//!                    │  │ (Mutex) │  │(RwLock) │   │
//!                    │  └────┬────┘  └────┬────┘   │
//!                    └───────┼────────────┼────────┘
//!                            │            │
//!              ┌─────────────┤            ├──────────────┐
//!              ▼             ▼            ▼              ▼
//!      ┌──────────────┐ ┌─────────┐ ┌───────────────┐ ┌──────────┐
//!      │ draw_* calls │ │FrameWriter│ │BackBufferGuard│ │  swap()  │
//!      │ (one lock    │ │(one lock │ │  (presenter)  │ │front+back│
//!      │  per call)   │ │per frame)│ │               │ │          │
//!      └──────────────┘ └─────────┘ └───────────────┘ └──────────┘
//! ```
//!
//! ## Thread Safety
//!
//! - Lock order is always FRONT then BACK. Presenters only take BACK.
//! - `swap()` exchanges the two vectors under both locks, so a presenter
//!   never observes a half-swapped surface and a swap never lands in the
//!   middle of a render-side write.
//! - A [`FrameWriter`] holds the FRONT lock. Drop it (or call
//!   [`FrameWriter::swap`]) before calling [`FrameBuffer::swap`] on the same
//!   thread, the lock is not reentrant.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use super::texture::{TextureSampler, TexturedSpan, DARKEN_MASK};

/// Packed `0x00RRGGBB` pixel colour.
pub type Color = u32;

/// Double-buffered pixel surface shared between the render thread and a presenter.
///
/// ## Usage
///
/// ```rust,ignore
/// let fb = FrameBuffer::new(320, 200);
///
/// loop {
///     {
///         let mut frame = fb.begin_frame();
///         frame.fill(0x0020_2020);
///         frame.span(160, 50, 150, 0x00FF_0000);
///     } // FRONT lock released
///
///     fb.swap();
///
///     // Any thread, concurrently with the next frame's writes:
///     present(&fb.back_buffer());
/// }
/// ```
pub struct FrameBuffer {
    width: usize,
    height: usize,
    /// Sole write target between swaps.
    front: Mutex<Vec<Color>>,
    /// Sole read target after a swap.
    back: RwLock<Vec<Color>>,
    /// Completed swaps.
    frame_count: AtomicU64,
}

impl FrameBuffer {
    /// Creates a surface of `width` x `height` pixels, both sides zeroed.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or the pixel count overflows `usize`.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Arc<Self> {
        assert!(width > 0 && height > 0, "FrameBuffer dimensions must be non-zero");
        let Some(len) = width.checked_mul(height) else {
            panic!("FrameBuffer of {width}x{height} pixels overflows usize");
        };
        Arc::new(Self {
            width,
            height,
            front: Mutex::new(vec![0; len]),
            back: RwLock::new(vec![0; len]),
            frame_count: AtomicU64::new(0),
        })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of swaps performed so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Locks the front buffer for a batch of writes.
    ///
    /// Use this when a whole column, or a whole frame, is written at once:
    /// one lock acquisition instead of one per pixel.
    #[must_use]
    pub fn begin_frame(&self) -> FrameWriter<'_> {
        FrameWriter {
            buffer: self,
            front: self.front.lock(),
        }
    }

    /// Writes one pixel into the front buffer. Out-of-bounds writes are ignored.
    #[inline]
    pub fn draw_pixel(&self, x: usize, y: usize, color: Color) {
        if let Some(index) = self.index(x, y) {
            self.front.lock()[index] = color;
        }
    }

    /// Writes rows `y_start..=y_end` of column `x` with a single colour.
    ///
    /// Rows past the bottom edge are clipped.
    #[inline]
    pub fn draw_vertical_span(&self, x: usize, y_start: usize, y_end: usize, color: Color) {
        self.begin_frame().span(x, y_start, y_end, color);
    }

    /// Writes one textured wall column.
    #[inline]
    pub fn draw_textured_span<T: TextureSampler + ?Sized>(&self, span: &TexturedSpan, texture: &T) {
        self.begin_frame().textured_span(span, texture);
    }

    /// Exchanges front and back.
    ///
    /// The finished front becomes the stable back buffer that presenters read.
    /// The new front holds the frame before last and is NOT cleared: the
    /// renderer overwrites every pixel it owns.
    pub fn swap(&self) {
        let mut front = self.front.lock();
        self.swap_locked(&mut front);
    }

    /// Read access to the stable buffer from the last swap.
    ///
    /// Holding the guard blocks the next `swap()`, never the renderer.
    #[must_use]
    pub fn back_buffer(&self) -> BackBufferGuard<'_> {
        BackBufferGuard {
            back: self.back.read(),
        }
    }

    fn swap_locked(&self, front: &mut Vec<Color>) {
        let mut back = self.back.write();
        std::mem::swap(front, &mut *back);
        self.frame_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

/// Exclusive write access to the front buffer.
///
/// Holds the front lock until dropped.
pub struct FrameWriter<'a> {
    buffer: &'a FrameBuffer,
    front: MutexGuard<'a, Vec<Color>>,
}

impl FrameWriter<'_> {
    /// Writes one pixel. Out-of-bounds writes are ignored.
    #[inline]
    pub fn put(&mut self, x: usize, y: usize, color: Color) {
        if let Some(index) = self.buffer.index(x, y) {
            self.front[index] = color;
        }
    }

    /// Writes rows `y_start..=y_end` of column `x`, clipped to the surface.
    pub fn span(&mut self, x: usize, y_start: usize, y_end: usize, color: Color) {
        let width = self.buffer.width;
        let Some((y_start, y_end)) = self.clip_column(x, y_start, y_end) else {
            return;
        };
        for y in y_start..=y_end {
            self.front[y * width + x] = color;
        }
    }

    /// Writes one textured column.
    ///
    /// The texture is stepped by `texture.height() / line_height` texels per
    /// row, starting where the visible part of a `line_height`-tall slice
    /// centred on the screen begins.
    pub fn textured_span<T: TextureSampler + ?Sized>(&mut self, span: &TexturedSpan, texture: &T) {
        if span.line_height == 0 {
            return;
        }
        let width = self.buffer.width;
        let half_screen = (self.buffer.height / 2) as f64;
        let Some((y_start, y_end)) = self.clip_column(span.x, span.y_start, span.y_end) else {
            return;
        };

        let step = texture.height() as f64 / span.line_height as f64;
        let mut tex_y = (y_start as f64 - half_screen + (span.line_height / 2) as f64) * step;
        for y in y_start..=y_end {
            let mut color = texture.sample(span.tex_x, tex_y as usize);
            tex_y += step;
            if span.darken {
                color = (color >> 1) & DARKEN_MASK;
            }
            self.front[y * width + span.x] = color;
        }
    }

    /// Overwrites every pixel.
    #[inline]
    pub fn fill(&mut self, color: Color) {
        self.front.fill(color);
    }

    /// The front buffer as written so far.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.front
    }

    /// Finishes the frame and swaps without releasing the front lock in between.
    pub fn swap(mut self) {
        self.buffer.swap_locked(&mut self.front);
    }

    fn clip_column(&self, x: usize, y_start: usize, y_end: usize) -> Option<(usize, usize)> {
        if x >= self.buffer.width || y_start >= self.buffer.height {
            return None;
        }
        let y_end = y_end.min(self.buffer.height - 1);
        (y_start <= y_end).then_some((y_start, y_end))
    }
}

/// Shared read access to the stable back buffer.
pub struct BackBufferGuard<'a> {
    back: RwLockReadGuard<'a, Vec<Color>>,
}

impl Deref for BackBufferGuard<'_> {
    type Target = [Color];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.back
    }
}
