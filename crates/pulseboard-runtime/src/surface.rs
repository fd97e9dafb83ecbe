#![forbid(unsafe_code)]

//! Drawable surface backing-resolution management.
//!
//! The surface tracks a logical on-screen size and keeps its backing pixel
//! store in sync, scaled by a capped device pixel ratio. The cap bounds
//! fill-rate cost on high-density displays; past 1.25x the extra pixels
//! cost frames without visibly sharpening a streaming chart.
//!
//! Resizes happen between frames only — the render pump applies any pending
//! size before invoking the draw callback, never during it.

/// Upper bound applied to the device pixel ratio.
pub const MAX_PIXEL_RATIO: f64 = 1.25;

/// Backing store dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// Reports the surface's logical size and pixel ratio, when available.
///
/// The runtime polls this between frames. Returning `None` means size
/// observation is unavailable; the surface then keeps whatever size the
/// one-shot setup resize gave it.
pub trait SizeObserver {
    fn observe(&mut self) -> Option<ObservedSize>;
}

/// One size observation: logical dimensions plus the display's pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedSize {
    pub logical_width: f64,
    pub logical_height: f64,
    pub device_pixel_ratio: f64,
}

/// A drawable surface with an owned grayscale backing store.
///
/// The store is a flat `width * height` byte buffer; what gets drawn into
/// it is the draw callback's business.
#[derive(Debug, Clone)]
pub struct Surface {
    logical_width: f64,
    logical_height: f64,
    pixel: PixelSize,
    backing: Vec<u8>,
}

impl Surface {
    /// Create a surface and run the best-effort setup resize at ratio 1.0.
    #[must_use]
    pub fn new(logical_width: f64, logical_height: f64) -> Self {
        let mut surface = Self {
            logical_width: 0.0,
            logical_height: 0.0,
            pixel: PixelSize {
                width: 0,
                height: 0,
            },
            backing: Vec::new(),
        };
        surface.resize_to_display(logical_width, logical_height, 1.0);
        surface
    }

    /// Sync the backing resolution to the observed logical size.
    ///
    /// The ratio is clamped to `(0, MAX_PIXEL_RATIO]` (a missing or bogus
    /// ratio falls back to 1.0). Idempotent: returns `false` and touches
    /// nothing when the computed pixel size already matches, so observers
    /// may call this every frame for free.
    pub fn resize_to_display(
        &mut self,
        logical_width: f64,
        logical_height: f64,
        device_pixel_ratio: f64,
    ) -> bool {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        let target = PixelSize {
            width: (logical_width.max(0.0) * ratio).round() as u32,
            height: (logical_height.max(0.0) * ratio).round() as u32,
        };

        self.logical_width = logical_width;
        self.logical_height = logical_height;
        if target == self.pixel {
            return false;
        }

        self.pixel = target;
        self.backing = vec![0; target.width as usize * target.height as usize];
        tracing::trace!(
            width = target.width,
            height = target.height,
            "surface backing resized"
        );
        true
    }

    /// Apply a pending observation, if the observer has one.
    pub fn sync_from(&mut self, observer: &mut dyn SizeObserver) -> bool {
        match observer.observe() {
            Some(size) => self.resize_to_display(
                size.logical_width,
                size.logical_height,
                size.device_pixel_ratio,
            ),
            None => false,
        }
    }

    /// Zero the backing store (start of a frame).
    pub fn clear(&mut self) {
        self.backing.fill(0);
    }

    #[must_use]
    pub fn pixel_size(&self) -> PixelSize {
        self.pixel
    }

    #[must_use]
    pub fn logical_size(&self) -> (f64, f64) {
        (self.logical_width, self.logical_height)
    }

    /// The backing store, row-major, for the draw callback.
    #[must_use]
    pub fn backing_mut(&mut self) -> &mut [u8] {
        &mut self.backing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_capped() {
        let mut s = Surface::new(0.0, 0.0);
        s.resize_to_display(800.0, 600.0, 3.0);
        assert_eq!(
            s.pixel_size(),
            PixelSize {
                width: 1_000,
                height: 750
            }
        );
    }

    #[test]
    fn resize_is_idempotent() {
        let mut s = Surface::new(800.0, 600.0);
        assert!(!s.resize_to_display(800.0, 600.0, 1.0));
        assert!(s.resize_to_display(800.0, 600.0, 1.25));
        assert!(!s.resize_to_display(800.0, 600.0, 1.25));
    }

    #[test]
    fn bogus_ratio_falls_back_to_one() {
        let mut s = Surface::new(0.0, 0.0);
        s.resize_to_display(100.0, 100.0, f64::NAN);
        assert_eq!(
            s.pixel_size(),
            PixelSize {
                width: 100,
                height: 100
            }
        );
        s.resize_to_display(100.0, 100.0, -2.0);
        assert_eq!(s.pixel_size().width, 100);
    }

    #[test]
    fn backing_matches_pixel_size_and_clears() {
        let mut s = Surface::new(10.0, 4.0);
        assert_eq!(s.backing_mut().len(), 40);
        s.backing_mut()[0] = 255;
        s.clear();
        assert_eq!(s.backing_mut()[0], 0);
    }

    #[test]
    fn observer_fallback_keeps_setup_size() {
        struct Blind;
        impl SizeObserver for Blind {
            fn observe(&mut self) -> Option<ObservedSize> {
                None
            }
        }
        let mut s = Surface::new(640.0, 480.0);
        assert!(!s.sync_from(&mut Blind));
        assert_eq!(
            s.pixel_size(),
            PixelSize {
                width: 640,
                height: 480
            }
        );
    }
}
