//! The drawable surface and how size changes reach a pipeline.
//!
//! A [`Viewport`] carries logical size and pixel density. When it comes from the host
//! through [`Viewport::from_physical`] it also remembers the exact pixel size the window
//! reported, so render targets always match the surface:
//!
//! ```
//! use strata::Viewport;
//!
//! let viewport = Viewport::from_physical(1001, 601, 1.5);
//! assert_eq!(viewport.physical_size(), (1001, 601));
//! ```

/// The drawable surface as the host reports it.
///
/// `width` and `height` are logical units; the pipeline sizes its targets from
/// [`physical_size`](Self::physical_size).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
    /// Physical pixels per logical unit.
    pub pixel_density: f32,
    /// Pixel size reported by the host, when known.
    physical: Option<(u32, u32)>,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_density: f32) -> Self {
        Self {
            width,
            height,
            pixel_density,
            physical: None,
        }
    }

    /// Builds a viewport from a window's physical size and scale factor.
    ///
    /// The logical size is rounded, the physical size is kept as given.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            width: (width as f64 / scale).round() as u32,
            height: (height as f64 / scale).round() as u32,
            pixel_density: scale as f32,
            physical: (width > 0 && height > 0).then_some((width, height)),
        }
    }

    /// A minimised window reports zero in one dimension.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixel_density > 0.0
    }

    /// Render target size in pixels.
    ///
    /// The host's exact size when known, otherwise `round(logical * density)`, at least
    /// 1x1.
    pub fn physical_size(&self) -> (u32, u32) {
        if let Some(size) = self.physical {
            return size;
        }
        let scale = |logical: u32| ((logical as f32 * self.pixel_density).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Width over height of the pixel area.
    pub fn aspect(&self) -> f32 {
        let (width, height) = self.physical_size();
        if self.height == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720, 1.0)
    }
}

/// Receives viewport changes from the host.
///
/// Delivery is synchronous and happens between frames, never during
/// [`Pipeline::execute`](crate::Pipeline::execute).
pub trait ViewportListener<B> {
    fn viewport_changed(&mut self, backend: &mut B, viewport: Viewport);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_rounds_and_scales() {
        assert_eq!(Viewport::new(800, 600, 1.0).physical_size(), (800, 600));
        assert_eq!(Viewport::new(800, 600, 2.0).physical_size(), (1600, 1200));
        assert_eq!(Viewport::new(801, 601, 1.5).physical_size(), (1202, 902));
        assert_eq!(Viewport::new(1, 1, 0.25).physical_size(), (1, 1));
    }

    #[test]
    fn zero_sized_is_invalid() {
        assert!(!Viewport::new(0, 600, 1.0).is_valid());
        assert!(!Viewport::new(800, 0, 1.0).is_valid());
        assert!(Viewport::new(1, 1, 1.0).is_valid());
        assert!(!Viewport::from_physical(0, 600, 1.5).is_valid());
    }

    #[test]
    fn from_physical_divides_out_scale() {
        let viewport = Viewport::from_physical(2560, 1440, 2.0);
        assert_eq!((viewport.width, viewport.height), (1280, 720));
        assert_eq!(viewport.physical_size(), (2560, 1440));
    }

    #[test]
    fn fractional_scale_keeps_the_window_pixel_size() {
        for (width, height, scale) in [
            (1001, 601, 1.5),
            (1001, 601, 1.25),
            (1367, 769, 1.25),
            (999, 333, 1.75),
            (3, 5, 1.5),
        ] {
            let viewport = Viewport::from_physical(width, height, scale);
            assert_eq!(viewport.physical_size(), (width, height), "{width}x{height} @ {scale}");
        }
    }

    #[test]
    fn aspect_uses_pixel_size() {
        let viewport = Viewport::from_physical(1001, 601, 1.5);
        assert!((viewport.aspect() - 1001.0 / 601.0).abs() < 1e-6);
    }
}
