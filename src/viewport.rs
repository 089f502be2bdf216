use serde::{Deserialize, Serialize};

/// Pixel dimensions of a capture viewport or a design frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Round a fractional design bounding box to integer pixels.
    ///
    /// Returns `None` for non-finite or non-positive sizes, or when rounding
    /// collapses an edge to zero.
    pub fn from_design_box(width: f64, height: f64) -> Option<Self> {
        if !width.is_finite() || !height.is_finite() {
            return None;
        }
        let w = width.round();
        let h = height.round();
        if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
            return None;
        }
        Some(Self {
            width: w as u32,
            height: h as u32,
        })
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_box_rounds_to_nearest_pixel() {
        assert_eq!(
            Viewport::from_design_box(1439.6, 899.4),
            Some(Viewport::new(1440, 899))
        );
        assert_eq!(
            Viewport::from_design_box(375.5, 812.0),
            Some(Viewport::new(376, 812))
        );
    }

    #[test]
    fn design_box_rejects_degenerate_sizes() {
        assert_eq!(Viewport::from_design_box(0.4, 100.0), None);
        assert_eq!(Viewport::from_design_box(-3.0, 100.0), None);
        assert_eq!(Viewport::from_design_box(f64::NAN, 100.0), None);
    }

    #[test]
    fn displays_as_width_by_height() {
        let vp = Viewport::new(1920, 1080);
        assert_eq!(vp.to_string(), "1920x1080");
        assert_eq!(vp.pixel_count(), 1920 * 1080);
    }
}
