//! 2D region-warp mouth backend.
//!
//! For avatars that are a single flat image. Each application redraws the
//! base frame, cuts a fixed proportional mouth region out of the source,
//! scales it according to the [`MouthShape`], paints over the original mouth
//! area with a sampled skin tone and composites the scaled region back,
//! centred on the same point.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

use super::surface::MouthSurface;
use crate::error::Result;
use crate::viseme::{MouthShape, MouthTarget};

/// Mouth location as fractions of the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthRegion {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for MouthRegion {
    fn default() -> Self {
        Self {
            left: 0.35,
            top: 0.62,
            right: 0.65,
            bottom: 0.80,
        }
    }
}

impl MouthRegion {
    /// Pixel rectangle `(x, y, w, h)` inside a `width × height` image.
    ///
    /// Always at least 1×1 and fully inside the image.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let frac = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let (l, r) = (frac(self.left).min(frac(self.right)), frac(self.left).max(frac(self.right)));
        let (t, b) = (frac(self.top).min(frac(self.bottom)), frac(self.top).max(frac(self.bottom)));

        let w_max = width.saturating_sub(1);
        let h_max = height.saturating_sub(1);
        let x = ((l * width as f32).round() as u32).min(w_max);
        let y = ((t * height as f32).round() as u32).min(h_max);
        let w = ((r - l) * width as f32).round().max(1.0) as u32;
        let h = ((b - t) * height as f32).round().max(1.0) as u32;
        (x, y, w.min(width - x), h.min(height - y))
    }
}

/// Horizontal and vertical scale factors for a shape at `intensity`.
pub fn shape_scale(shape: MouthShape, intensity: f32) -> (f32, f32) {
    let i = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    match shape {
        MouthShape::Neutral => (1.0, 1.0),
        MouthShape::Closed => (1.0, 1.0 - 0.10 * i),
        MouthShape::Open => (1.0, 1.0 + 0.35 * i),
        MouthShape::Wide => (1.0 + 0.20 * i, 1.0 + 0.45 * i),
        MouthShape::Smile => (1.0 + 0.15 * i, 1.0 - 0.15 * i),
        MouthShape::Round => (1.0 - 0.15 * i, 1.0 + 0.20 * i),
    }
}

/// A flat avatar image with a warpable mouth.
#[derive(Debug, Clone)]
pub struct RegionWarpCanvas {
    base: RgbaImage,
    frame: RgbaImage,
    region: MouthRegion,
    last_scale: (f32, f32),
}

impl RegionWarpCanvas {
    pub fn new(base: RgbaImage, region: MouthRegion) -> Self {
        Self {
            frame: base.clone(),
            base,
            region,
            last_scale: (1.0, 1.0),
        }
    }

    /// Load the avatar image from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    pub fn open(path: &Path, region: MouthRegion) -> Result<Self> {
        let base = image::open(path)?.to_rgba8();
        debug!(path = %path.display(), width = base.width(), height = base.height(), "avatar image loaded");
        Ok(Self::new(base, region))
    }

    /// The most recently composed frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Scale factors used for the most recent frame.
    pub fn last_scale(&self) -> (f32, f32) {
        self.last_scale
    }

    pub fn region(&self) -> MouthRegion {
        self.region
    }

    /// Write the current frame to disk (format from extension).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save_frame(&self, path: &Path) -> Result<()> {
        self.frame.save(path)?;
        Ok(())
    }

    /// Colour just above the mouth, used to paint over the original region.
    fn skin_sample(&self, x: u32, y: u32, w: u32) -> Rgba<u8> {
        let sx = x + w / 2;
        let sy = y.saturating_sub(2);
        *self.base.get_pixel(sx.min(self.base.width() - 1), sy)
    }
}

impl MouthSurface for RegionWarpCanvas {
    fn apply_mouth_shape(&mut self, target: &MouthTarget, intensity: f32) {
        self.frame.clone_from(&self.base);

        let (sx, sy) = shape_scale(target.shape, intensity);
        self.last_scale = (sx, sy);
        if (sx - 1.0).abs() < f32::EPSILON && (sy - 1.0).abs() < f32::EPSILON {
            return;
        }
        if self.base.width() == 0 || self.base.height() == 0 {
            return;
        }

        let (x, y, w, h) = self.region.to_pixels(self.base.width(), self.base.height());
        let mouth = imageops::crop_imm(&self.base, x, y, w, h).to_image();
        let new_w = ((w as f32 * sx).round() as u32).max(1);
        let new_h = ((h as f32 * sy).round() as u32).max(1);
        let warped = imageops::resize(&mouth, new_w, new_h, FilterType::Triangle);

        let skin = self.skin_sample(x, y, w);
        for py in y..y + h {
            for px in x..x + w {
                self.frame.put_pixel(px, py, skin);
            }
        }

        let cx = i64::from(x) + i64::from(w) / 2;
        let cy = i64::from(y) + i64::from(h) / 2;
        imageops::overlay(
            &mut self.frame,
            &warped,
            cx - i64::from(new_w) / 2,
            cy - i64::from(new_h) / 2,
        );
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::viseme::VisemeMapping;

    const SKIN: Rgba<u8> = Rgba([220, 180, 150, 255]);
    const LIP: Rgba<u8> = Rgba([160, 40, 60, 255]);

    /// 100×100 skin-coloured face with a lip-coloured mouth band.
    fn face() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(100, 100, SKIN);
        for y in 66..76 {
            for x in 38..62 {
                img.put_pixel(x, y, LIP);
            }
        }
        img
    }

    fn lip_rows(img: &RgbaImage) -> usize {
        (0..img.height())
            .filter(|y| img.get_pixel(50, *y) == &LIP)
            .count()
    }

    fn lip_cols(img: &RgbaImage) -> usize {
        (0..img.width())
            .filter(|x| img.get_pixel(*x, 70) == &LIP)
            .count()
    }

    #[test]
    fn region_maps_to_pixels() {
        let (x, y, w, h) = MouthRegion::default().to_pixels(100, 100);
        assert_eq!((x, y, w, h), (35, 62, 30, 18));
    }

    #[test]
    fn degenerate_region_is_still_inside_image() {
        let region = MouthRegion {
            left: 1.2,
            top: f32::NAN,
            right: 0.99,
            bottom: 0.99,
        };
        let (x, y, w, h) = region.to_pixels(10, 10);
        assert!(x + w <= 10 && y + h <= 10);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn shape_scales_follow_geometry() {
        assert_eq!(shape_scale(MouthShape::Neutral, 1.0), (1.0, 1.0));
        let (sx, sy) = shape_scale(MouthShape::Open, 1.0);
        assert_eq!(sx, 1.0);
        assert!(sy > 1.0);
        let (sx, sy) = shape_scale(MouthShape::Smile, 1.0);
        assert!(sx > 1.0 && sy < 1.0);
        let (sx, sy) = shape_scale(MouthShape::Round, 1.0);
        assert!(sx < 1.0 && sy > 1.0);
        assert_eq!(shape_scale(MouthShape::Wide, 0.0), (1.0, 1.0));
    }

    #[test]
    fn neutral_frame_equals_base() {
        let mut canvas = RegionWarpCanvas::new(face(), MouthRegion::default());
        canvas.reset_mouth();
        assert_eq!(canvas.frame(), &face());
    }

    #[test]
    fn open_shape_stretches_mouth_vertically() {
        let mut canvas = RegionWarpCanvas::new(face(), MouthRegion::default());
        let (target, _, _) = VisemeMapping::default().resolve(4);
        assert_eq!(target.shape, MouthShape::Open);
        canvas.apply_mouth_shape(&target, 1.0);
        assert!(lip_rows(canvas.frame()) > lip_rows(&face()));
        assert_eq!(lip_cols(canvas.frame()), lip_cols(&face()));
        // Outside the mouth area nothing moved.
        assert_eq!(canvas.frame().get_pixel(5, 5), &SKIN);
    }

    #[test]
    fn wide_shape_stretches_both_axes() {
        let mut canvas = RegionWarpCanvas::new(face(), MouthRegion::default());
        let (target, intensity, _) = VisemeMapping::default().resolve(10);
        assert_eq!(target.shape, MouthShape::Wide);
        canvas.apply_mouth_shape(&target, intensity);
        assert!(lip_rows(canvas.frame()) > lip_rows(&face()));
        assert!(lip_cols(canvas.frame()) > lip_cols(&face()));
    }

    #[test]
    fn smile_shape_widens_and_flattens() {
        let mut canvas = RegionWarpCanvas::new(face(), MouthRegion::default());
        let (target, _, _) = VisemeMapping::default().resolve(11);
        canvas.apply_mouth_shape(&target, 1.0);
        assert!(lip_cols(canvas.frame()) > lip_cols(&face()));
        assert!(lip_rows(canvas.frame()) <= lip_rows(&face()));
    }

    #[test]
    fn each_frame_redraws_from_base() {
        let mut canvas = RegionWarpCanvas::new(face(), MouthRegion::default());
        let (target, intensity, _) = VisemeMapping::default().resolve(10);
        canvas.apply_mouth_shape(&target, intensity);
        canvas.apply_mouth_shape(&target, intensity);
        let once = {
            let mut c = RegionWarpCanvas::new(face(), MouthRegion::default());
            c.apply_mouth_shape(&target, intensity);
            c.frame().clone()
        };
        assert_eq!(canvas.frame(), &once);
    }

    #[test]
    fn open_missing_file_is_an_error() {
        let err = RegionWarpCanvas::open(Path::new("/nonexistent/avatar.png"), MouthRegion::default());
        assert!(err.is_err());
    }

    #[test]
    fn save_and_reload_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut canvas = RegionWarpCanvas::new(face(), MouthRegion::default());
        let (target, intensity, _) = VisemeMapping::default().resolve(13);
        canvas.apply_mouth_shape(&target, intensity);
        canvas.save_frame(&path).unwrap();

        let reloaded = RegionWarpCanvas::open(&path, MouthRegion::default()).unwrap();
        assert_eq!(reloaded.frame(), canvas.frame());
    }
}
