// imgnorm/src/processors/planner.rs
//! Target-dimension planning.
//!
//! Everything here is pure: the inputs are the current dimensions and the
//! run's [`ResizeSpec`], no image or filesystem access is needed.

use crate::core::{DimensionPair, ResizeError, ResizeSpec, Result, SizingRule};

/// Passing this as a target side leaves the dimensions unchanged.
pub const KEEP_ORIGINAL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Shorter,
    Longer,
}

/// Per-image outcome of the sizing rule: which side to scale, and to what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTarget {
    Unchanged,
    Shorter(u32),
    Longer(u32),
}

/// New dimensions for a `width` x `height` image under `spec`.
pub fn plan(width: u32, height: u32, spec: &ResizeSpec) -> Result<DimensionPair> {
    let target = choose_target(width, height, &spec.sizing, spec.truncate_multiplier)?;
    apply_target(width, height, target)
}

/// Picks the strategy for one image. Priority is `target_pixels`, then
/// `max_dim` (only when the longer side exceeds it), then `min_dim` (only
/// when the shorter side falls below it).
///
/// `target_pixels` is not gated on the image being out of bounds, so it can
/// upscale.
pub fn choose_target(
    width: u32,
    height: u32,
    rule: &SizingRule,
    truncate_multiplier: u32,
) -> Result<ResizeTarget> {
    ensure_positive(width, height)?;

    match *rule {
        SizingRule::TargetPixels(pixels) => Ok(ResizeTarget::Shorter(truncated_shorter_side(
            width,
            height,
            pixels,
            truncate_multiplier,
        )?)),
        SizingRule::Bounds { max_dim, min_dim } => {
            let shorter = width.min(height);
            let longer = width.max(height);

            if let Some(max_dim) = max_dim.filter(|&max_dim| longer > max_dim) {
                return Ok(ResizeTarget::Longer(max_dim));
            }
            if let Some(min_dim) = min_dim.filter(|&min_dim| shorter < min_dim) {
                return Ok(ResizeTarget::Shorter(min_dim));
            }
            Ok(ResizeTarget::Unchanged)
        }
        SizingRule::Passthrough => Ok(ResizeTarget::Unchanged),
    }
}

pub fn apply_target(width: u32, height: u32, target: ResizeTarget) -> Result<DimensionPair> {
    match target {
        ResizeTarget::Unchanged => {
            ensure_positive(width, height)?;
            Ok(DimensionPair::new(width, height))
        }
        ResizeTarget::Shorter(side) => fit_side(width, height, i64::from(side), Side::Shorter),
        ResizeTarget::Longer(side) => fit_side(width, height, i64::from(side), Side::Longer),
    }
}

/// Shorter-side target for `target_pixels`, floored to a multiple of
/// `truncate_multiplier`.
pub fn truncated_shorter_side(
    width: u32,
    height: u32,
    target_pixels: u64,
    truncate_multiplier: u32,
) -> Result<u32> {
    ensure_positive(width, height)?;
    if target_pixels == 0 || truncate_multiplier == 0 {
        return Err(ResizeError::Validation(
            "target_pixels and truncate_multiplier must be positive".to_string(),
        ));
    }

    let area = f64::from(width) * f64::from(height);
    let scale = (target_pixels as f64 / area).sqrt();
    let scaled_shorter = f64::from(width.min(height)) * scale;
    let multiplier = f64::from(truncate_multiplier);
    let side = (scaled_shorter / multiplier).floor() * multiplier;

    if side < 1.0 || side > f64::from(u32::MAX) {
        return Err(ResizeError::Validation(format!(
            "target_pixels {} gives no usable shorter side for {}x{} at a multiple of {}",
            target_pixels, width, height, truncate_multiplier
        )));
    }

    Ok(side as u32)
}

/// Scales the chosen side to `target_side` and the other side in
/// proportion, rounding half to even. The result keeps the original
/// orientation: the longer value goes to the width only when
/// `width > height`.
///
/// A target of [`KEEP_ORIGINAL`] returns the input unchanged. A computed
/// side that rounds to zero is clamped to one pixel.
pub fn fit_side(width: u32, height: u32, target_side: i64, side: Side) -> Result<DimensionPair> {
    ensure_positive(width, height)?;

    if target_side == KEEP_ORIGINAL {
        return Ok(DimensionPair::new(width, height));
    }

    let target = u32::try_from(target_side)
        .ok()
        .filter(|&t| t > 0)
        .ok_or_else(|| {
            ResizeError::Validation(format!(
                "target side must be a positive integer, got {}",
                target_side
            ))
        })?;

    let shorter = f64::from(width.min(height));
    let longer = f64::from(width.max(height));

    let (new_shorter, new_longer) = match side {
        Side::Longer => (round_side(f64::from(target) * (shorter / longer)), target),
        Side::Shorter => (target, round_side(f64::from(target) * (longer / shorter))),
    };

    if width > height {
        Ok(DimensionPair::new(new_longer, new_shorter))
    } else {
        Ok(DimensionPair::new(new_shorter, new_longer))
    }
}

fn round_side(value: f64) -> u32 {
    value.round_ties_even().clamp(1.0, f64::from(u32::MAX)) as u32
}

fn ensure_positive(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ResizeError::Validation(format!(
            "width and height must be positive integers, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResizeConfig;

    fn spec_with(min_dim: Option<u32>, max_dim: Option<u32>, target_pixels: Option<u64>) -> ResizeSpec {
        ResizeConfig {
            min_dim,
            max_dim,
            target_pixels,
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    fn dims(width: u32, height: u32) -> DimensionPair {
        DimensionPair::new(width, height)
    }

    #[test]
    fn min_dim_leaves_images_already_above_it() {
        // the shorter side 1000 is not below 500, so nothing is scaled down
        let spec = spec_with(Some(500), None, None);
        assert_eq!(plan(1000, 2000, &spec).unwrap(), dims(1000, 2000));
        assert_eq!(
            choose_target(1000, 2000, &spec.sizing, spec.truncate_multiplier).unwrap(),
            ResizeTarget::Unchanged
        );
    }

    #[test]
    fn shorter_side_landscape_and_portrait() {
        assert_eq!(fit_side(1920, 1080, 720, Side::Shorter).unwrap(), dims(1280, 720));
        assert_eq!(fit_side(1080, 1920, 720, Side::Shorter).unwrap(), dims(720, 1280));
        assert_eq!(fit_side(1000, 1000, 500, Side::Shorter).unwrap(), dims(500, 500));
        assert_eq!(fit_side(1000, 500, 250, Side::Shorter).unwrap(), dims(500, 250));
        assert_eq!(fit_side(500, 1000, 250, Side::Shorter).unwrap(), dims(250, 500));
    }

    #[test]
    fn rounds_fractional_sides() {
        // 835 / 600 * 400 = 556.67
        assert_eq!(fit_side(835, 600, 400, Side::Shorter).unwrap(), dims(557, 400));
        // 512 * 0.9 = 460.8
        assert_eq!(fit_side(1000, 512, 900, Side::Longer).unwrap(), dims(900, 461));
    }

    #[test]
    fn rounds_half_to_even() {
        // 5 * (3 / 6) = 2.5 -> 2, 7 * (3 / 6) = 3.5 -> 4
        assert_eq!(fit_side(6, 3, 5, Side::Longer).unwrap(), dims(5, 2));
        assert_eq!(fit_side(6, 3, 7, Side::Longer).unwrap(), dims(7, 4));
    }

    #[test]
    fn longer_side() {
        assert_eq!(fit_side(2000, 400, 1000, Side::Longer).unwrap(), dims(1000, 200));
    }

    #[test]
    fn keep_original_sentinel() {
        assert_eq!(fit_side(835, 600, KEEP_ORIGINAL, Side::Shorter).unwrap(), dims(835, 600));
        assert_eq!(fit_side(2000, 400, KEEP_ORIGINAL, Side::Longer).unwrap(), dims(2000, 400));
    }

    #[test]
    fn rejects_non_positive_inputs() {
        assert!(matches!(
            fit_side(835, 600, -400, Side::Shorter),
            Err(ResizeError::Validation(_))
        ));
        assert!(matches!(
            fit_side(835, 600, 0, Side::Shorter),
            Err(ResizeError::Validation(_))
        ));
        assert!(matches!(
            fit_side(835, 0, 400, Side::Shorter),
            Err(ResizeError::Validation(_))
        ));
        assert!(matches!(
            fit_side(0, 600, 400, Side::Longer),
            Err(ResizeError::Validation(_))
        ));
        assert!(plan(0, 10, &spec_with(None, None, None)).is_err());
    }

    #[test]
    fn orientation_is_preserved() {
        let sizes = [1, 2, 3, 7, 31, 100, 333, 1080, 1920, 4001];
        for &w in &sizes {
            for &h in &sizes {
                for &target in &[1i64, 5, 64, 720, 5000] {
                    for side in [Side::Shorter, Side::Longer] {
                        let out = fit_side(w, h, target, side).unwrap();
                        if w > h {
                            assert!(out.width >= out.height, "{}x{} -> {}", w, h, out);
                        } else {
                            assert!(out.width <= out.height, "{}x{} -> {}", w, h, out);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn scenario_shorter_side_target() {
        assert_eq!(fit_side(1000, 2000, 500, Side::Shorter).unwrap(), dims(500, 1000));
    }

    #[test]
    fn scenario_max_dim_on_longer_side() {
        let spec = spec_with(None, Some(2000), None);
        assert_eq!(plan(4000, 1000, &spec).unwrap(), dims(2000, 500));
    }

    #[test]
    fn scenario_target_pixels() {
        let spec = spec_with(None, None, Some(1_000_000));
        assert_eq!(plan(2000, 1000, &spec).unwrap(), dims(1408, 704));
    }

    #[test]
    fn min_dim_upscales_small_images() {
        let spec = spec_with(Some(512), None, None);
        assert_eq!(plan(256, 128, &spec).unwrap(), dims(1024, 512));
    }

    #[test]
    fn max_dim_beats_min_dim() {
        // shorter side is below min_dim, but the longer side is over max_dim
        let spec = spec_with(Some(800), Some(1000), None);
        assert_eq!(plan(2000, 500, &spec).unwrap(), dims(1000, 250));
        // within max_dim, so min_dim applies
        assert_eq!(plan(900, 500, &spec).unwrap(), dims(1440, 800));
    }

    #[test]
    fn target_pixels_beats_bounds() {
        let spec = spec_with(Some(512), Some(3072), Some(1_000_000));
        assert_eq!(plan(2000, 1000, &spec).unwrap(), dims(1408, 704));
    }

    #[test]
    fn target_pixels_may_upscale() {
        let spec = spec_with(None, None, Some(1_000_000));
        let out = plan(200, 100, &spec).unwrap();
        assert_eq!(out, dims(1408, 704));
    }

    #[test]
    fn target_pixels_side_is_multiple_of_multiplier() {
        for multiplier in [8u32, 32, 64] {
            for &(w, h) in &[(4000u32, 3000u32), (1234, 5678), (999, 999), (3000, 1000)] {
                for pixels in [300_000u64, 1_000_000, 1_310_720] {
                    let side = truncated_shorter_side(w, h, pixels, multiplier).unwrap();
                    assert_eq!(side % multiplier, 0);
                    let out = plan(
                        w,
                        h,
                        &ResizeConfig {
                            target_pixels: Some(pixels),
                            truncate_multiplier: multiplier,
                            ..Default::default()
                        }
                        .validate()
                        .unwrap(),
                    )
                    .unwrap();
                    assert_eq!(out.shorter(), side);
                }
            }
        }
    }

    #[test]
    fn target_pixels_too_small_is_rejected() {
        let spec = spec_with(None, None, Some(16));
        assert!(matches!(plan(2000, 1000, &spec), Err(ResizeError::Validation(_))));
    }

    #[test]
    fn conforming_images_are_untouched() {
        let spec = spec_with(Some(512), Some(2048), None);
        let first = plan(1024, 768, &spec).unwrap();
        assert_eq!(first, dims(1024, 768));
        let second = plan(first.width, first.height, &spec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn planning_is_stable_after_bounds_resize() {
        let spec = spec_with(None, Some(2000), None);
        let first = plan(4000, 1000, &spec).unwrap();
        let second = plan(first.width, first.height, &spec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn extreme_aspect_is_clamped_to_one_pixel() {
        let spec = spec_with(None, Some(100), None);
        assert_eq!(plan(10_000, 1, &spec).unwrap(), dims(100, 1));
    }

    #[test]
    fn passthrough_is_identity() {
        let spec = spec_with(None, None, None);
        assert_eq!(plan(123, 456, &spec).unwrap(), dims(123, 456));
    }
}
