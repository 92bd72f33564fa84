//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest dimensions that fit inside `bounds` while keeping the aspect
/// ratio of `source`. Never enlarges: a source already inside the box is
/// returned unchanged.
///
/// Integer arithmetic keeps the result deterministic; the constrained axis
/// matches the box exactly and the other axis is rounded to nearest, never
/// below 1.
///
/// # Examples
/// ```
/// # use rasterforge::imaging::calculations::fit_within;
/// assert_eq!(fit_within((4000, 3000), (800, 800)), (800, 600));
/// assert_eq!(fit_within((300, 200), (800, 800)), (300, 200));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (box_w, box_h) = bounds;

    if src_w <= box_w && src_h <= box_h {
        return source;
    }

    let (sw, sh, bw, bh) = (src_w as u64, src_h as u64, box_w as u64, box_h as u64);
    if sw * bh >= sh * bw {
        // Width-limited
        let h = (sh * bw + sw / 2) / sw;
        (box_w, h.clamp(1, bh) as u32)
    } else {
        // Height-limited
        let w = (sw * bh + sh / 2) / sh;
        (w.clamp(1, bw) as u32, box_h)
    }
}

/// Scale so the longer edge is at most `max_edge`. Never enlarges.
pub fn fit_longest_side(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    fit_within(source, (max_edge, max_edge))
}

/// Scale both axes by `percent` (100 = unchanged). Each axis is floored and
/// kept at least 1px.
///
/// The result is wide enough to hold any `u32` source at any `u32` percent;
/// callers check it against their ceiling before narrowing.
pub fn scale_by_percent(source: (u32, u32), percent: u32) -> (u64, u64) {
    let (w, h) = source;
    let scale = |v: u32| ((v as u64 * percent as u64) / 100).max(1);
    (scale(w), scale(h))
}

/// Centered region of `source` with the aspect ratio of `target` (crop
/// before resize).
///
/// The region is as large as the source allows: one axis spans the whole
/// source, the other is trimmed equally from both sides. Resampling the
/// region to `target` then fills it exactly, and nothing larger than the
/// source or the target is ever allocated.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(left, top, width, height)` - Region inside the source, at least 1x1
pub fn cover_crop_region(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = (source.0 as u64, source.1 as u64);
    let (tgt_w, tgt_h) = (target.0.max(1) as u64, target.1.max(1) as u64);

    if src_w * tgt_h > src_h * tgt_w {
        // Source is wider: keep full height, trim the sides
        let w = ((src_h * tgt_w + tgt_h / 2) / tgt_h).clamp(1, src_w);
        ((src_w - w) as u32 / 2, 0, w as u32, source.1)
    } else {
        // Source is taller (or same ratio): keep full width, trim top and bottom
        let h = ((src_w * tgt_h + tgt_w / 2) / tgt_w).clamp(1, src_h);
        (0, (src_h - h) as u32 / 2, source.0, h as u32)
    }
}

/// Side length of the square canvas that holds `content` plus `padding` on
/// every side.
pub fn canvas_side(content: (u32, u32), padding: u32) -> u64 {
    content.0.max(content.1) as u64 + 2 * padding as u64
}

/// Top-left offset that centers `inner` inside `outer`. Any odd remainder
/// goes to the right/bottom side.
pub fn centered_offset(outer: (u32, u32), inner: (u32, u32)) -> (i64, i64) {
    (
        (outer.0 as i64 - inner.0 as i64).div_euclid(2),
        (outer.1 as i64 - inner.1 as i64).div_euclid(2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn fit_landscape_into_square_box() {
        assert_eq!(fit_within((4000, 3000), (800, 800)), (800, 600));
    }

    #[test]
    fn fit_portrait_into_square_box() {
        assert_eq!(fit_within((3000, 4000), (800, 800)), (600, 800));
    }

    #[test]
    fn fit_never_enlarges() {
        assert_eq!(fit_within((300, 200), (800, 800)), (300, 200));
        assert_eq!(fit_within((800, 800), (800, 800)), (800, 800));
    }

    #[test]
    fn fit_height_limited_box() {
        // 1000x500 into 900x300: height limits, width = 600
        assert_eq!(fit_within((1000, 500), (900, 300)), (600, 300));
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within((10_000, 1), (100, 100)), (100, 1));
        assert_eq!(fit_within((1, 10_000), (100, 100)), (1, 100));
    }

    #[test]
    fn fit_stays_inside_box_and_near_aspect() {
        let sources = [(1920, 1080), (1081, 607), (333, 777), (4000, 3001), (17, 5)];
        let boxes = [(100, 100), (640, 480), (50, 300), (7, 9)];
        for &src in &sources {
            for &bounds in &boxes {
                let (w, h) = fit_within(src, bounds);
                assert!(w <= bounds.0 && h <= bounds.1, "{src:?} in {bounds:?} -> {w}x{h}");
                assert!(w >= 1 && h >= 1);
                if (w, h) != src {
                    let got = w as f64 / h as f64;
                    let want = src.0 as f64 / src.1 as f64;
                    assert!(
                        (got - want).abs() < 1.0 / (w.min(h) as f64),
                        "{src:?} in {bounds:?} -> {w}x{h}"
                    );
                }
            }
        }
    }

    #[test]
    fn fit_longest_side_landscape() {
        assert_eq!(fit_longest_side((3200, 2400), 1600), (1600, 1200));
    }

    // =========================================================================
    // scale_by_percent tests
    // =========================================================================

    #[test]
    fn percent_scaling_floors() {
        assert_eq!(scale_by_percent((1000, 750), 50), (500, 375));
        assert_eq!(scale_by_percent((333, 333), 50), (166, 166));
    }

    #[test]
    fn percent_scaling_keeps_one_pixel() {
        assert_eq!(scale_by_percent((10, 10), 1), (1, 1));
    }

    #[test]
    fn percent_scaling_does_not_truncate() {
        // 200 * 2_147_483_698 / 100 does not fit in u32
        assert_eq!(
            scale_by_percent((200, 200), 2_147_483_698),
            (4_294_967_396, 4_294_967_396)
        );
        assert_eq!(
            scale_by_percent((u32::MAX, 1), u32::MAX),
            (u32::MAX as u64 * u32::MAX as u64 / 100, 42_949_672)
        );
    }

    // =========================================================================
    // cover_crop_region tests
    // =========================================================================

    #[test]
    fn cover_wider_source_trims_sides() {
        // 3000x1000 (3:1) → 16:9 keeps height 1000, width 1778
        assert_eq!(cover_crop_region((3000, 1000), (1280, 720)), (611, 0, 1778, 1000));
    }

    #[test]
    fn cover_taller_source_trims_top_and_bottom() {
        // 1000x1000 → 16:9 keeps width 1000, height 563
        assert_eq!(cover_crop_region((1000, 1000), (1280, 720)), (0, 218, 1000, 563));
    }

    #[test]
    fn cover_same_aspect_ratio_is_whole_source() {
        assert_eq!(cover_crop_region((1920, 1080), (1280, 720)), (0, 0, 1920, 1080));
        assert_eq!(cover_crop_region((800, 600), (400, 300)), (0, 0, 800, 600));
    }

    #[test]
    fn cover_extreme_aspect_stays_inside_source() {
        assert_eq!(cover_crop_region((2, 2000), (1280, 720)), (0, 999, 2, 1));
        assert_eq!(cover_crop_region((4000, 2), (1280, 720)), (1998, 0, 4, 2));
        assert_eq!(cover_crop_region((1, 1), (1280, 720)), (0, 0, 1, 1));
    }

    #[test]
    fn cover_region_never_exceeds_source() {
        let sources = [(1, 5000), (5000, 1), (1081, 607), (333, 777), (17, 5)];
        for &src in &sources {
            let (left, top, w, h) = cover_crop_region(src, (1280, 720));
            assert!(w >= 1 && h >= 1);
            assert!(left + w <= src.0 && top + h <= src.1, "{src:?}");
        }
    }

    // =========================================================================
    // canvas geometry tests
    // =========================================================================

    #[test]
    fn canvas_side_uses_longer_edge_plus_padding() {
        assert_eq!(canvas_side((300, 500), 0), 500);
        assert_eq!(canvas_side((300, 500), 20), 540);
    }

    #[test]
    fn centered_offset_even_and_odd() {
        assert_eq!(centered_offset((540, 540), (300, 500)), (120, 20));
        // Remainder of 1 lands on the right side
        assert_eq!(centered_offset((101, 101), (50, 100)), (25, 0));
    }
}
