//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Images are never upscaled: every result fits within the source.

/// Calculate the output size of a fit-inside resize.
///
/// A zero `width` or `height` leaves that side unconstrained; it follows the
/// source aspect ratio. Both zero returns the source size.
///
/// # Examples
/// ```
/// # use imgapi::imaging::calculate_fit_dimensions;
/// // Width only: 800x600 → 200x150
/// assert_eq!(calculate_fit_dimensions((800, 600), (200, 0)), (200, 150));
///
/// // Box: 800x600 into 200x200 → 200x150
/// assert_eq!(calculate_fit_dimensions((800, 600), (200, 200)), (200, 150));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if src_w == 0 || src_h == 0 || (tgt_w == 0 && tgt_h == 0) {
        return source;
    }

    let scale_w = if tgt_w == 0 {
        f64::INFINITY
    } else {
        tgt_w as f64 / src_w as f64
    };
    let scale_h = if tgt_h == 0 {
        f64::INFINITY
    } else {
        tgt_h as f64 / src_h as f64
    };
    let scale = scale_w.min(scale_h).min(1.0);

    (scale_side(src_w, scale), scale_side(src_h, scale))
}

/// Calculate the exact output size of a crop.
///
/// A zero side takes the other side's value (square crop). If the box is
/// larger than the source it is shrunk, keeping its aspect ratio, until it
/// fits.
pub fn calculate_crop_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = match target {
        (0, h) => (h, h),
        (w, 0) => (w, w),
        box_size => box_size,
    };

    if src_w == 0 || src_h == 0 || tgt_w == 0 {
        return source;
    }

    let scale = (src_w as f64 / tgt_w as f64)
        .min(src_h as f64 / tgt_h as f64)
        .min(1.0);

    (scale_side(tgt_w, scale), scale_side(tgt_h, scale))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h)
    }
}

fn scale_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}
