//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate aspect-preserving dimensions that fit within `max` on the longer edge.
///
/// Returns `None` when no scaling is needed: the image already fits, or one of
/// the source dimensions is zero. Otherwise the longer edge becomes exactly
/// `max` and the shorter edge is rounded, but never below 1.
///
/// # Examples
/// ```
/// # use fedimage::imaging::scaling_dimensions;
/// assert_eq!(scaling_dimensions(2000, 1500, 1000), Some((1000, 750)));
/// assert_eq!(scaling_dimensions(800, 600, 1000), None);
/// ```
pub fn scaling_dimensions(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || (width <= max && height <= max) {
        return None;
    }

    if width >= height {
        // Landscape or square
        let ratio = max as f64 / width as f64;
        Some((max, ((height as f64 * ratio).round() as u32).max(1)))
    } else {
        // Portrait
        let ratio = max as f64 / height as f64;
        Some((((width as f64 * ratio).round() as u32).max(1), max))
    }
}

/// Calculate dimensions that bring an undersized image up to `min`.
///
/// - Both edges below `min`: the longer edge becomes `min`.
/// - Exactly one edge below `min`: that edge becomes `min`.
/// - Otherwise the dimensions are returned unchanged.
///
/// The other edge follows proportionally. Zero-sized input is returned as-is.
pub fn scale_up_dimensions(width: u32, height: u32, min: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let proportional = |edge: u32, target: u32, reference: u32| -> u32 {
        (edge as f64 * target as f64 / reference as f64).round() as u32
    };

    if width < min && height < min {
        if width > height {
            (min, proportional(height, min, width))
        } else {
            (proportional(width, min, height), min)
        }
    } else if width < min {
        (min, proportional(height, min, width))
    } else if height < min {
        (proportional(width, min, height), min)
    } else {
        (width, height)
    }
}

/// Normalize a clockwise rotation to a number of quarter turns (0-3).
///
/// Returns `None` for angles that are not a multiple of 90 degrees.
pub fn quarter_turns(degrees: i32) -> Option<u8> {
    let normalized = degrees.rem_euclid(360);
    if normalized % 90 != 0 {
        return None;
    }
    Some((normalized / 90) as u8)
}

/// Clamp a crop rectangle to the canvas.
///
/// Returns `None` when the clamped rectangle is empty.
pub fn clamp_crop(
    canvas: (u32, u32),
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let (canvas_w, canvas_h) = canvas;
    if x >= canvas_w || y >= canvas_h {
        return None;
    }
    let w = width.min(canvas_w - x);
    let h = height.min(canvas_h - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some((x, y, w, h))
}
