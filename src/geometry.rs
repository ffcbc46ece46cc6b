// src/geometry.rs

//! Small geometry types and the layout math used by the views.
//!
//! All drawing in this application is anchor-centered: draw calls receive a
//! center point and the renderer derives the top-left placement from the
//! drawn content's own dimensions. The helpers here keep that convention in
//! one place.

/// A point in surface pixel coordinates. Signed so that layout math may
/// produce off-surface positions; clipping happens at blit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// A pixel extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }
}

/// An axis-aligned rectangle, position signed for the same reason as `Point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// The geometric center of the circular panel. The canvas needs a 7px
/// vertical offset relative to the true center of the 480px panel; circular
/// screens are weird.
pub const RENDER_CENTER: Point = Point::new(240, 247);

/// Derives the top-left corner for content of `size` centered on `anchor`.
pub fn anchored_top_left(anchor: Point, size: Size) -> Point {
    Point::new(
        anchor.x - size.width as i32 / 2,
        anchor.y - size.height as i32 / 2,
    )
}

/// Linearly remaps `v` from `[in_lo, in_hi]` onto `[out_lo, out_hi]`.
/// The caller must ensure `in_hi != in_lo`.
pub fn remap(v: i64, in_lo: i64, in_hi: i64, out_lo: i64, out_hi: i64) -> i64 {
    (v - in_lo) * (out_hi - out_lo) / (in_hi - in_lo) + out_lo
}

/// Splits a whole-second duration into `(minutes, seconds)`.
/// Durations of 100 minutes or more render wider than two digits; typical
/// tracks never get there.
pub fn format_time(total_secs: u32) -> (u32, u32) {
    (total_secs / 60, total_secs % 60)
}

/// Renders a whole-second duration as zero-padded `MM:SS`.
pub fn mmss(total_secs: u32) -> String {
    let (m, s) = format_time(total_secs);
    format!("{:02}:{:02}", m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_maps_endpoints_and_midpoint() {
        assert_eq!(remap(0, 0, 100, 0, 200), 0);
        assert_eq!(remap(50, 0, 100, 0, 200), 100);
        assert_eq!(remap(100, 0, 100, 0, 200), 200);
    }

    #[test]
    fn remap_handles_shifted_ranges() {
        assert_eq!(remap(15, 10, 20, 100, 200), 150);
    }

    #[test]
    fn format_time_splits_minutes_and_seconds() {
        assert_eq!(format_time(125), (2, 5));
        assert_eq!(format_time(59), (0, 59));
        assert_eq!(format_time(3600), (60, 0));
    }

    #[test]
    fn mmss_zero_pads_both_fields() {
        assert_eq!(mmss(125), "02:05");
        assert_eq!(mmss(59), "00:59");
        assert_eq!(mmss(0), "00:00");
    }

    #[test]
    fn anchored_top_left_centers_content_on_anchor() {
        let tl = anchored_top_left(Point::new(100, 100), Size::new(40, 20));
        assert_eq!(tl, Point::new(80, 90));
    }

    #[test]
    fn anchored_top_left_may_go_negative() {
        let tl = anchored_top_left(Point::new(5, 5), Size::new(40, 20));
        assert_eq!(tl, Point::new(-15, -5));
    }
}
