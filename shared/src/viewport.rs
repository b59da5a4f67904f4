use serde::{Deserialize, Serialize};

use crate::bounds::Extent;

/// Resolution (map units per pixel) at zoom 0 for 256 px Web Mercator tiles.
pub const MAX_RESOLUTION: f64 = 156_543.033_928_041;
const METERS_PER_INCH: f64 = 0.0254;
const SCREEN_DPI: f64 = 96.0;

/// Center + resolution of the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub center_x: f64,
    pub center_y: f64,
    pub resolution: f64,
}

impl View {
    pub fn new(center_x: f64, center_y: f64, resolution: f64) -> Self {
        Self {
            center_x,
            center_y,
            resolution,
        }
    }

    pub fn zoom(&self) -> f64 {
        (MAX_RESOLUTION / self.resolution).log2()
    }

    pub fn resolution_for_zoom(zoom: f64) -> f64 {
        MAX_RESOLUTION / zoom.exp2()
    }

    /// Resolution that renders the map at `1:scale` on a 96 DPI screen.
    pub fn resolution_for_scale(scale: f64) -> f64 {
        scale * METERS_PER_INCH / SCREEN_DPI
    }

    /// Convert map coordinates to pixel coordinates on a canvas of `size`.
    pub fn world_to_screen(&self, x: f64, y: f64, size: (f64, f64)) -> (f64, f64) {
        (
            (x - self.center_x) / self.resolution + size.0 / 2.0,
            (self.center_y - y) / self.resolution + size.1 / 2.0,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64, size: (f64, f64)) -> (f64, f64) {
        (
            (sx - size.0 / 2.0) * self.resolution + self.center_x,
            self.center_y - (sy - size.1 / 2.0) * self.resolution,
        )
    }

    pub fn visible_extent(&self, size: (f64, f64)) -> Extent {
        let half_w = size.0 * self.resolution / 2.0;
        let half_h = size.1 * self.resolution / 2.0;
        Extent::new(
            self.center_x - half_w,
            self.center_y - half_h,
            self.center_x + half_w,
            self.center_y + half_h,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub padding_px: f64,
    pub max_zoom: f64,
    pub duration_ms: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding_px: 50.0,
            max_zoom: 18.0,
            duration_ms: 400.0,
        }
    }
}

/// View that shows `extent` inside a `size` canvas, leaving `padding_px` on every side.
///
/// Degenerate extents (a single point) zoom to `max_zoom`. Returns `None` when the padded
/// canvas has no room left.
pub fn fit_extent(extent: &Extent, size: (f64, f64), options: &FitOptions) -> Option<View> {
    let avail_w = size.0 - options.padding_px * 2.0;
    let avail_h = size.1 - options.padding_px * 2.0;
    if avail_w <= 0.0 || avail_h <= 0.0 {
        return None;
    }

    let resolution = (extent.width() / avail_w).max(extent.height() / avail_h);
    let resolution = resolution.max(View::resolution_for_zoom(options.max_zoom));
    let (center_x, center_y) = extent.center();

    Some(View {
        center_x,
        center_y,
        resolution,
    })
}

/// An animated transition between two views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnimation {
    pub from: View,
    pub to: View,
    pub start_time: f64,
    pub duration: f64, // milliseconds
}

impl ViewAnimation {
    pub fn new(from: View, to: View, start_time: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start_time,
            duration,
        }
    }

    /// Interpolated view at `now`, or None once the animation is complete.
    pub fn current_view(&self, now: f64) -> Option<View> {
        let elapsed = now - self.start_time;
        if elapsed >= self.duration {
            return None;
        }
        if elapsed <= 0.0 {
            return Some(self.from);
        }

        let t = cubic_ease_out(elapsed / self.duration);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        // Resolution interpolates in log space so zooming feels uniform.
        let resolution = lerp(self.from.resolution.ln(), self.to.resolution.ln()).exp();

        Some(View {
            center_x: lerp(self.from.center_x, self.to.center_x),
            center_y: lerp(self.from.center_y, self.to.center_y),
            resolution,
        })
    }

    /// View to draw at `now`: the interpolated one while running, the target afterwards.
    pub fn view_at(&self, now: f64) -> View {
        self.current_view(now).unwrap_or(self.to)
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now - self.start_time >= self.duration
    }
}

/// Cubic ease-out: decelerating to zero velocity.
fn cubic_ease_out(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}
