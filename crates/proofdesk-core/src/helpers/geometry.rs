// crates/proofdesk-core/src/helpers/geometry.rs
//
// Plain 2D types shared between the annotation overlay, the thumbnail strip
// and the poster sampler. Kept free of egui so the core stays headless; the
// UI converts egui::Pos2 / egui::Rect into these at the call site.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width:  f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// An element's on-screen box in client (viewport) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub left:   f64,
    pub top:    f64,
    pub width:  f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 { self.left + self.width }
    pub fn bottom(&self) -> f64 { self.top + self.height }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Edge-inclusive containment. A pointer sitting exactly on the border
    /// still counts as inside, so a drag-leave fired on the edge is ignored.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

/// Convert a client-space pointer position into the overlay's viewBox space.
///
/// The ratio is viewBox / rendered size, so strokes are captured at the same
/// fidelity regardless of how the overlay is currently zoomed on screen.
/// Without a viewBox the rendered size is the coordinate space.
///
/// ```
/// use proofdesk_core::helpers::geometry::{client_to_view_box, Bounds, Point, Size};
/// let b = Bounds::new(100.0, 50.0, 400.0, 200.0);
/// let p = client_to_view_box(Point::new(300.0, 150.0), b, Some(Size::new(800.0, 400.0)));
/// assert_eq!(p, Point::new(400.0, 200.0));
/// ```
pub fn client_to_view_box(client: Point, bounds: Bounds, view_box: Option<Size>) -> Point {
    let local_x = client.x - bounds.left;
    let local_y = client.y - bounds.top;

    let Some(vb) = view_box.filter(Size::is_valid) else {
        return Point::new(local_x, local_y);
    };
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Point::new(local_x, local_y);
    }

    Point::new(
        local_x * vb.width  / bounds.width,
        local_y * vb.height / bounds.height,
    )
}

/// Scale `(width, height)` so the longer edge is at most `max_edge`, keeping
/// the aspect ratio. Never upscales; never returns a zero dimension.
///
/// ```
/// use proofdesk_core::helpers::geometry::fit_within;
/// assert_eq!(fit_within(1920, 1080, 300), (300, 169));
/// assert_eq!(fit_within(1080, 1920, 300), (169, 300));
/// assert_eq!(fit_within(200, 100, 300),   (200, 100));
/// ```
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_edge || longer == 0 {
        return (width.max(1), height.max(1));
    }
    let scale = max_edge as f64 / longer as f64;
    let w = (width  as f64 * scale).round() as u32;
    let h = (height as f64 * scale).round() as u32;
    (w.max(1), h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_box_conversion_without_view_box_is_local() {
        let b = Bounds::new(10.0, 20.0, 100.0, 50.0);
        let p = client_to_view_box(Point::new(60.0, 45.0), b, None);
        assert_eq!(p, Point::new(50.0, 25.0));
    }

    #[test]
    fn view_box_conversion_ignores_degenerate_bounds() {
        let b = Bounds::new(0.0, 0.0, 0.0, 0.0);
        let p = client_to_view_box(Point::new(5.0, 5.0), b, Some(Size::new(10.0, 10.0)));
        assert_eq!(p, Point::new(5.0, 5.0));
    }

    #[test]
    fn bounds_containment_is_edge_inclusive() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(Point::new(10.0, 10.0)));
        assert!(b.contains(Point::new(0.0, 5.0)));
        assert!(!b.contains(Point::new(10.01, 5.0)));
        assert!(!b.contains(Point::new(5.0, -0.5)));
    }

    #[test]
    fn fit_within_square_and_tiny() {
        assert_eq!(fit_within(600, 600, 300), (300, 300));
        assert_eq!(fit_within(3000, 2, 300), (300, 1));
        assert_eq!(fit_within(0, 0, 300), (1, 1));
    }
}
