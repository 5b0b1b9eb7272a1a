//! The rendering-surface seam.
//!
//! The engine never talks to a concrete graph-drawing library; it sees
//! the canvas through [`CanvasSurface`]. The trait is deliberately
//! narrow: camera get/set, screen-to-graph projection, and the surface's
//! pixel dimensions — everything the merge engine and viewport memory
//! need, nothing the renderer would have to fake.

use crate::model::Position;
use crate::viewport::Viewport;

/// Minimal view of the graph canvas.
///
/// Implementations wrap whatever rendering library the host uses. The
/// viewport setter is treated as idempotent-but-racy: the library may
/// run its own auto-fit after mount and overwrite assignments, which is
/// why restoration converges via [`crate::utils::RetryPolicy`] instead
/// of assigning once.
pub trait CanvasSurface {
    /// Current camera state.
    fn viewport(&self) -> Viewport;

    /// Assign the camera state. May be silently overridden by the
    /// surface's own fitting logic; callers reapply until it sticks.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Visible size of the surface in screen units.
    fn dimensions(&self) -> (f64, f64);

    /// Project a screen-space point into graph space. Returns `None`
    /// while the surface is not yet initialized.
    fn project(&self, screen: Position) -> Option<Position>;
}

/// The graph-space point under the visual center of the surface.
///
/// Tries the surface's own projection first, then falls back to
/// viewport math. Returns `None` only when the surface reports
/// degenerate dimensions.
#[must_use]
pub fn visual_center(surface: &dyn CanvasSurface) -> Option<Position> {
    let (width, height) = surface.dimensions();
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }
    let center = Position::new(width / 2.0, height / 2.0);
    if let Some(projected) = surface.project(center) {
        return Some(projected);
    }
    let viewport = surface.viewport();
    if viewport.zoom.is_finite() && viewport.zoom > 0.0 {
        Some(Position::new(
            (center.x - viewport.x) / viewport.zoom,
            (center.y - viewport.y) / viewport.zoom,
        ))
    } else {
        None
    }
}
