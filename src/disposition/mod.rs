//! Popup placement on screen.
//!
//! A [`Disposition`] hands out non-overlapping rectangles for popups and
//! reflows the survivors when one is removed. The concrete layout lives in a
//! strategy type so alternative stackings can be swapped in behind the trait.

pub mod geometry;
mod top_down;


pub use geometry::{Margins, Point, Rect, Size};
pub use top_down::{Side, TopDown};

use crate::config::PopupAnchor;
use crate::notification::NotificationId;
use thiserror::Error;

/// A popup that had to change position after a reflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupMove {
    pub id: NotificationId,
    pub position: Point,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispositionError {
    #[error("Popup size must be positive, got {0}")]
    InvalidSize(Size),
}

/// Inputs every strategy derives its available region from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutParams {
    /// Usable screen area, as reported by the renderer.
    pub screen: Rect,
    pub margins: Margins,
    /// Gap between two stacked popups.
    pub spacing: i32,
    /// Space reserved for the overflow indicator window.
    pub extra_window_size: Size,
}

/// Placement strategy interface.
pub trait Disposition: Send {
    /// Returns the top-left corner for popup `id`, or `None` when it does not fit.
    ///
    /// Asking again for an id that is already placed returns its current
    /// position without allocating anything.
    fn place(&mut self, id: NotificationId, size: Size)
    -> Result<Option<Point>, DispositionError>;

    /// Frees the slot of `id` and reflows the popups stacked after it.
    ///
    /// Returns the moves in stacking order. Unknown ids are ignored.
    fn remove(&mut self, id: NotificationId) -> Vec<PopupMove>;

    /// Forgets every placement without reporting moves.
    fn remove_all(&mut self);

    /// Current rectangle of `id`.
    fn placement(&self, id: NotificationId) -> Option<Rect>;

    /// Every placed popup, in stacking order.
    fn placements(&self) -> Vec<(NotificationId, Rect)>;

    /// Where the overflow indicator window goes.
    fn extra_window_position(&self) -> Point;

    fn params(&self) -> LayoutParams;

    /// Replaces all layout inputs and re-derives the available region.
    fn set_params(&mut self, params: LayoutParams);

    fn set_screen_geometry(&mut self, screen: Rect) {
        let params = LayoutParams {
            screen,
            ..self.params()
        };
        self.set_params(params);
    }

    fn set_margins(&mut self, margins: Margins) {
        let params = LayoutParams {
            margins,
            ..self.params()
        };
        self.set_params(params);
    }

    fn set_spacing(&mut self, spacing: i32) {
        let params = LayoutParams {
            spacing,
            ..self.params()
        };
        self.set_params(params);
    }

    fn set_extra_window_size(&mut self, extra_window_size: Size) {
        let params = LayoutParams {
            extra_window_size,
            ..self.params()
        };
        self.set_params(params);
    }
}

/// Builds the strategy configured for `anchor`.
pub fn for_anchor(anchor: PopupAnchor, params: LayoutParams) -> Box<dyn Disposition> {
    match anchor {
        PopupAnchor::TopRight => Box::new(TopDown::new(Side::Right, params)),
        PopupAnchor::TopLeft => Box::new(TopDown::new(Side::Left, params)),
    }
}
