use log::{debug, warn};

use super::{
    Disposition, DispositionError, LayoutParams, Point, PopupMove, Rect, Size,
};
use crate::notification::NotificationId;

/// Screen edge the stack hugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    id: NotificationId,
    rect: Rect,
}

/// Stacks popups from a top corner downward.
///
/// The overflow indicator sits at the bottom of the same edge, below the
/// area popups may use.
#[derive(Debug)]
pub struct TopDown {
    side: Side,
    params: LayoutParams,
    /// Screen minus margins.
    inner: Rect,
    /// `inner` minus the indicator and its spacing; popups must fit here.
    region: Rect,
    placements: Vec<Placement>,
}

impl TopDown {
    pub fn new(side: Side, params: LayoutParams) -> Self {
        let mut disposition = Self {
            side,
            params,
            inner: Rect::default(),
            region: Rect::default(),
            placements: Vec::new(),
        };
        disposition.recalculate_available_geometry();
        disposition
    }

    /// Region popups can currently be placed in.
    pub fn available_geometry(&self) -> Rect {
        self.region
    }

    fn recalculate_available_geometry(&mut self) {
        let params = &self.params;
        self.inner = params.screen.shrink(params.margins);

        let reserved = params
            .extra_window_size
            .height
            .saturating_add(params.spacing);
        let mut region = self.inner;
        region.height = region.height.saturating_sub(reserved).max(0);
        self.region = region;

        debug!(
            "Popup region recalculated: screen {}, region {}",
            params.screen, self.region
        );
    }

    fn aligned_x(&self, width: i32) -> i32 {
        match self.side {
            Side::Left => self.region.left(),
            Side::Right => self.region.right().saturating_sub(width),
        }
    }
}

impl Disposition for TopDown {
    fn place(
        &mut self,
        id: NotificationId,
        size: Size,
    ) -> Result<Option<Point>, DispositionError> {
        if !size.is_valid() {
            warn!("Refusing to place popup {} with size {}", id, size);
            return Err(DispositionError::InvalidSize(size));
        }

        if let Some(existing) = self.placement(id) {
            return Ok(Some(existing.top_left()));
        }

        let top = match self.placements.last() {
            Some(last) => last.rect.bottom().saturating_add(self.params.spacing),
            None => self.region.top(),
        };
        let candidate = Rect::new(self.aligned_x(size.width), top, size.width, size.height);

        if self.region.contains(&candidate) {
            self.placements.push(Placement {
                id,
                rect: candidate,
            });
            Ok(Some(candidate.top_left()))
        } else {
            debug!("No room for popup {} ({} at {})", id, size, candidate);
            Ok(None)
        }
    }

    fn remove(&mut self, id: NotificationId) -> Vec<PopupMove> {
        let Some(index) = self.placements.iter().position(|p| p.id == id) else {
            return Vec::new();
        };

        let shift = self.placements[index]
            .rect
            .height
            .saturating_add(self.params.spacing);
        let moves = self.placements[index + 1..]
            .iter_mut()
            .map(|placement| {
                placement.rect.y = placement.rect.y.saturating_sub(shift);
                PopupMove {
                    id: placement.id,
                    position: placement.rect.top_left(),
                }
            })
            .collect();

        self.placements.remove(index);
        moves
    }

    fn remove_all(&mut self) {
        self.placements.clear();
    }

    fn placement(&self, id: NotificationId) -> Option<Rect> {
        self.placements
            .iter()
            .find(|placement| placement.id == id)
            .map(|placement| placement.rect)
    }

    fn placements(&self) -> Vec<(NotificationId, Rect)> {
        self.placements.iter().map(|p| (p.id, p.rect)).collect()
    }

    fn extra_window_position(&self) -> Point {
        let size = self.params.extra_window_size;
        let x = match self.side {
            Side::Left => self.inner.left(),
            Side::Right => self.inner.right().saturating_sub(size.width),
        };
        Point::new(x, self.inner.bottom().saturating_sub(size.height))
    }

    fn params(&self) -> LayoutParams {
        self.params
    }

    fn set_params(&mut self, params: LayoutParams) {
        self.params = params;
        self.recalculate_available_geometry();
    }
}
