//! Connection points and connector drag state.

use crate::elements::{CanvasElement, ElementId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Edge a connection point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionSide {
    Top,
    Right,
    Bottom,
    Left,
}

/// Snap target for connector lines, in virtual coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub element: ElementId,
    pub side: ConnectionSide,
    pub point: Point,
}

/// The four edge midpoints of an element (top, right, bottom, left).
///
/// Computed from the unrotated box.
pub fn connection_points(element: &CanvasElement) -> [ConnectionPoint; 4] {
    let b = element.bounds();
    let center = b.center();
    let make = |side, point| ConnectionPoint {
        element: element.id,
        side,
        point,
    };
    [
        make(ConnectionSide::Top, Point::new(center.x, b.y0)),
        make(ConnectionSide::Right, Point::new(b.x1, center.y)),
        make(ConnectionSide::Bottom, Point::new(center.x, b.y1)),
        make(ConnectionSide::Left, Point::new(b.x0, center.y)),
    ]
}

/// State of an in-progress connector drag, in virtual coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionDragState {
    pub is_dragging: bool,
    pub start_point: Point,
    pub end_point: Point,
}

impl ConnectionDragState {
    pub fn dragging(start_point: Point, end_point: Point) -> Self {
        Self {
            is_dragging: true,
            start_point,
            end_point,
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}
