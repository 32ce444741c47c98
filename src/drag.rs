//! Drop-target geometry and the drag state machine.

/// Vertical extent of a rendered element, in the same coordinate space as the
/// pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Bounds { top, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

/// The task edge a dragged task would be dropped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub index: usize,
    pub edge: Edge,
}

impl DropTarget {
    /// Index the dropped task is inserted at.
    pub fn insertion_index(&self) -> usize {
        match self.edge {
            Edge::Top => self.index,
            Edge::Bottom => self.index + 1,
        }
    }
}

/// Finds the task edge closest to `pointer_y`.
///
/// Distances are measured relative to the list's top. Earlier candidates win
/// ties; a task's top edge is tried before its bottom edge. A pointer at or
/// below the midpoint of the last task always targets its bottom edge.
/// Returns `None` for an empty list.
pub fn compute_drop_target(pointer_y: f64, list: Bounds, tasks: &[Bounds]) -> Option<DropTarget> {
    let last = tasks.len().checked_sub(1)?;
    let mouse_y = pointer_y - list.top;

    let mut best = DropTarget {
        index: 0,
        edge: Edge::Top,
    };
    let mut best_distance = f64::INFINITY;

    for (index, task) in tasks.iter().enumerate() {
        let top = task.top - list.top;
        let bottom = top + task.height;

        for (edge, y) in [(Edge::Top, top), (Edge::Bottom, bottom)] {
            let distance = (mouse_y - y).abs();
            if distance < best_distance {
                best_distance = distance;
                best = DropTarget { index, edge };
            }
        }
    }

    let last_middle = tasks[last].top - list.top + tasks[last].height / 2.0;
    if mouse_y >= last_middle {
        best = DropTarget {
            index: last,
            edge: Edge::Bottom,
        };
    }

    Some(best)
}

/// Where a drag started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOrigin {
    pub task_id: i64,
    pub list_id: i64,
    pub index: usize,
}

/// The list currently under the pointer and the edge it resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hover {
    pub list_id: i64,
    pub target: Option<DropTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        origin: DragOrigin,
        hover: Option<Hover>,
    },
}

impl DragState {
    pub fn begin(&mut self, origin: DragOrigin) {
        *self = DragState::Dragging {
            origin,
            hover: None,
        };
    }

    /// Records the hovered list and target. Ignored while idle.
    pub fn hover(&mut self, list_id: i64, target: Option<DropTarget>) {
        if let DragState::Dragging { hover, .. } = self {
            *hover = Some(Hover { list_id, target });
        }
    }

    /// The pointer left a list; forget its target.
    pub fn leave(&mut self, list_id: i64) {
        if let DragState::Dragging { hover, .. } = self {
            if hover.is_some_and(|h| h.list_id == list_id) {
                *hover = None;
            }
        }
    }

    /// Ends the drag, returning what was recorded.
    pub fn finish(&mut self) -> Option<(DragOrigin, Option<Hover>)> {
        match std::mem::take(self) {
            DragState::Idle => None,
            DragState::Dragging { origin, hover } => Some((origin, hover)),
        }
    }

    pub fn origin(&self) -> Option<DragOrigin> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { origin, .. } => Some(*origin),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}
