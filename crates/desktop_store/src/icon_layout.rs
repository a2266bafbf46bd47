//! Desktop icon grid geometry, default placement and the drag/drop placement search.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    AppId, DesktopLayoutPrefs, IconDragSession, IconPosition, IconSizeTier, PointerPosition,
    Viewport, TASKBAR_RESERVED_HEIGHT,
};

/// Left edge of the first icon column.
pub const ICON_ORIGIN_LEFT: i32 = 24;
/// Top edge of the first icon row.
pub const ICON_ORIGIN_TOP: i32 = 28;
/// Horizontal gap between icon cells.
pub const ICON_GAP_X: i32 = 12;
/// Vertical gap between icon cells.
pub const ICON_GAP_Y: i32 = 12;
/// Pointer travel (px, either axis) before a press becomes a drag.
pub const DRAG_HYSTERESIS_PX: i32 = 3;
const MIN_DESKTOP_EXTENT: i32 = 320;
const TASKBAR_CLEARANCE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Footprint of one icon, label included.
pub struct IconCellSize {
    pub width: i32,
    pub height: i32,
}

/// Cell footprint for a size tier.
pub fn icon_cell_size(tier: IconSizeTier) -> IconCellSize {
    match tier {
        IconSizeTier::Small => IconCellSize {
            width: 82,
            height: 86,
        },
        IconSizeTier::Medium => IconCellSize {
            width: 96,
            height: 96,
        },
        IconSizeTier::Large => IconCellSize {
            width: 112,
            height: 108,
        },
    }
}

/// Zero-based column/row address of a grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub col: i32,
    pub row: i32,
}

/// Icon grid for one size tier and viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconGrid {
    /// Footprint of each icon for the active tier.
    pub cell: IconCellSize,
    /// Desktop width, never below the minimum extent.
    pub width: i32,
    /// Desktop height above the taskbar and its clearance, never below the minimum extent.
    pub height: i32,
    /// Largest x an icon's left edge may take.
    pub max_x: i32,
    /// Largest y an icon's top edge may take.
    pub max_y: i32,
    /// Column pitch: cell width plus gap.
    pub step_x: i32,
    /// Row pitch: cell height plus gap.
    pub step_y: i32,
}

impl IconGrid {
    /// Grid bounds for `tier` on a desktop of `viewport` size.
    pub fn new(tier: IconSizeTier, viewport: Viewport) -> Self {
        let cell = icon_cell_size(tier);
        let width = viewport.width.max(MIN_DESKTOP_EXTENT);
        let height =
            (viewport.height - TASKBAR_RESERVED_HEIGHT - TASKBAR_CLEARANCE).max(MIN_DESKTOP_EXTENT);
        Self {
            cell,
            width,
            height,
            max_x: (width - cell.width - ICON_ORIGIN_LEFT).max(ICON_ORIGIN_LEFT),
            max_y: (height - cell.height - ICON_GAP_Y).max(ICON_ORIGIN_TOP),
            step_x: cell.width + ICON_GAP_X,
            step_y: cell.height + ICON_GAP_Y,
        }
    }

    /// How many default slots fill a column before the next one starts.
    pub fn rows_per_column(&self) -> i32 {
        ((self.height - ICON_ORIGIN_TOP + ICON_GAP_Y) / self.step_y).max(1)
    }

    /// Last column whose cell fits entirely on the desktop.
    pub fn max_col(&self) -> i32 {
        ((self.width - ICON_ORIGIN_LEFT - self.cell.width) / self.step_x).max(0)
    }

    /// Last row whose cell fits entirely above the taskbar.
    pub fn max_row(&self) -> i32 {
        ((self.height - ICON_ORIGIN_TOP - self.cell.height) / self.step_y).max(0)
    }

    /// Pulls a top-left corner into the grid bounds.
    pub fn clamp(&self, x: i32, y: i32) -> IconPosition {
        IconPosition {
            x: x.clamp(ICON_ORIGIN_LEFT, self.max_x),
            y: y.clamp(ICON_ORIGIN_TOP, self.max_y),
        }
    }

    /// Column-major default slot for the `index`-th shortcut.
    pub fn default_position(&self, index: usize) -> IconPosition {
        let rows = self.rows_per_column() as usize;
        let col = (index / rows) as i32;
        let row = (index % rows) as i32;
        self.clamp(
            ICON_ORIGIN_LEFT + col * self.step_x,
            ICON_ORIGIN_TOP + row * self.step_y,
        )
    }

    /// Nearest cell to `position`, rounding half up.
    pub fn cell_of(&self, position: IconPosition) -> GridCell {
        let axis = |offset: i32, step: i32| {
            ((f64::from(offset) / f64::from(step)) + 0.5).floor().max(0.0) as i32
        };
        GridCell {
            col: axis(position.x - ICON_ORIGIN_LEFT, self.step_x),
            row: axis(position.y - ICON_ORIGIN_TOP, self.step_y),
        }
    }

    /// Top-left corner of `cell`, clamped.
    pub fn cell_position(&self, cell: GridCell) -> IconPosition {
        self.clamp(
            ICON_ORIGIN_LEFT + cell.col * self.step_x,
            ICON_ORIGIN_TOP + cell.row * self.step_y,
        )
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        (0..=self.max_col()).contains(&cell.col) && (0..=self.max_row()).contains(&cell.row)
    }

    /// Searches outward from `target` in diamond rings for a cell not in `occupied`.
    ///
    /// Ring `r` visits every in-grid cell with `|dcol| + |drow| == r`, `dcol` ascending and the
    /// positive row offset before the negative one.
    pub fn nearest_free_cell(
        &self,
        target: GridCell,
        occupied: &BTreeSet<GridCell>,
    ) -> Option<GridCell> {
        let max_radius = self.max_col() + self.max_row() + 2;
        for radius in 0..=max_radius {
            for delta_col in -radius..=radius {
                let remaining = radius - delta_col.abs();
                let offsets = [remaining, -remaining];
                let rows = if remaining == 0 {
                    &offsets[..1]
                } else {
                    &offsets[..]
                };
                for delta_row in rows {
                    let cell = GridCell {
                        col: target.col + delta_col,
                        row: target.row + delta_row,
                    };
                    if self.contains(cell) && !occupied.contains(&cell) {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }
}

/// Where each shortcut is drawn: active drag candidate, else persisted, else default; clamped.
pub fn resolved_positions(
    shortcuts: &[AppId],
    prefs: &DesktopLayoutPrefs,
    viewport: Viewport,
    drag: Option<&IconDragSession>,
) -> BTreeMap<AppId, IconPosition> {
    let grid = IconGrid::new(prefs.icon_size, viewport);
    shortcuts
        .iter()
        .enumerate()
        .map(|(index, app_id)| {
            let source = drag
                .filter(|session| session.app_id == *app_id)
                .map(|session| session.current)
                .or_else(|| prefs.icon_positions.get(app_id).copied())
                .unwrap_or_else(|| grid.default_position(index));
            (*app_id, grid.clamp(source.x, source.y))
        })
        .collect()
}

/// Captures a drag on `app_id`. `None` when the app has no desktop shortcut.
pub fn begin_icon_drag(
    shortcuts: &[AppId],
    prefs: &DesktopLayoutPrefs,
    viewport: Viewport,
    app_id: AppId,
    pointer: PointerPosition,
) -> Option<IconDragSession> {
    let origin = *resolved_positions(shortcuts, prefs, viewport, None).get(&app_id)?;
    Some(IconDragSession {
        app_id,
        pointer_offset: (pointer.x - origin.x, pointer.y - origin.y),
        origin,
        current: origin,
        moved: false,
    })
}

impl IconDragSession {
    /// Moves the candidate under the pointer. Once past the hysteresis the drag stays "moved".
    pub fn track(&mut self, pointer: PointerPosition, grid: &IconGrid) {
        let next = grid.clamp(
            pointer.x - self.pointer_offset.0,
            pointer.y - self.pointer_offset.1,
        );
        self.moved = self.moved
            || (next.x - self.origin.x).abs() > DRAG_HYSTERESIS_PX
            || (next.y - self.origin.y).abs() > DRAG_HYSTERESIS_PX;
        self.current = next;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of releasing an icon drag.
pub enum IconDrop {
    /// Released before crossing the hysteresis. Nothing is persisted.
    Click,
    /// Persist this position for the dragged icon.
    Place(IconPosition),
    /// Grid full; the icon keeps its pre-drag position.
    Revert(IconPosition),
}

/// Decides where a released drag lands.
///
/// With snap on, the nearest free cell wins; other icons' resolved cells count as taken.
pub fn finish_icon_drag(
    shortcuts: &[AppId],
    prefs: &DesktopLayoutPrefs,
    viewport: Viewport,
    session: &IconDragSession,
) -> IconDrop {
    if !session.moved {
        return IconDrop::Click;
    }
    let grid = IconGrid::new(prefs.icon_size, viewport);
    let dropped = grid.clamp(session.current.x, session.current.y);
    if !prefs.snap_to_grid {
        return IconDrop::Place(dropped);
    }

    let occupied = resolved_positions(shortcuts, prefs, viewport, None)
        .into_iter()
        .filter(|(app_id, _)| *app_id != session.app_id)
        .map(|(_, position)| grid.cell_of(position))
        .collect::<BTreeSet<_>>();
    match grid.nearest_free_cell(grid.cell_of(dropped), &occupied) {
        Some(cell) => IconDrop::Place(grid.cell_position(cell)),
        None => IconDrop::Revert(session.origin),
    }
}
