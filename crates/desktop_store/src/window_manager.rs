//! Shared window-manager transition helpers used by the desktop reducer.

use crate::{
    apps::app_definition,
    model::{
        AppId, DesktopState, ResizeEdge, SnapZone, Viewport, WindowId, WindowRecord, WindowRect,
    },
};

/// Distance (in px) from a viewport edge inside which a dragged window previews a snap.
pub const SNAP_EDGE_THRESHOLD: i32 = 36;
/// Most-recent-first launch history length.
pub const MAX_RECENT_APPS: usize = 12;
const CASCADE_ORIGIN: (i32, i32) = (72, 58);
const CASCADE_STEP: (i32, i32) = (22, 16);
const CASCADE_SLOTS: usize = 6;

/// Highest z-index in use, `0` when no windows exist.
pub fn top_z(windows: &[WindowRecord]) -> u32 {
    windows.iter().map(|w| w.z_index).max().unwrap_or(0)
}

/// Re-ranks z-indices to `1..=n`, keeping the stacking order. Ties keep their list order.
pub fn normalize_window_stack(windows: &mut [WindowRecord]) {
    let mut order = (0..windows.len()).collect::<Vec<_>>();
    order.sort_by_key(|index| windows[*index].z_index);
    for (rank, index) in (1u32..).zip(order) {
        windows[index].z_index = rank;
    }
}

/// The z-index that puts a window above every other one.
///
/// Re-ranks the stack first when the top is already at `u32::MAX`.
pub fn next_z(windows: &mut [WindowRecord]) -> u32 {
    if top_z(windows) == u32::MAX {
        normalize_window_stack(windows);
    }
    top_z(windows).saturating_add(1)
}

/// The id [`allocate_window_id`] will hand out next. Never names an existing window.
pub fn peek_window_id(state: &DesktopState) -> WindowId {
    let mut candidate = state.next_window_id.max(1);
    while state.window(WindowId(candidate)).is_some() {
        candidate = candidate.checked_add(1).unwrap_or(1);
    }
    WindowId(candidate)
}

/// Takes a fresh window id and advances the counter, wrapping to `1` past `u64::MAX`.
pub fn allocate_window_id(state: &mut DesktopState) -> WindowId {
    let window_id = peek_window_id(state);
    state.next_window_id = window_id.0.checked_add(1).unwrap_or(1);
    window_id
}

/// The non-minimized window with the highest z-index.
pub fn focus_candidate(windows: &[WindowRecord]) -> Option<WindowId> {
    windows
        .iter()
        .filter(|w| !w.minimized)
        .max_by_key(|w| w.z_index)
        .map(|w| w.id)
}

/// Builds the record for a newly opened window, cascaded by the number already open.
pub fn new_window(state: &mut DesktopState, app_id: AppId, window_id: WindowId) -> WindowRecord {
    let app = app_definition(app_id);
    let slot = (state.windows.len() % CASCADE_SLOTS) as i32;
    let z_index = next_z(&mut state.windows);
    WindowRecord {
        id: window_id,
        app_id,
        title: app.title.to_string(),
        rect: WindowRect {
            x: CASCADE_ORIGIN.0 + slot * CASCADE_STEP.0,
            y: CASCADE_ORIGIN.1 + slot * CASCADE_STEP.1,
            w: app.default_size.w,
            h: app.default_size.h,
        },
        z_index,
        minimized: false,
        maximized: false,
    }
}

/// Moves `app_id` to the front of the recent list.
pub fn push_recent_app(recent_apps: &mut Vec<AppId>, app_id: AppId) {
    recent_apps.retain(|entry| *entry != app_id);
    recent_apps.insert(0, app_id);
    recent_apps.truncate(MAX_RECENT_APPS);
}

/// Raises `window_id` above every other window, clears `minimized` and focuses it.
///
/// Returns `false` when the window does not exist.
pub fn raise_window(state: &mut DesktopState, window_id: WindowId) -> bool {
    if state.window(window_id).is_none() {
        return false;
    }
    let z_index = next_z(&mut state.windows);
    let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) else {
        return false;
    };
    window.z_index = z_index;
    window.minimized = false;
    state.focused_window_id = Some(window_id);
    state.snap_preview = None;
    true
}

/// Re-derives focus after a window left the visible set.
pub fn refocus_after_removal(state: &mut DesktopState) {
    state.focused_window_id = focus_candidate(&state.windows);
}

/// Snap zone for a window whose top-left corner sits at `rect`. Top wins over left, left over right.
pub fn detect_snap_zone(rect: WindowRect, viewport: Viewport) -> Option<SnapZone> {
    if rect.y <= SNAP_EDGE_THRESHOLD {
        Some(SnapZone::Top)
    } else if rect.x <= SNAP_EDGE_THRESHOLD {
        Some(SnapZone::Left)
    } else if rect.x.saturating_add(rect.w) >= viewport.width - SNAP_EDGE_THRESHOLD {
        Some(SnapZone::Right)
    } else {
        None
    }
}

/// Exact geometry for a snap zone. Left and right halves tile the width without gap or overlap.
pub fn snap_rect(zone: SnapZone, viewport: Viewport) -> WindowRect {
    let width = viewport.width;
    let height = viewport.usable_height();
    let left_width = width.div_euclid(2);
    match zone {
        SnapZone::Left => WindowRect {
            x: 0,
            y: 0,
            w: left_width,
            h: height,
        },
        SnapZone::Right => WindowRect {
            x: left_width,
            y: 0,
            w: width - left_width,
            h: height,
        },
        SnapZone::Top => WindowRect {
            x: 0,
            y: 0,
            w: width,
            h: height,
        },
    }
}

/// Applies `zone` geometry to `window_id`, raising and focusing it.
///
/// Returns `false` when the window does not exist.
pub fn apply_snap(
    state: &mut DesktopState,
    window_id: WindowId,
    zone: SnapZone,
    viewport: Viewport,
) -> bool {
    let Some(window) = state.windows.iter_mut().find(|w| w.id == window_id) else {
        return false;
    };
    window.rect = snap_rect(zone, viewport);
    window.maximized = zone == SnapZone::Top;
    raise_window(state, window_id)
}

/// Applies resize deltas for a given edge/corner drag. The result is not yet clamped to a minimum.
pub fn resize_rect(start: WindowRect, edge: ResizeEdge, dx: i32, dy: i32) -> WindowRect {
    match edge {
        ResizeEdge::East => WindowRect {
            w: start.w + dx,
            ..start
        },
        ResizeEdge::West => WindowRect {
            x: start.x + dx,
            w: start.w - dx,
            ..start
        },
        ResizeEdge::South => WindowRect {
            h: start.h + dy,
            ..start
        },
        ResizeEdge::North => WindowRect {
            y: start.y + dy,
            h: start.h - dy,
            ..start
        },
        ResizeEdge::NorthEast => WindowRect {
            y: start.y + dy,
            h: start.h - dy,
            w: start.w + dx,
            ..start
        },
        ResizeEdge::NorthWest => WindowRect {
            x: start.x + dx,
            y: start.y + dy,
            w: start.w - dx,
            h: start.h - dy,
        },
        ResizeEdge::SouthEast => WindowRect {
            w: start.w + dx,
            h: start.h + dy,
            ..start
        },
        ResizeEdge::SouthWest => WindowRect {
            x: start.x + dx,
            w: start.w - dx,
            h: start.h + dy,
            ..start
        },
    }
}

/// Clamps a resized rect to the app's minimum size, keeping the dragged edge's opposite side fixed.
pub fn clamp_resized_rect(
    start: WindowRect,
    edge: ResizeEdge,
    resized: WindowRect,
    app_id: AppId,
) -> WindowRect {
    let min = app_definition(app_id).min_size;
    let clamped = resized.clamped_min(min.w, min.h);
    let moves_left_edge = matches!(
        edge,
        ResizeEdge::West | ResizeEdge::NorthWest | ResizeEdge::SouthWest
    );
    let moves_top_edge = matches!(
        edge,
        ResizeEdge::North | ResizeEdge::NorthEast | ResizeEdge::NorthWest
    );
    WindowRect {
        x: if moves_left_edge {
            start.x + start.w - clamped.w
        } else {
            clamped.x
        },
        y: if moves_top_edge {
            start.y + start.h - clamped.h
        } else {
            clamped.y
        },
        ..clamped
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn window(id: u64, z_index: u32, minimized: bool) -> WindowRecord {
        WindowRecord {
            id: WindowId(id),
            app_id: AppId::Notepad,
            title: "Notepad".to_string(),
            rect: WindowRect {
                x: 200,
                y: 200,
                w: 700,
                h: 520,
            },
            z_index,
            minimized,
            maximized: false,
        }
    }

    #[test]
    fn focus_candidate_skips_minimized_windows() {
        let windows = vec![window(1, 3, false), window(2, 9, true), window(3, 5, false)];
        assert_eq!(focus_candidate(&windows), Some(WindowId(3)));
        assert_eq!(focus_candidate(&[window(1, 1, true)]), None);
        assert_eq!(top_z(&windows), 9);
    }

    #[test]
    fn cascade_wraps_after_six_windows() {
        let mut state = DesktopState::default();
        for id in 1..=6 {
            state.windows.push(window(id, id as u32, false));
        }
        let seventh = new_window(&mut state, AppId::Explorer, WindowId(7));
        assert_eq!((seventh.rect.x, seventh.rect.y), (72, 58));
        state.windows.truncate(2);
        let third = new_window(&mut state, AppId::Explorer, WindowId(3));
        assert_eq!((third.rect.x, third.rect.y), (116, 90));
        assert_eq!(third.z_index, 3);
    }

    #[test]
    fn recent_apps_are_deduplicated_and_bounded() {
        let mut recents = vec![AppId::Notepad, AppId::Explorer];
        push_recent_app(&mut recents, AppId::Explorer);
        assert_eq!(recents, vec![AppId::Explorer, AppId::Notepad]);

        let mut long = Vec::new();
        for _ in 0..20 {
            for app in AppId::ALL {
                push_recent_app(&mut long, app);
            }
        }
        assert!(long.len() <= MAX_RECENT_APPS);
        assert_eq!(long[0], AppId::Terminal);
    }

    #[test]
    fn snap_detection_prefers_top_then_left_then_right() {
        let viewport = Viewport::new(1280, 800);
        let rect = |x, y| WindowRect { x, y, w: 400, h: 300 };
        assert_eq!(detect_snap_zone(rect(0, 0), viewport), Some(SnapZone::Top));
        assert_eq!(detect_snap_zone(rect(10, 200), viewport), Some(SnapZone::Left));
        assert_eq!(detect_snap_zone(rect(850, 200), viewport), Some(SnapZone::Right));
        assert_eq!(detect_snap_zone(rect(400, 200), viewport), None);
    }

    #[test]
    fn left_and_right_halves_tile_odd_widths() {
        let viewport = Viewport::new(1281, 700);
        let left = snap_rect(SnapZone::Left, viewport);
        let right = snap_rect(SnapZone::Right, viewport);
        assert_eq!(left.w, 640);
        assert_eq!(right.w, 641);
        assert_eq!(left.x + left.w, right.x);
        assert_eq!(right.x + right.w, viewport.width);
        assert_eq!(left.h, 644);
    }

    #[test]
    fn west_resize_clamp_keeps_right_edge_fixed() {
        let start = WindowRect {
            x: 100,
            y: 100,
            w: 700,
            h: 520,
        };
        let resized = resize_rect(start, ResizeEdge::West, 400, 0);
        let clamped = clamp_resized_rect(start, ResizeEdge::West, resized, AppId::Notepad);
        assert_eq!(clamped.w, 500);
        assert_eq!(clamped.x + clamped.w, start.x + start.w);
    }

    #[test]
    fn stack_at_the_z_ceiling_is_reranked_before_raising() {
        let mut windows = vec![
            window(1, u32::MAX, false),
            window(2, 7, false),
            window(3, u32::MAX - 1, true),
        ];
        assert_eq!(next_z(&mut windows), 4);
        let ranks = windows.iter().map(|w| w.z_index).collect::<Vec<_>>();
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[test]
    fn window_ids_skip_taken_values_and_wrap() {
        let mut state = DesktopState::default();
        state.windows.push(window(u64::MAX, 1, false));
        state.windows.push(window(1, 2, false));
        state.next_window_id = u64::MAX;

        assert_eq!(allocate_window_id(&mut state), WindowId(2));
        assert_eq!(state.next_window_id, 3);
        assert_eq!(peek_window_id(&state), WindowId(3));
    }

    #[test]
    fn snap_detection_tolerates_far_off_coordinates() {
        let rect = WindowRect {
            x: i32::MAX,
            y: 200,
            w: 700,
            h: 520,
        };
        assert_eq!(
            detect_snap_zone(rect, Viewport::new(1280, 800)),
            Some(SnapZone::Right)
        );
    }
}
