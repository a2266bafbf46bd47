//! Reducer helpers for desktop icon layout and icon drags.

use crate::{
    apps::DESKTOP_SHORTCUTS,
    icon_layout::{begin_icon_drag, finish_icon_drag, IconDrop, IconGrid},
    model::{AppId, DesktopState, IconDragSession, InteractionState, Viewport},
    reducer::{DesktopAction, ReducerError, RuntimeEffect},
    sound::{SoundCue, SoundEvent},
};

const REVERT_CUE_MULTIPLIER: f64 = 0.55;

pub(super) fn reduce_icon_action(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: &DesktopAction,
    effects: &mut Vec<RuntimeEffect>,
) -> Result<bool, ReducerError> {
    match action {
        DesktopAction::SetDesktopSnapToGrid { enabled } => {
            state.desktop.snap_to_grid = *enabled;
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::SetDesktopIconSize { size } => {
            state.desktop.icon_size = *size;
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::SetDesktopIconPosition { app_id, position } => {
            state.desktop.icon_positions.insert(*app_id, *position);
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::ResetDesktopIconLayout => {
            state.desktop.icon_positions.clear();
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        DesktopAction::BeginIconDrag {
            app_id,
            pointer,
            viewport,
        } => {
            interaction.icon_drag = begin_icon_drag(
                &DESKTOP_SHORTCUTS,
                &state.desktop,
                *viewport,
                *app_id,
                *pointer,
            );
        }
        DesktopAction::UpdateIconDrag { pointer, viewport } => {
            if let Some(session) = interaction.icon_drag.as_mut() {
                let grid = IconGrid::new(state.desktop.icon_size, *viewport);
                session.track(*pointer, &grid);
            }
        }
        DesktopAction::EndIconDrag { viewport } => {
            let Some(session) = interaction.icon_drag.take() else {
                return Ok(true);
            };
            drop_icon(state, &DESKTOP_SHORTCUTS, *viewport, &session, effects);
        }
        _ => return Ok(false),
    }

    Ok(true)
}

/// Commits a released drag among `shortcuts`. A full grid leaves the layout alone and buzzes.
fn drop_icon(
    state: &mut DesktopState,
    shortcuts: &[AppId],
    viewport: Viewport,
    session: &IconDragSession,
    effects: &mut Vec<RuntimeEffect>,
) {
    match finish_icon_drag(shortcuts, &state.desktop, viewport, session) {
        IconDrop::Click => {}
        IconDrop::Place(position) => {
            state.desktop.icon_positions.insert(session.app_id, position);
            effects.push(RuntimeEffect::PersistSnapshot);
        }
        IconDrop::Revert(_) => {
            effects.push(RuntimeEffect::PlaySound(SoundCue::scaled(
                SoundEvent::Error,
                REVERT_CUE_MULTIPLIER,
            )));
        }
    }
}
