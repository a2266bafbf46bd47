use super::{SoundCue, SoundEvent};

const BOOT_LOGIN_DELAY_MS: u64 = 520;
const DEMO_STEP_MS: u64 = 360;
const TEST_ALL_STEP_MS: u64 = 300;

const DEMO_EVENTS: [SoundEvent; 9] = [
    SoundEvent::Boot,
    SoundEvent::Login,
    SoundEvent::OpenWindow,
    SoundEvent::Notify,
    SoundEvent::Minimize,
    SoundEvent::Maximize,
    SoundEvent::ClickSoft,
    SoundEvent::Recycle,
    SoundEvent::CloseWindow,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Timed cue sequences played by the boot screen and the soundboard.
pub enum SoundSequence {
    /// Boot chime followed by the login chime. Played once per process.
    BootChime,
    /// Soundboard "play demo" walk through the common desktop cues.
    SoundboardDemo,
    /// Soundboard "test all" walk through every event.
    TestAll,
}

impl SoundSequence {
    /// Cues with their offsets from the sequence start, in play order.
    pub fn steps(self) -> Vec<(u64, SoundCue)> {
        match self {
            Self::BootChime => vec![
                (0, SoundCue::scaled(SoundEvent::Boot, 0.65)),
                (BOOT_LOGIN_DELAY_MS, SoundCue::scaled(SoundEvent::Login, 0.6)),
            ],
            Self::SoundboardDemo => DEMO_EVENTS
                .into_iter()
                .enumerate()
                .map(|(index, event)| {
                    (
                        index as u64 * DEMO_STEP_MS,
                        SoundCue::scaled(event, 0.55),
                    )
                })
                .collect(),
            Self::TestAll => SoundEvent::ALL
                .into_iter()
                .enumerate()
                .map(|(index, event)| {
                    let multiplier = if event == SoundEvent::ClickSoft {
                        0.45
                    } else {
                        0.62
                    };
                    (
                        index as u64 * TEST_ALL_STEP_MS,
                        SoundCue::scaled(event, multiplier),
                    )
                })
                .collect(),
        }
    }

    /// Whether a muted store refuses to start this sequence.
    pub fn refused_while_muted(self) -> bool {
        matches!(self, Self::TestAll)
    }
}
