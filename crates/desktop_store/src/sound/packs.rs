//! Built-in sound pack registry.

use super::{SoundEvent, SoundPackId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundPack {
    pub id: SoundPackId,
    pub label: &'static str,
    pub description: &'static str,
}

pub const SOUND_PACKS: [SoundPack; 3] = [
    SoundPack {
        id: SoundPackId::Classic,
        label: "Classic",
        description: "Rounded and mellow placeholder tones.",
    },
    SoundPack {
        id: SoundPackId::Aero,
        label: "Aero",
        description: "Bright and airy placeholder tones.",
    },
    SoundPack {
        id: SoundPackId::Purple,
        label: "Purple",
        description: "Soft synthetic tones tuned for PurpleOS.",
    },
];

pub fn sound_pack(id: SoundPackId) -> &'static SoundPack {
    match id {
        SoundPackId::Classic => &SOUND_PACKS[0],
        SoundPackId::Aero => &SOUND_PACKS[1],
        SoundPackId::Purple => &SOUND_PACKS[2],
    }
}

/// Strips trailing slashes; an empty or root-only base becomes the empty prefix.
pub fn normalize_base_path(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

/// Asset path of `event` in `pack` under the (normalized) deployment base path.
pub fn default_sound_source(base_path: &str, pack: SoundPackId, event: SoundEvent) -> String {
    format!(
        "{}/sounds/{}/{}-{}.wav",
        normalize_base_path(base_path),
        pack.as_str(),
        event.file_stem(),
        pack.as_str()
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pack_sources_follow_stem_and_pack_naming() {
        assert_eq!(
            default_sound_source("", SoundPackId::Purple, SoundEvent::OpenWindow),
            "/sounds/purple/open-window-purple.wav"
        );
        assert_eq!(
            default_sound_source("/os/", SoundPackId::Aero, SoundEvent::ClickSoft),
            "/os/sounds/aero/click-soft-aero.wav"
        );
    }

    #[test]
    fn root_base_path_collapses_to_empty_prefix() {
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("///"), "");
        assert_eq!(normalize_base_path("/purple"), "/purple");
    }

    #[test]
    fn registry_lookup_is_exhaustive() {
        for id in SoundPackId::ALL {
            assert_eq!(sound_pack(id).id, id);
        }
    }
}
