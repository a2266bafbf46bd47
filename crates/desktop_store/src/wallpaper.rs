//! Built-in wallpaper catalog.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallpaperDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub source: &'static str,
}

pub const DEFAULT_WALLPAPER_ID: &str = "purple-nebula";

pub const WALLPAPERS: [WallpaperDefinition; 4] = [
    WallpaperDefinition {
        id: DEFAULT_WALLPAPER_ID,
        label: "Purple Nebula",
        source: "/wallpapers/purple-aurora.svg",
    },
    WallpaperDefinition {
        id: "purple-aurora",
        label: "Purple Aurora",
        source: "/wallpapers/purple-aurora.svg",
    },
    WallpaperDefinition {
        id: "nebula-wave",
        label: "Nebula Wave",
        source: "/wallpapers/nebula-wave.svg",
    },
    WallpaperDefinition {
        id: "iris-bloom",
        label: "Iris Bloom",
        source: "/wallpapers/iris-bloom.svg",
    },
];

/// Looks up a wallpaper, falling back to the first catalog entry for unknown ids.
pub fn wallpaper(wallpaper_id: &str) -> &'static WallpaperDefinition {
    WALLPAPERS
        .iter()
        .find(|entry| entry.id == wallpaper_id)
        .unwrap_or(&WALLPAPERS[0])
}

/// Wallpaper asset URL under the deployment base path.
pub fn wallpaper_url(base_path: &str, wallpaper_id: &str) -> String {
    format!(
        "{}{}",
        crate::sound::normalize_base_path(base_path),
        wallpaper(wallpaper_id).source
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unknown_wallpaper_falls_back_to_first_entry() {
        assert_eq!(wallpaper("missing").id, "purple-nebula");
        assert_eq!(wallpaper("iris-bloom").label, "Iris Bloom");
    }

    #[test]
    fn wallpaper_url_uses_base_path() {
        assert_eq!(
            wallpaper_url("/os/", "nebula-wave"),
            "/os/wallpapers/nebula-wave.svg"
        );
    }
}
