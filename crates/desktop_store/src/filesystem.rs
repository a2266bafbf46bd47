//! Seed listing for the simulated explorer.

use crate::model::{FileItem, FileKind};

fn item(id: &str, name: &str, kind: FileKind, size: &str, modified_at: &str) -> FileItem {
    FileItem {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        size: size.to_string(),
        modified_at: modified_at.to_string(),
        locked: false,
    }
}

pub fn initial_files() -> Vec<FileItem> {
    vec![
        item(
            "folder-projects",
            "Projects",
            FileKind::Folder,
            "--",
            "2026-02-19 18:10",
        ),
        item(
            "file-roadmap",
            "PurpleOS-Roadmap.md",
            FileKind::File,
            "38 KB",
            "2026-02-24 09:33",
        ),
        item(
            "file-brand",
            "Brand-Guide.pdf",
            FileKind::File,
            "2.2 MB",
            "2026-02-21 16:42",
        ),
        item(
            "file-preview",
            "Desktop-Preview.png",
            FileKind::File,
            "512 KB",
            "2026-02-25 08:12",
        ),
        FileItem {
            locked: true,
            ..item(
                "file-kernel",
                "system-core.dll",
                FileKind::File,
                "12.6 MB",
                "2026-02-01 11:00",
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_kernel_file_is_locked() {
        let locked = initial_files()
            .into_iter()
            .filter(|item| item.locked)
            .map(|item| item.name)
            .collect::<Vec<_>>();
        assert_eq!(locked, vec!["system-core.dll".to_string()]);
    }
}
