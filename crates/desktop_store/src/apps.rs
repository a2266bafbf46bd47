use crate::model::AppId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDescriptor {
    pub app_id: AppId,
    pub title: &'static str,
    pub description: &'static str,
    pub default_size: WindowSize,
    pub min_size: WindowSize,
}

const APP_REGISTRY: [AppDescriptor; 5] = [
    AppDescriptor {
        app_id: AppId::Settings,
        title: "Settings",
        description: "System controls and sound customization.",
        default_size: WindowSize { w: 920, h: 640 },
        min_size: WindowSize { w: 720, h: 480 },
    },
    AppDescriptor {
        app_id: AppId::Soundboard,
        title: "Soundboard",
        description: "Trigger every PurpleOS system event sound.",
        default_size: WindowSize { w: 780, h: 560 },
        min_size: WindowSize { w: 620, h: 420 },
    },
    AppDescriptor {
        app_id: AppId::Explorer,
        title: "Explorer",
        description: "Simple fake filesystem explorer.",
        default_size: WindowSize { w: 860, h: 560 },
        min_size: WindowSize { w: 640, h: 420 },
    },
    AppDescriptor {
        app_id: AppId::Notepad,
        title: "Notepad",
        description: "Quick local notes saved to browser storage.",
        default_size: WindowSize { w: 700, h: 520 },
        min_size: WindowSize { w: 500, h: 360 },
    },
    AppDescriptor {
        app_id: AppId::Terminal,
        title: "Terminal",
        description: "Run simple shell-like commands inside PurpleOS.",
        default_size: WindowSize { w: 760, h: 500 },
        min_size: WindowSize { w: 560, h: 360 },
    },
];

/// Desktop icons, in default layout order.
pub const DESKTOP_SHORTCUTS: [AppId; 3] = [AppId::Explorer, AppId::Soundboard, AppId::Settings];

pub const START_MENU_APPS: [AppId; 5] = AppId::ALL;

pub const TASKBAR_PINNED_APPS: [AppId; 5] = [
    AppId::Explorer,
    AppId::Soundboard,
    AppId::Settings,
    AppId::Terminal,
    AppId::Notepad,
];

pub fn app_registry() -> &'static [AppDescriptor] {
    &APP_REGISTRY
}

pub fn app_definition(app_id: AppId) -> &'static AppDescriptor {
    match app_id {
        AppId::Settings => &APP_REGISTRY[0],
        AppId::Soundboard => &APP_REGISTRY[1],
        AppId::Explorer => &APP_REGISTRY[2],
        AppId::Notepad => &APP_REGISTRY[3],
        AppId::Terminal => &APP_REGISTRY[4],
    }
}
