use std::sync::Arc;

use gpui::*;
use gpui_component::{Root, ThemeRegistry};

use banter::app::{ChatShell, ClearChat, Quit, default_themes_path};
use banter::settings::{AppSettings, DEFAULT_ENDPOINT, SettingsStore};
use banter_backend::{BackendConfig, ChatBackend, HttpBackend};

/// Application entry point.
///
/// Bootstraps the GPUI application with:
/// 1. Asset loading via gpui-component-assets
/// 2. gpui-component initialization (required for Root and themes)
/// 3. Theme loading/watching from ./themes directory (non-fatal if missing)
/// 4. Settings load and backend client construction
/// 5. Window creation with Root wrapper for gpui-component composition
fn main() {
    // Initialize tracing for development debugging
    tracing_subscriber::fmt::init();

    // Create application with bundled assets
    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(|cx| {
        gpui_tokio_bridge::init(cx);

        // Initialize gpui-component - REQUIRED before any Root usage
        // This sets up the theme system and component registry
        gpui_component::init(cx);

        let settings: Arc<AppSettings> =
            Arc::new(AppSettings::clone(&SettingsStore::load().settings()).with_env_overrides());

        // Attempt to load and watch themes from ./themes directory
        // This is non-fatal: if the directory doesn't exist or is empty,
        // the app falls back to default built-in themes
        {
            let watch_settings = settings.clone();
            if let Err(err) = ThemeRegistry::watch_dir(default_themes_path(), cx, move |cx| {
                watch_settings.apply_theme(None, cx);
                tracing::info!("Theme directory watch initialized");
            }) {
                tracing::warn!(
                    "Failed to watch themes directory: {}. Using default themes.",
                    err
                );
                settings.apply_theme(None, cx);
            }
        }

        let backend: Arc<dyn ChatBackend> =
            match HttpBackend::new(BackendConfig::new(settings.endpoint.clone())) {
                Ok(backend) => Arc::new(backend),
                Err(error) => {
                    tracing::error!(
                        "failed to build client for '{}': {}. Falling back to {DEFAULT_ENDPOINT}.",
                        settings.endpoint,
                        error
                    );
                    Arc::new(
                        HttpBackend::new(BackendConfig::new(DEFAULT_ENDPOINT))
                            .expect("default endpoint is valid"),
                    )
                }
            };

        // Register global action handlers
        // Quit action: cleanly shut down the application
        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        // Global keyboard shortcuts
        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("cmd-n", ClearChat, None),
        ]);

        // Spawn async window creation to ensure all initialization is complete
        cx.spawn(async move |cx| {
            cx.update(|cx| {
                // Window options with reasonable defaults for a chat client
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(900.), px(700.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        appears_transparent: true,
                        // Align traffic lights with Zed-style top titlebar inset.
                        traffic_light_position: Some(point(px(9.), px(9.))),
                        ..Default::default()
                    }),
                    // Match Zed-style client decorations on Linux/FreeBSD so the app draws
                    // its own title area instead of showing a system titlebar.
                    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
                    window_decorations: Some(WindowDecorations::Client),
                    #[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
                    window_decorations: None,
                    ..Default::default()
                };

                // Open the main window with Root wrapper
                // Root is REQUIRED by gpui-component for dialogs/sheets
                cx.open_window(options, |window, cx| {
                    let shell =
                        cx.new(|cx| ChatShell::new(backend.clone(), settings.clone(), window, cx));

                    // Wrap in Root for gpui-component integration
                    cx.new(|cx| Root::new(shell, window, cx))
                })
                .expect("failed to open main window");

                // Activate the application
                cx.activate(true);
            })
        })
        .detach();
    });
}
