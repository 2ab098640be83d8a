// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]
// Disable console on Windows for non-dev builds.
#![cfg_attr(not(feature = "dev"), windows_subsystem = "windows")]

mod board;
mod config;
#[cfg(feature = "dev")]
mod dev_tools;

#[cfg(feature = "dev_native")]
use bevy::remote::http::RemoteHttpPlugin;
use bevy::{asset::AssetMetaCheck, prelude::*};
use bevy_rich_text3d::Text3dPlugin;
use bevy_tweening::TweeningPlugin;

fn main() -> AppExit {
    App::new().add_plugins(AppPlugin).run()
}

pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        // Add Bevy plugins.
        app.add_plugins((
            DefaultPlugins
                .set(AssetPlugin {
                    // Card images ship without .meta files.
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Window {
                        title: "3D Board".to_string(),
                        fit_canvas_to_parent: true,
                        ..default()
                    }
                    .into(),
                    ..default()
                }),
            TweeningPlugin,
            Text3dPlugin {
                load_system_fonts: true,
                ..default()
            },
        ));

        // Add other plugins.
        app.add_plugins((
            config::plugin,
            board::plugin,
            #[cfg(feature = "dev")]
            dev_tools::plugin,
        ));

        // Add Bevy Remote Protocol for debugging (native dev only)
        #[cfg(feature = "dev_native")]
        {
            use bevy::remote::RemotePlugin;

            // Parse --brp-port=XXXX from CLI args
            let port = std::env::args()
                .find(|arg| arg.starts_with("--brp-port="))
                .and_then(|arg| arg.strip_prefix("--brp-port=").map(|s| s.to_string()))
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(15702);

            app.add_plugins(RemotePlugin::default());
            app.add_plugins(RemoteHttpPlugin::default().with_port(port));
            info!("BRP listening on port {}", port);
        }

        // Order new `AppSystems` variants by adding them here:
        app.configure_sets(
            Update,
            (
                AppSystems::TickTimers,
                AppSystems::RecordInput,
                AppSystems::Update,
            )
                .chain(),
        );
    }
}

/// High-level groupings of systems for the app in the `Update` schedule.
/// When adding a new variant, make sure to order it in the `configure_sets`
/// call above.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub(crate) enum AppSystems {
    /// Tick timers, settle finished motions, advance fades.
    TickTimers,
    /// Read the pointer and turn hovers and clicks into board requests.
    RecordInput,
    /// Run the animation coordinator and sync the scene.
    Update,
}
