pub mod dashboard;
pub mod error;
pub mod models;
pub mod recommendations;
pub mod settings;
pub mod telemetry;
pub mod utils;

pub use dashboard::{DashboardController, DashboardSnapshot, DashboardTab, RecommendationLoadState};
pub use error::{DashboardError, DashboardResult};

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
pub(crate) use desktop::AppState;

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Arc;

    use tauri::Manager;

    use crate::{
        dashboard::{
            commands::{
                get_dashboard_settings, get_dashboard_state, login, logout, select_tab,
                set_dashboard_settings,
            },
            DashboardController,
        },
        settings::SettingsStore,
        utils::init_logging,
    };

    pub(crate) struct AppState {
        pub(crate) dashboard: DashboardController,
        pub(crate) settings: SettingsStore,
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        // Reads RUST_LOG, defaults to info
        init_logging(log::LevelFilter::Info);

        log::info!("EnerX starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;
                    let settings = settings_store.dashboard();
                    log::info!(
                        "Recommendation latency {}ms, timeout {}ms",
                        settings.recommendation_latency_ms,
                        settings.generation_timeout_ms
                    );

                    let dashboard =
                        DashboardController::from_settings(&settings, Arc::new(app.handle().clone()))?;

                    app.manage(AppState {
                        dashboard,
                        settings: settings_store,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                get_dashboard_state,
                login,
                logout,
                select_tab,
                get_dashboard_settings,
                set_dashboard_settings,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
