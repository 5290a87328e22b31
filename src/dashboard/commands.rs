use tauri::State;

use crate::{
    dashboard::{DashboardController, DashboardSnapshot, DashboardTab},
    settings::DashboardSettings,
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> DashboardController {
    state.dashboard.clone()
}

#[tauri::command]
pub async fn get_dashboard_state(state: State<'_, AppState>) -> Result<DashboardSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn login(state: State<'_, AppState>) -> Result<DashboardSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.login().await)
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<DashboardSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.logout().await)
}

#[tauri::command]
pub async fn select_tab(
    state: State<'_, AppState>,
    tab: DashboardTab,
) -> Result<DashboardSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.select_tab(tab).await)
}

#[tauri::command]
pub fn get_dashboard_settings(state: State<'_, AppState>) -> Result<DashboardSettings, String> {
    Ok(state.settings.stored())
}

/// Takes effect on the next launch; the running controller keeps its timing.
#[tauri::command]
pub fn set_dashboard_settings(
    settings: DashboardSettings,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state
        .settings
        .update_dashboard(settings)
        .map_err(|e| e.to_string())
}
