use super::DashboardSnapshot;

pub const STATE_CHANGED_EVENT: &str = "dashboard-state-changed";

/// Receives every snapshot the controller publishes, in mutation order.
pub trait StateEmitter: Send + Sync {
    fn emit_state(&self, snapshot: &DashboardSnapshot);
}

/// Headless sink that only logs what would have been pushed to a front end.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmitter;

impl StateEmitter for LogEmitter {
    fn emit_state(&self, snapshot: &DashboardSnapshot) {
        log::debug!(
            "{STATE_CHANGED_EVENT}: authenticated={} tab={:?} recommendations={}",
            snapshot.session.is_authenticated,
            snapshot.session.active_tab,
            snapshot.recommendations_status(),
        );
    }
}

#[cfg(feature = "desktop")]
impl StateEmitter for tauri::AppHandle {
    fn emit_state(&self, snapshot: &DashboardSnapshot) {
        use tauri::Emitter;

        if let Err(err) = self.emit(STATE_CHANGED_EVENT, snapshot) {
            log::error!("failed to emit {STATE_CHANGED_EVENT}: {err}");
        }
    }
}
