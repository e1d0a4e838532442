use axum::extract::FromRef;

use crate::db::Storage;

#[derive(Debug, Clone)]
pub struct AppState {
    pub storage: Storage,
}

impl FromRef<AppState> for Storage {
    fn from_ref(state: &AppState) -> Self {
        // pool uses an Arc internally so clone is cheap
        state.storage.clone()
    }
}
