//! Shared test utilities

use std::sync::Arc;

use fleet_ota::api::ApiState;
use fleet_ota::{DeviceDefaults, Fleet};
use tokio::sync::Mutex;

/// Set up the standard seeded fleet
#[must_use]
pub fn setup_fleet() -> Fleet {
    Fleet::seeded(DeviceDefaults::default()).expect("failed to seed test fleet")
}

/// Build API state over a fresh seeded fleet
#[allow(dead_code)]
pub fn setup_state(api_key: Option<&str>) -> Arc<ApiState> {
    Arc::new(ApiState {
        fleet: Arc::new(Mutex::new(setup_fleet())),
        api_key: api_key.map(ToString::to_string),
    })
}
