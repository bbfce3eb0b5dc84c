use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::store::Store;

/// Shared application state, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        Self {
            store,
            tokens: TokenService::from_config(config),
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}
