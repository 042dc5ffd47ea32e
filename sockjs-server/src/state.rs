use std::sync::Arc;

use crate::config::ServerConfig;
use crate::router::Router;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(router: Router, config: ServerConfig) -> Self {
        Self {
            router: Arc::new(router),
            config: Arc::new(config),
        }
    }
}
