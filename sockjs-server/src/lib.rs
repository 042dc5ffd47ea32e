pub mod config;
pub mod connection;
pub mod demo;
pub mod http;
pub mod pool;
pub mod router;
pub mod session;
pub mod state;
pub mod transports;

pub use config::ServerConfig;
pub use connection::ConnectionClass;
pub use http::build_router;
pub use pool::SessionPool;
pub use router::Router;
pub use session::Session;
pub use state::AppState;
