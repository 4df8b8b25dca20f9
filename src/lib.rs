pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;

pub use application::cart_store::CartStore;
pub use application::order_service::OrderService;
pub use application::permission_channel::{ChannelHandle, PermissionChannel, ReconnectPolicy};
pub use config::AppConfig;
pub use errors::AppError;
pub use infrastructure::http_api::HttpOrderApi;
pub use infrastructure::kv_store::{FileStore, MemoryStore};
pub use infrastructure::ws::WsConnector;
