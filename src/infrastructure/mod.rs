pub mod http_api;
pub mod kv_store;
pub mod models;
pub mod notifier;
pub mod ws;
