//! HTTP Layer - 对外 REST 接口
//!
//! 只做协议转换，流水线逻辑全部在应用层

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
