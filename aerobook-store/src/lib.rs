pub mod app_config;
pub mod http_gateway;

pub use app_config::Config;
pub use http_gateway::HttpGateway;
