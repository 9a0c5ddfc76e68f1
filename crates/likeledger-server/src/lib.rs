pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use config::{LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use handlers::router;
pub use server::{LedgerServer, init_tracing};
pub use state::AppState;
