mod error;
mod server;

pub use error::{INVALID_REQUEST_BODY, ProxyError};
pub use server::{AppState, RelayServer, create_router};
