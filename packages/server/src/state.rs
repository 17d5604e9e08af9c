use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::ws::registry::ConnectionRegistry;

/// Shared application state passed to all handlers.
///
/// The chat and signaling gateways hold independent connection registries:
/// a socket connected to one namespace is invisible to the other.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub chat: ConnectionRegistry,
    pub signaling: ConnectionRegistry,
}
