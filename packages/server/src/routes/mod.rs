//! REST route tree, all mounted under `/api/v1`. The WebSocket endpoints
//! (`/ws/chat`, `/ws/signaling`) live outside this tree and are wired up
//! directly in `build_router`.

mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}
