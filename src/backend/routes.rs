//! Model API routes. Paths are parameterized on the model segment, so one
//! router serves every registered model; static segments like `count` win
//! over the id parameter.

use crate::backend::handlers::{
    count, create, delete_by_id, exists, find_by_id, list, login, logout, update,
};
use crate::backend::BackendCore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn model_routes(core: Arc<BackendCore>) -> Router {
    Router::new()
        .route("/:model", get(list).post(create))
        .route("/:model/count", get(count))
        .route("/:model/login", post(login))
        .route("/:model/logout", post(logout))
        .route(
            "/:model/:id",
            get(find_by_id).put(update).patch(update).delete(delete_by_id),
        )
        .route("/:model/:id/exists", get(exists))
        .with_state(core)
}
