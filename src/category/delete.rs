//! Category deletion endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{Error, category::CategoryId};

use super::{create::CreateCategoryEndpointState, db::delete_category};

/// Handle category deletion requests.
///
/// Categories that still have expenses are not deleted.
pub async fn delete_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(()) => {
            tracing::info!("Deleted category {category_id}");
            StatusCode::OK.into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}
