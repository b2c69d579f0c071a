use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::notification as NotificationApi;
use domain::notification::NewNotification;

use log::*;

/// POST insert a new notification for a user.
///
/// The inserted row is pushed to every realtime subscriber filtered on its `user_id`.
pub async fn create(
    State(app_state): State<AppState>,
    Json(new_notification): Json<NewNotification>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Notification from: {new_notification:?}");

    let notification =
        NotificationApi::create(app_state.event_publisher.as_ref(), new_notification).await?;

    debug!("New Notification: {notification:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), notification)),
    ))
}
