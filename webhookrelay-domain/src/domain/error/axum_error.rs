use crate::RelayError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (&self).into_response()
    }
}

impl IntoResponse for &RelayError {
    fn into_response(self) -> Response {
        let body = self.as_application().as_json();

        let status: StatusCode = self.into();

        (status, Json(body)).into_response()
    }
}
