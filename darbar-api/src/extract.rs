use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections are answered with the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);
