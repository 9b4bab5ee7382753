//! Extractors whose rejections come back as `ApiError` JSON rather than
//! axum's plain-text responses.

use axum::extract::{Json, Path, Query};
use axum_extra::extract::WithRejection;

use crate::error::ApiError;

pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;
pub type PathParam<T> = WithRejection<Path<T>, ApiError>;
pub type QueryParams<T> = WithRejection<Query<T>, ApiError>;
