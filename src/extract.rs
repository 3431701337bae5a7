//! # Extractors
//!
//! Thin wrappers over axum's `Form` and `Path` whose rejections are
//! [`AppError::BadRequest`], so a malformed request renders the error view
//! like any other handler failure.

use crate::error::AppError;
use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
};

/// URL-encoded form body.
pub struct Form<T>(pub T);

impl<T, S> FromRequest<S> for Form<T>
where
    axum::Form<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Form(value) = axum::Form::<T>::from_request(req, state).await?;
        Ok(Form(value))
    }
}

/// Path parameters.
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    axum::extract::Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Path(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Login {
        #[allow(dead_code)]
        username: String,
        #[allow(dead_code)]
        password: String,
    }

    fn form_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_form_field_is_a_bad_request() {
        let rejection = Form::<Login>::from_request(form_request("username=ana"), &())
            .await
            .err()
            .unwrap();

        assert!(matches!(rejection, AppError::BadRequest(ref m) if m.contains("password")));
        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn complete_form_is_extracted() {
        let result =
            Form::<Login>::from_request(form_request("username=ana&password=pw"), &()).await;
        assert!(result.is_ok());
    }
}
