//! 请求提取器
//! 包装 axum 的 Json / Path / Query，使拒绝统一转换为 AppError 的 JSON 错误体

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// 反序列化 JSON 请求体并执行 `Validate`
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// 路径参数，解析失败返回 400
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        Ok(ApiPath(value))
    }
}

/// 查询参数，解析失败返回 400
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        Ok(ApiQuery(value))
    }
}

// serde 的原始错误只写日志，不返回给客户端
fn json_rejection(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected JSON body");

    let message = match rejection {
        JsonRejection::JsonDataError(_) => "Request body has missing or invalid fields",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`"
        }
        JsonRejection::BytesRejection(_) => "Request body could not be read",
        _ => "Invalid request body",
    };

    AppError::validation(message)
}

fn path_rejection(rejection: PathRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected path parameters");
    AppError::validation("Invalid path parameter")
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected query string");
    AppError::validation("Invalid query parameters")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Validate)]
    struct NewItem {
        #[validate(length(min = 1, max = 10))]
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Window {
        #[allow(dead_code)]
        from: chrono::NaiveDate,
    }

    async fn create(ValidatedJson(body): ValidatedJson<NewItem>) -> String {
        body.name
    }

    async fn fetch(ApiPath(id): ApiPath<Uuid>) -> String {
        id.to_string()
    }

    async fn search(ApiQuery(_window): ApiQuery<Window>) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/items", post(create).get(search))
            .route("/items/{id}", get(fetch))
    }

    async fn send(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/items")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let response = app().oneshot(post_json(r#"{"name":"pump"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_validation_error() {
        let (status, json) = send(post_json(r#"{"name": 5}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], 400);
        let message = json["error"]["message"].as_str().unwrap();
        assert!(!message.contains("invalid type"));
    }

    #[tokio::test]
    async fn test_syntax_error_is_validation_error() {
        let (status, json) = send(post_json("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Request body is not valid JSON");
    }

    #[tokio::test]
    async fn test_failed_validate_is_validation_error() {
        let (status, json) = send(post_json(r#"{"name":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_non_uuid_path_is_validation_error() {
        let req = Request::builder()
            .uri("/items/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Invalid path parameter");
    }

    #[tokio::test]
    async fn test_bad_query_is_validation_error() {
        let req = Request::builder()
            .uri("/items?from=yesterday")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Invalid query parameters");
    }
}
