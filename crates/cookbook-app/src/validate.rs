use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::response::{IntoResponse, Response};
use garde::{Report, Validate};
use http::{request::Parts, StatusCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

use crate::state::AppState;

/// Extractor wrapper, which validates extracted payload (json body or query) with garde
#[derive(Debug, Clone, Copy, Default)]
pub struct Garde<E>(pub E);

impl<E> Deref for Garde<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Garde<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<E: Display> Display for Garde<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> Garde<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

#[derive(Debug)]
pub enum ValidationRejection<V, E> {
    /// Payload was extracted, but is not valid
    Valid(V),
    /// Inner extractor failed
    Inner(E),
}

impl<V: Display, E: Display> Display for ValidationRejection<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationRejection::Valid(errors) => write!(f, "{errors}"),
            ValidationRejection::Inner(error) => write!(f, "{error}"),
        }
    }
}

impl<V: Error + 'static, E: Error + 'static> Error for ValidationRejection<V, E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ValidationRejection::Valid(ve) => Some(ve),
            ValidationRejection::Inner(e) => Some(e),
        }
    }
}

impl<V: serde::Serialize, E: IntoResponse> IntoResponse for ValidationRejection<V, E> {
    fn into_response(self) -> Response {
        match self {
            ValidationRejection::Valid(v) => {
                (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(v)).into_response()
            }
            ValidationRejection::Inner(e) => e.into_response(),
        }
    }
}

pub type GardeRejection<E> = ValidationRejection<Report, E>;

impl<E> From<Report> for GardeRejection<E> {
    fn from(value: Report) -> Self {
        Self::Valid(value)
    }
}

impl<Extractor, T> FromRequest<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
{
    type Rejection = GardeRejection<<Extractor as FromRequest<AppState>>::Rejection>;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state)
            .await
            .map_err(GardeRejection::Inner)?;

        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}

// Query and Path extractors work on parts only
impl<Extractor, T> FromRequestParts<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
{
    type Rejection = GardeRejection<<Extractor as FromRequestParts<AppState>>::Rejection>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state)
            .await
            .map_err(GardeRejection::Inner)?;

        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use axum::{
        body::Body,
        extract::Query,
        routing::{get, post},
        Json, Router,
    };
    use cookbook_auth::token::TokenManager;
    use cookbook_dal::comment::CreateComment;
    use garde::Path;
    use tower::ServiceExt as _;

    use super::*;
    use crate::{rest_api::Paging, state::AppConfig};

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    async fn test_state() -> AppState {
        let pool = cookbook_dal::new_pool("sqlite::memory:").await.unwrap();
        let config = AppConfig {
            base_url: "http://localhost:3000".parse().unwrap(),
            default_page_size: 10,
        };
        let tokens = TokenManager::new(SECRET, Duration::from_secs(60)).unwrap();
        AppState::new(config, pool, tokens)
    }

    async fn comment(Garde(Json(payload)): Garde<Json<CreateComment>>) -> String {
        payload.content
    }

    async fn paging(Garde(Query(_paging)): Garde<Query<Paging>>) -> &'static str {
        "ok"
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/comment", post(comment))
            .route("/paging", get(paging))
            .with_state(state)
    }

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/comment")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request {
        http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_validated_json() {
        let app = router(test_state().await);

        let res = app
            .clone()
            .oneshot(json_request(r#"{"content": "Tasty indeed"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .clone()
            .oneshot(json_request(r#"{"content": "no"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(report.to_string().contains("content"));

        let res = app.oneshot(json_request("not json")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validated_query() {
        let app = router(test_state().await);

        let res = app
            .clone()
            .oneshot(get_request("/paging?page=2&page_size=5"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .clone()
            .oneshot(get_request("/paging?page=0"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = app
            .oneshot(get_request("/paging?page_size=5000"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_garde_wrapper() {
        let mut inner = String::from("soup");
        let mut v = Garde(inner.clone());
        assert_eq!(&inner, v.deref());
        inner.push_str(" du jour");
        v.deref_mut().push_str(" du jour");
        assert_eq!(inner, v.to_string());
        assert_eq!(inner, v.into_inner());
    }

    #[test]
    fn test_rejection_display_and_source() {
        let mut report = Report::new();
        report.append(Path::empty(), garde::Error::new("too short"));
        let s = report.to_string();
        let rejection = GardeRejection::<io::Error>::Valid(report);
        assert_eq!(rejection.to_string(), s);
        assert!(matches!(rejection.source(), Some(source) if source.downcast_ref::<Report>().is_some()));

        let rejection = GardeRejection::<io::Error>::Inner(io::Error::other("broken body"));
        assert_eq!(rejection.to_string(), "broken body");
        assert!(matches!(rejection.source(), Some(source) if source.downcast_ref::<io::Error>().is_some()));
    }
}
