use axum::{
    async_trait,
    extract::{rejection::JsonRejection, rejection::QueryRejection, FromRequest, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::repositories::PageRequest;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON body extractor that reports malformed bodies as validation errors
/// instead of axum's plain-text rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ServiceError {
    match rejection {
        JsonRejection::JsonDataError(e) => ServiceError::ValidationError(e.body_text()),
        JsonRejection::JsonSyntaxError(_) => {
            ServiceError::ValidationError("Request body is not valid JSON".to_string())
        }
        JsonRejection::MissingJsonContentType(_) => ServiceError::ValidationError(
            "Expected request with `Content-Type: application/json`".to_string(),
        ),
        other => ServiceError::ValidationError(other.body_text()),
    }
}

/// Parses a path identifier; anything that is not a UUID cannot name a
/// stored record, so it is reported as `not_found`.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::NotFound(not_found.to_string()))
}

/// `?page=&limit=` on list endpoints. Both absent means "not paginated".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PaginationParams {
    pub fn from_query(query: Result<Query<Self>, QueryRejection>) -> Result<Self, ServiceError> {
        query
            .map(|Query(params)| params)
            .map_err(|e| ServiceError::ValidationError(e.body_text()))
    }

    /// Resolves to a page request, clamping the page size to the configured bounds.
    pub fn page_request(&self, config: &AppConfig) -> Option<PageRequest> {
        if self.page.is_none() && self.limit.is_none() {
            return None;
        }
        let per_page = self
            .limit
            .unwrap_or(config.api_default_page_size)
            .clamp(1, config.api_max_page_size);
        Some(PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page,
        })
    }
}

/// Paginated list envelope: `{orders, page, pages, total}`.
#[derive(Debug, Serialize)]
pub struct PaginatedOrders<T> {
    pub orders: Vec<T>,
    pub page: u64,
    pub pages: u64,
    pub total: u64,
}

impl<T> PaginatedOrders<T> {
    pub fn new(orders: Vec<T>, page: PageRequest, total: u64) -> Self {
        Self {
            orders,
            page: page.page,
            pages: total.div_ceil(page.per_page.max(1)),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "k3J9-qpX2_vLm8RtZw4Yb7NcHf1DsGe6Ua0".into(),
            "127.0.0.1".into(),
            5000,
            "test".into(),
        )
    }

    #[test]
    fn no_params_means_unpaginated() {
        assert_eq!(PaginationParams::default().page_request(&config()), None);
    }

    #[test]
    fn limit_is_clamped() {
        let cfg = config();
        let params = PaginationParams {
            page: None,
            limit: Some(10_000),
        };
        let page = params.page_request(&cfg).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, cfg.api_max_page_size);

        let zero = PaginationParams {
            page: Some(0),
            limit: Some(0),
        };
        let page = zero.page_request(&cfg).unwrap();
        assert_eq!((page.page, page.per_page), (1, 1));
    }

    #[test]
    fn page_count_rounds_up() {
        let envelope = PaginatedOrders::<u8>::new(vec![], PageRequest { page: 2, per_page: 20 }, 41);
        assert_eq!(envelope.pages, 3);
        let empty = PaginatedOrders::<u8>::new(vec![], PageRequest { page: 1, per_page: 20 }, 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(
            parse_id("abc", "Order not found"),
            Err(ServiceError::NotFound(ref m)) if m == "Order not found"
        ));
    }
}
