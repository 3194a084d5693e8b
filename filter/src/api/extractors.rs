//! Filter extractors for API routes
//!
//! Both extractors only parse. Validation needs a property snapshot, so the
//! handler passes the result to [`FilterService`] together with the space id
//! and a cancellation token.

use axum::body::Bytes;
use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;

use crate::filters::{FilterExpression, FilterItem, FilterService, SortOptions};

use super::types::ApiError;

/// Route extension naming the endpoint whose default conditions apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEndpoint(pub &'static str);

/// Filters and sort options from the URL query string
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilters {
    pub items: Vec<FilterItem>,
    pub sort: SortOptions,
}

impl<S> FromRequestParts<S> for QueryFilters
where
    FilterService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let service = FilterService::from_ref(state);
        let raw_query = parts.uri.query().unwrap_or_default();
        let endpoint = parts.extensions.get::<FilterEndpoint>().map(|e| e.0);

        let items = service.query_parser().parse(raw_query, endpoint)?;
        let sort = SortOptions::from_query(raw_query)?;
        Ok(Self { items, sort })
    }
}

/// JSON filter expression from the request body; `None` means no filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBody(pub Option<FilterExpression>);

impl<S> FromRequest<S> for FilterBody
where
    FilterService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let service = FilterService::from_ref(state);
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request("INVALID_BODY", rejection.body_text()))?;

        let expression = service.expression_parser().parse_bytes(&body)?;
        Ok(Self(expression))
    }
}
