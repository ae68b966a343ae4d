use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    routing, Json, Router,
};
use folio_core::{FolioApp, FolioError, RequestContext};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::{
    params::{FromRestParams, ResponseStatus, RestParams},
    FolioAxumError, FolioAxumState,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

fn map_json_rejection(rejection: JsonRejection) -> FolioAxumError {
    FolioError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

/// Context, service params and the response-status slot for one call.
fn call_parts<P: FromRestParams>(
    headers: &HeaderMap,
    query: HashMap<String, String>,
    method: &str,
    uri: &Uri,
) -> (RequestContext, P, ResponseStatus) {
    let rest = RestParams::from_parts("rest", headers, query, method, uri);
    let ctx = rest
        .header(REQUEST_ID_HEADER)
        .map(RequestContext::new)
        .unwrap_or_default();
    let status = rest.status.clone();
    (ctx, P::from_rest_params(rest), status)
}

/// How `GET /` reads the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mount {
    /// `GET /` lists every record.
    Collection,
    /// `GET /` answers the single record, or 404 when none exists.
    Singleton,
}

/// REST routes for the service registered as `service_name`.
///
/// Every verb is mounted; methods outside the service's capabilities are
/// refused by the pipeline with 405.
pub fn service_router<R, P>(service_name: Arc<String>, app: Arc<FolioApp<R, P>>, mount: Mount) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let state = FolioAxumState { app };

    let list = {
        let service_name = Arc::clone(&service_name);
        move |State(state): State<FolioAxumState<R, P>>,
              headers: HeaderMap,
              Query(query): Query<HashMap<String, String>>,
              OriginalUri(uri): OriginalUri| async move {
            let (ctx, params, _) = call_parts::<P>(&headers, query, "GET", &uri);

            let svc = state.app.service(&service_name)?;
            let res = svc.find(ctx, params).await?;
            Ok::<_, FolioAxumError>(Json(res))
        }
    };

    let single = {
        let service_name = Arc::clone(&service_name);
        move |State(state): State<FolioAxumState<R, P>>,
              headers: HeaderMap,
              Query(query): Query<HashMap<String, String>>,
              OriginalUri(uri): OriginalUri| async move {
            let (ctx, params, _) = call_parts::<P>(&headers, query, "GET", &uri);

            let svc = state.app.service(&service_name)?;
            let res = svc
                .find(ctx, params)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    let label = service_name.rsplit('/').next().unwrap_or_default();
                    FolioError::not_found(format!("No {label} content found"))
                })?;
            Ok::<_, FolioAxumError>(Json(res))
        }
    };

    let index = match mount {
        Mount::Collection => routing::get(list),
        Mount::Singleton => routing::get(single),
    };

    let router = Router::new()
        .route(
            "/",
            index.post({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<FolioAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      data: Result<Json<R>, JsonRejection>| async move {
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let (ctx, params, status) = call_parts::<P>(&headers, query, "POST", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.create(ctx, data, params).await?;
                    Ok::<_, FolioAxumError>((status.or(StatusCode::CREATED), Json(res)))
                }
            }),
        )
        .route(
            "/{id}",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<FolioAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>| async move {
                    let (ctx, params, _) = call_parts::<P>(&headers, query, "GET", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.get(ctx, &id, params).await?;
                    Ok::<_, FolioAxumError>(Json(res))
                }
            })
            .put({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<FolioAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>,
                      data: Result<Json<R>, JsonRejection>| async move {
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let (ctx, params, _) = call_parts::<P>(&headers, query, "PUT", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.update(ctx, &id, data, params).await?;
                    Ok::<_, FolioAxumError>(Json(res))
                }
            })
            .patch({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<FolioAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>,
                      data: Result<Json<R>, JsonRejection>| async move {
                    let Json(data) = data.map_err(map_json_rejection)?;
                    let (ctx, params, _) = call_parts::<P>(&headers, query, "PATCH", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.patch(ctx, Some(&id), data, params).await?;
                    Ok::<_, FolioAxumError>(Json(res))
                }
            })
            .delete({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<FolioAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>| async move {
                    let (ctx, params, _) = call_parts::<P>(&headers, query, "DELETE", &uri);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.remove(ctx, Some(&id), params).await?;
                    Ok::<_, FolioAxumError>(Json(res))
                }
            }),
        )
        .with_state(state);

    // Outermost first: assign the id, then echo it on the response.
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}
