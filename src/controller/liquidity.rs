//! Active liquidity endpoint
//!
//! Responses are kept in the process-wide edge cache for as long as their
//! `Cache-Control` allows.

use actix_web::{
    get,
    http::{header, StatusCode},
    web, HttpRequest, HttpResponse,
};
use tracing::debug;

use crate::{
    cache::CachedResponse,
    configuration::{AppState, State},
    error::Error,
    handler::liquidity::active_liquidity,
    helpers::{edge_ttl, parse_extended_pool_params},
};

#[get("/liquidity/{chain_id}/{address}")]
pub async fn index(
    state: web::Data<AppState<State>>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, Error> {
    let (chain_id, address) = path.into_inner();
    let (chain, address) = parse_extended_pool_params(&chain_id, &address)?;

    let cache_key = format!("{} {}", req.method(), req.uri());

    if let Some(cached) = state.edge_cache.get(&cache_key).await {
        debug!("Edge cache hit: {}", cache_key);
        return Ok(replay(cached));
    }

    let outcome = active_liquidity(&state, chain, &address).await?;
    let cache_control = outcome.cache_control();
    let body = serde_json::to_vec(outcome.result())?;

    if let Some(ttl) = edge_ttl(cache_control) {
        let app = state.get_ref().clone();
        let cached = CachedResponse {
            status: StatusCode::OK.as_u16(),
            body: body.clone(),
            headers: vec![
                (
                    header::CONTENT_TYPE.to_string(),
                    String::from("application/json"),
                ),
                (
                    header::CACHE_CONTROL.to_string(),
                    cache_control.to_owned(),
                ),
            ],
        };
        tokio::spawn(async move {
            app.edge_cache.set_with_ttl(&cache_key, cached, ttl).await;
        });
    }

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .insert_header((header::CACHE_CONTROL, cache_control))
        .body(body))
}

fn replay(cached: CachedResponse) -> HttpResponse {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = HttpResponse::build(status);

    for (name, value) in cached.headers {
        response.insert_header((name, value));
    }

    response.body(cached.body)
}
