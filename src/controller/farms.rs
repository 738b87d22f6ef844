//! Farm snapshot endpoints
//!
//! Public read of the saved snapshot plus the protected manual refresh and
//! LP APR upload.

use std::str::FromStr;

use actix_web::{get, post, web, HttpResponse};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    chain::ChainId,
    configuration::{AppState, State},
    error::Error,
    handler::farm_snapshot::save_farms,
    model::AprMap,
};

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    auth: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub result: bool,
}

fn authorize(state: &State, query: &AuthQuery) -> Result<(), Error> {
    let auth = query.auth.to_owned().context("Auth is required")?;

    if auth != state.config.auth {
        return Err(Error::Unauthorized);
    }

    Ok(())
}

#[get("/farms/{chain_id}")]
pub async fn index(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let chain = ChainId::from_str(&path.into_inner())?;

    match state.kv.get_farms(chain).await? {
        Some(saved) => Ok(HttpResponse::Ok().json(saved)),
        None => Err(Error::NotFound(format!("farms of chain {}", chain))),
    }
}

#[post("/farms/{chain_id}/refresh")]
pub async fn refresh(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
    query: web::Query<AuthQuery>,
) -> Result<HttpResponse, Error> {
    let chain = ChainId::from_str(&path.into_inner())?;
    authorize(&state, &query)?;

    info!("Manual farms refresh on {}", chain);
    let saved = save_farms(&state, chain).await?;

    Ok(HttpResponse::Ok().json(saved))
}

#[post("/farms/{chain_id}/apr")]
pub async fn apr(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
    query: web::Query<AuthQuery>,
    data: web::Json<AprMap>,
) -> Result<HttpResponse, Error> {
    let chain = ChainId::from_str(&path.into_inner())?;
    authorize(&state, &query)?;

    let apr_map = data
        .into_inner()
        .into_iter()
        .map(|(address, apr)| (address.to_lowercase(), apr))
        .collect::<AprMap>();

    state.kv.save_apr(chain, &apr_map).await?;
    info!("Stored {} LP APRs on {}", apr_map.len(), chain);

    Ok(HttpResponse::Ok().json(UpdateResponse { result: true }))
}
