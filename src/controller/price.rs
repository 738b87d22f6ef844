use actix_web::{get, web, Responder};
use serde::{Deserialize, Serialize};

use crate::{
    chain::ChainId,
    configuration::{AppState, State},
    error::Error,
    helpers::format_units_signed,
};

/// Decimals of the reward token USD aggregator.
const FEED_DECIMALS: u8 = 8;

#[get("/price/waya")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let answer = state
        .reader(ChainId::Bsc)
        .latest_answer(state.config.reward_price_feed)
        .await?;

    Ok(web::Json(Response {
        price: format_units_signed(&answer, FEED_DECIMALS),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub price: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{test, App};
    use bigdecimal::num_bigint::BigInt;

    use super::*;
    use crate::test_support::{state, FakeFarmConfig, FakeIndexer, FakeReader};

    #[actix_web::test]
    async fn test_price_is_scaled_by_feed_decimals() {
        let mut reader = FakeReader::active_pool();
        reader.answer = BigInt::from(253_450_000i64);
        let app_state = AppState::new(state(
            Arc::new(reader),
            Arc::new(FakeIndexer::with_pages(vec![])),
            Arc::new(FakeFarmConfig::default()),
        ));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state))
                .service(index),
        )
        .await;

        let req = test::TestRequest::get().uri("/price/waya").to_request();
        let response: Response = test::call_and_read_body_json(&app, req).await;

        assert_eq!(response.price, "2.5345");
    }
}
