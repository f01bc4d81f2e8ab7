// region:    --- Imports
use crate::auction::model::NewAuction;
use crate::bidding::commands::{handle_buy_now, handle_place_bid, BuyNowCommand, PlaceBidCommand};
use crate::error::AuctionResult;
use crate::query;
use crate::query::view::{AuctionView, PublicBid};
use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Router
pub fn routes(state: Arc<AppState>) -> Router {
    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/auctions", post(handle_create_auction))
        .route("/auctions/:id", get(handle_get_auction))
        .route(
            "/auctions/:id/bids",
            get(handle_get_bid_history).post(handle_bid),
        )
        .route("/auctions/:id/buy-now", post(handle_buy_now_request))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 64))
        .with_state(state)
}
// endregion: --- Router

// region:    --- Requests
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub bidder_id: i64,
    pub max_bid_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct BuyNowRequest {
    pub buyer_id: i64,
}

/// 입찰 응답. 호출자에게만 자신의 최고 입찰 여부를 알려준다.
#[derive(Debug, Serialize, Deserialize)]
pub struct BidResponse {
    pub auction: AuctionView,
    pub is_high_bidder: bool,
    pub extended: bool,
}
// endregion: --- Requests

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    Json(req): Json<BidRequest>,
) -> AuctionResult<Json<BidResponse>> {
    info!(
        "{:<12} --> 입찰 요청 id: {}, bidder: {}",
        "Handler", auction_id, req.bidder_id
    );
    let cmd = PlaceBidCommand {
        auction_id,
        bidder_id: req.bidder_id,
        max_bid_cents: req.max_bid_cents,
    };
    let outcome = handle_place_bid(cmd, &state).await?;
    let auction = query::handlers::get_auction_details(&state, auction_id).await?;
    Ok(Json(BidResponse {
        auction,
        is_high_bidder: outcome.high_bidder_id == req.bidder_id,
        extended: outcome.extended,
    }))
}

/// 즉시 구매 요청 처리
pub async fn handle_buy_now_request(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    Json(req): Json<BuyNowRequest>,
) -> AuctionResult<Json<AuctionView>> {
    info!(
        "{:<12} --> 즉시 구매 요청 id: {}, buyer: {}",
        "Handler", auction_id, req.buyer_id
    );
    let cmd = BuyNowCommand {
        auction_id,
        buyer_id: req.buyer_id,
    };
    handle_buy_now(cmd, &state).await?;
    let auction = query::handlers::get_auction_details(&state, auction_id).await?;
    Ok(Json(auction))
}

/// 경매 등록
pub async fn handle_create_auction(
    State(state): State<Arc<AppState>>,
    Json(new_auction): Json<NewAuction>,
) -> AuctionResult<impl IntoResponse> {
    info!("{:<12} --> 경매 등록: {}", "Handler", new_auction.title);
    let auction = state.store.create_auction(new_auction).await?;
    let view = query::handlers::get_auction_details(&state, auction.id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 상세 조회
pub async fn handle_get_auction(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
) -> AuctionResult<Json<AuctionView>> {
    let view = query::handlers::get_auction_details(&state, auction_id).await?;
    Ok(Json(view))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
) -> AuctionResult<Json<Vec<PublicBid>>> {
    let history = query::handlers::get_bid_history(&state, auction_id).await?;
    Ok(Json(history))
}

pub async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// endregion: --- Query Handlers
