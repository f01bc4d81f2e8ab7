// region:    --- Imports
use super::view::{AuctionView, PublicBid};
use crate::auction::model::AuctionSnapshot;
use crate::error::{AuctionError, AuctionResult};
use crate::identity::{anonymous_label, mask_identity};
use crate::state::AppState;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 상세 조회
pub async fn get_auction_details(state: &AppState, auction_id: i64) -> AuctionResult<AuctionView> {
    info!("{:<12} --> 경매 상세 조회 id: {}", "Query", auction_id);
    let snapshot = load(state, auction_id).await?;
    let high_bidder = match snapshot.high_bidder_id() {
        Some(bidder_id) => Some(public_name(state, bidder_id).await),
        None => None,
    };
    Ok(AuctionView::from_snapshot(
        &snapshot,
        high_bidder,
        state.clock.now(),
    ))
}

/// 입찰 이력 조회 (최신순)
pub async fn get_bid_history(state: &AppState, auction_id: i64) -> AuctionResult<Vec<PublicBid>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    let snapshot = load(state, auction_id).await?;
    let mut history = Vec::with_capacity(snapshot.bids.len());
    for bid in snapshot.bids.iter().rev() {
        history.push(PublicBid {
            id: bid.id,
            amount_cents: bid.amount_cents,
            bidder: public_name(state, bid.bidder_id).await,
            auto: bid.auto,
            created_at: bid.created_at,
        });
    }
    Ok(history)
}

async fn load(state: &AppState, auction_id: i64) -> AuctionResult<AuctionSnapshot> {
    state
        .store
        .load_auction(auction_id)
        .await?
        .ok_or(AuctionError::NotFound(auction_id))
}

/// 마스킹된 표시명. 조회 실패 시 익명 표기
async fn public_name(state: &AppState, user_id: i64) -> String {
    match state.identities.display_identity(user_id).await {
        Ok(Some(identity)) => mask_identity(&identity),
        Ok(None) => anonymous_label(user_id),
        Err(e) => {
            warn!(
                "{:<12} --> 사용자 {} 표시명 조회 실패: {}",
                "Query", user_id, e
            );
            anonymous_label(user_id)
        }
    }
}

// endregion: --- Query Handlers
