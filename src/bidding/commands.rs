/// 입찰 관련 커맨드 처리
/// 1. 입찰 (대리 입찰 + 마감 연장)
/// 2. 즉시 구매
/// 두 커맨드 모두 경매 잠금 안에서 스냅샷 조회, 계산, 반영을 수행하고
/// 버전 충돌 시 처음부터 다시 시도한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{AuctionSnapshot, AuctionStatus, NewBid};
use crate::bidding::proxy;
use crate::error::{AuctionError, AuctionResult};
use crate::message_broker::publish_all;
use crate::state::AppState;
use crate::store::BidCommit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    /// 입찰자의 비공개 상한
    pub max_bid_cents: i64,
}

/// 즉시 구매 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuyNowCommand {
    pub auction_id: i64,
    pub buyer_id: i64,
}

/// 입찰 처리 결과
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BidOutcome {
    pub auction_id: i64,
    pub current_price_cents: i64,
    pub high_bidder_id: i64,
    pub end_at: DateTime<Utc>,
    pub extended: bool,
}

/// 1. 입찰
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    state: &AppState,
) -> AuctionResult<BidOutcome> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    if cmd.max_bid_cents <= 0 {
        return Err(AuctionError::InvalidBid(
            "bid amount must be positive".to_string(),
        ));
    }

    let _guard = state.locks.acquire(cmd.auction_id).await;
    let mut retries = 0;

    while retries < state.bidding.max_retries {
        let snapshot = load_snapshot(state, cmd.auction_id).await?;
        // 시각은 잠금 안에서 읽는다
        let now = state.clock.now();

        proxy::check_admission(&snapshot, cmd.bidder_id, cmd.max_bid_cents, now)?;

        let resolution = proxy::resolve(
            &snapshot.bids,
            cmd.bidder_id,
            cmd.max_bid_cents,
            state.bidding.increment_cents,
        );
        let new_end_at = proxy::soft_close_extension(
            snapshot.auction.end_at,
            now,
            state.bidding.soft_close_window,
        );

        let commit = BidCommit {
            auction_id: cmd.auction_id,
            expected_version: snapshot.auction.version,
            bids: resolution.bids.clone(),
            placed_at: now,
            new_end_at,
            new_status: None,
        };

        match state.store.commit_bids(commit).await {
            Ok(()) => {
                let end_at = new_end_at.unwrap_or(snapshot.auction.end_at);
                if let Some(extended_to) = new_end_at {
                    info!(
                        "{:<12} --> 마감 연장 id: {} -> {}",
                        "Command", cmd.auction_id, extended_to
                    );
                }
                info!(
                    "{:<12} --> 입찰 성공 id: {}, 현재 가격: {}, 최고 입찰자: {}",
                    "Command",
                    cmd.auction_id,
                    resolution.current_price_cents,
                    resolution.high_bidder_id
                );

                let events = bid_events(cmd.auction_id, &resolution.bids, new_end_at, now);
                publish_all(state.publisher.as_ref(), &events).await;

                return Ok(BidOutcome {
                    auction_id: cmd.auction_id,
                    current_price_cents: resolution.current_price_cents,
                    high_bidder_id: resolution.high_bidder_id,
                    end_at,
                    extended: new_end_at.is_some(),
                });
            }
            Err(AuctionError::ConcurrencyConflict(_)) => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    // 재시도 소진: 현재 상태로 다시 판정
    let snapshot = load_snapshot(state, cmd.auction_id).await?;
    proxy::check_admission(&snapshot, cmd.bidder_id, cmd.max_bid_cents, state.clock.now())?;
    Err(AuctionError::InvalidBid(
        "auction is busy, please retry".to_string(),
    ))
}

/// 2. 즉시 구매(낙찰)
pub async fn handle_buy_now(cmd: BuyNowCommand, state: &AppState) -> AuctionResult<BidOutcome> {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Command", cmd);

    let guard = state.locks.acquire(cmd.auction_id).await;
    let mut retries = 0;
    let mut result = None;

    while retries < state.bidding.max_retries {
        let snapshot = load_snapshot(state, cmd.auction_id).await?;
        let now = state.clock.now();

        proxy::check_open(&snapshot, now)?;
        let price = buy_now_price(&snapshot)?;

        let bid = NewBid {
            bidder_id: cmd.buyer_id,
            amount_cents: price,
            proxy_max_cents: price,
            auto: false,
        };
        let commit = BidCommit {
            auction_id: cmd.auction_id,
            expected_version: snapshot.auction.version,
            bids: vec![bid],
            placed_at: now,
            new_end_at: Some(now),
            new_status: Some(AuctionStatus::Ended),
        };

        match state.store.commit_bids(commit).await {
            Ok(()) => {
                info!(
                    "{:<12} --> BuyNowExecuted id: {}, 가격: {}",
                    "Command", cmd.auction_id, price
                );
                let events = [
                    AuctionEvent::BuyNowExecuted {
                        auction_id: cmd.auction_id,
                        buyer_id: cmd.buyer_id,
                        price_cents: price,
                        timestamp: now,
                    },
                    AuctionEvent::StatusChanged {
                        auction_id: cmd.auction_id,
                        status: AuctionStatus::Ended,
                        timestamp: now,
                    },
                ];
                publish_all(state.publisher.as_ref(), &events).await;
                result = Some(BidOutcome {
                    auction_id: cmd.auction_id,
                    current_price_cents: price,
                    high_bidder_id: cmd.buyer_id,
                    end_at: now,
                    extended: false,
                });
                break;
            }
            Err(AuctionError::ConcurrencyConflict(_)) => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let Some(outcome) = result else {
        let snapshot = load_snapshot(state, cmd.auction_id).await?;
        proxy::check_open(&snapshot, state.clock.now())?;
        return Err(AuctionError::InvalidBid(
            "auction is busy, please retry".to_string(),
        ));
    };

    // 종료된 경매의 잠금 항목 정리
    drop(guard);
    state.locks.forget(cmd.auction_id);
    Ok(outcome)
}

// endregion: --- Commands

// region:    --- Helpers
async fn load_snapshot(state: &AppState, auction_id: i64) -> AuctionResult<AuctionSnapshot> {
    state
        .store
        .load_auction(auction_id)
        .await?
        .ok_or(AuctionError::NotFound(auction_id))
}

fn buy_now_price(snapshot: &AuctionSnapshot) -> AuctionResult<i64> {
    let Some(price) = snapshot.auction.buy_now_cents else {
        return Err(AuctionError::InvalidBid(
            "auction has no buy-now price".to_string(),
        ));
    };
    if snapshot.current_price_cents() >= price {
        return Err(AuctionError::InvalidBid(
            "current price already reached the buy-now price".to_string(),
        ));
    }
    Ok(price)
}

fn bid_events(
    auction_id: i64,
    bids: &[NewBid],
    new_end_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<AuctionEvent> {
    let mut events: Vec<AuctionEvent> = bids
        .iter()
        .map(|bid| AuctionEvent::BidPlaced {
            auction_id,
            bidder_id: bid.bidder_id,
            amount_cents: bid.amount_cents,
            auto: bid.auto,
            timestamp: now,
        })
        .collect();
    if let Some(end_at) = new_end_at {
        events.push(AuctionEvent::AuctionExtended {
            auction_id,
            end_at,
            timestamp: now,
        });
    }
    events
}
// endregion: --- Helpers
