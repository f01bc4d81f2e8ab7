// region:    --- Imports
use crate::auction::model::{AuctionSnapshot, AuctionStatus, Bid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction View
/// 공개 경매 정보
/// 최고 입찰자는 마스킹된 표시명으로만 노출된다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuctionView {
    pub id: i64,
    pub title: String,
    pub status: AuctionStatus,
    pub display_status: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub buy_now_cents: Option<i64>,
    pub reserve_met: bool,
    pub current_price_cents: i64,
    /// 입찰 시도 수. 자동 입찰 기록은 세지 않는다.
    pub total_bids: usize,
    pub high_bidder: Option<String>,
    pub time_remaining_seconds: i64,
}

impl AuctionView {
    pub fn from_snapshot(
        snapshot: &AuctionSnapshot,
        high_bidder: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let auction = &snapshot.auction;
        let current_price_cents = snapshot.current_price_cents();
        Self {
            id: auction.id,
            title: auction.title.clone(),
            status: auction.status,
            display_status: auction.status.display_label().to_string(),
            start_at: auction.start_at,
            end_at: auction.end_at,
            buy_now_cents: auction.buy_now_cents,
            reserve_met: reserve_met(auction.reserve_cents, snapshot.high_bid()),
            current_price_cents,
            total_bids: snapshot.bids.iter().filter(|bid| !bid.auto).count(),
            high_bidder,
            time_remaining_seconds: time_remaining(auction.status, auction.end_at, now),
        }
    }
}

/// 예약가가 있고 현재가가 그 이상일 때만 true
fn reserve_met(reserve_cents: Option<i64>, high_bid: Option<&Bid>) -> bool {
    match (reserve_cents, high_bid) {
        (Some(reserve), Some(bid)) => bid.amount_cents >= reserve,
        _ => false,
    }
}

fn time_remaining(status: AuctionStatus, end_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    match status {
        AuctionStatus::Live => (end_at - now).num_seconds().max(0),
        _ => 0,
    }
}
// endregion: --- Auction View

// region:    --- Public Bid
/// 공개 입찰 이력 항목. 비공개 상한은 포함하지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicBid {
    pub id: i64,
    pub amount_cents: i64,
    pub bidder: String,
    pub auto: bool,
    pub created_at: DateTime<Utc>,
}
// endregion: --- Public Bid
