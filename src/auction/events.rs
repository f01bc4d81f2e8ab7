use crate::auction::model::AuctionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 외부로 발행되는 경매 도메인 이벤트
/// 입찰자의 비공개 상한(proxy max)은 싣지 않는다.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AuctionEvent {
    // 입찰 이벤트
    BidPlaced {
        auction_id: i64,
        bidder_id: i64,
        amount_cents: i64,
        auto: bool,
        timestamp: DateTime<Utc>,
    },
    // 마감 연장 이벤트
    AuctionExtended {
        auction_id: i64,
        end_at: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    // 즉시 구매 이벤트
    BuyNowExecuted {
        auction_id: i64,
        buyer_id: i64,
        price_cents: i64,
        timestamp: DateTime<Utc>,
    },
    // 상태 전이 이벤트
    StatusChanged {
        auction_id: i64,
        status: AuctionStatus,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> i64 {
        match self {
            AuctionEvent::BidPlaced { auction_id, .. }
            | AuctionEvent::AuctionExtended { auction_id, .. }
            | AuctionEvent::BuyNowExecuted { auction_id, .. }
            | AuctionEvent::StatusChanged { auction_id, .. } => *auction_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::AuctionExtended { .. } => "AuctionExtended",
            AuctionEvent::BuyNowExecuted { .. } => "BuyNowExecuted",
            AuctionEvent::StatusChanged { .. } => "StatusChanged",
        }
    }
}
