// region:    --- Imports
use crate::error::{AuctionError, AuctionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Auction Status
/// 경매 상태
/// SCHEDULED -> LIVE -> ENDED 순서로만 전이된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Ended,
}

impl AuctionStatus {
    /// 저장소 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "SCHEDULED",
            AuctionStatus::Live => "LIVE",
            AuctionStatus::Ended => "ENDED",
        }
    }

    /// 화면 표기
    pub fn display_label(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "upcoming",
            AuctionStatus::Live => "active",
            AuctionStatus::Ended => "completed",
        }
    }

    /// 바로 다음 단계로의 전이만 허용
    pub fn can_transition_to(&self, next: AuctionStatus) -> bool {
        matches!(
            (self, next),
            (AuctionStatus::Scheduled, AuctionStatus::Live)
                | (AuctionStatus::Live, AuctionStatus::Ended)
        )
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = AuctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(AuctionStatus::Scheduled),
            "LIVE" => Ok(AuctionStatus::Live),
            "ENDED" => Ok(AuctionStatus::Ended),
            other => Err(AuctionError::CorruptRecord(format!(
                "unknown auction status: {other}"
            ))),
        }
    }
}
// endregion: --- Auction Status

// region:    --- Auction
/// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub seller_id: i64,
    pub status: AuctionStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reserve_cents: Option<i64>,
    pub buy_now_cents: Option<i64>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// 경매 테이블 행
#[derive(Debug, sqlx::FromRow)]
pub struct AuctionRow {
    pub id: i64,
    pub title: String,
    pub seller_id: i64,
    pub status: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reserve_cents: Option<i64>,
    pub buy_now_cents: Option<i64>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = AuctionError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        Ok(Auction {
            id: row.id,
            title: row.title,
            seller_id: row.seller_id,
            status: row.status.parse()?,
            start_at: row.start_at,
            end_at: row.end_at,
            reserve_cents: row.reserve_cents,
            buy_now_cents: row.buy_now_cents,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// 신규 경매 등록 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub title: String,
    pub seller_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub reserve_cents: Option<i64>,
    #[serde(default)]
    pub buy_now_cents: Option<i64>,
}

impl NewAuction {
    pub fn validate(&self) -> AuctionResult<()> {
        if self.title.trim().is_empty() {
            return Err(AuctionError::InvalidAuction("title is required".into()));
        }
        if self.end_at <= self.start_at {
            return Err(AuctionError::InvalidAuction(
                "end time must be after start time".into(),
            ));
        }
        if matches!(self.reserve_cents, Some(cents) if cents <= 0) {
            return Err(AuctionError::InvalidAuction(
                "reserve price must be positive".into(),
            ));
        }
        if matches!(self.buy_now_cents, Some(cents) if cents <= 0) {
            return Err(AuctionError::InvalidAuction(
                "buy-now price must be positive".into(),
            ));
        }
        Ok(())
    }
}
// endregion: --- Auction

// region:    --- Bid
/// 입찰 모델
/// amount_cents 는 이 입찰로 형성된 공개 가격, proxy_max_cents 는 입찰자의 비공개 상한
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount_cents: i64,
    pub proxy_max_cents: i64,
    /// 기존 최고 입찰자를 대신해 엔진이 넣은 자동 입찰
    pub auto: bool,
    pub created_at: DateTime<Utc>,
}

/// 저장 전 입찰
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBid {
    pub bidder_id: i64,
    pub amount_cents: i64,
    pub proxy_max_cents: i64,
    pub auto: bool,
}
// endregion: --- Bid

// region:    --- Snapshot
/// 경매와 생성 순서로 정렬된 입찰 이력
#[derive(Debug, Clone)]
pub struct AuctionSnapshot {
    pub auction: Auction,
    pub bids: Vec<Bid>,
}

impl AuctionSnapshot {
    /// 최고 입찰 (가장 최근 기록)
    pub fn high_bid(&self) -> Option<&Bid> {
        self.bids.last()
    }

    pub fn current_price_cents(&self) -> i64 {
        self.high_bid().map(|bid| bid.amount_cents).unwrap_or(0)
    }

    pub fn high_bidder_id(&self) -> Option<i64> {
        self.high_bid().map(|bid| bid.bidder_id)
    }
}
// endregion: --- Snapshot
