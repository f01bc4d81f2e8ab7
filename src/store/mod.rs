/// 경매 저장소
/// 입찰 엔진과 스케줄러가 사용하는 영속성 인터페이스
// region:    --- Imports
use crate::auction::model::{Auction, AuctionSnapshot, AuctionStatus, NewAuction, NewBid};
use crate::error::AuctionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuctionStore;
pub use postgres::PostgresAuctionStore;

// endregion: --- Imports

// region:    --- Bid Commit
/// 원자적으로 반영할 입찰 결과
/// expected_version 이 저장된 버전과 다르거나 경매가 LIVE 가 아니면
/// ConcurrencyConflict 로 실패하고 아무것도 반영되지 않는다.
#[derive(Debug, Clone)]
pub struct BidCommit {
    pub auction_id: i64,
    pub expected_version: i64,
    pub bids: Vec<NewBid>,
    pub placed_at: DateTime<Utc>,
    pub new_end_at: Option<DateTime<Utc>>,
    pub new_status: Option<AuctionStatus>,
}
// endregion: --- Bid Commit

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 신규 경매 등록 (SCHEDULED)
    async fn create_auction(&self, new_auction: NewAuction) -> AuctionResult<Auction>;

    /// 경매와 생성 순서로 정렬된 입찰 이력 조회
    async fn load_auction(&self, auction_id: i64) -> AuctionResult<Option<AuctionSnapshot>>;

    /// 입찰 기록 추가와 종료 시각/상태 변경을 한 번에 반영
    async fn commit_bids(&self, commit: BidCommit) -> AuctionResult<()>;

    /// 전이 대상 경매 id 조회
    /// SCHEDULED 는 start_at <= now, LIVE 는 end_at <= now 기준
    async fn find_due(&self, status: AuctionStatus, now: DateTime<Utc>) -> AuctionResult<Vec<i64>>;

    /// 조건부 상태 전이. 이미 전이되었거나 시각 조건이 맞지 않으면 false
    async fn transition(
        &self,
        auction_id: i64,
        from: AuctionStatus,
        to: AuctionStatus,
        now: DateTime<Utc>,
    ) -> AuctionResult<bool>;
}
// endregion: --- Auction Store Trait
