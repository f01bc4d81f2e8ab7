/// PostgreSQL 경매 저장소
/// 경매 행의 version 컬럼으로 다른 인스턴스와의 동시 갱신을 검출한다.
// region:    --- Imports
use super::{AuctionStore, BidCommit};
use crate::auction::model::{
    Auction, AuctionRow, AuctionSnapshot, AuctionStatus, Bid, NewAuction,
};
use crate::database::DatabaseManager;
use crate::error::{AuctionError, AuctionResult};
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

// endregion: --- Imports

pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn create_auction(&self, new_auction: NewAuction) -> AuctionResult<Auction> {
        new_auction.validate()?;
        let row = sqlx::query_as::<_, AuctionRow>(queries::INSERT_AUCTION)
            .bind(&new_auction.title)
            .bind(new_auction.seller_id)
            .bind(new_auction.start_at)
            .bind(new_auction.end_at)
            .bind(new_auction.reserve_cents)
            .bind(new_auction.buy_now_cents)
            .fetch_one(self.db_manager.pool())
            .await?;
        Auction::try_from(row)
    }

    async fn load_auction(&self, auction_id: i64) -> AuctionResult<Option<AuctionSnapshot>> {
        // 경매와 입찰 이력을 같은 트랜잭션에서 읽는다
        let loaded = self
            .db_manager
            .transaction::<_, Option<(AuctionRow, Vec<Bid>)>, sqlx::Error>(|tx| {
                Box::pin(async move {
                    let row = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    let bids = sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
                        .bind(auction_id)
                        .fetch_all(&mut **tx)
                        .await?;
                    Ok(Some((row, bids)))
                })
            })
            .await?;

        loaded
            .map(|(row, bids)| -> AuctionResult<AuctionSnapshot> {
                Ok(AuctionSnapshot {
                    auction: Auction::try_from(row)?,
                    bids,
                })
            })
            .transpose()
    }

    async fn commit_bids(&self, commit: BidCommit) -> AuctionResult<()> {
        let auction_id = commit.auction_id;
        self.db_manager
            .transaction::<_, (), AuctionError>(|tx| {
                Box::pin(async move {
                    let updated = sqlx::query_scalar::<_, i64>(queries::UPDATE_AUCTION_VERSIONED)
                        .bind(commit.auction_id)
                        .bind(commit.expected_version)
                        .bind(commit.new_end_at)
                        .bind(commit.new_status.map(|status| status.as_str()))
                        .fetch_optional(&mut **tx)
                        .await?;
                    if updated.is_none() {
                        // 롤백 후 재시도 대상
                        return Err(AuctionError::ConcurrencyConflict(commit.auction_id));
                    }

                    for new_bid in &commit.bids {
                        sqlx::query(queries::INSERT_BID)
                            .bind(commit.auction_id)
                            .bind(new_bid.bidder_id)
                            .bind(new_bid.amount_cents)
                            .bind(new_bid.proxy_max_cents)
                            .bind(new_bid.auto)
                            .bind(commit.placed_at)
                            .execute(&mut **tx)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await?;
        debug!("{:<12} --> 입찰 반영 완료 id: {}", "Store", auction_id);
        Ok(())
    }

    async fn find_due(&self, status: AuctionStatus, now: DateTime<Utc>) -> AuctionResult<Vec<i64>> {
        let query = match status {
            AuctionStatus::Scheduled => queries::FIND_DUE_TO_START,
            AuctionStatus::Live => queries::FIND_DUE_TO_END,
            AuctionStatus::Ended => return Ok(Vec::new()),
        };
        let ids = sqlx::query_scalar::<_, i64>(query)
            .bind(now)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(ids)
    }

    async fn transition(
        &self,
        auction_id: i64,
        from: AuctionStatus,
        to: AuctionStatus,
        now: DateTime<Utc>,
    ) -> AuctionResult<bool> {
        let query = match (from, to) {
            (AuctionStatus::Scheduled, AuctionStatus::Live) => queries::START_AUCTION,
            (AuctionStatus::Live, AuctionStatus::Ended) => queries::END_AUCTION,
            _ => {
                return Err(AuctionError::InvalidAuction(format!(
                    "illegal transition {from} -> {to}"
                )))
            }
        };
        let result = sqlx::query(query)
            .bind(auction_id)
            .bind(now)
            .execute(self.db_manager.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
