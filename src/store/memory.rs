/// 메모리 경매 저장소
/// DATABASE_URL 이 없을 때와 테스트에서 사용한다. PostgreSQL 구현과 같은 버전 검사를 따른다.
// region:    --- Imports
use super::{AuctionStore, BidCommit};
use crate::auction::model::{Auction, AuctionSnapshot, AuctionStatus, Bid, NewAuction};
use crate::error::{AuctionError, AuctionResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

// endregion: --- Imports

#[derive(Debug, Default)]
struct MemoryState {
    auctions: HashMap<i64, Auction>,
    bids: HashMap<i64, Vec<Bid>>,
    next_auction_id: i64,
    next_bid_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryAuctionStore {
    state: RwLock<MemoryState>,
}

impl MemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 상태별 전이 기준 시각
fn due_time(auction: &Auction, status: AuctionStatus) -> Option<DateTime<Utc>> {
    match status {
        AuctionStatus::Scheduled => Some(auction.start_at),
        AuctionStatus::Live => Some(auction.end_at),
        AuctionStatus::Ended => None,
    }
}

#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    async fn create_auction(&self, new_auction: NewAuction) -> AuctionResult<Auction> {
        new_auction.validate()?;
        let mut state = self.state.write().await;
        state.next_auction_id += 1;
        let auction = Auction {
            id: state.next_auction_id,
            title: new_auction.title,
            seller_id: new_auction.seller_id,
            status: AuctionStatus::Scheduled,
            start_at: new_auction.start_at,
            end_at: new_auction.end_at,
            reserve_cents: new_auction.reserve_cents,
            buy_now_cents: new_auction.buy_now_cents,
            version: 0,
            created_at: Utc::now(),
        };
        state.auctions.insert(auction.id, auction.clone());
        state.bids.insert(auction.id, Vec::new());
        Ok(auction)
    }

    async fn load_auction(&self, auction_id: i64) -> AuctionResult<Option<AuctionSnapshot>> {
        let state = self.state.read().await;
        Ok(state.auctions.get(&auction_id).map(|auction| AuctionSnapshot {
            auction: auction.clone(),
            bids: state.bids.get(&auction_id).cloned().unwrap_or_default(),
        }))
    }

    async fn commit_bids(&self, commit: BidCommit) -> AuctionResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let auction = state
            .auctions
            .get_mut(&commit.auction_id)
            .ok_or(AuctionError::NotFound(commit.auction_id))?;
        if auction.version != commit.expected_version || auction.status != AuctionStatus::Live {
            return Err(AuctionError::ConcurrencyConflict(commit.auction_id));
        }

        auction.version += 1;
        if let Some(end_at) = commit.new_end_at {
            auction.end_at = end_at;
        }
        if let Some(status) = commit.new_status {
            auction.status = status;
        }

        let history = state.bids.entry(commit.auction_id).or_default();
        for new_bid in commit.bids {
            state.next_bid_id += 1;
            history.push(Bid {
                id: state.next_bid_id,
                auction_id: commit.auction_id,
                bidder_id: new_bid.bidder_id,
                amount_cents: new_bid.amount_cents,
                proxy_max_cents: new_bid.proxy_max_cents,
                auto: new_bid.auto,
                created_at: commit.placed_at,
            });
        }
        Ok(())
    }

    async fn find_due(&self, status: AuctionStatus, now: DateTime<Utc>) -> AuctionResult<Vec<i64>> {
        let state = self.state.read().await;
        let mut ids: Vec<i64> = state
            .auctions
            .values()
            .filter(|auction| auction.status == status)
            .filter(|auction| matches!(due_time(auction, status), Some(at) if at <= now))
            .map(|auction| auction.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn transition(
        &self,
        auction_id: i64,
        from: AuctionStatus,
        to: AuctionStatus,
        now: DateTime<Utc>,
    ) -> AuctionResult<bool> {
        if !from.can_transition_to(to) {
            return Err(AuctionError::InvalidAuction(format!(
                "illegal transition {from} -> {to}"
            )));
        }
        let mut state = self.state.write().await;
        let auction = state
            .auctions
            .get_mut(&auction_id)
            .ok_or(AuctionError::NotFound(auction_id))?;
        let due = matches!(due_time(auction, from), Some(at) if at <= now);
        if auction.status != from || !due {
            return Ok(false);
        }
        auction.status = to;
        auction.version += 1;
        Ok(true)
    }
}
