/// 경매별 상호 배제
/// 입찰 처리와 스케줄러의 상태 전이는 같은 경매 id 의 잠금 안에서만 실행된다.
/// 서로 다른 경매는 병렬로 처리된다.
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct AuctionLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

/// 잠금 보유 구간. drop 시 해제된다.
pub struct AuctionGuard {
    auction_id: i64,
    _guard: OwnedMutexGuard<()>,
}

impl AuctionGuard {
    pub fn auction_id(&self) -> i64 {
        self.auction_id
    }
}

impl AuctionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 경매 잠금 획득
    pub async fn acquire(&self, auction_id: i64) -> AuctionGuard {
        // DashMap 샤드 잠금은 await 전에 풀어야 한다
        let lock = Arc::clone(self.locks.entry(auction_id).or_default().value());
        AuctionGuard {
            auction_id,
            _guard: lock.lock_owned().await,
        }
    }

    /// 대기자가 없는 잠금 항목 제거 (종료된 경매 정리용)
    pub fn forget(&self, auction_id: i64) {
        self.locks
            .remove_if(&auction_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
