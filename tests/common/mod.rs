#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proxy_auction::auction::events::AuctionEvent;
use proxy_auction::auction::model::{Auction, AuctionSnapshot, AuctionStatus, NewAuction};
use proxy_auction::clock::{Clock, ManualClock};
use proxy_auction::config::BiddingConfig;
use proxy_auction::error::{AuctionError, AuctionResult};
use proxy_auction::identity::MemoryIdentityDirectory;
use proxy_auction::message_broker::EventPublisher;
use proxy_auction::scheduler::AuctionScheduler;
use proxy_auction::state::AppState;
use proxy_auction::store::{AuctionStore, BidCommit, MemoryAuctionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 발행된 이벤트를 기록하는 발행기
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AuctionEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &AuctionEvent) -> AuctionResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// 항상 실패하는 발행기 (브로커 장애)
#[derive(Default)]
pub struct FailingPublisher {
    attempts: AtomicUsize,
}

impl FailingPublisher {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &AuctionEvent) -> AuctionResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuctionError::Broker("broker unavailable".to_string()))
    }
}

/// 처음 n 번의 입찰 반영을 버전 충돌로 실패시키는 저장소
/// fail_transitions_for 로 지정한 경매는 상태 전이가 항상 실패한다.
pub struct FlakyStore {
    inner: MemoryAuctionStore,
    remaining_conflicts: AtomicUsize,
    broken_auction: Mutex<Option<i64>>,
}

impl FlakyStore {
    pub fn new(conflicts: usize) -> Self {
        Self {
            inner: MemoryAuctionStore::new(),
            remaining_conflicts: AtomicUsize::new(conflicts),
            broken_auction: Mutex::new(None),
        }
    }

    pub fn fail_transitions_for(&self, auction_id: i64) {
        *self.broken_auction.lock().unwrap() = Some(auction_id);
    }
}

#[async_trait]
impl AuctionStore for FlakyStore {
    async fn create_auction(&self, new_auction: NewAuction) -> AuctionResult<Auction> {
        self.inner.create_auction(new_auction).await
    }

    async fn load_auction(&self, auction_id: i64) -> AuctionResult<Option<AuctionSnapshot>> {
        self.inner.load_auction(auction_id).await
    }

    async fn commit_bids(&self, commit: BidCommit) -> AuctionResult<()> {
        let conflict = self
            .remaining_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(AuctionError::ConcurrencyConflict(commit.auction_id));
        }
        self.inner.commit_bids(commit).await
    }

    async fn find_due(&self, status: AuctionStatus, now: DateTime<Utc>) -> AuctionResult<Vec<i64>> {
        self.inner.find_due(status, now).await
    }

    async fn transition(
        &self,
        auction_id: i64,
        from: AuctionStatus,
        to: AuctionStatus,
        now: DateTime<Utc>,
    ) -> AuctionResult<bool> {
        if *self.broken_auction.lock().unwrap() == Some(auction_id) {
            return Err(AuctionError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.transition(auction_id, from, to, now).await
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub clock: ManualClock,
    pub publisher: Arc<RecordingPublisher>,
    pub identities: Arc<MemoryIdentityDirectory>,
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// 메모리 저장소와 수동 시계로 구성
pub fn setup() -> Harness {
    setup_with_store(Arc::new(MemoryAuctionStore::new()), BiddingConfig::default())
}

pub fn setup_with_store(store: Arc<dyn AuctionStore>, bidding: BiddingConfig) -> Harness {
    let clock = ManualClock::new(t0());
    let publisher = Arc::new(RecordingPublisher::default());
    let identities = Arc::new(MemoryIdentityDirectory::new());
    let state = AppState::new(store, identities.clone(), bidding)
        .with_publisher(publisher.clone())
        .with_clock(Arc::new(clock.clone()));
    Harness {
        state: Arc::new(state),
        clock,
        publisher,
        identities,
    }
}

impl Harness {
    pub fn scheduler(&self) -> AuctionScheduler {
        AuctionScheduler::new(Arc::clone(&self.state), std::time::Duration::from_secs(60))
    }

    /// 지금 시작해서 ends_in 뒤에 끝나는 LIVE 경매 생성
    pub async fn live_auction(&self, ends_in: Duration) -> i64 {
        self.live_auction_with(ends_in, None, None).await
    }

    pub async fn live_auction_with(
        &self,
        ends_in: Duration,
        reserve_cents: Option<i64>,
        buy_now_cents: Option<i64>,
    ) -> i64 {
        let now = self.clock.now();
        let auction = self
            .state
            .store
            .create_auction(NewAuction {
                title: "테스트 경매".to_string(),
                seller_id: 900,
                start_at: now,
                end_at: now + ends_in,
                reserve_cents,
                buy_now_cents,
            })
            .await
            .unwrap();
        self.scheduler().run_once().await;
        let snapshot = self.snapshot(auction.id).await;
        assert_eq!(snapshot.auction.status, AuctionStatus::Live);
        auction.id
    }

    pub async fn snapshot(&self, auction_id: i64) -> AuctionSnapshot {
        self.state
            .store
            .load_auction(auction_id)
            .await
            .unwrap()
            .expect("auction exists")
    }
}
