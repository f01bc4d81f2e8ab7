/// 입찰 엔진, 스케줄러, 조회 핸들러가 공유하는 구성 요소
use crate::bidding::locks::AuctionLocks;
use crate::clock::{Clock, SystemClock};
use crate::config::BiddingConfig;
use crate::identity::IdentityDirectory;
use crate::message_broker::{EventPublisher, NoopPublisher};
use crate::store::AuctionStore;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn Clock>,
    pub locks: AuctionLocks,
    pub bidding: BiddingConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        identities: Arc<dyn IdentityDirectory>,
        bidding: BiddingConfig,
    ) -> Self {
        Self {
            store,
            identities,
            publisher: Arc::new(NoopPublisher),
            clock: Arc::new(SystemClock),
            locks: AuctionLocks::new(),
            bidding,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
