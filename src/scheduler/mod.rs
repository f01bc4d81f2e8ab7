/// 경매 상태 업데이트 스케줄러
/// 주기마다 SCHEDULED -> LIVE, LIVE -> ENDED 전이를 적용한다.
/// 각 전이는 입찰 처리와 같은 경매 잠금 안에서 조건부로 실행되므로
/// 마감 직전 입찰과 종료 처리가 동시에 성립하지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::AuctionStatus;
use crate::message_broker::publish_all;
use crate::state::AppState;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Sweep Report
/// 한 번의 상태 업데이트 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub started: usize,
    pub ended: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.started == 0 && self.ended == 0 && self.failed == 0
    }
}
// endregion: --- Sweep Report

// region:    --- Auction Scheduler
/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler {
    state: Arc<AppState>,
    period: Duration,
}

/// 경매 상태 업데이트 스케줄러 생성
impl AuctionScheduler {
    pub fn new(state: Arc<AppState>, period: Duration) -> Self {
        Self { state, period }
    }

    /// 경매 상태 업데이트 스케줄러 시작
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    /// 경매 상태 업데이트
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        // SCHEDULED -> LIVE 상태 변경
        let (started, failed) = self
            .apply(AuctionStatus::Scheduled, AuctionStatus::Live)
            .await;
        report.started = started;
        report.failed += failed;

        // LIVE -> ENDED 상태 변경
        let (ended, failed) = self.apply(AuctionStatus::Live, AuctionStatus::Ended).await;
        report.ended = ended;
        report.failed += failed;

        if report.is_empty() {
            debug!("{:<12} --> 상태 변경 대상 없음", "Scheduler");
        } else {
            info!(
                "{:<12} --> 경매 상태 업데이트: 시작 {}, 종료 {}, 실패 {}",
                "Scheduler", report.started, report.ended, report.failed
            );
        }
        report
    }

    /// 대상 경매마다 잠금을 잡고 조건부 전이. 한 건의 실패가 나머지를 막지 않는다.
    async fn apply(&self, from: AuctionStatus, to: AuctionStatus) -> (usize, usize) {
        let state = &self.state;
        let due = match state.store.find_due(from, state.clock.now()).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(
                    "{:<12} --> {} 대상 조회 중 오류 발생: {:?}",
                    "Scheduler", from, e
                );
                return (0, 1);
            }
        };

        let mut applied = 0;
        let mut failed = 0;
        for auction_id in due {
            let guard = state.locks.acquire(auction_id).await;
            // 잠금 대기 중 입찰로 연장되었을 수 있으므로 시각을 다시 읽는다
            let now = state.clock.now();
            match state.store.transition(auction_id, from, to, now).await {
                Ok(true) => {
                    applied += 1;
                    info!(
                        "{:<12} --> 경매 {} 상태 변경: {} -> {}",
                        "Scheduler", auction_id, from, to
                    );
                    let event = AuctionEvent::StatusChanged {
                        auction_id,
                        status: to,
                        timestamp: now,
                    };
                    publish_all(state.publisher.as_ref(), &[event]).await;
                }
                Ok(false) => {
                    debug!(
                        "{:<12} --> 경매 {} 는 이미 처리되었거나 연장됨",
                        "Scheduler", auction_id
                    );
                }
                Err(e) => {
                    failed += 1;
                    error!(
                        "{:<12} --> 경매 {} 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", auction_id, e
                    );
                }
            }
            drop(guard);
            if to == AuctionStatus::Ended {
                state.locks.forget(auction_id);
            }
        }
        (applied, failed)
    }
}
// endregion: --- Auction Scheduler
