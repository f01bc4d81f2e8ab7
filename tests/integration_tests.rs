mod common;

use chrono::Duration;
use common::{setup, setup_with_store, FailingPublisher, FlakyStore};
use proxy_auction::auction::events::AuctionEvent;
use proxy_auction::auction::model::AuctionStatus;
use proxy_auction::bidding::commands::{
    handle_buy_now, handle_place_bid, BuyNowCommand, PlaceBidCommand,
};
use proxy_auction::clock::Clock;
use proxy_auction::config::BiddingConfig;
use proxy_auction::error::AuctionError;
use proxy_auction::query;
use proxy_auction::state::AppState;
use std::sync::Arc;
use tracing::info;

const X: i64 = 1;
const Y: i64 = 2;

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

fn bid(auction_id: i64, bidder_id: i64, max_bid_cents: i64) -> PlaceBidCommand {
    PlaceBidCommand {
        auction_id,
        bidder_id,
        max_bid_cents,
    }
}

/// 대리 입찰 시나리오 A ~ E
#[tokio::test]
async fn test_proxy_bidding_scenarios() {
    let h = setup();
    let id = h.live_auction(Duration::hours(2)).await;

    // A: 첫 입찰은 한 단위
    let a = handle_place_bid(bid(id, X, 50_000), &h.state).await.unwrap();
    assert_eq!(a.current_price_cents, 10_000);
    assert_eq!(a.high_bidder_id, X);

    // B: 낮은 상한의 도전자 -> 기존 입찰자 유지
    let b = handle_place_bid(bid(id, Y, 15_000), &h.state).await.unwrap();
    assert_eq!(b.current_price_cents, 25_000);
    assert_eq!(b.high_bidder_id, X);

    let view = query::handlers::get_auction_details(&h.state, id).await.unwrap();
    assert_eq!(view.current_price_cents, 25_000);

    // C: 상한을 넘는 도전자
    let c = handle_place_bid(bid(id, Y, 60_000), &h.state).await.unwrap();
    assert_eq!(c.current_price_cents, 60_000);
    assert_eq!(c.high_bidder_id, Y);

    // E: 최고 입찰자의 재입찰은 거절되고 상태가 바뀌지 않는다
    let before = h.snapshot(id).await;
    let err = handle_place_bid(bid(id, Y, 90_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::InvalidBid(_)));
    let after = h.snapshot(id).await;
    assert_eq!(before.bids.len(), after.bids.len());
    assert_eq!(before.auction.version, after.auction.version);
    assert_eq!(before.auction.end_at, after.auction.end_at);

    // 모든 기록은 상한 이하이고 가격은 감소하지 않는다
    for record in &after.bids {
        assert!(record.amount_cents <= record.proxy_max_cents);
    }
    for pair in after.bids.windows(2) {
        assert!(pair[0].amount_cents <= pair[1].amount_cents);
    }
}

/// 시나리오 D: 마감 90초 전 입찰은 now + 120초로 연장
#[tokio::test]
async fn test_soft_close_extension() {
    let h = setup();
    let id = h.live_auction(Duration::seconds(90)).await;
    let original_end = h.snapshot(id).await.auction.end_at;

    h.clock.advance(Duration::seconds(10));
    let now = h.clock.now();
    let outcome = handle_place_bid(bid(id, X, 20_000), &h.state).await.unwrap();

    assert!(outcome.extended);
    assert_eq!(outcome.end_at, now + Duration::seconds(120));
    let snapshot = h.snapshot(id).await;
    assert_eq!(snapshot.auction.end_at, now + Duration::seconds(120));
    assert!(snapshot.auction.end_at >= original_end);

    let extended = h
        .publisher
        .events()
        .into_iter()
        .any(|event| matches!(event, AuctionEvent::AuctionExtended { auction_id, .. } if auction_id == id));
    assert!(extended);
}

/// 연장 구간 밖의 입찰은 종료 시각을 바꾸지 않는다
#[tokio::test]
async fn test_early_bid_keeps_end_time() {
    let h = setup();
    let id = h.live_auction(Duration::hours(1)).await;
    let original_end = h.snapshot(id).await.auction.end_at;

    let outcome = handle_place_bid(bid(id, X, 20_000), &h.state).await.unwrap();
    assert!(!outcome.extended);
    assert_eq!(h.snapshot(id).await.auction.end_at, original_end);
}

/// 경매 사이클 테스트: 예정 -> 진행 -> 종료, 반복 실행은 변화 없음
#[tokio::test]
async fn test_auction_lifecycle() {
    let h = setup();
    let scheduler = h.scheduler();
    let now = h.clock.now();
    let auction = h
        .state
        .store
        .create_auction(proxy_auction::auction::model::NewAuction {
            title: "경매 사이클 테스트".to_string(),
            seller_id: 900,
            start_at: now + Duration::minutes(5),
            end_at: now + Duration::minutes(30),
            reserve_cents: None,
            buy_now_cents: None,
        })
        .await
        .unwrap();

    // 시작 전
    assert!(scheduler.run_once().await.is_empty());
    assert_eq!(h.snapshot(auction.id).await.auction.status, AuctionStatus::Scheduled);
    let err = handle_place_bid(bid(auction.id, X, 20_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionNotLive(_)));

    // 시작
    h.clock.advance(Duration::minutes(5));
    let report = scheduler.run_once().await;
    assert_eq!(report.started, 1);
    assert_eq!(h.snapshot(auction.id).await.auction.status, AuctionStatus::Live);
    assert!(scheduler.run_once().await.is_empty());

    // 종료
    h.clock.advance(Duration::minutes(30));
    let report = scheduler.run_once().await;
    assert_eq!(report.ended, 1);
    let ended = h.snapshot(auction.id).await;
    assert_eq!(ended.auction.status, AuctionStatus::Ended);

    // 두 번째 실행은 아무것도 바꾸지 않는다
    assert!(scheduler.run_once().await.is_empty());
    let again = h.snapshot(auction.id).await;
    assert_eq!(again.auction.status, AuctionStatus::Ended);
    assert_eq!(again.auction.version, ended.auction.version);
}

/// 스케줄러가 시작과 종료를 한 번에 처리해도 단계를 건너뛰지 않는다
#[tokio::test]
async fn test_overdue_auction_passes_through_live() {
    let h = setup();
    let now = h.clock.now();
    let auction = h
        .state
        .store
        .create_auction(proxy_auction::auction::model::NewAuction {
            title: "지연 처리".to_string(),
            seller_id: 900,
            start_at: now - Duration::hours(2),
            end_at: now - Duration::hours(1),
            reserve_cents: None,
            buy_now_cents: None,
        })
        .await
        .unwrap();

    let report = h.scheduler().run_once().await;
    assert_eq!(report.started, 1);
    assert_eq!(report.ended, 1);
    assert_eq!(h.snapshot(auction.id).await.auction.status, AuctionStatus::Ended);

    let transitions: Vec<AuctionStatus> = h
        .publisher
        .events()
        .into_iter()
        .filter_map(|event| match event {
            AuctionEvent::StatusChanged { auction_id, status, .. } if auction_id == auction.id => {
                Some(status)
            }
            _ => None,
        })
        .collect();
    assert_eq!(transitions, vec![AuctionStatus::Live, AuctionStatus::Ended]);
}

/// 연장된 경매는 원래 종료 시각이 지나도 LIVE 로 남는다
#[tokio::test]
async fn test_sweep_honours_extension() {
    let h = setup();
    let scheduler = h.scheduler();
    let id = h.live_auction(Duration::seconds(90)).await;

    handle_place_bid(bid(id, X, 20_000), &h.state).await.unwrap();

    h.clock.advance(Duration::seconds(100));
    scheduler.run_once().await;
    assert_eq!(h.snapshot(id).await.auction.status, AuctionStatus::Live);

    h.clock.advance(Duration::seconds(20));
    let report = scheduler.run_once().await;
    assert_eq!(report.ended, 1);
    assert_eq!(h.snapshot(id).await.auction.status, AuctionStatus::Ended);
}

/// 종료 시각이 지났지만 아직 종료 처리 전인 경매는 입찰을 거절
#[tokio::test]
async fn test_bid_after_end_is_rejected() {
    let h = setup();
    let id = h.live_auction(Duration::minutes(10)).await;

    h.clock.advance(Duration::minutes(10) + Duration::seconds(1));
    let err = handle_place_bid(bid(id, X, 20_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionEnded(_)));

    h.scheduler().run_once().await;
    let err = handle_place_bid(bid(id, X, 20_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionNotLive(_)));
    assert!(h.snapshot(id).await.bids.is_empty());
}

#[tokio::test]
async fn test_unknown_auction() {
    let h = setup();
    let err = handle_place_bid(bid(404, X, 20_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotFound(404)));
    let err = query::handlers::get_auction_details(&h.state, 404)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::NotFound(404)));
}

#[tokio::test]
async fn test_non_positive_bid_rejected() {
    let h = setup();
    let id = h.live_auction(Duration::hours(1)).await;
    for amount in [0, -5] {
        let err = handle_place_bid(bid(id, X, amount), &h.state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuctionError::InvalidBid(_)));
    }
}

/// 공개 조회는 이메일을 마스킹하고 비공개 상한을 노출하지 않는다
#[tokio::test]
async fn test_public_reads_mask_bidders() {
    let h = setup();
    h.identities.register(X, "john@gmail.com").await;
    h.identities.register(Y, "yuna@naver.com").await;
    let id = h.live_auction_with(Duration::hours(1), Some(20_000), None).await;

    handle_place_bid(bid(id, X, 50_000), &h.state).await.unwrap();
    let view = query::handlers::get_auction_details(&h.state, id).await.unwrap();
    assert_eq!(view.high_bidder.as_deref(), Some("j***n@g***l.com"));
    assert!(!view.reserve_met);

    handle_place_bid(bid(id, Y, 15_000), &h.state).await.unwrap();
    let view = query::handlers::get_auction_details(&h.state, id).await.unwrap();
    assert!(view.reserve_met);
    assert_eq!(view.total_bids, 2);
    assert_eq!(view.high_bidder.as_deref(), Some("j***n@g***l.com"));

    let view_json = serde_json::to_string(&view).unwrap();
    assert!(!view_json.contains("john@gmail.com"));

    let history = query::handlers::get_bid_history(&h.state, id).await.unwrap();
    assert_eq!(history.len(), 3);
    // 최신순
    assert!(history[0].auto);
    assert_eq!(history[0].amount_cents, 25_000);
    let history_json = serde_json::to_string(&history).unwrap();
    assert!(!history_json.contains("yuna@naver.com"));
    assert!(!history_json.contains("proxy_max"));
    assert!(!history_json.contains("50000"));
}

/// 총 입찰 수는 성공한 입찰 요청 수와 같고 자동 입찰 기록은 세지 않는다
#[tokio::test]
async fn test_total_bids_counts_attempts() {
    let h = setup();
    let id = h.live_auction(Duration::hours(1)).await;

    let attempts = [
        (1, 50_000),
        (2, 15_000),
        (3, 30_000),
        (2, 80_000),
        (1, 70_000),
        (3, 200_000),
        // 이미 최고 입찰자
        (3, 250_000),
        (1, 120_000),
        // 현재가 이하
        (2, 100_000),
    ];
    let mut accepted = 0;
    for (bidder_id, max_bid_cents) in attempts {
        match handle_place_bid(bid(id, bidder_id, max_bid_cents), &h.state).await {
            Ok(_) => accepted += 1,
            Err(AuctionError::InvalidBid(_)) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
        let view = query::handlers::get_auction_details(&h.state, id).await.unwrap();
        assert_eq!(view.total_bids, accepted);
    }

    assert_eq!(accepted, 7);
    let snapshot = h.snapshot(id).await;
    assert_eq!(snapshot.bids.len(), 11);
    assert_eq!(snapshot.bids.iter().filter(|b| b.auto).count(), 4);
    assert_eq!(snapshot.current_price_cents(), 130_000);
    assert_eq!(snapshot.high_bidder_id(), Some(3));
}

/// 즉시 구매는 경매를 즉시 종료한다
#[tokio::test]
async fn test_buy_now() {
    let h = setup();
    let id = h
        .live_auction_with(Duration::hours(1), None, Some(500_000))
        .await;
    handle_place_bid(bid(id, X, 50_000), &h.state).await.unwrap();

    let outcome = handle_buy_now(
        BuyNowCommand {
            auction_id: id,
            buyer_id: Y,
        },
        &h.state,
    )
    .await
    .unwrap();
    assert_eq!(outcome.current_price_cents, 500_000);
    assert_eq!(outcome.high_bidder_id, Y);

    let snapshot = h.snapshot(id).await;
    assert_eq!(snapshot.auction.status, AuctionStatus::Ended);
    assert_eq!(snapshot.current_price_cents(), 500_000);
    assert_eq!(snapshot.high_bidder_id(), Some(Y));

    let err = handle_place_bid(bid(id, X, 900_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionNotLive(_)));
}

#[tokio::test]
async fn test_buy_now_requires_price() {
    let h = setup();
    let id = h.live_auction(Duration::hours(1)).await;
    let err = handle_buy_now(
        BuyNowCommand {
            auction_id: id,
            buyer_id: Y,
        },
        &h.state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuctionError::InvalidBid(_)));
}

/// 한 경매의 상태 전이 실패가 다른 경매의 전이를 막지 않는다
#[tokio::test]
async fn test_sweep_continues_past_failing_auction() {
    let store = Arc::new(FlakyStore::new(0));
    let h = setup_with_store(store.clone(), BiddingConfig::default());
    let now = h.clock.now();

    let mut ids = vec![];
    for title in ["굴삭기", "지게차", "덤프트럭"] {
        let auction = h
            .state
            .store
            .create_auction(proxy_auction::auction::model::NewAuction {
                title: title.to_string(),
                seller_id: 900,
                start_at: now,
                end_at: now + Duration::hours(1),
                reserve_cents: None,
                buy_now_cents: None,
            })
            .await
            .unwrap();
        ids.push(auction.id);
    }
    let broken = ids[1];
    store.fail_transitions_for(broken);

    let scheduler = h.scheduler();
    let report = scheduler.run_once().await;
    assert_eq!(report.started, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(h.snapshot(ids[0]).await.auction.status, AuctionStatus::Live);
    assert_eq!(h.snapshot(broken).await.auction.status, AuctionStatus::Scheduled);
    assert_eq!(h.snapshot(ids[2]).await.auction.status, AuctionStatus::Live);

    h.clock.advance(Duration::hours(2));
    let report = scheduler.run_once().await;
    assert_eq!(report.ended, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(h.snapshot(ids[0]).await.auction.status, AuctionStatus::Ended);
    assert_eq!(h.snapshot(broken).await.auction.status, AuctionStatus::Scheduled);
    assert_eq!(h.snapshot(ids[2]).await.auction.status, AuctionStatus::Ended);
}

/// 이벤트 발행 실패는 커밋된 입찰을 실패시키지 않는다
#[tokio::test]
async fn test_publish_failure_keeps_bid() {
    let h = setup();
    let id = h.live_auction(Duration::hours(1)).await;
    let publisher = Arc::new(FailingPublisher::default());
    let state = AppState::new(
        Arc::clone(&h.state.store),
        h.identities.clone(),
        BiddingConfig::default(),
    )
    .with_publisher(publisher.clone())
    .with_clock(Arc::new(h.clock.clone()));

    let outcome = handle_place_bid(bid(id, X, 50_000), &state).await.unwrap();
    assert_eq!(outcome.high_bidder_id, X);
    assert!(publisher.attempts() >= 1);

    let outcome = handle_place_bid(bid(id, Y, 15_000), &state).await.unwrap();
    assert_eq!(outcome.current_price_cents, 25_000);

    let snapshot = h.snapshot(id).await;
    assert_eq!(snapshot.bids.len(), 3);
    assert_eq!(snapshot.high_bidder_id(), Some(X));
}

/// 버전 충돌은 내부에서 재시도된다
#[tokio::test]
async fn test_conflicts_are_retried() {
    let h = setup_with_store(Arc::new(FlakyStore::new(3)), BiddingConfig::default());
    let id = h.live_auction(Duration::hours(1)).await;

    let outcome = handle_place_bid(bid(id, X, 30_000), &h.state).await.unwrap();
    assert_eq!(outcome.current_price_cents, 10_000);
    assert_eq!(h.snapshot(id).await.bids.len(), 1);
}

/// 재시도를 모두 소진하면 다시 판정한 결과를 돌려준다
#[tokio::test]
async fn test_exhausted_retries_degrade_to_invalid_bid() {
    let bidding = BiddingConfig {
        max_retries: 2,
        ..BiddingConfig::default()
    };
    let h = setup_with_store(Arc::new(FlakyStore::new(10)), bidding);
    let id = h.live_auction(Duration::hours(1)).await;

    let err = handle_place_bid(bid(id, X, 30_000), &h.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuctionError::InvalidBid(_)));
    assert!(h.snapshot(id).await.bids.is_empty());
}

/// 동시성 입찰 테스트
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bidding() {
    init_tracing();
    let h = setup();
    let id = h.live_auction(Duration::hours(2)).await;

    // 50개의 동시 입찰 생성
    let mut handles = vec![];
    for i in 1..=50_i64 {
        let state: Arc<AppState> = Arc::clone(&h.state);
        handles.push(tokio::spawn(async move {
            handle_place_bid(bid(id, i, i * 7_000), &state).await
        }));
    }

    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successful_bids += 1,
            Err(AuctionError::InvalidBid(_)) => failed_bids += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
    info!(
        "성공한 입찰 수: {}, 실패한 입찰 수: {}",
        successful_bids, failed_bids
    );
    assert!(successful_bids >= 1);

    let snapshot = h.snapshot(id).await;
    // 가장 높은 상한의 입찰자가 최고 입찰자
    assert_eq!(snapshot.high_bidder_id(), Some(50));
    for record in &snapshot.bids {
        assert!(record.amount_cents <= record.proxy_max_cents);
    }
    for pair in snapshot.bids.windows(2) {
        assert!(pair[0].amount_cents <= pair[1].amount_cents);
    }
    // 사용자 입찰 한 건당 버전 한 번 증가 (LIVE 전이 1 포함)
    assert_eq!(snapshot.auction.version, successful_bids + 1);
}

/// 마감 시각의 입찰과 종료 처리는 동시에 성립하지 않는다
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bid_races_sweep() {
    for _ in 0..20 {
        let h = setup();
        let id = h.live_auction(Duration::minutes(1)).await;
        let original_end = h.snapshot(id).await.auction.end_at;
        h.clock.set(original_end);

        let state = Arc::clone(&h.state);
        let bid_task =
            tokio::spawn(async move { handle_place_bid(bid(id, X, 20_000), &state).await });
        let scheduler = h.scheduler();
        let sweep_task = tokio::spawn(async move { scheduler.run_once().await });

        let bid_result = bid_task.await.unwrap();
        sweep_task.await.unwrap();

        let snapshot = h.snapshot(id).await;
        match bid_result {
            Ok(outcome) => {
                assert_eq!(snapshot.auction.status, AuctionStatus::Live);
                assert!(outcome.end_at > original_end);
                assert_eq!(snapshot.bids.len(), 1);
            }
            Err(err) => {
                assert!(matches!(err, AuctionError::AuctionNotLive(_)));
                assert_eq!(snapshot.auction.status, AuctionStatus::Ended);
                assert!(snapshot.bids.is_empty());
            }
        }
    }
}
