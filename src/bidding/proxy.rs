/// 대리 입찰(proxy bidding) 계산
/// 1. 입찰 허용 여부 검사
/// 2. 대리 입찰 경쟁 결과 계산
/// 3. 마감 연장(soft close) 판정
/// 저장소나 시계에 의존하지 않는 순수 함수로만 구성한다.
// region:    --- Imports
use crate::auction::model::{AuctionSnapshot, AuctionStatus, Bid, NewBid};
use crate::error::{AuctionError, AuctionResult};
use chrono::{DateTime, Duration, Utc};

// endregion: --- Imports

// region:    --- Resolution
/// 대리 입찰 경쟁 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResolution {
    /// 생성 순서대로 추가할 입찰 기록
    pub bids: Vec<NewBid>,
    pub current_price_cents: i64,
    pub high_bidder_id: i64,
}

impl ProxyResolution {
    pub fn caller_leads(&self, bidder_id: i64) -> bool {
        self.high_bidder_id == bidder_id
    }
}
// endregion: --- Resolution

// region:    --- Admission
/// 1. 입찰 허용 여부 검사
/// 경매 잠금 안에서 읽은 스냅샷과 시각으로 판정해야 한다.
pub fn check_admission(
    snapshot: &AuctionSnapshot,
    bidder_id: i64,
    max_bid_cents: i64,
    now: DateTime<Utc>,
) -> AuctionResult<()> {
    check_open(snapshot, now)?;

    if max_bid_cents <= 0 {
        return Err(AuctionError::InvalidBid(
            "bid amount must be positive".to_string(),
        ));
    }

    if snapshot.high_bidder_id() == Some(bidder_id) {
        return Err(AuctionError::InvalidBid(
            "you are already the high bidder".to_string(),
        ));
    }

    let current_price = snapshot.current_price_cents();
    if max_bid_cents <= current_price {
        return Err(AuctionError::InvalidBid(format!(
            "bid must be higher than the current price of {current_price}"
        )));
    }

    Ok(())
}

/// LIVE 상태이면서 종료 시각이 지나지 않았는지 검사
pub fn check_open(snapshot: &AuctionSnapshot, now: DateTime<Utc>) -> AuctionResult<()> {
    let auction = &snapshot.auction;
    if auction.status != AuctionStatus::Live {
        return Err(AuctionError::AuctionNotLive(auction.id));
    }
    // 스케줄러가 아직 종료 처리하지 않은 경매도 거절한다
    if now > auction.end_at {
        return Err(AuctionError::AuctionEnded(auction.id));
    }
    Ok(())
}
// endregion: --- Admission

// region:    --- Proxy Duel
/// 2. 대리 입찰 경쟁 결과 계산
/// 입찰 이력은 생성 순서로 정렬되어 있고 마지막 기록이 최고 입찰이다.
pub fn resolve(
    bids: &[Bid],
    bidder_id: i64,
    max_bid_cents: i64,
    increment_cents: i64,
) -> ProxyResolution {
    let Some(prior) = bids.last() else {
        // 첫 입찰: 시작가 0 에서 한 단위
        let price = max_bid_cents.min(increment_cents);
        return ProxyResolution {
            bids: vec![NewBid {
                bidder_id,
                amount_cents: price,
                proxy_max_cents: max_bid_cents,
                auto: false,
            }],
            current_price_cents: price,
            high_bidder_id: bidder_id,
        };
    };

    let prior_max = prior.proxy_max_cents;

    if max_bid_cents > prior_max {
        // 신규 입찰자가 이김
        let price = max_bid_cents.min(prior_max.saturating_add(increment_cents));
        return ProxyResolution {
            bids: vec![NewBid {
                bidder_id,
                amount_cents: price,
                proxy_max_cents: max_bid_cents,
                auto: false,
            }],
            current_price_cents: price,
            high_bidder_id: bidder_id,
        };
    }

    // 기존 최고 입찰자가 유지: 도전자는 자기 상한까지 밀려나고
    // 기존 입찰자의 자동 입찰이 그 위 가격을 형성한다 (동률이면 먼저 입찰한 쪽)
    let price = prior_max.min(max_bid_cents.saturating_add(increment_cents));
    ProxyResolution {
        bids: vec![
            NewBid {
                bidder_id,
                amount_cents: max_bid_cents,
                proxy_max_cents: max_bid_cents,
                auto: false,
            },
            NewBid {
                bidder_id: prior.bidder_id,
                amount_cents: price,
                proxy_max_cents: prior_max,
                auto: true,
            },
        ],
        current_price_cents: price,
        high_bidder_id: prior.bidder_id,
    }
}
// endregion: --- Proxy Duel

// region:    --- Soft Close
/// 3. 마감 연장 판정
/// 남은 시간이 연장 구간보다 짧으면 now + window 를 반환한다. 종료 시각을 앞당기지 않는다.
pub fn soft_close_extension(
    end_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<DateTime<Utc>> {
    if end_at - now < window {
        let extended = now + window;
        (extended > end_at).then_some(extended)
    } else {
        None
    }
}
// endregion: --- Soft Close
