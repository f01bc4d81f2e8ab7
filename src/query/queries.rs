/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, title, seller_id, status, start_at, end_at, reserve_cents, buy_now_cents, version, created_at FROM auctions WHERE id = $1";

/// 입찰 이력 조회 (생성 순)
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount_cents, proxy_max_cents, auto, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY created_at ASC, id ASC
"#;

/// 경매 등록
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (title, seller_id, status, start_at, end_at, reserve_cents, buy_now_cents)
    VALUES ($1, $2, 'SCHEDULED', $3, $4, $5, $6)
    RETURNING id, title, seller_id, status, start_at, end_at, reserve_cents, buy_now_cents, version, created_at
"#;

/// 버전 검사 후 경매 갱신 (종료 시각, 상태)
pub const UPDATE_AUCTION_VERSIONED: &str = r#"
    UPDATE auctions
    SET version = version + 1,
        end_at = COALESCE($3, end_at),
        status = COALESCE($4, status)
    WHERE id = $1 AND version = $2 AND status = 'LIVE'
    RETURNING id
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount_cents, proxy_max_cents, auto, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// 시작 대상 경매 조회
pub const FIND_DUE_TO_START: &str =
    "SELECT id FROM auctions WHERE status = 'SCHEDULED' AND start_at <= $1 ORDER BY id";

/// 종료 대상 경매 조회
pub const FIND_DUE_TO_END: &str =
    "SELECT id FROM auctions WHERE status = 'LIVE' AND end_at <= $1 ORDER BY id";

/// SCHEDULED -> LIVE
pub const START_AUCTION: &str = r#"
    UPDATE auctions SET status = 'LIVE', version = version + 1
    WHERE id = $1 AND status = 'SCHEDULED' AND start_at <= $2
"#;

/// LIVE -> ENDED
pub const END_AUCTION: &str = r#"
    UPDATE auctions SET status = 'ENDED', version = version + 1
    WHERE id = $1 AND status = 'LIVE' AND end_at <= $2
"#;

/// 사용자 표시 정보 조회
pub const GET_USER_EMAIL: &str = "SELECT email FROM users WHERE id = $1";
