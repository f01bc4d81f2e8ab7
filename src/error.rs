/// 경매 엔진 에러 정의
/// HTTP 계층에서는 IntoResponse 구현을 통해 상태 코드와 에러 코드로 변환된다.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

// endregion: --- Imports

// region:    --- Error
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    /// 존재하지 않는 경매
    #[error("auction {0} not found")]
    NotFound(i64),

    /// 잘못된 금액, 현재가 이하 입찰, 이미 최고 입찰자인 경우
    #[error("invalid bid: {0}")]
    InvalidBid(String),

    /// 경매가 LIVE 상태가 아님
    #[error("auction {0} is not live")]
    AuctionNotLive(i64),

    /// 종료 시각이 지났지만 아직 스케줄러가 종료 처리하지 않은 경매
    #[error("auction {0} has ended")]
    AuctionEnded(i64),

    /// 낙관적 버전 검사 실패 (내부 재시도 대상)
    #[error("concurrent update on auction {0}")]
    ConcurrencyConflict(i64),

    #[error("invalid auction: {0}")]
    InvalidAuction(String),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("message broker error: {0}")]
    Broker(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type AuctionResult<T> = Result<T, AuctionError>;

impl AuctionError {
    /// 클라이언트에 노출되는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::InvalidBid(_) => "INVALID_BID",
            AuctionError::AuctionNotLive(_) => "NOT_LIVE",
            AuctionError::AuctionEnded(_) => "ALREADY_ENDED",
            AuctionError::ConcurrencyConflict(_) => "MAX_RETRIES_EXCEEDED",
            AuctionError::InvalidAuction(_) => "INVALID_AUCTION",
            AuctionError::CorruptRecord(_)
            | AuctionError::Config(_)
            | AuctionError::Broker(_)
            | AuctionError::Database(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::InvalidBid(_) | AuctionError::InvalidAuction(_) => {
                StatusCode::BAD_REQUEST
            }
            AuctionError::AuctionNotLive(_)
            | AuctionError::AuctionEnded(_)
            | AuctionError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            AuctionError::CorruptRecord(_)
            | AuctionError::Config(_)
            | AuctionError::Broker(_)
            | AuctionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // 내부 오류 상세는 응답에 싣지 않는다
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}
// endregion: --- Error
