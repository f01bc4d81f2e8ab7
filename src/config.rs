/// 서비스 설정
/// 환경 변수에서 한 번 읽어 들인 뒤 각 구성 요소에 전달한다.
// region:    --- Imports
use crate::error::{AuctionError, AuctionResult};
use chrono::Duration;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Defaults
/// 입찰 단위 (100.00 단위 통화)
pub const DEFAULT_BID_INCREMENT_CENTS: i64 = 10_000;

/// 마감 연장 구간 (초)
pub const DEFAULT_SOFT_CLOSE_SECS: i64 = 120;

/// 경매 상태 스케줄러 주기 (초)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// 버전 충돌 시 최대 재시도 횟수
pub const DEFAULT_MAX_RETRIES: u32 = 100;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

pub const DEFAULT_EVENTS_TOPIC: &str = "auction-events";
// endregion: --- Defaults

// region:    --- Bidding Config
/// 입찰 엔진 설정
#[derive(Debug, Clone)]
pub struct BiddingConfig {
    pub increment_cents: i64,
    pub soft_close_window: Duration,
    pub max_retries: u32,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            increment_cents: DEFAULT_BID_INCREMENT_CENTS,
            soft_close_window: Duration::seconds(DEFAULT_SOFT_CLOSE_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
// endregion: --- Bidding Config

// region:    --- Config
#[derive(Debug, Clone)]
pub struct Config {
    /// 미설정 시 메모리 저장소 사용
    pub database_url: Option<String>,
    /// 미설정 시 이벤트 발행 생략
    pub kafka_brokers: Option<String>,
    pub events_topic: String,
    pub bind_addr: String,
    pub sweep_interval_secs: u64,
    pub reset_database: bool,
    pub bidding: BiddingConfig,
}

impl Config {
    /// 환경 변수로부터 설정 생성
    pub fn from_env() -> AuctionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 생성
    pub fn from_lookup<F>(lookup: F) -> AuctionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let increment_cents: i64 =
            parse_or(&lookup, "BID_INCREMENT_CENTS", DEFAULT_BID_INCREMENT_CENTS)?;
        if increment_cents <= 0 {
            return Err(AuctionError::Config(
                "BID_INCREMENT_CENTS must be positive".to_string(),
            ));
        }

        let soft_close_secs: i64 =
            parse_or(&lookup, "SOFT_CLOSE_SECS", DEFAULT_SOFT_CLOSE_SECS)?;
        if soft_close_secs < 0 {
            return Err(AuctionError::Config(
                "SOFT_CLOSE_SECS must not be negative".to_string(),
            ));
        }

        let sweep_interval_secs: u64 =
            parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_interval_secs == 0 {
            return Err(AuctionError::Config(
                "SWEEP_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        let max_retries: u32 = parse_or(&lookup, "BID_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        if max_retries == 0 {
            return Err(AuctionError::Config(
                "BID_MAX_RETRIES must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            kafka_brokers: lookup("KAFKA_BROKERS").filter(|v| !v.is_empty()),
            events_topic: lookup("EVENTS_TOPIC")
                .unwrap_or_else(|| DEFAULT_EVENTS_TOPIC.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            sweep_interval_secs,
            reset_database: parse_or(&lookup, "RESET_DATABASE", false)?,
            bidding: BiddingConfig {
                increment_cents,
                soft_close_window: Duration::seconds(soft_close_secs),
                max_retries,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AuctionResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AuctionError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}
// endregion: --- Config
