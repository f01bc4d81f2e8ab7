// region:    --- Imports
use proxy_auction::config::Config;
use proxy_auction::database::DatabaseManager;
use proxy_auction::handlers;
use proxy_auction::identity::{IdentityDirectory, MemoryIdentityDirectory, PostgresIdentityDirectory};
use proxy_auction::message_broker::{self, EventPublisher, KafkaProducer};
use proxy_auction::scheduler::AuctionScheduler;
use proxy_auction::state::AppState;
use proxy_auction::store::{AuctionStore, MemoryAuctionStore, PostgresAuctionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    info!("{:<12} --> 설정 로드: {:?}", "Main", config.bidding);

    // 저장소 및 사용자 조회 구성
    let (store, identities): (Arc<dyn AuctionStore>, Arc<dyn IdentityDirectory>) =
        match config.database_url.as_deref() {
            Some(database_url) => {
                let db_manager = Arc::new(DatabaseManager::connect(database_url).await?);

                // 데이터베이스 초기화
                if let Err(e) = db_manager.initialize_database(config.reset_database).await {
                    error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                    return Err(e.into());
                }
                info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

                let store: Arc<dyn AuctionStore> =
                    Arc::new(PostgresAuctionStore::new(Arc::clone(&db_manager)));
                let identities: Arc<dyn IdentityDirectory> =
                    Arc::new(PostgresIdentityDirectory::new(db_manager));
                (store, identities)
            }
            None => {
                warn!(
                    "{:<12} --> DATABASE_URL 미설정: 메모리 저장소 사용",
                    "Main"
                );
                let store: Arc<dyn AuctionStore> = Arc::new(MemoryAuctionStore::new());
                let identities: Arc<dyn IdentityDirectory> =
                    Arc::new(MemoryIdentityDirectory::new());
                (store, identities)
            }
        };

    // 이벤트 발행 구성
    let mut state = AppState::new(store, identities, config.bidding.clone());
    if let Some(brokers) = config.kafka_brokers.as_deref() {
        // 토픽이 이미 있으면 생성 실패는 무시한다
        if let Err(e) = message_broker::create_topic(brokers, &config.events_topic, 5, 1).await {
            warn!("{:<12} --> 토픽 생성 건너뜀: {}", "Main", e);
        }
        let producer: Arc<dyn EventPublisher> =
            Arc::new(KafkaProducer::new(brokers, &config.events_topic)?);
        state = state.with_publisher(producer);
        info!("{:<12} --> Kafka 발행 활성화: {}", "Main", brokers);
    } else {
        warn!("{:<12} --> KAFKA_BROKERS 미설정: 이벤트 발행 생략", "Main");
    }
    let state = Arc::new(state);

    // 경매 상태 스케줄러
    let scheduler = AuctionScheduler::new(
        Arc::clone(&state),
        Duration::from_secs(config.sweep_interval_secs),
    );
    let _sweeper = scheduler.start();

    // 라우터 설정
    let routes_all = handlers::routes(state);

    // 리스너 생성
    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
