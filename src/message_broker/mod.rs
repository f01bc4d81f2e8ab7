/// 경매 이벤트 발행
/// 커밋된 상태 변경을 Kafka 토픽으로 내보낸다. 발행 실패는 이미 커밋된 입찰을 되돌리지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::error::{AuctionError, AuctionResult};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Event Publisher Trait
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> AuctionResult<()>;
}

/// 브로커가 설정되지 않았을 때 사용하는 발행기
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &AuctionEvent) -> AuctionResult<()> {
        debug!(
            "{:<12} --> 이벤트 발행 생략: {}",
            "Producer",
            event.event_type()
        );
        Ok(())
    }
}

/// 이벤트 일괄 발행. 실패는 기록만 하고 넘어간다.
pub async fn publish_all(publisher: &dyn EventPublisher, events: &[AuctionEvent]) {
    for event in events {
        if let Err(e) = publisher.publish(event).await {
            warn!(
                "{:<12} --> 이벤트 발행 실패: {} auction={} ({})",
                "Producer",
                event.event_type(),
                event.auction_id(),
                e
            );
        }
    }
}
// endregion: --- Event Publisher Trait

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    topic: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, topic: &str) -> AuctionResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| AuctionError::Broker(format!("producer creation error: {e}")))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            topic: topic.to_string(),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, key: &str, value: &str) -> AuctionResult<()> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", self.topic, key
        );
        let record = FutureRecord::to(&self.topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| AuctionError::Broker(format!("error sending message: {e:?}")))?;

        Ok(())
    }
}

#[async_trait]
impl EventPublisher for KafkaProducer {
    async fn publish(&self, event: &AuctionEvent) -> AuctionResult<()> {
        // 같은 경매의 이벤트는 같은 파티션으로
        let key = event.auction_id().to_string();
        let payload = serde_json::to_string(event)
            .map_err(|e| AuctionError::Broker(format!("event serialization error: {e}")))?;
        self.send_message(&key, &payload).await
    }
}
// endregion: --- Kafka Producer

// region:    --- Topic
/// 토픽 생성
pub async fn create_topic(
    brokers: &str,
    topic_name: &str,
    num_partitions: i32,
    replication_factor: i32,
) -> AuctionResult<()> {
    info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

    let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()
        .map_err(|e| AuctionError::Broker(format!("AdminClient 생성 실패: {e:?}")))?;

    let new_topic = NewTopic::new(
        topic_name,
        num_partitions,
        TopicReplication::Fixed(replication_factor),
    );

    match admin_client
        .create_topics(&[new_topic], &AdminOptions::new())
        .await
    {
        Ok(_) => {
            info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", topic_name);
            Ok(())
        }
        Err(e) => {
            error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
            Err(AuctionError::Broker(format!("토픽 생성 실패: {e:?}")))
        }
    }
}
// endregion: --- Topic
