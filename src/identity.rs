/// 사용자 식별 정보
/// 입찰자 id 를 표시용 식별자(이메일)로 바꾸고, 공개 조회에서는 마스킹해서 내보낸다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::AuctionResult;
use crate::query::queries;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- Identity Directory
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// 표시용 식별자 조회. 없는 사용자는 None
    async fn display_identity(&self, user_id: i64) -> AuctionResult<Option<String>>;
}

/// users 테이블 기반 조회
pub struct PostgresIdentityDirectory {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresIdentityDirectory {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl IdentityDirectory for PostgresIdentityDirectory {
    async fn display_identity(&self, user_id: i64) -> AuctionResult<Option<String>> {
        let email = sqlx::query_scalar::<_, String>(queries::GET_USER_EMAIL)
            .bind(user_id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(email)
    }
}

/// 메모리 조회 (테스트, 로컬 실행용)
#[derive(Debug, Default)]
pub struct MemoryIdentityDirectory {
    users: RwLock<HashMap<i64, String>>,
}

impl MemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: i64, email: impl Into<String>) {
        self.users.write().await.insert(user_id, email.into());
    }
}

#[async_trait]
impl IdentityDirectory for MemoryIdentityDirectory {
    async fn display_identity(&self, user_id: i64) -> AuctionResult<Option<String>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}
// endregion: --- Identity Directory

// region:    --- Masking
/// 공개 표시용 마스킹
/// "john@gmail.com" -> "j***n@g***l.com"
pub fn mask_identity(identity: &str) -> String {
    match identity.split_once('@') {
        Some((local, domain)) => {
            let masked_domain = match domain.rsplit_once('.') {
                Some((name, tld)) => format!("{}.{}", mask_part(name), tld),
                None => mask_part(domain),
            };
            format!("{}@{}", mask_part(local), masked_domain)
        }
        None => mask_part(identity),
    }
}

fn mask_part(part: &str) -> String {
    let chars: Vec<char> = part.chars().collect();
    match chars.as_slice() {
        [] => "***".to_string(),
        [first] | [first, _] => format!("{first}***"),
        [first, .., last] => format!("{first}***{last}"),
    }
}

/// 식별 정보가 없을 때 쓰는 익명 표기
pub fn anonymous_label(user_id: i64) -> String {
    format!("bidder-{user_id}")
}
// endregion: --- Masking
