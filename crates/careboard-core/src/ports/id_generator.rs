//! IdGenerator port - 仮 ID 生成の抽象化
//!
//! 楽観的に作成したタスクに付ける TempId を生成します。
//! サーバー採番 ID（TaskId）はここでは作りません。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::TempId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は衝突しない仮 ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（spawn したタスクからも使える）
pub trait IdGenerator: Send + Sync {
    fn generate_temp_id(&self) -> TempId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// テスト時は FixedClock で timestamp 部分を固定できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_temp_id(&self) -> TempId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        TempId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
