//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpTaskStore**: REST バックエンド向け（reqwest）
//! - **InMemoryTaskStore**: 開発・テスト用の正本（失敗注入つき）

pub mod http_store;
pub mod inmem_store;

// 主要な型を再エクスポート
pub use self::http_store::HttpTaskStore;
pub use self::inmem_store::{InMemoryTaskStore, StoreCalls};
