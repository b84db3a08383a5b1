//! careboard-core
//!
//! Board synchronization engine for the careboard family medical organizer.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, container, item, board, errors, events）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator, EventSink）
//! - **app**: アプリケーションロジック（engine, drag, edit, derive, reconcile, builder, status）
//! - **impls**: 実装（HttpTaskStore, InMemoryTaskStore）
//! - **config**: クライアント設定（ファイル + 環境変数）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{BoardEngine, EngineBuilder, EngineError};
pub use config::{ClientConfig, ConfigError};
