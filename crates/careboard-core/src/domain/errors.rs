//! Errors - エラー分類
//!
//! 各モジュールは自分の thiserror enum を持ち、`kind()` でここに分類を返します。
//! 呼び出し側は分類を見て「リトライ / 入力やり直し / 再マウント」を選びます。

/// ErrorKind はエラーの運用分類
///
/// # 分類
/// - Transient: 一時的なネットワーク障害（リトライ or 次回 refresh で回復）
/// - Validation: 入力不正（ネットワーク呼び出し前に拒否）
/// - Conflict: ボード不変条件違反（重複・不在の列）
/// - NotFound: 対象が存在しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Validation,
    Conflict,
    NotFound,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}
