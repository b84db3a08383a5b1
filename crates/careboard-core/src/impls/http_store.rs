//! HttpTaskStore - REST バックエンドへの TaskStore 実装
//!
//! # 学習ポイント
//! - reqwest::Client は内部で接続プールを持つので 1 つを使い回す
//! - ベース URL は末尾 `/` 付きで保持し、`Url::join` で相対パスを解決する
//! - HTTP ステータスを StoreError に写像（404 → NotFound, それ以外の非 2xx → Status）
//!
//! パスはバックエンドのルーティングに合わせて `api/` 配下、末尾スラッシュ付き。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::domain::{Item, NewTask, ProfileId, SourceRecord, TaskId, TaskPatch};
use crate::ports::{StoreError, TaskStore};

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

pub struct HttpTaskStore {
    client: Client,
    base_url: Url,
}

impl HttpTaskStore {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, StoreError> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    /// 既存の Client を使う（プロキシ設定などを呼び出し側で決めたい場合）
    pub fn with_client(mut base_url: Url, client: Client) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|err| StoreError::Transport(format!("invalid endpoint {path:?}: {err}")))
    }

    fn tasks_url(&self, profile_id: ProfileId) -> Result<Url, StoreError> {
        self.endpoint(&format!("api/profiles/{}/tasks/", profile_id.value()))
    }

    fn records_url(&self, profile_id: ProfileId) -> Result<Url, StoreError> {
        self.endpoint(&format!("api/profiles/{}/records/", profile_id.value()))
    }

    fn task_url(&self, task_id: TaskId) -> Result<Url, StoreError> {
        self.endpoint(&format!("api/tasks/{}/", task_id.value()))
    }
}

/// レスポンスを検査してから JSON を取り出す
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(response.url().path().to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| StoreError::Decode(err.to_string()))
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self, profile_id: ProfileId) -> Result<Vec<Item>, StoreError> {
        let url = self.tasks_url(profile_id)?;
        debug!(%url, "GET tasks");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn list_records(&self, profile_id: ProfileId) -> Result<Vec<SourceRecord>, StoreError> {
        let url = self.records_url(profile_id)?;
        debug!(%url, "GET records");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn create_task(&self, profile_id: ProfileId, task: &NewTask) -> Result<Item, StoreError> {
        let url = self.tasks_url(profile_id)?;
        debug!(%url, title = %task.title, "POST task");
        let response = self.client.post(url).json(task).send().await?;
        decode(response).await
    }

    async fn patch_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Item, StoreError> {
        let url = self.task_url(task_id)?;
        debug!(%url, "PATCH task");
        let response = self.client.patch(url).json(patch).send().await?;
        decode(response).await
    }
}
