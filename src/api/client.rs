use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use zeroize::Zeroizing;

use super::types::{
    ChatSearchRequest, Envelope, FetchMessagesRequest, ForwardRequest, IndexChat, IndexedChats,
    MessageResponse, MultiSearchRequest, ReplyRequest, SearchResponse,
};
use super::{ApiError, FileStream, SearchBackend};
use crate::config::ClientConfig;

/// HTTP implementation of [`SearchBackend`].
pub struct HttpBackend {
    http: Client,
    api_root: Url,
    api_key: RwLock<Option<Zeroizing<String>>>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        let api_root = Url::parse(&config.api_root)?;
        Ok(Self {
            http,
            api_root,
            api_key: RwLock::new(None),
        })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Direct link to a message attachment. Needs no bearer key.
    pub fn file_url(&self, chat_id: i64, message_id: i64) -> Result<Url, ApiError> {
        let mut url = self.endpoint("client/filestream")?;
        url.query_pairs_mut()
            .append_pair("chat_id", &chat_id.to_string())
            .append_pair("message_id", &message_id.to_string());
        Ok(url)
    }

    /// Single-chat search through the query-string variant of the endpoint.
    pub async fn search_in_chat_by_get(
        &self,
        chat_id: i64,
        request: &ChatSearchRequest,
    ) -> Result<SearchResponse, ApiError> {
        let builder = self.search_by_get_request(chat_id, request)?;
        let envelope: Envelope<SearchResponse> = send_json(builder).await?;
        Ok(envelope.into_payload())
    }

    fn search_by_get_request(
        &self,
        chat_id: i64,
        request: &ChatSearchRequest,
    ) -> Result<RequestBuilder, ApiError> {
        let mut url = self.endpoint(&format!("index/{}/search", chat_id))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &request.query);
            if let Some(offset) = request.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
            if let Some(limit) = request.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(users) = request.users.as_ref().filter(|u| !u.is_empty()) {
                pairs.append_pair("users", &join_ids(users));
            }
            if let Some(types) = request.types.as_ref().filter(|t| !t.is_empty()) {
                pairs.append_pair("types", &types.join(","));
            }
        }
        Ok(self.http.get(url).headers(self.headers()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.api_root.join(path)?)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let key = self.api_key.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(key) = key.as_ref() {
            match HeaderValue::from_str(&format!("Bearer {}", key.as_str())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => log::warn!("API key contains characters not allowed in a header"),
            }
        }
        headers
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.get(self.endpoint(path)?).headers(self.headers()))
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .http
            .post(self.endpoint(path)?)
            .headers(self.headers())
            .json(body))
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl SearchBackend for HttpBackend {
    fn set_api_key(&self, key: Option<&str>) {
        let mut slot = self.api_key.write().unwrap_or_else(PoisonError::into_inner);
        *slot = key.map(|k| Zeroizing::new(k.to_string()));
    }

    async fn indexed_chats(&self) -> Result<IndexedChats, ApiError> {
        let envelope: Envelope<Vec<IndexChat>> = send_json(self.get("indexed")?).await?;
        let master = envelope.master.unwrap_or(false);
        Ok(IndexedChats {
            chats: envelope.into_payload(),
            master,
        })
    }

    async fn chat_index(&self, chat_id: i64) -> Result<Option<IndexChat>, ApiError> {
        let envelope: Envelope<IndexChat> =
            send_json(self.get(&format!("index/{}", chat_id))?).await?;
        Ok(envelope.payload)
    }

    async fn search_in_chat(
        &self,
        chat_id: i64,
        request: &ChatSearchRequest,
    ) -> Result<SearchResponse, ApiError> {
        let builder = self.post(&format!("index/{}/search", chat_id), request)?;
        let envelope: Envelope<SearchResponse> = send_json(builder).await?;
        Ok(envelope.into_payload())
    }

    async fn multi_search(&self, request: &MultiSearchRequest) -> Result<SearchResponse, ApiError> {
        let envelope: Envelope<SearchResponse> =
            send_json(self.post("index/multi-search", request)?).await?;
        Ok(envelope.into_payload())
    }

    async fn fetch_messages(&self, chat_id: i64, ids: &[i64]) -> Result<SearchResponse, ApiError> {
        let body = FetchMessagesRequest { ids: ids.to_vec() };
        let builder = self.post(&format!("index/{}/msgs/fetch", chat_id), &body)?;
        let envelope: Envelope<SearchResponse> = send_json(builder).await?;
        Ok(envelope.into_payload())
    }

    async fn reply(&self, request: &ReplyRequest) -> Result<MessageResponse, ApiError> {
        send_json(self.post("client/reply", request)?).await
    }

    async fn forward(&self, request: &ForwardRequest) -> Result<MessageResponse, ApiError> {
        send_json(self.post("client/forward", request)?).await
    }

    async fn open_file(&self, chat_id: i64, message_id: i64) -> Result<FileStream, ApiError> {
        let response = self.http.get(self.file_url(chat_id, message_id)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes_stream().map_err(ApiError::Http).boxed())
    }
}
