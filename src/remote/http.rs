//! `reqwest` implementation of the topic gateway.
//!
//! Endpoints, relative to the configured collection URL:
//! - `POST   {collection}`        create
//! - `GET    {collection}?limit=&offset=` list
//! - `GET    {collection}/{id}`   fetch one
//! - `PATCH  {collection}/{id}`   update name/description
//! - `DELETE {collection}/{id}`   delete

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{TopicError, TopicResult};
use crate::model::{Topic, TopicId};
use crate::remote::session::SessionProvider;
use crate::remote::wire::{
    CreateTopicRequest, ListTopicsQuery, ListTopicsResponse, TopicRecord, UpdateTopicRequest,
    error_message,
};
use crate::remote::{NewTopic, TopicChanges, TopicGateway, TopicPage};

/// HTTP gateway to the topic backend.
pub struct HttpTopicGateway<S> {
    client: Client,
    collection: Url,
    session: S,
}

impl<S: SessionProvider> HttpTopicGateway<S> {
    /// Create a gateway for the configured backend.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: S) -> TopicResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()
            .map_err(|e| TopicError::Config(format!("cannot build http client: {e}")))?;

        Ok(Self {
            client,
            collection: config.collection_url()?,
            session,
        })
    }

    /// Collection URL every request is built from.
    #[must_use]
    pub const fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn topic_url(&self, id: &TopicId) -> TopicResult<Url> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|()| TopicError::Config("collection url cannot be a base".to_string()))?
            .push(id.as_str());
        Ok(url)
    }

    /// Attach the bearer token and send; non-success statuses become typed errors.
    async fn dispatch(&self, request: RequestBuilder, operation: &str) -> TopicResult<Response> {
        let token = self
            .session
            .session_token()
            .filter(|t| !t.is_blank())
            .ok_or_else(|| TopicError::Auth("no active session".to_string()))?;

        tracing::debug!(operation, "sending topic request");
        let response = request.bearer_auth(token.expose()).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = TopicError::from_status(status.as_u16(), error_message(&body));
        tracing::debug!(operation, status = status.as_u16(), "topic request rejected: {err}");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> TopicResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_record(&self, request: RequestBuilder, operation: &str) -> TopicResult<Topic> {
        let response = self.dispatch(request, operation).await?;
        Self::decode::<TopicRecord>(response).await?.into_topic()
    }
}

#[async_trait]
impl<S: SessionProvider> TopicGateway for HttpTopicGateway<S> {
    async fn create_topic(&self, topic: &NewTopic) -> TopicResult<Topic> {
        let body = CreateTopicRequest {
            name: topic.name(),
            description: topic.description(),
            use_knowledge_graph: topic.uses_knowledge_graph(),
        };
        let request = self.client.post(self.collection.clone()).json(&body);
        self.fetch_record(request, "create").await
    }

    async fn list_topics(&self, limit: u32, offset: u32) -> TopicResult<TopicPage> {
        if limit == 0 {
            return Err(TopicError::Validation("limit must be > 0".to_string()));
        }
        let request = self
            .client
            .get(self.collection.clone())
            .query(&ListTopicsQuery { limit, offset });
        let response = self.dispatch(request, "list").await?;
        let payload: ListTopicsResponse = Self::decode(response).await?;

        let topics = payload
            .topics
            .into_iter()
            .map(TopicRecord::into_topic)
            .collect::<TopicResult<Vec<_>>>()?;
        Ok(TopicPage::new(topics, limit))
    }

    async fn get_topic(&self, id: &TopicId) -> TopicResult<Topic> {
        let request = self.client.get(self.topic_url(id)?);
        self.fetch_record(request, "get").await
    }

    async fn update_topic(&self, id: &TopicId, changes: &TopicChanges) -> TopicResult<Topic> {
        changes.validate()?;
        let body = UpdateTopicRequest {
            name: changes.name.as_deref().map(str::trim),
            description: changes.description.as_deref(),
        };
        let request = self.client.patch(self.topic_url(id)?).json(&body);
        self.fetch_record(request, "update").await
    }

    async fn delete_topic(&self, id: &TopicId) -> TopicResult<()> {
        let request = self.client.delete(self.topic_url(id)?);
        match self.dispatch(request, "delete").await {
            Ok(_) => Ok(()),
            Err(TopicError::NotFound(_)) => Err(TopicError::NotFound(format!("topic {id}"))),
            Err(err) => Err(err),
        }
    }
}
