//! Scripted in-memory gateway for store tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{TopicError, TopicResult};
use crate::model::{Topic, TopicId};
use crate::remote::{NewTopic, TopicChanges, TopicGateway, TopicPage};

#[derive(Default)]
struct Script {
    create: VecDeque<TopicResult<Topic>>,
    list: VecDeque<TopicResult<Vec<Topic>>>,
    get: VecDeque<TopicResult<Topic>>,
    update: VecDeque<TopicResult<Topic>>,
    delete: VecDeque<TopicResult<()>>,
    calls: Vec<String>,
}

/// Gateway answering from queued responses. Clones share the same script.
///
/// With a gate installed, every call waits for [`ScriptedGateway::release`] before
/// answering, which lets tests observe the store while a call is in flight.
#[derive(Clone, Default)]
pub(crate) struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    /// Let one waiting (or the next) call through.
    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }

    pub(crate) fn push_create(&self, result: TopicResult<Topic>) {
        self.with_script(|s| s.create.push_back(result));
    }

    pub(crate) fn push_list(&self, result: TopicResult<Vec<Topic>>) {
        self.with_script(|s| s.list.push_back(result));
    }

    pub(crate) fn push_get(&self, result: TopicResult<Topic>) {
        self.with_script(|s| s.get.push_back(result));
    }

    pub(crate) fn push_update(&self, result: TopicResult<Topic>) {
        self.with_script(|s| s.update.push_back(result));
    }

    pub(crate) fn push_delete(&self, result: TopicResult<()>) {
        self.with_script(|s| s.delete.push_back(result));
    }

    /// Calls received so far, e.g. `["create:Rust", "delete:t1"]`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.with_script(|s| s.calls.clone())
    }

    async fn answer<T>(
        &self,
        call: String,
        pick: impl FnOnce(&mut Script) -> Option<TopicResult<T>>,
    ) -> TopicResult<T> {
        let answer = self.with_script(|s| {
            s.calls.push(call);
            pick(s)
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        answer.unwrap_or_else(|| Err(TopicError::Network("no scripted response".to_string())))
    }
}

#[async_trait]
impl TopicGateway for ScriptedGateway {
    async fn create_topic(&self, topic: &NewTopic) -> TopicResult<Topic> {
        self.answer(format!("create:{}", topic.name()), |s| s.create.pop_front())
            .await
    }

    async fn list_topics(&self, limit: u32, offset: u32) -> TopicResult<TopicPage> {
        self.answer(format!("list:{limit}:{offset}"), |s| s.list.pop_front())
            .await
            .map(|topics| TopicPage::new(topics, limit))
    }

    async fn get_topic(&self, id: &TopicId) -> TopicResult<Topic> {
        self.answer(format!("get:{id}"), |s| s.get.pop_front()).await
    }

    async fn update_topic(&self, id: &TopicId, changes: &TopicChanges) -> TopicResult<Topic> {
        changes.validate()?;
        self.answer(format!("update:{id}"), |s| s.update.pop_front())
            .await
    }

    async fn delete_topic(&self, id: &TopicId) -> TopicResult<()> {
        self.answer(format!("delete:{id}"), |s| s.delete.pop_front())
            .await
    }
}
