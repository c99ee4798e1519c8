//! Remote-backed store actions.
//!
//! Every action runs the same protocol: mark the operation in flight and clear the last
//! error, call the gateway, then either apply the confirmed result or record the failure.
//! Settling always happens in one commit together with the result, so listeners never see
//! a half-applied action.
//!
//! Once started, the gateway call and the settling commit run on their own task. Dropping
//! the action's future only stops waiting for it: a delete the backend already received is
//! still applied locally.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{TopicError, TopicResult};
use crate::model::{Topic, TopicId, TopicPatch, TopicStatus};
use crate::remote::{NewTopic, TopicChanges, TopicGateway, TopicPage};
use crate::store::{Operation, Shared, TopicState, TopicStore};

const INTERRUPTED: &str = "action interrupted before the backend answered";

/// One started operation, holding its own handle on the store.
///
/// Dropped unsettled (its task was torn down), it settles the operation as failed.
struct InFlight<G> {
    shared: Arc<Shared<G>>,
    operation: Option<Operation>,
}

impl<G> InFlight<G> {
    fn begin(shared: &Arc<Shared<G>>, operation: Operation) -> Self {
        debug!(%operation, "operation started");
        shared.commit(|state| Some(state.began(operation.clone())));
        Self {
            shared: Arc::clone(shared),
            operation: Some(operation),
        }
    }

    fn gateway(&self) -> &G {
        &self.shared.gateway
    }

    /// Apply the confirmed result and settle in one commit; returns the committed snapshot.
    fn succeed<F>(mut self, apply: F) -> Arc<TopicState>
    where
        F: FnOnce(&TopicState) -> TopicState,
    {
        let Some(operation) = self.operation.take() else {
            return self.shared.snapshot();
        };
        let committed = self
            .shared
            .commit(|state| Some(apply(state).settled(&operation)));
        debug!(%operation, "operation settled");
        committed.unwrap_or_else(|| self.shared.snapshot())
    }

    fn fail(mut self, error: TopicError) -> TopicError {
        if let Some(operation) = self.operation.take() {
            warn!(%operation, kind = %error.kind(), error = %error, "operation failed");
            let message = error.to_string();
            self.shared
                .commit(|state| Some(state.failed(&operation, message)));
        }
        error
    }
}

impl<G> Drop for InFlight<G> {
    fn drop(&mut self) {
        if let Some(operation) = self.operation.take() {
            warn!(%operation, "operation interrupted");
            self.shared
                .commit(|state| Some(state.failed(&operation, INTERRUPTED.to_string())));
        }
    }
}

/// Run the rest of an action on its own task and wait for it.
async fn detach<T, F>(action: F) -> TopicResult<T>
where
    T: Send + 'static,
    F: Future<Output = TopicResult<T>> + Send + 'static,
{
    tokio::spawn(action).await?
}

/// Merge the backend-owned fields of `confirmed` into the entry and the selection, and
/// return the merged local copy (collection first, then selection), else `confirmed`.
fn merge_confirmed<G>(flight: InFlight<G>, id: &TopicId, confirmed: Topic) -> Topic {
    let patch = TopicPatch::from_server(&confirmed);
    let state = flight.succeed(|current| {
        current
            .patched(id, &patch)
            .unwrap_or_else(|| current.clone())
    });
    state
        .topic(id)
        .or_else(|| state.selected_topic.as_ref().filter(|t| &t.id == id))
        .cloned()
        .unwrap_or(confirmed)
}

impl<G: TopicGateway + 'static> TopicStore<G> {
    /// Create a topic remotely and prepend the confirmed record.
    ///
    /// The returned topic has status [`TopicStatus::Completed`]: a successful create means
    /// the backend finished its initial setup.
    ///
    /// # Errors
    /// Returns [`TopicError::Validation`] for a blank name (no request is sent) and any
    /// gateway failure. The failure is also recorded in `last_error`; the collection is
    /// left as it was.
    pub async fn create_topic(
        &self,
        name: &str,
        description: Option<&str>,
        uses_knowledge_graph: bool,
    ) -> TopicResult<Topic> {
        let flight = InFlight::begin(&self.shared, Operation::Create);
        let request = match NewTopic::new(name, description, uses_knowledge_graph) {
            Ok(request) => request,
            Err(e) => return Err(flight.fail(e)),
        };

        detach(async move {
            let result = flight.gateway().create_topic(&request).await;
            match result {
                Ok(created) => {
                    let topic = Topic {
                        status: TopicStatus::Completed,
                        ..created
                    };
                    info!(id = %topic.id, title = %topic.title, "topic created");
                    let inserted = topic.clone();
                    flight.succeed(move |state| state.prepended(inserted));
                    Ok(topic)
                }
                Err(e) => Err(flight.fail(e)),
            }
        })
        .await
    }

    /// Load the first page (store page size, offset 0) and replace the collection with it.
    ///
    /// # Errors
    /// Any gateway failure; the previous collection stays in place.
    pub async fn load_topics(&self) -> TopicResult<TopicPage> {
        self.load_topics_page(self.page_size, 0).await
    }

    /// Load one page and replace the collection with it, in backend order.
    ///
    /// The replace happens only once the whole page is received and mapped.
    ///
    /// # Errors
    /// Any gateway failure; the previous collection stays in place.
    pub async fn load_topics_page(&self, limit: u32, offset: u32) -> TopicResult<TopicPage> {
        let flight = InFlight::begin(&self.shared, Operation::Load);
        detach(async move {
            let result = flight.gateway().list_topics(limit, offset).await;
            match result {
                Ok(page) => {
                    info!(
                        count = page.topics.len(),
                        has_more = page.has_more,
                        offset,
                        "topics loaded"
                    );
                    let topics = page.topics.clone();
                    flight.succeed(move |state| state.replaced(topics));
                    Ok(page)
                }
                Err(e) => Err(flight.fail(e)),
            }
        })
        .await
    }

    /// Re-fetch one topic and merge the backend-owned fields into the local copy and the
    /// selection. A topic absent locally is not inserted.
    ///
    /// Returns the merged local topic, or the fetched one if it is not held locally.
    ///
    /// # Errors
    /// Any gateway failure, notably [`TopicError::NotFound`].
    pub async fn refresh_topic(&self, id: &TopicId) -> TopicResult<Topic> {
        let target = id.clone();
        let flight = InFlight::begin(&self.shared, Operation::Refresh(id.clone()));
        detach(async move {
            let result = flight.gateway().get_topic(&target).await;
            match result {
                Ok(fetched) => Ok(merge_confirmed(flight, &target, fetched)),
                Err(e) => Err(flight.fail(e)),
            }
        })
        .await
    }

    /// Rename or re-describe a topic remotely, then merge the confirmed record locally.
    ///
    /// Returns the merged local topic, or the server's record if it is not held locally.
    ///
    /// # Errors
    /// [`TopicError::Validation`] for an empty or blank change set, otherwise any gateway
    /// failure. Local state is untouched on failure.
    pub async fn edit_topic(&self, id: &TopicId, changes: &TopicChanges) -> TopicResult<Topic> {
        let flight = InFlight::begin(&self.shared, Operation::Edit(id.clone()));
        if let Err(e) = changes.validate() {
            return Err(flight.fail(e));
        }
        let target = id.clone();
        let changes = changes.clone();
        detach(async move {
            let result = flight.gateway().update_topic(&target, &changes).await;
            match result {
                Ok(updated) => {
                    info!(id = %target, "topic updated");
                    Ok(merge_confirmed(flight, &target, updated))
                }
                Err(e) => Err(flight.fail(e)),
            }
        })
        .await
    }

    /// Delete a topic remotely; remove it locally (and from the selection) only once the
    /// backend confirms.
    ///
    /// # Errors
    /// Any gateway failure, notably [`TopicError::NotFound`]. The topic stays in place.
    pub async fn delete_topic(&self, id: &TopicId) -> TopicResult<()> {
        let target = id.clone();
        let flight = InFlight::begin(&self.shared, Operation::Delete(id.clone()));
        detach(async move {
            let result = flight.gateway().delete_topic(&target).await;
            match result {
                Ok(()) => {
                    info!(id = %target, "topic deleted");
                    flight.succeed(|state| {
                        state.without(&target).unwrap_or_else(|| state.clone())
                    });
                    Ok(())
                }
                Err(e) => Err(flight.fail(e)),
            }
        })
        .await
    }
}
