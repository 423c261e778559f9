//! @acp:module "Observer Session"
//! @acp:summary "Async event loop feeding the context observer and re-running the pipeline"
//! @acp:domain personalization
//! @acp:layer service
//!
//! Interaction events arrive on a bounded channel and are consumed one at a
//! time by a single task that owns both the observer and the
//! [`Personalizer`]. A settle timer promotes the observer to observing; it is
//! dropped with the loop when the session shuts down.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::accumulator::{BehaviorAccumulator, ContextObserver, ObserverState};
use super::config::ObserverConfig;
use super::events::InteractionEvent;
use crate::decision::DecisionResult;
use crate::error::{HeroError, Result};
use crate::pipeline::Personalizer;
use crate::signals::Intent;

/// What a finished session hands back
pub struct SessionReport {
    pub personalizer: Personalizer,
    pub accumulator: BehaviorAccumulator,
    /// Decisions produced by behavioral re-personalization, in order
    pub repersonalizations: Vec<DecisionResult>,
    pub events_processed: usize,
}

/// Serializable summary of a [`SessionReport`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub events_processed: usize,
    pub final_intent: Intent,
    pub repersonalizations: Vec<DecisionResult>,
}

impl SessionReport {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            events_processed: self.events_processed,
            final_intent: self
                .personalizer
                .last_decision()
                .map(|d| d.intent)
                .unwrap_or(Intent::Default),
            repersonalizations: self.repersonalizations.clone(),
        }
    }
}

pub struct ObserverSession {
    observer: ContextObserver,
    personalizer: Personalizer,
    repersonalizations: Vec<DecisionResult>,
    events_processed: usize,
}

impl ObserverSession {
    /// Start the session loop on the current Tokio runtime.
    ///
    /// The observer's active intent is taken from the personalizer's last
    /// decision, DEFAULT if there is none.
    pub fn spawn(personalizer: Personalizer, config: ObserverConfig) -> ObserverHandle {
        let capacity = config.channel_capacity.max(1);
        let mut observer = ContextObserver::new(config, personalizer.tables());
        observer.set_active_intent(
            personalizer
                .last_decision()
                .map(|d| d.intent)
                .unwrap_or(Intent::Default),
        );

        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let session = ObserverSession {
            observer,
            personalizer,
            repersonalizations: Vec::new(),
            events_processed: 0,
        };
        let task = tokio::spawn(session.run(event_rx, shutdown_rx));

        ObserverHandle {
            events: event_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<InteractionEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> SessionReport {
        let settle = tokio::time::sleep(Duration::from_millis(self.observer.config().settle_delay_ms));
        tokio::pin!(settle);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("Observer session shutting down");
                    break;
                }
                () = &mut settle, if self.observer.state() == ObserverState::Idle => {
                    self.observer.begin_observing();
                }
                event = events.recv() => match event {
                    Some(event) => self.process(&event),
                    None => break,
                },
            }
        }

        tracing::debug!(
            events = self.events_processed,
            repersonalizations = self.repersonalizations.len(),
            "Observer session finished"
        );
        SessionReport {
            personalizer: self.personalizer,
            accumulator: self.observer.accumulator().clone(),
            repersonalizations: self.repersonalizations,
            events_processed: self.events_processed,
        }
    }

    fn process(&mut self, event: &InteractionEvent) {
        self.events_processed += 1;
        let Some(trigger) = self.observer.handle(event) else {
            return;
        };

        let decision = self.personalizer.repersonalize(&trigger);
        self.observer.commit_trigger(&trigger);
        tracing::info!(
            from = %trigger.from,
            intent = %trigger.intent,
            score = trigger.score,
            at_ms = trigger.at_ms,
            "Behavioral re-personalization"
        );
        self.repersonalizations.push(decision);
    }
}

/// Producer side of a running session
pub struct ObserverHandle {
    events: mpsc::Sender<InteractionEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<SessionReport>,
}

impl ObserverHandle {
    /// Queue an event, waiting for channel capacity
    pub async fn send(&self, event: InteractionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| HeroError::Other("observer session closed".to_string()))
    }

    /// Queue an event without waiting; a full channel drops it
    pub fn try_send(&self, event: InteractionEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(kind = event.kind(), "Observer channel full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Process every queued event, then stop
    pub async fn finish(self) -> Result<SessionReport> {
        let ObserverHandle {
            events,
            shutdown,
            task,
        } = self;
        drop(events);
        let report = task.await.map_err(|e| HeroError::Other(e.to_string()));
        drop(shutdown);
        report
    }

    /// Stop now; queued events that were not consumed yet are discarded
    pub async fn shutdown(self) -> Result<SessionReport> {
        let _ = self.shutdown.send(());
        self.task.await.map_err(|e| HeroError::Other(e.to_string()))
    }
}
