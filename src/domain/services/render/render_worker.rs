//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the render dispatcher: a single worker task that drains a bounded
// queue and calls the render sink strictly in submission order, however many producers submit
// concurrently. A full queue makes submitters wait.
//
// After each first-hand render the worker schedules delayed repeats for the event. A repeat
// reloads the last committed event from the store and goes through the same queue.
//
// | Component       | Description                                                 |
// |-----------------|-------------------------------------------------------------|
// | RenderWorker    | Worker task owning the render sink                          |
// | RenderClient    | Cloneable handle used to submit work                        |
// | RenderCommand   | Commands sent to the worker                                 |
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name            | Description                                       | Key Methods         |
// |-----------------|---------------------------------------------------|---------------------|
// | RenderWorker    | Worker task managing the render sink              | start               |
// |                 |                                                   | handle_command      |
// |-----------------|---------------------------------------------------|---------------------|
// | RenderClient    | Client interface to the worker                    | render              |
// |                 |                                                   | render_once         |
// |                 |                                                   | flush               |
// |                 |                                                   | shutdown            |
//
//--------------------------------------------------------------------------------------------------
// ENUMS
//--------------------------------------------------------------------------------------------------
// | Name            | Description                                       | Variants            |
// |-----------------|---------------------------------------------------|---------------------|
// | RenderCommand   | Commands sent to worker                           | Render              |
// |                 |                                                   | Flush               |
// |                 |                                                   | Shutdown            |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::RenderError;
use super::repeater::{RepeatTask, Repeater};
use crate::domain::models::Event;
use crate::outbounds::sinks::RenderSink;
use crate::outbounds::store::AggregateStore;

/// Commands that can be sent to the RenderWorker
#[derive(Debug)]
enum RenderCommand {
    /// Render an event; `repeat` schedules delayed repeats afterwards
    Render { event: Box<Event>, repeat: bool },

    /// Answer once everything submitted before has been handled
    Flush { response_tx: oneshot::Sender<()> },

    /// Stop the worker
    Shutdown,
}

/// Worker task that issues render calls one at a time.
pub struct RenderWorker {
    sink: Arc<dyn RenderSink>,
    capacity: usize,
    repeats: Vec<Duration>,
    store: Option<Arc<dyn AggregateStore>>,
    repeater: Option<Repeater>,
}

impl RenderWorker {
    /// Creates a worker with a queue of `capacity` pending commands.
    pub fn new(sink: Arc<dyn RenderSink>, capacity: usize) -> Self {
        Self {
            sink,
            capacity: capacity.max(1),
            repeats: Vec::new(),
            store: None,
            repeater: None,
        }
    }

    /// Enables delayed repeats that reload the event from `store`.
    pub fn with_repeats(mut self, repeats: Vec<Duration>, store: Arc<dyn AggregateStore>) -> Self {
        self.repeats = repeats;
        self.store = Some(store);
        self
    }

    /// Spawns the worker and returns a client to interact with it.
    pub fn start(mut self) -> (RenderClient, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(self.capacity);
        let client = RenderClient::new(command_tx);

        if let Some(store) = self.store.take() {
            if !self.repeats.is_empty() {
                let task = reload_and_render(store, client.clone());
                self.repeater = Some(Repeater::new(std::mem::take(&mut self.repeats), task));
            }
        }

        let handle = tokio::spawn(async move {
            self.run(command_rx).await;
        });
        (client, handle)
    }

    /// Main worker loop that processes commands
    async fn run(&mut self, mut rx: Receiver<RenderCommand>) {
        info!(capacity = self.capacity, "render worker started");
        while let Some(cmd) = rx.recv().await {
            match cmd {
                RenderCommand::Shutdown => break,
                _ => self.handle_command(cmd).await,
            }
        }
        if let Some(repeater) = &self.repeater {
            repeater.cancel_all();
        }
        info!("render worker stopped");
    }

    /// Processes a single command
    async fn handle_command(&mut self, cmd: RenderCommand) {
        match cmd {
            RenderCommand::Render { event, repeat } => {
                match self.sink.render(&event).await {
                    Ok(()) => debug!(event_id = %event.id, repeat, "event rendered"),
                    Err(e) => error!(event_id = %event.id, error = %e, "failed to render event"),
                }
                if repeat {
                    if let Some(repeater) = &self.repeater {
                        repeater.schedule(&event.id);
                    }
                }
            }

            RenderCommand::Flush { response_tx } => {
                let _ = response_tx.send(());
            }

            RenderCommand::Shutdown => {
                // Handled in the run loop
            }
        }
    }
}

/// Repeat task: reload the committed event and queue a render without further repeats.
fn reload_and_render(store: Arc<dyn AggregateStore>, client: RenderClient) -> RepeatTask {
    Arc::new(move |event_id: String| {
        let store = store.clone();
        let client = client.clone();
        Box::pin(async move {
            match store.load(&event_id).await {
                Ok(event) => {
                    if let Err(e) = client.render_once(event).await {
                        warn!(event_id = %event_id, error = %e, "failed to queue repeat render");
                    }
                }
                Err(e) => error!(event_id = %event_id, error = %e, "failed to reload event for repeat render"),
            }
        })
    })
}

/// Client interface to interact with the RenderWorker
#[derive(Clone)]
pub struct RenderClient {
    command_tx: Sender<RenderCommand>,
}

impl RenderClient {
    fn new(command_tx: Sender<RenderCommand>) -> Self {
        Self { command_tx }
    }

    /// Queues a render followed by delayed repeats. Waits while the queue is full.
    pub async fn render(&self, event: Event) -> Result<(), RenderError> {
        self.submit(event, true).await
    }

    /// Queues a single render.
    pub async fn render_once(&self, event: Event) -> Result<(), RenderError> {
        self.submit(event, false).await
    }

    async fn submit(&self, event: Event, repeat: bool) -> Result<(), RenderError> {
        self.command_tx
            .send(RenderCommand::Render {
                event: Box::new(event),
                repeat,
            })
            .await
            .map_err(|_| RenderError::ChannelClosed)
    }

    /// Waits until every render submitted before this call has been handled.
    pub async fn flush(&self) -> Result<(), RenderError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(RenderCommand::Flush { response_tx })
            .await
            .map_err(|_| RenderError::ChannelClosed)?;
        response_rx.await.map_err(|_| RenderError::NoResponse)
    }

    /// Shuts down the worker. Pending repeats are cancelled.
    pub async fn shutdown(&self) -> Result<(), RenderError> {
        self.command_tx
            .send(RenderCommand::Shutdown)
            .await
            .map_err(|_| RenderError::ChannelClosed)
    }
}
