//! The engine thread: owns the tokio runtime, receives commands from the
//! synchronous side and reports back over a plain channel of events.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::analyze::SingleAnalysisClient;
use crate::api::{ApiClient, ApiConfig};
use crate::channel::{ChannelConfig, DuplexChannel};
use crate::poller::{BatchProgressPoller, PollerConfig};
use crate::session::SessionIdentity;
use crate::types::{ClientError, ConfirmAck, EngineEvent};
use crate::upload::BatchUploadController;
use client_logging::{client_error, client_info};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api: ApiConfig,
    pub poller: PollerConfig,
    pub channel: ChannelConfig,
    pub session: SessionIdentity,
}

impl EngineConfig {
    pub fn new(base_url: impl Into<String>, session: SessionIdentity) -> Self {
        Self {
            api: ApiConfig::new(base_url),
            poller: PollerConfig::default(),
            channel: ChannelConfig::default(),
            session,
        }
    }
}

/// Commands the synchronous side can issue.
#[derive(Debug)]
pub enum EngineCommand {
    /// Probe the service's health endpoint.
    HealthCheck,
    /// Open the push channel for this session.
    Connect,
    Analyze { email: String },
    SendChat { text: String },
    Preview { path: PathBuf },
    Confirm { path: PathBuf, new_emails: u64 },
    StartPolling { batch_id: String },
    StopPolling,
    /// Stop polling, close the channel and end the engine thread.
    Shutdown,
}

/// Cheap-to-clone handle for sending commands to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Spawns the engine thread and returns the handle plus the event
    /// stream it reports on.
    pub fn new(config: EngineConfig) -> Result<(Self, mpsc::Receiver<EngineEvent>), ClientError> {
        let api = Arc::new(ApiClient::new(config.api)?);
        let ws_url = api.ws_url(config.session.id())?;
        let session_id = config.session.id().to_string();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let poller_config = config.poller;
        let channel_config = config.channel;
        thread::spawn(move || {
            run_engine(
                api,
                session_id,
                ws_url,
                poller_config,
                channel_config,
                cmd_rx,
                event_tx,
            );
        });
        Ok((Self { cmd_tx }, event_rx))
    }

    /// Sends a command; silently dropped if the engine thread has exited.
    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

fn run_engine(
    api: Arc<ApiClient>,
    session_id: String,
    ws_url: String,
    poller_config: PollerConfig,
    channel_config: ChannelConfig,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            client_error!("failed to start async runtime: {error}");
            return;
        }
    };
    let analysis = SingleAnalysisClient::new(Arc::clone(&api));
    let uploads = BatchUploadController::new(Arc::clone(&api), session_id.clone());
    let mut poller =
        BatchProgressPoller::new(Arc::clone(&api), poller_config, event_tx.clone());
    let mut channel: Option<DuplexChannel> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::HealthCheck => {
                let api = Arc::clone(&api);
                let events = event_tx.clone();
                runtime.spawn(async move {
                    let healthy = api.health().await.is_ok();
                    let _ = events.send(EngineEvent::HealthChecked { healthy });
                });
            }
            EngineCommand::Connect => {
                if channel.is_none() {
                    channel = Some(DuplexChannel::connect(
                        runtime.handle(),
                        ws_url.clone(),
                        channel_config.clone(),
                        event_tx.clone(),
                    ));
                }
            }
            EngineCommand::Analyze { email } => {
                let client = analysis.clone();
                let events = event_tx.clone();
                runtime.spawn(async move {
                    let result = client.analyze(&email, false).await;
                    let _ = events.send(EngineEvent::AnalysisCompleted { email, result });
                });
            }
            EngineCommand::SendChat { text } => {
                let api = Arc::clone(&api);
                let session_id = session_id.clone();
                let events = event_tx.clone();
                runtime.spawn(async move {
                    // The reply arrives over the push channel; only the
                    // delivery outcome is reported here.
                    let result = api
                        .send_chat_message(&session_id, &text)
                        .await
                        .map(|_envelope| ());
                    let _ = events.send(EngineEvent::ChatDelivered { result });
                });
            }
            EngineCommand::Preview { path } => {
                let uploads = uploads.clone();
                let events = event_tx.clone();
                runtime.spawn(async move {
                    let result = uploads.preview(&path).await;
                    let _ = events.send(EngineEvent::PreviewReady {
                        path: path.display().to_string(),
                        result,
                    });
                });
            }
            EngineCommand::Confirm { path, new_emails } => {
                let uploads = uploads.clone();
                let events = event_tx.clone();
                runtime.spawn(async move {
                    let result = uploads.confirm(&path, new_emails).await;
                    if let Ok(ConfirmAck::Queued(job)) = &result {
                        client_info!("upload queued as batch {}", job.batch_id);
                    }
                    let _ = events.send(EngineEvent::ConfirmCompleted { result });
                });
            }
            EngineCommand::StartPolling { batch_id } => {
                poller.start(runtime.handle(), batch_id);
            }
            EngineCommand::StopPolling => {
                poller.stop();
            }
            EngineCommand::Shutdown => {
                poller.stop();
                if let Some(channel) = channel.take() {
                    channel.shutdown();
                }
                client_info!("engine shutting down");
                break;
            }
        }
    }
    // Dropping the runtime here aborts any work still in flight.
}
