//! Application context and the polling orchestrator.
//!
//! [`AppContext`] owns the sensor, the processor and the polling settings, and
//! is shared between the command loop and the [`Orchestrator`] task. The
//! orchestrator only moves data; every change of settings goes through
//! [`AppContext::configure`] or [`AppContext::execute`].
//!
//! ```text
//! commands ──► AppContext ──► SampleSource ◄── generation task
//!                   │                │
//!                   │          collect_data(n)
//!                   ▼                ▼
//!             Orchestrator ──► SlidingWindowProcessor ──► SnapshotSink
//! ```

use crate::command::{Command, Component, HELP_TEXT};
use crate::config::{OrchestratorConfig, PipelineConfig, MAX_COLLECT_SIZE, MAX_POLLING_RATE_MS};
use crate::error::{AppResult, DaqError};
use crate::processor::{ProcessorSnapshot, SlidingWindowProcessor};
use crate::report::{format_configuration, SnapshotSink};
use crate::sensor::SampleSource;
use crate::validation::{is_in_range, parse_value as parse};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Text for the operator
    pub message: String,
    /// True once the command loop should end
    pub exit: bool,
}

impl Outcome {
    fn reply(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit: false,
        }
    }
}

/// Shared state of one pipeline.
pub struct AppContext {
    source: Arc<SampleSource>,
    processor: Arc<SlidingWindowProcessor>,
    settings: Mutex<OrchestratorConfig>,
    generating: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl AppContext {
    /// Build the components from a loaded configuration.
    pub fn new(config: &PipelineConfig) -> AppResult<Self> {
        config.validate()?;
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            source: Arc::new(SampleSource::new(config.sensor.clone())?),
            processor: Arc::new(SlidingWindowProcessor::new(config.processor.clone())?),
            settings: Mutex::new(config.orchestrator.clone()),
            generating: AtomicBool::new(false),
            shutdown_tx,
        })
    }

    /// The sensor.
    pub fn source(&self) -> &Arc<SampleSource> {
        &self.source
    }

    /// The processor.
    pub fn processor(&self) -> &Arc<SlidingWindowProcessor> {
        &self.processor
    }

    /// Current polling settings.
    pub fn orchestrator_settings(&self) -> OrchestratorConfig {
        self.settings.lock().clone()
    }

    /// True between `start` and `stop` while the generation task is alive.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst) && self.source.is_generating()
    }

    /// True once [`shutdown`](Self::shutdown) ran.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Receiver that flips to `true` on shutdown.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Snapshot of the processor.
    pub fn snapshot(&self) -> ProcessorSnapshot {
        self.processor.snapshot()
    }

    /// Text summary of every component's settings.
    pub fn describe(&self) -> String {
        format_configuration(
            &self.source.settings(),
            &self.processor.settings(),
            &self.orchestrator_settings(),
        )
    }

    /// Route a property change to the component that owns it.
    pub fn configure(&self, component: Component, option: &str, value: &str) -> AppResult<()> {
        match component {
            Component::Sensor => self.source.configure(option, value),
            Component::Processor => self.processor.configure(option, value),
            Component::Orchestrator => self.configure_orchestrator(option, value),
        }
    }

    fn configure_orchestrator(&self, option: &str, value: &str) -> AppResult<()> {
        match option {
            "pollingrate" => {
                let rate: u64 = parse(option, value)?;
                is_in_range(rate, 1..MAX_POLLING_RATE_MS).map_err(|_| {
                    DaqError::invalid(
                        option,
                        format!("must be greater than 0 and less than {MAX_POLLING_RATE_MS}"),
                    )
                })?;
                self.settings.lock().polling_rate_ms = rate;
            }
            "collectsize" => {
                let size: usize = parse(option, value)?;
                is_in_range(size, 1..MAX_COLLECT_SIZE).map_err(|_| {
                    DaqError::invalid(
                        option,
                        format!("must be greater than 0 and less than {MAX_COLLECT_SIZE}"),
                    )
                })?;
                self.settings.lock().collect_size = size;
            }
            "printdata" => {
                let flag = match value.trim() {
                    "0" => false,
                    "1" => true,
                    other => {
                        return Err(DaqError::invalid(
                            option,
                            format!("'{other}': expected 0 or 1"),
                        ))
                    }
                };
                self.settings.lock().print_data = flag;
            }
            _ => {
                return Err(DaqError::UnknownOption {
                    component: "orchestrator".to_string(),
                    option: option.to_string(),
                })
            }
        }
        debug!(option, value, "Orchestrator setting updated");
        Ok(())
    }

    /// Start sample generation and polling.
    pub fn start(&self) -> AppResult<()> {
        self.source.start_generation()?;
        self.generating.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop polling and wait for the generation task to exit.
    pub async fn stop(&self) -> AppResult<()> {
        self.generating.store(false, Ordering::SeqCst);
        self.source.stop_generation().await
    }

    /// Stop everything and release the orchestrator.
    pub async fn shutdown(&self) -> AppResult<()> {
        self.generating.store(false, Ordering::SeqCst);
        if self.source.is_generating() {
            self.source.stop_generation().await?;
        }
        self.shutdown_tx.send_replace(true);
        info!("Pipeline shut down");
        Ok(())
    }

    /// Execute one command. Declined requests come back as messages.
    #[instrument(skip(self), level = "debug")]
    pub async fn execute(&self, command: Command) -> AppResult<Outcome> {
        let result = match command {
            Command::Set { property, value } => match Component::for_property(&property) {
                Some(component) => self
                    .configure(component, &property, &value)
                    .map(|()| Outcome::reply(format!("{property} set to {value}"))),
                None => Err(DaqError::UnknownOption {
                    component: "pipeline".to_string(),
                    option: property,
                }),
            },
            Command::Start => self
                .start()
                .map(|()| Outcome::reply("Sample generation started")),
            Command::Stop => self
                .stop()
                .await
                .map(|()| Outcome::reply("Sample generation stopped")),
            Command::Status => Ok(Outcome::reply(self.describe())),
            Command::Help => Ok(Outcome::reply(HELP_TEXT)),
            Command::Exit => {
                self.shutdown().await?;
                return Ok(Outcome {
                    message: "Bye".to_string(),
                    exit: true,
                });
            }
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_rejection() => {
                warn!("Command declined: {e}");
                Ok(Outcome::reply(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Parse and execute one input line.
    pub async fn execute_line(&self, line: &str) -> AppResult<Outcome> {
        match line.parse::<Command>() {
            Ok(command) => self.execute(command).await,
            Err(e) => Ok(Outcome::reply(e.to_string())),
        }
    }
}

/// Moves batches from the sensor into the processor at the polling rate.
pub struct Orchestrator {
    ctx: Arc<AppContext>,
    sink: Arc<dyn SnapshotSink>,
}

impl Orchestrator {
    /// Orchestrator over `ctx` reporting into `sink`.
    pub fn new(ctx: Arc<AppContext>, sink: Arc<dyn SnapshotSink>) -> Self {
        Self { ctx, sink }
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// One polling step. Returns true when a batch reached the processor.
    pub fn poll_once(&self) -> bool {
        if !self.ctx.is_generating() || !self.ctx.source.is_ready() {
            return false;
        }

        let settings = self.ctx.orchestrator_settings();
        let batch = self.ctx.source.collect_data(settings.collect_size);
        let absorbed = !batch.is_empty();
        if absorbed {
            self.ctx.processor.input_data(&batch);
            self.sink
                .render(&self.ctx.processor.snapshot(), settings.print_data);
        }
        self.ctx.source.clear_ready();
        absorbed
    }

    /// Poll until shutdown.
    pub async fn run(self) {
        let mut shutdown_rx = self.ctx.shutdown_signal();
        info!("Orchestrator started");
        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            self.poll_once();

            let delay = Duration::from_millis(self.ctx.orchestrator_settings().polling_rate_ms);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Orchestrator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingSink;
    use crate::sensor::ValueMode;

    fn context() -> Arc<AppContext> {
        let mut config = PipelineConfig::default();
        config.sensor.period_ms = 5;
        config.sensor.value_mode = ValueMode::Deterministic;
        config.orchestrator.polling_rate_ms = 10;
        config.orchestrator.collect_size = 2;
        Arc::new(AppContext::new(&config).unwrap())
    }

    #[test]
    fn test_orchestrator_settings_are_validated() {
        let ctx = context();
        assert!(ctx
            .configure(Component::Orchestrator, "pollingrate", "10000")
            .is_err());
        assert!(ctx
            .configure(Component::Orchestrator, "collectsize", "0")
            .is_err());
        assert!(ctx
            .configure(Component::Orchestrator, "printdata", "2")
            .is_err());
        assert_eq!(ctx.orchestrator_settings().polling_rate_ms, 10);

        ctx.configure(Component::Orchestrator, "pollingrate", "250")
            .unwrap();
        ctx.configure(Component::Orchestrator, "printdata", "0")
            .unwrap();
        let settings = ctx.orchestrator_settings();
        assert_eq!(settings.polling_rate_ms, 250);
        assert!(!settings.print_data);
    }

    #[test]
    fn test_poll_skips_when_not_generating() {
        let ctx = context();
        ctx.source().tick();
        ctx.source().tick();
        let sink = Arc::new(CollectingSink::new());
        let orchestrator = Orchestrator::new(ctx.clone(), sink.clone());
        assert!(!orchestrator.poll_once());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_execute_declines_without_failing() {
        let ctx = context();
        let outcome = ctx.execute_line("set filtersize 99").await.unwrap();
        assert!(!outcome.exit);
        assert!(outcome.message.contains("filtersize"));

        let outcome = ctx.execute_line("set gain 3").await.unwrap();
        assert!(outcome.message.contains("gain"));

        let outcome = ctx.execute_line("stop").await.unwrap();
        assert!(outcome.message.contains("not running"));

        let outcome = ctx.execute_line("dance").await.unwrap();
        assert!(outcome.message.contains("unknown command"));
    }

    #[tokio::test]
    async fn test_start_stop_exit() {
        let ctx = context();
        ctx.execute(Command::Start).await.unwrap();
        assert!(ctx.is_generating());

        let outcome = ctx.execute(Command::Start).await.unwrap();
        assert!(outcome.message.contains("already running"));

        ctx.execute(Command::Stop).await.unwrap();
        assert!(!ctx.is_generating());
        assert!(!ctx.source().is_generating());

        let outcome = ctx.execute(Command::Exit).await.unwrap();
        assert!(outcome.exit);
        assert!(ctx.is_shut_down());
    }

    #[tokio::test]
    async fn test_dead_generation_task_is_not_fatal() {
        let ctx = context();
        ctx.start().unwrap();
        ctx.source().stop_generation().await.unwrap();
        assert!(!ctx.is_generating());

        let sink = Arc::new(CollectingSink::new());
        ctx.source().tick();
        let orchestrator = Orchestrator::new(ctx.clone(), sink.clone());
        assert!(!orchestrator.poll_once());

        let outcome = ctx.execute(Command::Stop).await.unwrap();
        assert!(!outcome.exit);
        let outcome = ctx.execute(Command::Start).await.unwrap();
        assert!(outcome.message.contains("started"));
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_orchestrator_feeds_processor() {
        let ctx = context();
        let sink = Arc::new(CollectingSink::new());
        let handle = Orchestrator::new(ctx.clone(), sink.clone()).spawn();

        ctx.start().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        ctx.shutdown().await.unwrap();
        handle.await.unwrap();

        assert!(!sink.is_empty());
        let last = sink.snapshots().pop().unwrap();
        assert_eq!(last.raw.len(), 30);
        assert!(last.raw.iter().any(|v| *v != 0.0));
    }
}
