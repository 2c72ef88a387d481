use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use replica_core::MirrorConfig;
use replica_sync::{pipeline, EventLogger, FileEventLog, Synchronizer};

use crate::error::{io_err, DaemonError};
use crate::log_rotation::RotationPolicy;
use crate::status::{self, LastPass};

/// Pass counters for one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub passes: usize,
    pub failed: usize,
}

/// Runs a pass over one configured mirror, then sleeps for the interval,
/// until shut down or a pass limit is reached.
///
/// The synchronizer (and with it the staleness tracker) lives for the whole
/// run. Passes never overlap: the next sleep starts only after the current
/// pass has returned. A pass that aborts on a failed copy or delete is
/// counted and logged; the driver carries on with the next tick.
pub struct PollingDriver<L> {
    config: MirrorConfig,
    synchronizer: Synchronizer<L>,
    interval: Duration,
    max_passes: Option<usize>,
    status_home: Option<PathBuf>,
    rotation: Option<RotationPolicy>,
}

impl PollingDriver<FileEventLog> {
    /// Driver for a saved configuration, logging to its event log and
    /// echoing every event to stdout.
    pub fn from_config(config: MirrorConfig) -> Result<Self, DaemonError> {
        config.validate()?;
        let secs = config.interval_secs.ok_or(DaemonError::ManualMode)?;
        let synchronizer = Synchronizer::new(pipeline::event_log_for(&config, true));
        Ok(Self::new(config, synchronizer, Duration::from_secs(secs))
            .with_rotation(RotationPolicy::default()))
    }
}

impl<L: EventLogger + Send + 'static> PollingDriver<L> {
    pub fn new(config: MirrorConfig, synchronizer: Synchronizer<L>, interval: Duration) -> Self {
        Self {
            config,
            synchronizer,
            interval,
            max_passes: None,
            status_home: None,
            rotation: None,
        }
    }

    /// Stop after `passes` passes instead of running until shutdown.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Persist each pass outcome under `<home>/.replica/run/`.
    pub fn with_status(mut self, home: &Path) -> Self {
        self.status_home = Some(home.to_path_buf());
        self
    }

    /// Rotate the event log before each pass.
    pub fn with_rotation(mut self, policy: RotationPolicy) -> Self {
        self.rotation = Some(policy);
        self
    }

    /// Drive passes until `shutdown` resolves or the pass limit is reached.
    ///
    /// The first pass starts immediately. Shutdown is observed between
    /// passes, never in the middle of one. Hands the synchronizer back so
    /// callers can inspect the logger and tracker.
    pub async fn run_until<F>(
        self,
        shutdown: F,
    ) -> Result<(Synchronizer<L>, DriverStats), DaemonError>
    where
        F: Future<Output = ()>,
    {
        let Self {
            config,
            mut synchronizer,
            interval,
            max_passes,
            status_home,
            rotation,
        } = self;
        tokio::pin!(shutdown);

        let mut stats = DriverStats::default();
        tracing::info!(
            source = %config.source.display(),
            replica = %config.replica.display(),
            interval_secs = interval.as_secs(),
            "polling driver started"
        );

        loop {
            let started = Instant::now();
            let pass_config = config.clone();
            let (returned, result) = tokio::task::spawn_blocking(move || {
                if let Some(policy) = rotation {
                    policy.rotate_logged(&pass_config.log_file);
                }
                let result = pipeline::run(&pass_config, &mut synchronizer);
                (synchronizer, result)
            })
            .await
            .map_err(|err| DaemonError::Join(err.to_string()))?;
            synchronizer = returned;
            stats.passes += 1;

            let last = match result {
                Ok(report) => {
                    tracing::info!(
                        pass = stats.passes,
                        created = report.created,
                        deleted = report.deleted,
                        modified = report.modified,
                        listing_errors = report.listing_errors,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "pass finished"
                    );
                    LastPass::succeeded(stats.passes, report)
                }
                Err(err) => {
                    stats.failed += 1;
                    tracing::error!(pass = stats.passes, error = %err, "pass aborted");
                    LastPass::failed(stats.passes, &err)
                }
            };

            if let Some(home) = &status_home {
                if let Err(err) = status::save_at(home, &last) {
                    tracing::warn!(error = %err, "failed to record pass status");
                }
            }

            if max_passes.is_some_and(|max| stats.passes >= max) {
                tracing::info!(passes = stats.passes, "pass limit reached");
                break;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(passes = stats.passes, "shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        Ok((synchronizer, stats))
    }
}

/// Start the polling driver for `config` and block the current thread until
/// ctrl-c or `max_passes` passes.
pub fn start_blocking(
    home: &Path,
    config: MirrorConfig,
    max_passes: Option<usize>,
) -> Result<DriverStats, DaemonError> {
    let mut driver = PollingDriver::from_config(config)?.with_status(home);
    if let Some(max) = max_passes {
        driver = driver.with_max_passes(max);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(async move {
        let (_, stats) = driver.run_until(ctrl_c()).await?;
        Ok(stats)
    })
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, stopping after the current pass"),
        Err(err) => {
            tracing::warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await
        }
    }
}

/// Install the process-wide subscriber. Diagnostics go to stderr so they
/// never interleave with the event echo on stdout. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
