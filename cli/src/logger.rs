use std::sync::OnceLock;

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Env var controlling the log filter, e.g. `SCF_LOG=debug`
const LOG_ENV: &str = "SCF_LOG";

/// Set up log levels, formatting, and other configurations for the logger
pub struct Logger {
    multi_progress: MultiProgress,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

impl<'a> Logger {
    pub fn init() -> &'a Self {
        LOGGER.get_or_init(|| {
            let logger = env_logger::Builder::from_env(
                // No logs shown by default, only human-friendly messages
                // Enable logs output with "export SCF_LOG=debug" in terminal
                env_logger::Env::default().filter_or(LOG_ENV, "off"),
            )
            .format_timestamp_secs()
            .build();

            let level = logger.filter();
            let multi_progress = MultiProgress::new();

            // Fails only if another logger was installed first, keep that one
            if LogWrapper::new(multi_progress.clone(), logger)
                .try_init()
                .is_ok()
            {
                log::set_max_level(level);
            }

            Self { multi_progress }
        })
    }

    /// Spinners must be registered here so log lines are printed above them
    pub fn multi_progress() -> &'a MultiProgress {
        &Self::init().multi_progress
    }
}
