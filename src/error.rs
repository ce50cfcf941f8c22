use thiserror::Error;

/// Run-level failure kinds. Per-item problems (a single bad observation)
/// are recovered locally and surface only as a skip count; these are the
/// failures that abort or gate a whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("lesson store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("collector failed: {0}")]
    CollectorFailed(String),

    #[error("observation missing required field '{0}'")]
    MalformedObservation(&'static str),

    #[error("another run appears to be in progress (lock {0})")]
    RunInProgress(String),
}
