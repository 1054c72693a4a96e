/// Failure taxonomy for planning an orchestrated flow.
///
/// Configuration and input problems abort the attempt before any transaction
/// is submitted. Read failures carry the underlying error chain for display.
/// Failures while the flow is running are reported on the step itself, in
/// [`crate::flow::FlowStatus`].
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("failed to read {what}: {source}")]
    Read {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl FlowError {
    pub(crate) fn config(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }

    pub(crate) fn read(what: &'static str, source: anyhow::Error) -> Self {
        Self::Read { what, source }
    }
}
