use thiserror::Error;

/// Result type for processing chain operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while assembling or running a pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No stages in pipeline
    #[error("Cannot assemble a pipeline with no stages")]
    NoStages,

    /// `feed` called after the input queue was closed
    #[error("Cannot feed a closed pipeline")]
    FeedAfterClose,

    /// `close` called more than once
    #[error("Pipeline input is already closed")]
    AlreadyClosed,

    /// `await_completion` called before `start_consuming`
    #[error("Cannot await completion before a consumer is started")]
    ConsumerNotStarted,

    /// `start_consuming` called more than once
    #[error("Consumer has already been started")]
    ConsumerAlreadyStarted,

    /// `await_completion` called before `close`
    #[error("Cannot await completion before the input is closed")]
    NotClosed,

    /// Stage transform error
    #[error("Stage execution failed: {0}")]
    StageError(String),

    /// A downstream queue disconnected while a stage still had output for it
    #[error("Queue disconnected under stage '{0}'")]
    ChannelClosed(String),

    /// Thread join error
    #[error("Thread join error: {0}")]
    ThreadError(String),
}
