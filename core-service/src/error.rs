use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A mutating call needs a signed-in user and there is none.
    #[error("No signed-in user")]
    NotAuthenticated,

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Interception error: {0}")]
    Intercept(#[from] core_intercept::InterceptError),

    #[error("Offline store error: {0}")]
    Offline(#[from] core_offline::OfflineError),

    #[error("Content error: {0}")]
    Content(#[from] core_content::ContentError),

    #[error("Study error: {0}")]
    Study(#[from] core_study::StudyError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
