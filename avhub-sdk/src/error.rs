use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("State management error: {0}")]
    State(#[from] hub_state::StateError),

    #[error("Cannot reach hub: {0}")]
    HubUnreachable(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Control rejected by hub: {0}")]
    ControlRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
