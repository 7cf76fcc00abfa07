use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request failed: status {0}")]
    Status(u16),

    #[error("malformed xml: {0}")]
    Xml(String),

    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("unexpected response shape: {0}")]
    Shape(String),
}
