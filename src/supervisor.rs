use crate::error::RpcError;
use crate::models::{ProcessAction, ProcessInfo};
use crate::xmlrpc::{decode_response, MethodCall};
use std::sync::Arc;
use tracing::debug;

pub const GET_ALL_PROCESS_INFO: &str = "supervisor.getAllProcessInfo";

#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, body: String) -> Result<String, RpcError>;
}

#[derive(Clone)]
pub struct SupervisorClient {
    transport: Arc<dyn RpcTransport>,
}

impl SupervisorClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub async fn list_processes(&self) -> Result<Vec<ProcessInfo>, RpcError> {
        debug!(method = GET_ALL_PROCESS_INFO, "calling supervisor");
        let body = MethodCall::new(GET_ALL_PROCESS_INFO).encode();
        let response = self.transport.call(body).await?;
        let value = decode_response(&response)?;
        let entries = value.as_array().ok_or_else(|| {
            RpcError::Shape(format!("{GET_ALL_PROCESS_INFO} did not return an array"))
        })?;
        entries.iter().map(ProcessInfo::from_value).collect()
    }

    pub async fn start_process(&self, name: &str) -> Result<(), RpcError> {
        self.control(ProcessAction::Start, name).await
    }

    pub async fn stop_process(&self, name: &str) -> Result<(), RpcError> {
        self.control(ProcessAction::Stop, name).await
    }

    // The response body is not inspected.
    pub async fn control(&self, action: ProcessAction, name: &str) -> Result<(), RpcError> {
        debug!(method = action.method(), process = name, "calling supervisor");
        let body = MethodCall::new(action.method()).with_param(name).encode();
        self.transport.call(body).await.map(|_| ())
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ReqwestTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl RpcTransport for ReqwestTransport {
    async fn call(&self, body: String) -> Result<String, RpcError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RpcError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|err| RpcError::Transport(format!("failed to read response: {err}")))
    }
}
