use crate::error::RpcError;
use crate::xmlrpc::Value;

pub const RUNNING: &str = "RUNNING";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub name: String,
    pub state: String,
    pub group: Option<String>,
    pub description: Option<String>,
    pub pid: Option<i64>,
}

impl ProcessInfo {
    pub fn from_value(value: &Value) -> Result<Self, RpcError> {
        if value.as_struct().is_none() {
            return Err(RpcError::Shape("process info is not a struct".to_string()));
        }

        let required = |member: &str| {
            value
                .member(member)
                .and_then(Value::to_text)
                .ok_or_else(|| RpcError::Shape(format!("process info without {member}")))
        };

        Ok(Self {
            name: required("name")?,
            state: required("statename")?,
            group: value.member("group").and_then(Value::to_text),
            description: value.member("description").and_then(Value::to_text),
            pid: value.member("pid").and_then(Value::as_i64),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAction {
    Start,
    Stop,
}

impl ProcessAction {
    pub fn for_state(state: &str) -> Self {
        if state == RUNNING {
            ProcessAction::Stop
        } else {
            ProcessAction::Start
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            ProcessAction::Start => "supervisor.startProcess",
            ProcessAction::Stop => "supervisor.stopProcess",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessAction::Start => "start",
            ProcessAction::Stop => "stop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessAction::Start => "起動",
            ProcessAction::Stop => "停止",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCard {
    pub name: String,
    pub state: String,
    pub action: ProcessAction,
}

impl From<&ProcessInfo> for ProcessCard {
    fn from(info: &ProcessInfo) -> Self {
        Self {
            name: info.name.clone(),
            state: info.state.clone(),
            action: ProcessAction::for_state(&info.state),
        }
    }
}
