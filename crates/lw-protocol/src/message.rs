use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound for a single framed message.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Command names understood by a ledger node.
pub mod commands {
    pub const ADD_OBSERVER: &str = "addObserver";
    pub const ADD_TRANSACTION: &str = "addTransaction";
    pub const ADD_TEMPORARY_TRANSACTION: &str = "addTemporaryTransaction";
    pub const COMMIT_TRANSACTION: &str = "commitTransaction";
    pub const GET_BLOCK: &str = "getBlock";
    pub const GET_BLOCKS: &str = "getBlocks";
}

/// Request sent to a node: a command name and an optional argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandEnvelope {
    pub fn new(command: impl Into<String>, data: Option<Value>) -> Self {
        Self { command: command.into(), data }
    }
}

/// Reply from a node. Only a reply with non-null `dataName` and `data`
/// counts as a result; anything else is an empty reply. The name itself is
/// not interpreted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub data_name: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn into_data(self) -> Option<Value> {
        match (self.data_name, self.data) {
            (Some(_), Some(data)) => Some(data),
            _ => None,
        }
    }
}
