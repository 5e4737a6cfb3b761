use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One endpoint of the ledger network.
///
/// The address is a URI such as `tcp://10.0.0.1:3000`, `tls://node:3001`, or
/// `ws://node:8080`. The scheme is interpreted by the transport driver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "url")]
    address: String,
}

impl Node {
    pub fn new(address: impl Into<String>) -> Result<Self, TypeError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(TypeError::EmptyAddress);
        }
        Ok(Self { address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
