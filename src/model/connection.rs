use serde::{Deserialize, Serialize};

/// Output port every non-branching node leaves through.
pub const MAIN_PORT: &str = "main";

/// The single input port every node exposes.
pub const INPUT_PORT: &str = "input";

/// One outgoing link of a node: where it goes, which output port it leaves
/// through, and the branch condition it carries, if any.
///
/// On the wire a connection is either a bare target id (implying the `main`
/// port and no condition) or an object `{ targetId, condition?, port? }`.
/// Both forms deserialize into this struct; it always serializes as the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConnectionWire", rename_all = "camelCase")]
pub struct Connection {
    pub target_id: String,
    pub port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Id of the canvas edge this connection came from, when one was known.
    #[serde(skip)]
    pub edge_id: Option<String>,
}

impl Connection {
    /// A connection through the `main` port with no condition.
    pub fn to(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            port: MAIN_PORT.to_string(),
            condition: None,
            edge_id: None,
        }
    }

    pub fn via(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_edge_id(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConnectionWire {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Detailed {
        target_id: String,
        #[serde(default)]
        condition: Option<String>,
        #[serde(default)]
        port: Option<String>,
    },
}

impl From<ConnectionWire> for Connection {
    fn from(wire: ConnectionWire) -> Self {
        match wire {
            ConnectionWire::Bare(target_id) => Connection::to(target_id),
            ConnectionWire::Detailed {
                target_id,
                condition,
                port,
            } => Connection {
                target_id,
                port: port
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| MAIN_PORT.to_string()),
                condition: condition.filter(|c| !c.is_empty()),
                edge_id: None,
            },
        }
    }
}
