//! Request and response bodies of the workflow REST API.
//!
//! The API itself is an external service; this module only shapes what goes
//! over the wire and decodes what comes back.

use crate::error::PayloadError;
use crate::model::{Workflow, WorkflowConfig, WorkflowDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Workflow category sent with every create/update.
pub const WORKFLOW_KIND: &str = "SUPPORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    List,
    Get(String),
    Create,
    Update(String),
    Delete(String),
    TestRun(String),
    SetDefault,
    GetDefault,
    ImportN8n,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::List | Endpoint::Get(_) | Endpoint::GetDefault => Method::Get,
            Endpoint::Create | Endpoint::TestRun(_) | Endpoint::ImportN8n => Method::Post,
            Endpoint::Update(_) | Endpoint::SetDefault => Method::Put,
            Endpoint::Delete(_) => Method::Delete,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::List | Endpoint::Create => "/api/workflows".to_string(),
            Endpoint::Get(id) | Endpoint::Update(id) | Endpoint::Delete(id) => {
                format!("/api/workflows/{}", id)
            }
            Endpoint::TestRun(id) => format!("/api/workflows/{}/test", id),
            Endpoint::SetDefault | Endpoint::GetDefault => "/api/workflows/default".to_string(),
            Endpoint::ImportN8n => "/api/workflows/import/n8n".to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// Body of a create or update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPayload {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub config: WorkflowConfig,
    pub is_active: bool,
}

/// A save is a create when the workflow has never been persisted, an update otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create(WorkflowPayload),
    Update { id: String, payload: WorkflowPayload },
}

impl SaveRequest {
    pub fn for_workflow(workflow: &Workflow) -> Self {
        let payload = WorkflowPayload {
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            kind: WORKFLOW_KIND.to_string(),
            config: workflow.config(),
            is_active: workflow.is_active,
        };
        match workflow.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => SaveRequest::Update {
                id: id.to_string(),
                payload,
            },
            // New workflows are always created inactive.
            None => SaveRequest::Create(WorkflowPayload {
                is_active: false,
                ..payload
            }),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            SaveRequest::Create(_) => Endpoint::Create,
            SaveRequest::Update { id, .. } => Endpoint::Update(id.clone()),
        }
    }

    pub fn payload(&self) -> &WorkflowPayload {
        match self {
            SaveRequest::Create(payload) | SaveRequest::Update { payload, .. } => payload,
        }
    }

    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self.payload())?)
    }
}

/// Stored `config`, which older records hold as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigField {
    Encoded(String),
    Inline(WorkflowConfig),
}

impl ConfigField {
    pub fn decode(self) -> Result<WorkflowConfig, PayloadError> {
        match self {
            ConfigField::Inline(config) => Ok(config),
            ConfigField::Encoded(raw) if raw.trim().is_empty() => Ok(WorkflowConfig::default()),
            ConfigField::Encoded(raw) => serde_json::from_str(&raw)
                .map_err(|e| PayloadError::InvalidConfig(e.to_string())),
        }
    }
}

/// A workflow as returned by `GET /api/workflows/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Option<ConfigField>,
    #[serde(default)]
    pub is_active: bool,
}

impl WorkflowRecord {
    pub fn into_document(self) -> Result<WorkflowDocument, PayloadError> {
        let config = match self.config {
            Some(field) => field.decode()?,
            None => WorkflowConfig::default(),
        };
        Ok(WorkflowDocument {
            id: Some(self.id),
            name: self.name,
            description: self.description.unwrap_or_default(),
            nodes: config.nodes,
            edges: Some(config.edges),
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowListResponse {
    #[serde(default)]
    pub workflows: Vec<WorkflowRecord>,
}

/// Body of `POST /api/workflows/:id/test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunRequest {
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultWorkflowRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultWorkflowResponse {
    #[serde(default)]
    pub default_workflow_id: Option<String>,
}

/// Body of `POST /api/workflows/import/n8n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct N8nImportRequest {
    pub name: String,
    pub description: String,
    pub workflow: Value,
}

impl N8nImportRequest {
    /// Builds the request from a pasted n8n export. Invalid JSON aborts the import.
    pub fn from_export(
        name: impl Into<String>,
        description: impl Into<String>,
        export: &str,
    ) -> Result<Self, PayloadError> {
        let workflow: Value = serde_json::from_str(export)?;
        if !workflow.is_object() {
            return Err(PayloadError::InvalidConfig(
                "n8n export must be a JSON object".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            description: description.into(),
            workflow,
        })
    }
}
