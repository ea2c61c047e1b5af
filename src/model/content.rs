//! Type-dependent node payloads.
//!
//! On the wire a node's content is an open JSON object whose meaningful keys
//! depend on the node type. Here it is a closed sum keyed by `NodeType`; keys
//! a variant does not model are carried next to it as a pass-through map so
//! that loading and saving a workflow never drops data.

use super::node::NodeType;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Untyped JSON object used for content keys outside the typed payload.
pub type ContentMap = Map<String, Value>;

/// Keys the canvas node data sets itself. Never stored as content.
pub const CANVAS_KEYS: [&str; 3] = ["ports", "type", "label"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GptResponseContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCollectionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectInfoContent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared by TRANSFER_HUMAN and END.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalMessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayContent {
    /// Seconds to wait before following the outgoing connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Typed content of a node. The variant determines the node's type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Start(TextContent),
    Message(TextContent),
    Condition(ConditionContent),
    Action(ActionContent),
    GptResponse(GptResponseContent),
    DataCollection(DataCollectionContent),
    CollectInfo(CollectInfoContent),
    TransferHuman(FinalMessageContent),
    Delay(DelayContent),
    End(FinalMessageContent),
    Webhook(WebhookContent),
    ApiCall(ApiCallContent),
    /// A type this crate does not model. Its keys live in the node's extras.
    Other { type_name: String },
}

impl NodeContent {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeContent::Start(_) => NodeType::Start,
            NodeContent::Message(_) => NodeType::Message,
            NodeContent::Condition(_) => NodeType::Condition,
            NodeContent::Action(_) => NodeType::Action,
            NodeContent::GptResponse(_) => NodeType::GptResponse,
            NodeContent::DataCollection(_) => NodeType::DataCollection,
            NodeContent::CollectInfo(_) => NodeType::CollectInfo,
            NodeContent::TransferHuman(_) => NodeType::TransferHuman,
            NodeContent::Delay(_) => NodeType::Delay,
            NodeContent::End(_) => NodeType::End,
            NodeContent::Webhook(_) => NodeType::Webhook,
            NodeContent::ApiCall(_) => NodeType::ApiCall,
            NodeContent::Other { type_name } => NodeType::Other(type_name.clone()),
        }
    }

    /// Content a freshly dropped node of `node_type` starts with.
    pub fn default_for(node_type: &NodeType) -> Self {
        match node_type {
            NodeType::Message => NodeContent::Message(TextContent {
                text: Some("New message".to_string()),
            }),
            NodeType::Condition => NodeContent::Condition(ConditionContent {
                condition: Some("continue|end".to_string()),
            }),
            other => NodeContent::empty_for(other),
        }
    }

    /// Content of `node_type` with every field unset.
    pub fn empty_for(node_type: &NodeType) -> Self {
        match node_type {
            NodeType::Start => NodeContent::Start(TextContent::default()),
            NodeType::Message => NodeContent::Message(TextContent::default()),
            NodeType::Condition => NodeContent::Condition(ConditionContent::default()),
            NodeType::Action => NodeContent::Action(ActionContent::default()),
            NodeType::GptResponse => NodeContent::GptResponse(GptResponseContent::default()),
            NodeType::DataCollection => {
                NodeContent::DataCollection(DataCollectionContent::default())
            }
            NodeType::CollectInfo => NodeContent::CollectInfo(CollectInfoContent::default()),
            NodeType::TransferHuman => NodeContent::TransferHuman(FinalMessageContent::default()),
            NodeType::Delay => NodeContent::Delay(DelayContent::default()),
            NodeType::End => NodeContent::End(FinalMessageContent::default()),
            NodeType::Webhook => NodeContent::Webhook(WebhookContent::default()),
            NodeType::ApiCall => NodeContent::ApiCall(ApiCallContent::default()),
            NodeType::Other(name) => NodeContent::Other {
                type_name: name.clone(),
            },
        }
    }

    /// Splits a raw content object into the typed payload for `node_type` and
    /// the keys that payload does not model.
    ///
    /// Fails when a modelled key has the wrong JSON shape, e.g. a numeric
    /// `condition`. The canvas keys `ports`, `type` and `label` are always
    /// discarded.
    pub fn try_from_map(
        node_type: &NodeType,
        map: &ContentMap,
    ) -> Result<(Self, ContentMap), serde_json::Error> {
        let content = match node_type {
            NodeType::Start => NodeContent::Start(typed(map)?),
            NodeType::Message => NodeContent::Message(typed(map)?),
            NodeType::Condition => NodeContent::Condition(typed(map)?),
            NodeType::Action => NodeContent::Action(typed(map)?),
            NodeType::GptResponse => NodeContent::GptResponse(typed(map)?),
            NodeType::DataCollection => NodeContent::DataCollection(typed(map)?),
            NodeType::CollectInfo => NodeContent::CollectInfo(typed(map)?),
            NodeType::TransferHuman => NodeContent::TransferHuman(typed(map)?),
            NodeType::Delay => NodeContent::Delay(typed(map)?),
            NodeType::End => NodeContent::End(typed(map)?),
            NodeType::Webhook => NodeContent::Webhook(typed(map)?),
            NodeType::ApiCall => NodeContent::ApiCall(typed(map)?),
            NodeType::Other(name) => NodeContent::Other {
                type_name: name.clone(),
            },
        };
        let known = content.field_names();
        let extra = map
            .iter()
            .filter(|(key, _)| {
                !known.contains(&key.as_str()) && !CANVAS_KEYS.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok((content, extra))
    }

    /// Permissive form of `try_from_map` used when loading workflows.
    ///
    /// A payload that does not fit its type becomes empty content and every
    /// raw key is kept in the returned extras.
    pub fn from_map(node_type: &NodeType, map: &ContentMap) -> (Self, ContentMap) {
        match Self::try_from_map(node_type, map) {
            Ok(parts) => parts,
            Err(err) => {
                tracing::warn!(
                    node_type = %node_type,
                    error = %err,
                    "content does not match its node type, keeping raw keys only"
                );
                let mut extra = map.clone();
                extra.retain(|key, _| !CANVAS_KEYS.contains(&key.as_str()));
                (NodeContent::empty_for(node_type), extra)
            }
        }
    }

    /// Serialises the typed payload back into a JSON object.
    pub fn to_map(&self) -> ContentMap {
        let value = match self {
            NodeContent::Start(c) | NodeContent::Message(c) => serde_json::to_value(c),
            NodeContent::Condition(c) => serde_json::to_value(c),
            NodeContent::Action(c) => serde_json::to_value(c),
            NodeContent::GptResponse(c) => serde_json::to_value(c),
            NodeContent::DataCollection(c) => serde_json::to_value(c),
            NodeContent::CollectInfo(c) => serde_json::to_value(c),
            NodeContent::TransferHuman(c) | NodeContent::End(c) => serde_json::to_value(c),
            NodeContent::Delay(c) => serde_json::to_value(c),
            NodeContent::Webhook(c) => serde_json::to_value(c),
            NodeContent::ApiCall(c) => serde_json::to_value(c),
            NodeContent::Other { .. } => Ok(Value::Object(Map::new())),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Keys of the content object that this variant models.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            NodeContent::Start(_) | NodeContent::Message(_) => &["text"],
            NodeContent::Condition(_) => &["condition"],
            NodeContent::Action(_) => &["action"],
            NodeContent::GptResponse(_) => &["systemPrompt"],
            NodeContent::DataCollection(_) => &["field", "prompt"],
            NodeContent::CollectInfo(_) => &["fields", "message"],
            NodeContent::TransferHuman(_) | NodeContent::End(_) => &["finalMessage"],
            NodeContent::Delay(_) => &["delay"],
            NodeContent::Webhook(_) => &["url", "method", "headers", "body"],
            NodeContent::ApiCall(_) => &["endpoint", "message"],
            NodeContent::Other { .. } => &[],
        }
    }

    /// The CONDITION branch expression, if this is a condition node.
    pub fn condition(&self) -> Option<&str> {
        match self {
            NodeContent::Condition(c) => c.condition.as_deref(),
            _ => None,
        }
    }

    /// One-line text shown on the node body.
    pub fn summary(&self) -> String {
        match self {
            NodeContent::Start(c) | NodeContent::Message(c) => c.text.clone().unwrap_or_default(),
            NodeContent::Condition(c) => c.condition.clone().unwrap_or_default(),
            NodeContent::ApiCall(c) => c.endpoint.clone().unwrap_or_default(),
            NodeContent::CollectInfo(c) => c.fields.iter().join(", "),
            NodeContent::DataCollection(c) => c.field.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

fn typed<T: DeserializeOwned>(map: &ContentMap) -> Result<T, serde_json::Error> {
    let known: ContentMap = map
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    serde_json::from_value(Value::Object(known))
}
