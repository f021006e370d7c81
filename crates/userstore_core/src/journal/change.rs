//! Operation descriptors handed to the modification log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutating repository operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOperation {
    Add,
    Update,
    SoftDelete,
    HardDelete,
}

impl UserOperation {
    /// Stable string id used in journal storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::SoftDelete => "soft_delete",
            Self::HardDelete => "hard_delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add" => Some(Self::Add),
            "update" => Some(Self::Update),
            "soft_delete" => Some(Self::SoftDelete),
            "hard_delete" => Some(Self::HardDelete),
            _ => None,
        }
    }
}

/// Bound parameter value captured for audit/replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeValue {
    Null,
    Integer(i64),
    Text(String),
}

impl From<i64> for ChangeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for ChangeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for ChangeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Text(value.to_rfc3339())
    }
}

impl<T: Into<ChangeValue>> From<Option<T>> for ChangeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One named statement parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeParam {
    pub name: String,
    pub value: ChangeValue,
}

/// Everything needed to reconstruct one committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserChange {
    pub operation: UserOperation,
    /// Statement shape that was executed.
    pub query: &'static str,
    pub params: Vec<ChangeParam>,
}

impl UserChange {
    pub fn new(operation: UserOperation, query: &'static str) -> Self {
        Self {
            operation,
            query,
            params: Vec::new(),
        }
    }

    /// Appends one named parameter.
    pub fn param(mut self, name: &str, value: impl Into<ChangeValue>) -> Self {
        self.params.push(ChangeParam {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Looks up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&ChangeValue> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| &param.value)
    }
}
