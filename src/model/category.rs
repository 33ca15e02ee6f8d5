use crate::model::TransactionType;
use serde::{Deserialize, Serialize};

/// A named bucket that transactions of the same type are filed under, e.g. "Cuotas" (income) or
/// "Materiales" (expense).
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) r#type: TransactionType,
    /// Set by the store, never written by us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
}

impl Category {
    /// Creates a category from an insert payload and the ID the store assigned to it.
    pub fn new(id: impl Into<String>, new: NewCategory) -> Self {
        Self {
            id: id.into(),
            name: new.name,
            r#type: new.r#type,
            created_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_type(&self) -> TransactionType {
        self.r#type
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    /// Overwrites the fields that are set in `updates`.
    pub fn apply(&mut self, updates: &CategoryUpdates) {
        if let Some(name) = &updates.name {
            self.name = name.clone();
        }
        if let Some(t) = updates.r#type {
            self.r#type = t;
        }
    }
}

/// The insert payload for a category. The store assigns the ID.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewCategory {
    pub name: String,
    pub r#type: TransactionType,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, r#type: TransactionType) -> Self {
        Self {
            name: name.into(),
            r#type,
        }
    }
}

/// A partial update of a category. Fields that are `None` are left unchanged.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<TransactionType>,
}

impl CategoryUpdates {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.r#type.is_none()
    }
}
