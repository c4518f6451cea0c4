//! External type-descriptor input model.
//!
//! The upstream semantic analyzer hands us one typed tree per function
//! parameter. We model that interface as a serde-deserializable tree so the
//! CLI can consume descriptor dumps directly and tests can build fixtures
//! with `json!`.

use std::sync::Arc;

use serde::Deserialize;

use crate::node::ParamKind;

/// One type descriptor. `kind`-tagged on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDesc {
    String,
    Int,
    Float,
    Decimal,
    Boolean,
    Json,
    Xml,
    Anydata,
    Typedesc,
    Record {
        name: String,
        #[serde(default)]
        fields: Vec<FieldDesc>,
    },
    Union {
        #[serde(default)]
        members: Vec<Arc<TypeDesc>>,
    },
    Array {
        element: Arc<TypeDesc>,
    },
    Map {
        value: Arc<TypeDesc>,
    },
    #[serde(other)]
    Unknown,
}

/// A declared record field, in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Arc<TypeDesc>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, rename = "defaultValue")]
    pub default_value: String,
}

fn default_true() -> bool {
    true
}

impl TypeDesc {
    pub fn kind(&self) -> ParamKind {
        match self {
            TypeDesc::String => ParamKind::Str,
            TypeDesc::Int => ParamKind::Int,
            TypeDesc::Float => ParamKind::Float,
            TypeDesc::Decimal => ParamKind::Decimal,
            TypeDesc::Boolean => ParamKind::Bool,
            TypeDesc::Json => ParamKind::Json,
            TypeDesc::Xml => ParamKind::Xml,
            TypeDesc::Anydata => ParamKind::Anydata,
            TypeDesc::Typedesc => ParamKind::Typedesc,
            TypeDesc::Record { .. } => ParamKind::Record,
            TypeDesc::Union { .. } => ParamKind::Union,
            TypeDesc::Array { .. } => ParamKind::Array,
            TypeDesc::Map { .. } => ParamKind::Map,
            TypeDesc::Unknown => ParamKind::Unknown,
        }
    }

    /// Human type label: record name for records, kind string otherwise.
    /// Union members feed this into the discriminator key.
    pub fn display_name(&self) -> String {
        match self {
            TypeDesc::Record { name, .. } => name.clone(),
            other => other.kind().as_str().to_string(),
        }
    }

    pub fn fields(&self) -> &[FieldDesc] {
        match self {
            TypeDesc::Record { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn members(&self) -> &[Arc<TypeDesc>] {
        match self {
            TypeDesc::Union { members } => members,
            _ => &[],
        }
    }

    pub fn element_type(&self) -> Option<&Arc<TypeDesc>> {
        match self {
            TypeDesc::Array { element } => Some(element),
            _ => None,
        }
    }

    pub fn value_type(&self) -> Option<&Arc<TypeDesc>> {
        match self {
            TypeDesc::Map { value } => Some(value),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FUNCTION / MODULE DESCRIPTORS
// ————————————————————————————————————————————————————————————————————————————

/// One declared parameter of a function.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Arc<TypeDesc>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, rename = "defaultValue")]
    pub default_value: String,
    #[serde(default, rename = "visibleWhen")]
    pub visible_when: Option<String>,
}

/// A resource path segment as declared upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathSegDesc {
    Literal(String),
    Param {
        name: String,
        #[serde(default = "default_string_kind")]
        kind: String,
    },
}

fn default_string_kind() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDesc {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default, rename = "returnKind")]
    pub return_kind: Option<String>,
    #[serde(default)]
    pub path: Vec<PathSegDesc>,
    #[serde(default)]
    pub params: Vec<ParamDesc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDesc {
    pub module: String,
    #[serde(default)]
    pub functions: Vec<FunctionDesc>,
}
