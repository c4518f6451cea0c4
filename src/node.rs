//! Canonical parameter node model.
//!
//! One `ParamNode` describes one function parameter (or one nested field) as
//! a closed tagged union: scalar, record, union, array, map, typedesc. The
//! schema builder produces these trees once per generation pass; the emitter
//! serializes them into template properties and UI schema. The runtime
//! marshaler never sees these objects — it re-derives shape information from
//! the generated property keys alone.

use std::sync::Arc;

use crate::descriptor::TypeDesc;

// ————————————————————————————————————————————————————————————————————————————
// KINDS
// ————————————————————————————————————————————————————————————————————————————

/// Declared kind of a parameter or field. Closed set; anything the builder
/// does not recognize becomes `Unknown` and passes through inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    Decimal,
    Str,
    Record,
    Union,
    Array,
    Map,
    Typedesc,
    Anydata,
    Json,
    Xml,
    Unknown,
}

impl ParamKind {
    /// Wire string written into `paramType<i>` / `pathParamType<i>`.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::Bool => "boolean",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Decimal => "decimal",
            ParamKind::Str => "string",
            ParamKind::Record => "record",
            ParamKind::Union => "union",
            ParamKind::Array => "array",
            ParamKind::Map => "map",
            ParamKind::Typedesc => "typedesc",
            ParamKind::Anydata => "anydata",
            ParamKind::Json => "json",
            ParamKind::Xml => "xml",
            ParamKind::Unknown => "unknown",
        }
    }

    /// Inverse of [`as_str`](Self::as_str). Unrecognized strings map to
    /// `Unknown`; callers decide whether that is worth a log line.
    pub fn parse(s: &str) -> ParamKind {
        match s {
            "boolean" => ParamKind::Bool,
            "int" => ParamKind::Int,
            "float" => ParamKind::Float,
            "decimal" => ParamKind::Decimal,
            "string" => ParamKind::Str,
            "record" => ParamKind::Record,
            "union" => ParamKind::Union,
            "array" => ParamKind::Array,
            "map" => ParamKind::Map,
            "typedesc" => ParamKind::Typedesc,
            "anydata" => ParamKind::Anydata,
            "json" => ParamKind::Json,
            "xml" => ParamKind::Xml,
            _ => ParamKind::Unknown,
        }
    }

    /// Kinds that may appear in a resource path segment.
    pub fn is_path_safe(self) -> bool {
        matches!(
            self,
            ParamKind::Str | ParamKind::Int | ParamKind::Float | ParamKind::Bool | ParamKind::Decimal
        )
    }
}

/// Element classification for arrays and map values. Drives both grid
/// rendering at build time and the table transform dispatch at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Scalar(ParamKind),
    Record,
    NestedArray,
    Union,
}

impl ElementKind {
    /// Wire string written into `arrayElementType<i>`.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Scalar(k) => k.as_str(),
            ElementKind::Record => "record",
            ElementKind::NestedArray => "array",
            ElementKind::Union => "union",
        }
    }

    pub fn parse(s: &str) -> ElementKind {
        match s {
            "record" => ElementKind::Record,
            "array" => ElementKind::NestedArray,
            "union" => ElementKind::Union,
            other => ElementKind::Scalar(ParamKind::parse(other)),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

/// Metadata shared by every node variant. `kind` is fixed at construction;
/// only required/default/visibility/display may change afterwards.
#[derive(Debug, Clone)]
pub struct Meta {
    pub index: i32,
    pub name: String,
    kind: ParamKind,
    required: bool,
    pub default_value: String,
    /// Opaque UI predicate; evaluated by the host tool, never by this crate.
    pub visible_when: Option<String>,
    /// Resolved human type label; disambiguates union/record display.
    pub display_type: Option<String>,
    /// Heavy build-time backing reference; released after serialization.
    pub(crate) descriptor: Option<Arc<TypeDesc>>,
}

impl Meta {
    pub fn new(index: i32, name: impl Into<String>, kind: ParamKind) -> Self {
        Meta {
            index,
            name: name.into(),
            kind,
            required: false,
            default_value: String::new(),
            visible_when: None,
            display_type: None,
            descriptor: None,
        }
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

/// Variant-specific payload. Exhaustive matches everywhere: adding a variant
/// breaks every consumer at compile time, by intent.
#[derive(Debug, Clone)]
pub enum Shape {
    Scalar,
    Record {
        record_name: String,
        /// Dotted path from the root parameter; qualifies nested-field names
        /// that would otherwise collide in the flat property namespace.
        parent_path: String,
        fields: Vec<ParamNode>,
    },
    Union {
        members: Vec<ParamNode>,
    },
    Array {
        element: ElementKind,
        is_table: bool,
        is_2d: bool,
        is_union_array: bool,
        /// Grid columns when the element is a record.
        columns: Vec<ParamNode>,
        /// Member type names when the element is a union. No sub-tree is
        /// built: union-array leaves resolve per row at run time.
        member_types: Vec<String>,
        inner_element: Option<ElementKind>,
    },
    Map {
        value: ElementKind,
        columns: Vec<ParamNode>,
        is_table: bool,
    },
    Typedesc,
}

#[derive(Debug, Clone)]
pub struct ParamNode {
    pub meta: Meta,
    pub shape: Shape,
}

impl ParamNode {
    pub fn new(meta: Meta, shape: Shape) -> Self {
        ParamNode { meta, shape }
    }

    /// Set the required flag. A union is required iff all of its members are
    /// required, so the flag fans out to every member here.
    pub fn set_required(&mut self, required: bool) {
        self.meta.required = required;
        if let Shape::Union { members } = &mut self.shape {
            for m in members {
                m.set_required(required);
            }
        }
    }

    /// Children of composite variants, in declaration order.
    pub fn children(&self) -> &[ParamNode] {
        match &self.shape {
            Shape::Scalar | Shape::Typedesc => &[],
            Shape::Record { fields, .. } => fields,
            Shape::Union { members } => members,
            Shape::Array { columns, .. } => columns,
            Shape::Map { columns, .. } => columns,
        }
    }

    pub fn children_mut(&mut self) -> &mut [ParamNode] {
        match &mut self.shape {
            Shape::Scalar | Shape::Typedesc => &mut [],
            Shape::Record { fields, .. } => fields,
            Shape::Union { members } => members,
            Shape::Array { columns, .. } => columns,
            Shape::Map { columns, .. } => columns,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOURCE PATHS
// ————————————————————————————————————————————————————————————————————————————

/// One component of a resource's addressable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Param { name: String, kind: ParamKind },
}

/// Machine dispatch name for a resource path: `$` + literal or `$$` + name,
/// concatenated in segment order.
pub fn dispatch_name(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            PathSegment::Literal(lit) => {
                out.push('$');
                out.push_str(lit);
            }
            PathSegment::Param { name, .. } => {
                out.push_str("$$");
                out.push_str(name);
            }
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
