//! Schema builder.
//!
//! Walks the external type descriptors of one function and produces the
//! canonical parameter node tree, assigning positional indices and UI
//! metadata. Runs single-threaded, once per generation pass, inside an
//! explicit [`Session`] that must be reset between independent runs.

use std::sync::Arc;

use tracing::warn;

use crate::descriptor::{FunctionDesc, ParamDesc, PathSegDesc, TypeDesc};
use crate::error::BuildError;
use crate::keys;
use crate::node::{dispatch_name, ElementKind, Meta, ParamKind, ParamNode, PathSegment, Shape};

// ————————————————————————————————————————————————————————————————————————————
// MODELS
// ————————————————————————————————————————————————————————————————————————————

/// Fully built model of one function: path parameters first (they occupy
/// the argument slots below the regular parameters at call time), then the
/// regular positional parameters.
#[derive(Debug, Clone)]
pub struct FunctionModel {
    pub name: String,
    pub doc: String,
    pub return_kind: ParamKind,
    pub path: Vec<PathSegment>,
    pub path_params: Vec<ParamNode>,
    pub params: Vec<ParamNode>,
}

impl FunctionModel {
    pub fn dispatch_name(&self) -> String {
        dispatch_name(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct ModuleModel {
    pub name: String,
    pub functions: Vec<FunctionModel>,
}

// ————————————————————————————————————————————————————————————————————————————
// SESSION
// ————————————————————————————————————————————————————————————————————————————

/// Build-session context. One mutable model per generation run, created and
/// reset explicitly; starting a run while another is active is rejected
/// rather than silently merging two generations.
#[derive(Debug, Default)]
pub struct Session {
    active: Option<ModuleModel>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn begin(&mut self, module: impl Into<String>) -> Result<(), BuildError> {
        if self.active.is_some() {
            return Err(BuildError::SessionActive);
        }
        self.active = Some(ModuleModel { name: module.into(), functions: Vec::new() });
        Ok(())
    }

    pub fn add_function(&mut self, desc: &FunctionDesc) -> Result<(), BuildError> {
        let model = self.active.as_mut().ok_or(BuildError::SessionNotStarted)?;
        model.functions.push(build_function(desc));
        Ok(())
    }

    /// Take the completed model out; the session returns to idle and may
    /// `begin` again.
    pub fn finish(&mut self) -> Result<ModuleModel, BuildError> {
        self.active.take().ok_or(BuildError::SessionNotStarted)
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

pub fn build_function(desc: &FunctionDesc) -> FunctionModel {
    let mut path = Vec::new();
    let mut path_params = Vec::new();
    for seg in &desc.path {
        match seg {
            PathSegDesc::Literal(lit) => path.push(PathSegment::Literal(lit.clone())),
            PathSegDesc::Param { name, kind } => {
                let mut kind = ParamKind::parse(kind);
                if !kind.is_path_safe() {
                    warn!(param = %name, kind = kind.as_str(), "non-primitive path parameter; treating as string");
                    kind = ParamKind::Str;
                }
                path.push(PathSegment::Param { name: name.clone(), kind });
                let index = path_params.len() as i32;
                let mut node = ParamNode::new(Meta::new(index, name.clone(), kind), Shape::Scalar);
                node.set_required(true);
                path_params.push(node);
            }
        }
    }

    let params = desc
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| build_root_param(p, i as i32))
        .collect();

    FunctionModel {
        name: desc.name.clone(),
        doc: desc.doc.clone(),
        return_kind: desc
            .return_kind
            .as_deref()
            .map(ParamKind::parse)
            .unwrap_or(ParamKind::Anydata),
        path,
        path_params,
        params,
    }
}

fn build_root_param(desc: &ParamDesc, index: i32) -> ParamNode {
    let mut node = build_param(&desc.ty, &desc.name, index, "");
    node.set_required(desc.required);
    node.meta.default_value = desc.default_value.clone();
    node.meta.visible_when = desc.visible_when.clone();
    node
}

/// Build one parameter node from one descriptor, recursively for composites.
/// `parent_path` is the dotted path of the enclosing record chain; nested
/// field names are qualified with it so they stay unique in the flat
/// property namespace.
pub fn build_param(desc: &Arc<TypeDesc>, name: &str, index: i32, parent_path: &str) -> ParamNode {
    let kind = desc.kind();
    let qualified = qualify(parent_path, name);
    let mut meta = Meta::new(index, qualified.clone(), kind);
    meta.descriptor = Some(desc.clone());

    let shape = match desc.as_ref() {
        TypeDesc::String
        | TypeDesc::Int
        | TypeDesc::Float
        | TypeDesc::Decimal
        | TypeDesc::Boolean
        | TypeDesc::Json
        | TypeDesc::Xml
        | TypeDesc::Anydata => Shape::Scalar,

        TypeDesc::Typedesc => Shape::Typedesc,

        TypeDesc::Record { name: record_name, fields } => {
            meta.display_type = Some(record_name.clone());
            let children = build_fields(fields, &qualified);
            Shape::Record {
                record_name: record_name.clone(),
                parent_path: parent_path.to_string(),
                fields: children,
            }
        }

        TypeDesc::Union { members } => {
            meta.display_type = Some(desc.display_name());
            // Member order fixes discriminator label assignment.
            let members = members
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let member_name = format!("{name}{}", keys::capitalize(&m.display_name()));
                    let mut node = build_param(m, &member_name, i as i32, parent_path);
                    node.meta.display_type = Some(m.display_name());
                    node
                })
                .collect();
            Shape::Union { members }
        }

        TypeDesc::Array { element } => build_array_shape(element, &qualified),

        TypeDesc::Map { value } => {
            let value_kind = classify_element(value);
            let columns = if let ElementKind::Record = value_kind {
                build_fields(value.fields(), &qualified)
            } else {
                Vec::new()
            };
            Shape::Map {
                value: value_kind,
                is_table: matches!(value_kind, ElementKind::Record),
                columns,
            }
        }

        TypeDesc::Unknown => {
            // Forward compatibility: the node passes through inert, but a
            // silent unknown would hide upstream analyzer changes.
            warn!(param = %qualified, "unrecognized type descriptor kind; no runtime behavior is guaranteed");
            Shape::Scalar
        }
    };

    ParamNode::new(meta, shape)
}

fn build_fields(fields: &[crate::descriptor::FieldDesc], parent_path: &str) -> Vec<ParamNode> {
    fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut node = build_param(&f.ty, &f.name, i as i32, parent_path);
            node.set_required(f.required);
            node.meta.default_value = f.default_value.clone();
            node
        })
        .collect()
}

fn build_array_shape(element: &Arc<TypeDesc>, qualified: &str) -> Shape {
    let element_kind = classify_element(element);
    match element_kind {
        ElementKind::Record => Shape::Array {
            element: element_kind,
            is_table: true,
            is_2d: false,
            is_union_array: false,
            columns: build_fields(element.fields(), qualified),
            member_types: Vec::new(),
            inner_element: None,
        },
        ElementKind::NestedArray => {
            // Recurse exactly one level: the inner element kind is all the
            // grid needs for column coercion.
            let inner = element
                .element_type()
                .map(|inner| classify_element(inner));
            Shape::Array {
                element: element_kind,
                is_table: true,
                is_2d: true,
                is_union_array: false,
                columns: Vec::new(),
                member_types: Vec::new(),
                inner_element: inner,
            }
        }
        ElementKind::Union => {
            // No sub-tree: union-array leaves are resolved per row at run
            // time, not per schema.
            let member_types = element
                .members()
                .iter()
                .map(|m| m.display_name())
                .collect();
            Shape::Array {
                element: element_kind,
                is_table: true,
                is_2d: false,
                is_union_array: true,
                columns: Vec::new(),
                member_types,
                inner_element: None,
            }
        }
        ElementKind::Scalar(k) => Shape::Array {
            element: element_kind,
            is_table: k.is_path_safe(),
            is_2d: false,
            is_union_array: false,
            columns: Vec::new(),
            member_types: Vec::new(),
            inner_element: None,
        },
    }
}

fn classify_element(desc: &TypeDesc) -> ElementKind {
    match desc.kind() {
        ParamKind::Record => ElementKind::Record,
        ParamKind::Array => ElementKind::NestedArray,
        ParamKind::Union => ElementKind::Union,
        k => ElementKind::Scalar(k),
    }
}

fn qualify(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{parent_path}.{name}")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TEARDOWN
// ————————————————————————————————————————————————————————————————————————————

/// Release the heavy backing descriptors of every node in the function,
/// using an explicit work stack: record/union graphs can nest deeply enough
/// that naive recursion risks stack exhaustion.
pub fn release_descriptors(function: &mut FunctionModel) {
    let mut stack: Vec<&mut ParamNode> = function
        .path_params
        .iter_mut()
        .chain(function.params.iter_mut())
        .collect();
    while let Some(node) = stack.pop() {
        node.meta.descriptor = None;
        stack.extend(node.children_mut().iter_mut());
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
