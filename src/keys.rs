//! Key-naming protocol.
//!
//! The single source of the string keys shared between the generation pass
//! (which writes them into template properties) and the invocation marshaler
//! (which reads them back per message). Both sides call these functions and
//! nothing else formats keys, so the wire contract cannot drift.
//!
//! Keys derive purely from `(index, role)` — they are regenerable from a
//! parameter node tree without being stored.

/// Property holding the template-variable *name* bound to positional
/// parameter `i`. The value itself is looked up by that name.
pub fn param_name(i: i32) -> String {
    format!("param{i}")
}

/// Declared kind string for positional parameter `i`.
pub fn param_type(i: i32) -> String {
    format!("paramType{i}")
}

/// Path-derived parameters: counted and typed separately from the regular
/// positional list, spliced before it at call time.
pub fn path_param(i: i32) -> String {
    format!("pathParam{i}")
}

pub fn path_param_type(i: i32) -> String {
    format!("pathParamType{i}")
}

pub const PATH_PARAM_SIZE: &str = "pathParamSize";

/// Element-kind string for an array parameter; read only at call time.
pub fn array_element_type(i: i32) -> String {
    format!("arrayElementType{i}")
}

/// Column-type hint for 2-D array reconstruction.
pub fn inner_element_type(i: i32) -> String {
    format!("innerArrayElementType{i}")
}

/// Union discriminator property: holds the template-variable name for the
/// member branch named `member_type` of union parameter `i`.
pub fn union_member(i: i32, member_type: &str) -> String {
    format!("param{i}Union{}", capitalize(member_type))
}

/// Discriminator lookup key for a union bound to variable `name`; its value
/// at run time is a member type name.
pub fn data_type(name: &str) -> String {
    format!("{name}DataType")
}

/// First char uppercased, rest verbatim.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}
