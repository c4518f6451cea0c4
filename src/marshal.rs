//! Invocation marshaler.
//!
//! Run-time counterpart of the schema builder: reads the generated property
//! bag through the key-naming protocol and reconstructs the ordered, typed
//! argument list for one function call. Stateless and reentrant — the host
//! engine invokes this concurrently for many in-flight messages, and every
//! input here is scoped to one invocation.

use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::MarshalError;
use crate::keys;
use crate::node::ParamKind;
use crate::table;

// ————————————————————————————————————————————————————————————————————————————
// HOST INTERFACES
// ————————————————————————————————————————————————————————————————————————————

/// Flat, string-keyed property lookup: the generated template's view of one
/// call site.
pub trait Properties {
    fn get(&self, key: &str) -> Option<String>;
}

impl Properties for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl Properties for IndexMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        IndexMap::get(self, key).cloned()
    }
}

/// A value bound to a template variable. The host may hand us raw text, an
/// already-parsed structured value, or an XML-like element handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Text(String),
    Json(Value),
    Xml(String),
}

impl Bound {
    /// Flat text rendering, for primitive coercion. Structured values and
    /// markup have no text form.
    fn text(&self) -> Option<String> {
        match self {
            Bound::Text(s) => Some(s.clone()),
            Bound::Json(Value::String(s)) => Some(s.clone()),
            Bound::Json(v @ (Value::Bool(_) | Value::Number(_))) => Some(v.to_string()),
            Bound::Json(_) | Bound::Xml(_) => None,
        }
    }
}

/// Named-value lookup: variables resolved out of band by the host (computed
/// upstream, externally bound, or referenced indirectly).
pub trait Resolver {
    fn resolve(&self, name: &str) -> Option<Bound>;
}

impl Resolver for HashMap<String, Bound> {
    fn resolve(&self, name: &str) -> Option<Bound> {
        self.get(name).cloned()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OUTPUT VALUES
// ————————————————————————————————————————————————————————————————————————————

/// One reconstructed call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// No value bound for this call (null at the call boundary).
    Absent,
    Value(Value),
    Xml(String),
    Type(TypeHandle),
}

/// Runtime type handle resolved for a typedesc parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHandle {
    Predefined(ParamKind),
    Registered { module: String, name: String },
}

/// Module-level type name registry. Built once during host initialization,
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, TypeHandle>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    pub fn register(&mut self, module: impl Into<String>, name: impl Into<String>) {
        let module = module.into();
        let name = name.into();
        self.entries
            .insert(name.clone(), TypeHandle::Registered { module, name });
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeHandle> {
        self.entries.get(name)
    }
}

static PREDEFINED: Lazy<HashMap<&'static str, ParamKind>> = Lazy::new(|| {
    HashMap::from([
        ("string", ParamKind::Str),
        ("int", ParamKind::Int),
        ("float", ParamKind::Float),
        ("decimal", ParamKind::Decimal),
        ("boolean", ParamKind::Bool),
        ("json", ParamKind::Json),
        ("xml", ParamKind::Xml),
        ("anydata", ParamKind::Anydata),
    ])
});

static EMPTY_REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

// ————————————————————————————————————————————————————————————————————————————
// COMPOSITE CONSTRUCTION SEAM
// ————————————————————————————————————————————————————————————————————————————

/// Record/map construction collaborator. The default implementation treats
/// the raw text as JSON; hosts with richer record semantics plug in here.
pub trait CompositeBuilder {
    fn build_record(&self, raw: &str, name: &str, index: i32) -> Result<Value, MarshalError>;
    fn build_map(&self, raw: &str, name: &str, index: i32) -> Result<Value, MarshalError>;
}

pub struct JsonComposites;

static JSON_COMPOSITES: JsonComposites = JsonComposites;

impl CompositeBuilder for JsonComposites {
    fn build_record(&self, raw: &str, name: &str, index: i32) -> Result<Value, MarshalError> {
        serde_json::from_str(raw).map_err(|source| MarshalError::Composite {
            what: "record",
            name: name.to_string(),
            index,
            source,
        })
    }

    fn build_map(&self, raw: &str, name: &str, index: i32) -> Result<Value, MarshalError> {
        serde_json::from_str(raw).map_err(|source| MarshalError::Composite {
            what: "map",
            name: name.to_string(),
            index,
            source,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MARSHALER
// ————————————————————————————————————————————————————————————————————————————

/// Per-invocation marshaler. Borrows the invocation-scoped lookups; owns
/// nothing mutable.
pub struct Marshaler<'a> {
    props: &'a dyn Properties,
    resolver: &'a dyn Resolver,
    registry: &'a TypeRegistry,
    composites: &'a dyn CompositeBuilder,
}

impl<'a> Marshaler<'a> {
    pub fn new(props: &'a dyn Properties, resolver: &'a dyn Resolver) -> Self {
        Marshaler {
            props,
            resolver,
            registry: &EMPTY_REGISTRY,
            composites: &JSON_COMPOSITES,
        }
    }

    pub fn with_registry(mut self, registry: &'a TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_composites(mut self, composites: &'a dyn CompositeBuilder) -> Self {
        self.composites = composites;
        self
    }

    /// Reconstruct the full argument list: path-derived arguments spliced
    /// ahead of the `param_count` regular positional arguments.
    pub fn arguments(&self, param_count: usize) -> Result<Vec<Arg>, MarshalError> {
        let mut args = self.path_arguments()?;
        for i in 0..param_count {
            args.push(self.positional(i as i32)?);
        }
        Ok(args)
    }

    /// One regular positional argument.
    pub fn positional(&self, index: i32) -> Result<Arg, MarshalError> {
        self.build_arg(&keys::param_name(index), None, index)
    }

    // Core per-index algorithm. `name_key` is the property holding the
    // template-variable name; `forced` overrides the declared kind during
    // union member re-dispatch (where `index` is the -1 sentinel).
    fn build_arg(
        &self,
        name_key: &str,
        forced: Option<ParamKind>,
        index: i32,
    ) -> Result<Arg, MarshalError> {
        let var_name = self.props.get(name_key).ok_or_else(|| {
            MarshalError::MissingParamName { key: name_key.to_string(), index }
        })?;

        let kind = match forced {
            Some(k) => k,
            None => match self.props.get(&keys::param_type(index)) {
                Some(s) => ParamKind::parse(&s),
                None => {
                    // Lenient by contract: downstream artifacts rely on the
                    // string default, so this stays a warning.
                    warn!(param = %var_name, index, "declared parameter kind missing; defaulting to string");
                    ParamKind::Str
                }
            },
        };

        match self.resolver.resolve(&var_name) {
            None => match kind {
                // Union: the discriminator is still honored even with no
                // direct binding — the member branch may be bound instead.
                ParamKind::Union => self.union_arg(&var_name, index),
                ParamKind::Record => self
                    .composites
                    .build_record("{}", &var_name, index)
                    .map(Arg::Value),
                ParamKind::Anydata => Ok(Arg::Type(TypeHandle::Predefined(ParamKind::Anydata))),
                _ => Ok(Arg::Absent),
            },
            Some(bound) => self.coerce(kind, bound, &var_name, index),
        }
    }

    fn coerce(
        &self,
        kind: ParamKind,
        bound: Bound,
        name: &str,
        index: i32,
    ) -> Result<Arg, MarshalError> {
        match kind {
            ParamKind::Bool
            | ParamKind::Int
            | ParamKind::Float
            | ParamKind::Decimal
            | ParamKind::Str => {
                let text = bound.text().ok_or_else(|| coercion_err(name, kind, &bound))?;
                coerce_primitive(kind, &text, name).map(Arg::Value)
            }

            ParamKind::Json | ParamKind::Anydata => match bound {
                Bound::Text(raw) => serde_json::from_str(&raw)
                    .map(Arg::Value)
                    .map_err(|source| MarshalError::Json { name: name.to_string(), source }),
                Bound::Json(v) => Ok(Arg::Value(v)),
                Bound::Xml(_) => Err(coercion_err(name, kind, &bound)),
            },

            ParamKind::Xml => Ok(self.xml_arg(bound, name)),

            ParamKind::Record => match bound {
                Bound::Text(raw) => self
                    .composites
                    .build_record(&raw, name, index)
                    .map(Arg::Value),
                Bound::Json(v) => Ok(Arg::Value(v)),
                Bound::Xml(_) => Err(coercion_err(name, kind, &bound)),
            },

            ParamKind::Map => match bound {
                Bound::Text(raw) => self.composites.build_map(&raw, name, index).map(Arg::Value),
                Bound::Json(v) => Ok(Arg::Value(v)),
                Bound::Xml(_) => Err(coercion_err(name, kind, &bound)),
            },

            ParamKind::Array => {
                // Element kind is read only here, at call time.
                let element = self
                    .props
                    .get(&keys::array_element_type(index))
                    .unwrap_or_default();
                match bound {
                    Bound::Text(raw) => table::transform(&element, &raw, self.props, index)
                        .map(Arg::Value)
                        .map_err(MarshalError::from),
                    Bound::Json(rows) => {
                        table::transform_value(&element, rows, self.props, index)
                            .map(Arg::Value)
                            .map_err(MarshalError::from)
                    }
                    Bound::Xml(_) => Err(coercion_err(name, kind, &bound)),
                }
            }

            ParamKind::Union => self.union_arg(name, index),

            ParamKind::Typedesc => {
                let text = match bound.text() {
                    Some(t) => t,
                    None => return Err(coercion_err(name, kind, &bound)),
                };
                Ok(self.typedesc_arg(&text))
            }

            ParamKind::Unknown => {
                warn!(param = %name, "unsupported declared kind; passing argument through inert");
                Ok(Arg::Absent)
            }
        }
    }

    /// Union resolution: the `<name>DataType` variable names the member
    /// branch; the member's own property key re-enters the per-index
    /// algorithm with the member kind forced and a non-positional index.
    fn union_arg(&self, var_name: &str, index: i32) -> Result<Arg, MarshalError> {
        let member = match self.resolver.resolve(&keys::data_type(var_name)) {
            Some(b) => match b.text() {
                Some(t) => t,
                None => {
                    warn!(param = %var_name, "union discriminator is not text; argument absent");
                    return Ok(Arg::Absent);
                }
            },
            None => {
                warn!(param = %var_name, "no union discriminator bound; argument absent");
                return Ok(Arg::Absent);
            }
        };

        let member_key = keys::union_member(index, &member);
        let forced = match ParamKind::parse(&member) {
            // A member type name that is no primitive is a record type name.
            ParamKind::Unknown => ParamKind::Record,
            k => k,
        };
        self.build_arg(&member_key, Some(forced), -1)
    }

    fn xml_arg(&self, bound: Bound, name: &str) -> Arg {
        // XML is optional by convention at this layer: missing or malformed
        // sources yield null, never a hard failure.
        match bound {
            Bound::Xml(x) => Arg::Xml(x),
            Bound::Text(indirect) => match self.resolver.resolve(&indirect) {
                Some(Bound::Xml(x)) => Arg::Xml(x),
                Some(_) => {
                    error!(param = %name, source = %indirect, "named value is not a markup element");
                    Arg::Absent
                }
                None => {
                    error!(param = %name, source = %indirect, "no markup element bound");
                    Arg::Absent
                }
            },
            Bound::Json(_) => {
                error!(param = %name, "structured value bound to xml parameter");
                Arg::Absent
            }
        }
    }

    fn typedesc_arg(&self, name: &str) -> Arg {
        if let Some(kind) = PREDEFINED.get(name) {
            return Arg::Type(TypeHandle::Predefined(*kind));
        }
        if let Some(handle) = self.registry.lookup(name) {
            return Arg::Type(handle.clone());
        }
        // Never fail the whole call for an unresolved typedesc.
        warn!(type_name = %name, "unresolved typedesc name; degrading to string value");
        Arg::Value(Value::String(name.to_string()))
    }

    /// Prefix step: path-derived arguments, coerced within the primitive
    /// kinds only. A missing path value is recoverable — the called function
    /// validates its own required path data.
    fn path_arguments(&self) -> Result<Vec<Arg>, MarshalError> {
        let size = self
            .props
            .get(keys::PATH_PARAM_SIZE)
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0)
            .min(i32::MAX as usize);

        // The declared count is untrusted artifact data; reserve modestly
        // and let the per-index lookup below report a corrupted count.
        let mut out = Vec::with_capacity(size.min(16));
        for i in 0..size as i32 {
            let key = keys::path_param(i);
            let name = self
                .props
                .get(&key)
                .ok_or(MarshalError::MissingParamName { key, index: i })?;

            let mut kind = match self.props.get(&keys::path_param_type(i)) {
                Some(s) => ParamKind::parse(&s),
                None => {
                    warn!(param = %name, index = i, "path parameter kind missing; defaulting to string");
                    ParamKind::Str
                }
            };
            if !kind.is_path_safe() {
                warn!(param = %name, kind = kind.as_str(), "non-primitive path parameter kind; treating as string");
                kind = ParamKind::Str;
            }

            match self.resolver.resolve(&name) {
                None => {
                    warn!(param = %name, index = i, "no path value bound; inserting null");
                    out.push(Arg::Absent);
                }
                Some(bound) => {
                    let text = bound.text().ok_or_else(|| coercion_err(&name, kind, &bound))?;
                    out.push(Arg::Value(coerce_primitive(kind, &text, &name)?));
                }
            }
        }
        Ok(out)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVE COERCION
// ————————————————————————————————————————————————————————————————————————————

/// Text-to-value parse for the primitive kinds. Parse failure is a hard
/// error: a malformed numeric for a declared numeric parameter is a caller
/// bug, not a runtime condition to mask.
fn coerce_primitive(kind: ParamKind, text: &str, name: &str) -> Result<Value, MarshalError> {
    let fail = |source: Option<Box<dyn std::error::Error + Send + Sync>>| MarshalError::Coercion {
        name: name.to_string(),
        kind: kind.as_str(),
        text: text.to_string(),
        source,
    };
    match kind {
        ParamKind::Bool => text
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| fail(Some(Box::new(e)))),
        ParamKind::Int => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| fail(Some(Box::new(e)))),
        ParamKind::Float | ParamKind::Decimal => {
            let f = text.parse::<f64>().map_err(|e| fail(Some(Box::new(e))))?;
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| fail(None))
        }
        ParamKind::Str => Ok(Value::String(text.to_string())),
        _ => Err(fail(None)),
    }
}

fn coercion_err(name: &str, kind: ParamKind, bound: &Bound) -> MarshalError {
    let text = match bound {
        Bound::Text(s) => s.clone(),
        Bound::Json(v) => v.to_string(),
        Bound::Xml(_) => "<xml>".to_string(),
    };
    MarshalError::Coercion {
        name: name.to_string(),
        kind: kind.as_str(),
        text,
        source: None,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn bound(pairs: Vec<(&str, Bound)>) -> HashMap<String, Bound> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn int_text_coerces_to_integer() {
        let p = props(&[("pathParamSize", "0"), ("param0", "count"), ("paramType0", "int")]);
        let r = bound(vec![("count", Bound::Text("42".into()))]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!(42))]);
    }

    #[test]
    fn malformed_int_is_a_hard_error() {
        let p = props(&[("param0", "count"), ("paramType0", "int")]);
        let r = bound(vec![("count", Bound::Text("4x".into()))]);
        let err = Marshaler::new(&p, &r).arguments(1).unwrap_err();
        assert!(matches!(err, MarshalError::Coercion { kind: "int", .. }));
    }

    #[test]
    fn missing_param_name_is_a_configuration_error() {
        let p = props(&[("paramType0", "int")]);
        let r = bound(vec![]);
        let err = Marshaler::new(&p, &r).arguments(1).unwrap_err();
        assert!(matches!(err, MarshalError::MissingParamName { index: 0, .. }));
    }

    #[test]
    fn missing_param_type_defaults_to_string() {
        let p = props(&[("param0", "note")]);
        let r = bound(vec![("note", Bound::Text("hello".into()))]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!("hello"))]);
    }

    #[test]
    fn unbound_value_yields_absent() {
        let p = props(&[("param0", "note"), ("paramType0", "string")]);
        let r = bound(vec![]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Absent]);
    }

    #[test]
    fn union_discriminator_redispatches_member_branch() {
        let p = props(&[
            ("param0", "amount"),
            ("paramType0", "union"),
            ("param0UnionInt", "amountInt"),
            ("param0UnionString", "amountString"),
        ]);
        let r = bound(vec![
            ("amountDataType", Bound::Text("int".into())),
            ("amountInt", Bound::Text("7".into())),
            ("amountString", Bound::Text("seven".into())),
        ]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!(7))]);
    }

    #[test]
    fn union_resolves_even_without_direct_binding() {
        // No value bound under "amount" itself; the discriminator still
        // picks the member branch.
        let p = props(&[
            ("param0", "amount"),
            ("paramType0", "union"),
            ("param0UnionString", "amountString"),
        ]);
        let r = bound(vec![
            ("amountDataType", Bound::Text("string".into())),
            ("amountString", Bound::Text("seven".into())),
        ]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!("seven"))]);
    }

    #[test]
    fn union_without_discriminator_degrades_to_absent() {
        let p = props(&[("param0", "amount"), ("paramType0", "union")]);
        let r = bound(vec![]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Absent]);
    }

    #[test]
    fn path_values_splice_ahead_and_missing_slots_are_null() {
        let p = props(&[
            ("pathParamSize", "2"),
            ("pathParam0", "orderId"),
            ("pathParamType0", "int"),
            ("pathParam1", "region"),
            ("pathParamType1", "string"),
            ("param0", "expand"),
            ("paramType0", "boolean"),
        ]);
        let r = bound(vec![
            ("orderId", Bound::Text("12".into())),
            ("expand", Bound::Text("true".into())),
        ]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(
            args,
            vec![Arg::Value(json!(12)), Arg::Absent, Arg::Value(json!(true))]
        );
    }

    #[test]
    fn malformed_path_value_is_a_hard_error() {
        let p = props(&[
            ("pathParamSize", "1"),
            ("pathParam0", "orderId"),
            ("pathParamType0", "int"),
        ]);
        let r = bound(vec![("orderId", Bound::Text("twelve".into()))]);
        let err = Marshaler::new(&p, &r).arguments(0).unwrap_err();
        assert!(matches!(err, MarshalError::Coercion { kind: "int", .. }));
    }

    #[test]
    fn json_parameter_parses_bound_text() {
        let p = props(&[("param0", "payload"), ("paramType0", "json")]);
        let r = bound(vec![("payload", Bound::Text(r#"{"a":[1,2]}"#.into()))]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!({"a": [1, 2]}))]);

        let r = bound(vec![("payload", Bound::Text("{not json".into()))]);
        let err = Marshaler::new(&p, &r).arguments(1).unwrap_err();
        assert!(matches!(err, MarshalError::Json { .. }));
    }

    #[test]
    fn record_builds_from_text_and_defaults_empty_when_unbound() {
        let p = props(&[("param0", "address"), ("paramType0", "record")]);
        let r = bound(vec![(
            "address",
            Bound::Text(r#"{"street":"Main","zip":7}"#.into()),
        )]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!({"street": "Main", "zip": 7}))]);

        let r = bound(vec![]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!({}))]);
    }

    #[test]
    fn map_builds_from_text_and_rejects_malformed_text() {
        let p = props(&[("param0", "headers"), ("paramType0", "map")]);
        let r = bound(vec![(
            "headers",
            Bound::Text(r#"{"a":"1","b":"2"}"#.into()),
        )]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!({"a": "1", "b": "2"}))]);

        let r = bound(vec![("headers", Bound::Json(json!({"a": 1})))]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!({"a": 1}))]);

        let r = bound(vec![("headers", Bound::Text("{oops".into()))]);
        let err = Marshaler::new(&p, &r).arguments(1).unwrap_err();
        assert!(matches!(err, MarshalError::Composite { what: "map", .. }));
    }

    #[test]
    fn absurd_path_param_size_fails_the_call_not_the_process() {
        // A corrupted-but-numeric count must surface as the missing-key
        // configuration error, never as a giant up-front reservation.
        let p = props(&[("pathParamSize", "4000000000")]);
        let r = bound(vec![]);
        let err = Marshaler::new(&p, &r).arguments(0).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::MissingParamName { index: 0, .. }
        ));
    }

    #[test]
    fn xml_resolves_through_secondary_indirection() {
        let p = props(&[("param0", "body"), ("paramType0", "xml")]);
        let r = bound(vec![
            ("body", Bound::Text("bodySource".into())),
            ("bodySource", Bound::Xml("<order id=\"1\"/>".into())),
        ]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Xml("<order id=\"1\"/>".into())]);

        // missing source element degrades to null, not an error
        let r = bound(vec![("body", Bound::Text("bodySource".into()))]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Absent]);
    }

    #[test]
    fn typedesc_resolution_order_predefined_registry_fallback() {
        let p = props(&[("param0", "target"), ("paramType0", "typedesc")]);
        let mut registry = TypeRegistry::new();
        registry.register("shop", "Order");

        let r = bound(vec![("target", Bound::Text("int".into()))]);
        let args = Marshaler::new(&p, &r).with_registry(&registry).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Type(TypeHandle::Predefined(ParamKind::Int))]);

        let r = bound(vec![("target", Bound::Text("Order".into()))]);
        let args = Marshaler::new(&p, &r).with_registry(&registry).arguments(1).unwrap();
        assert_eq!(
            args,
            vec![Arg::Type(TypeHandle::Registered {
                module: "shop".into(),
                name: "Order".into()
            })]
        );

        let r = bound(vec![("target", Bound::Text("Mystery".into()))]);
        let args = Marshaler::new(&p, &r).with_registry(&registry).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!("Mystery"))]);
    }

    #[test]
    fn anydata_without_binding_yields_default_type_handle() {
        let p = props(&[("param0", "blob"), ("paramType0", "anydata")]);
        let r = bound(vec![]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Type(TypeHandle::Predefined(ParamKind::Anydata))]);
    }

    #[test]
    fn array_dispatches_through_table_transform() {
        let p = props(&[
            ("param0", "rows"),
            ("paramType0", "array"),
            ("arrayElementType0", "union"),
        ]);
        let r = bound(vec![(
            "rows",
            Bound::Text(
                r#"[{"type":"int","value":"7"},{"type":"boolean","value":"yes"}]"#.into(),
            ),
        )]);
        let args = Marshaler::new(&p, &r).arguments(1).unwrap();
        assert_eq!(args, vec![Arg::Value(json!([7, "yes"]))]);
    }

    // Round-trip law: keys generated at build time are exactly the keys read
    // back at run time, for every node kind and nesting depth used here.
    #[test]
    fn build_time_properties_marshal_back_to_expected_arguments() {
        use crate::builder::build_function;
        use crate::descriptor::FunctionDesc;
        use crate::emit::template_properties;

        let fd: FunctionDesc = serde_json::from_value(json!({
            "name": "submit",
            "path": [ "orders", { "name": "orderId", "kind": "int" } ],
            "params": [
                { "name": "note", "type": { "kind": "string" } },
                { "name": "amount", "type": { "kind": "union", "members": [
                    { "kind": "int" }, { "kind": "float" }
                ]}},
                { "name": "address", "type": { "kind": "record", "name": "Address",
                    "fields": [ { "name": "street", "type": { "kind": "string" } } ] } },
                { "name": "scores", "type": { "kind": "array", "element": { "kind": "float" } } }
            ]
        }))
        .unwrap();
        let model = build_function(&fd);
        let props = template_properties(&model);

        let r = bound(vec![
            ("orderId", Bound::Text("99".into())),
            ("note", Bound::Text("rush".into())),
            ("amountDataType", Bound::Text("float".into())),
            ("amountFloat", Bound::Text("2.5".into())),
            ("address", Bound::Text(r#"{"street":"Main"}"#.into())),
            ("scores", Bound::Text(r#"["1","2.5"]"#.into())),
        ]);

        let args = Marshaler::new(&props, &r)
            .arguments(model.params.len())
            .unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Value(json!(99)),
                Arg::Value(json!("rush")),
                Arg::Value(json!(2.5)),
                Arg::Value(json!({"street": "Main"})),
                Arg::Value(json!([1.0, 2.5])),
            ]
        );
    }
}
