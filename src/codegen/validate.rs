//! Contract validation.
//!
//! [`validate`] turns a [`ServiceDecl`] into a [`ServiceContract`] the
//! generator can emit, or reports every reason it cannot. A method must take
//! exactly one input record, return at most one output record, and have a
//! name no other method of the same contract maps to.

use std::collections::HashMap;

use super::schema::{MethodDecl, ServiceDecl};

/// Output type of methods that return nothing.
pub const EMPTY_TYPE: &str = "rpcwire::Empty";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield", "gen",
];

/// Names a generated module imports or relies on from the prelude.
const RESERVED_NAMES: &[&str] = &[
    "Arc", "Endpoint", "RpcHandler", "ServiceHandler", "TypedRpcHandler", "Fault", "Try",
    "BoxFuture", "S", "Box", "Option", "Some", "None", "Result", "Ok", "Err", "Vec", "String",
    "Send", "Sync", "Sized", "Unpin", "Clone", "Copy", "Debug", "Default", "Drop", "Fn",
    "FnMut", "FnOnce", "From", "Into", "ToString", "ToOwned", "Iterator", "IntoIterator",
];

/// Type names that are not records.
const NON_RECORD_TYPES: &[&str] = &[
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
    "u64", "u128", "usize", "f32", "f64", "String", "Vec", "Option", "Box", "Result",
    "HashMap", "BTreeMap", "HashSet", "BTreeSet",
];

/// A validated contract, ready for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContract {
    /// Wire name, also the name of the generated trait.
    pub name: String,
    /// Name of the generated module and file stem.
    pub module_name: String,
    /// Methods in declaration order.
    pub methods: Vec<RpcMethod>,
}

/// A validated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMethod {
    /// Wire name, the last path segment of the route.
    pub name: String,
    /// Name of the generated Rust function.
    pub rust_name: String,
    pub input_name: String,
    pub input_type: String,
    /// Output record type, [`EMPTY_TYPE`] when none was declared.
    pub output_type: String,
}

/// A reason a contract cannot be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub service: String,
    pub method: Option<String>,
    pub message: String,
}

impl Diagnostic {
    fn service(service: &str, message: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            method: None,
            message: message.into(),
        }
    }

    fn method(service: &str, method: &str, message: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            method: Some(method.to_string()),
            message: message.into(),
        }
    }

    /// The diagnostic as a build script warning line.
    pub fn cargo_warning(&self) -> String {
        format!("cargo:warning={}", self)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{}.{}: {}", self.service, method, self.message),
            None => write!(f, "{}: {}", self.service, self.message),
        }
    }
}

/// Validate one service declaration.
///
/// # Errors
///
/// Returns every diagnostic found if the contract cannot be generated.
pub fn validate(decl: &ServiceDecl) -> Result<ServiceContract, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    if !is_upper_camel(&decl.name) {
        diagnostics.push(Diagnostic::service(
            &decl.name,
            "service name must be an UpperCamelCase identifier",
        ));
    }

    for generated in [
        decl.name.clone(),
        format!("{}Stub", decl.name),
        format!("{}Handler", decl.name),
    ] {
        if RESERVED_NAMES.contains(&generated.as_str()) {
            diagnostics.push(Diagnostic::service(
                &decl.name,
                format!(
                    "generated item {} clashes with a name the module uses",
                    generated
                ),
            ));
        }
    }

    if decl.methods.is_empty() {
        diagnostics.push(Diagnostic::service(&decl.name, "contract declares no methods"));
    }

    let mut methods = Vec::with_capacity(decl.methods.len());
    let mut seen: HashMap<String, String> = HashMap::new();
    for method in &decl.methods {
        let Some(rpc) = validate_method(&decl.name, method, &mut diagnostics) else {
            continue;
        };
        if let Some(previous) = seen.get(&rpc.rust_name) {
            let message = if previous == &rpc.name {
                "duplicate method name".to_string()
            } else {
                format!(
                    "method name collides with {} as Rust function {}",
                    previous, rpc.rust_name
                )
            };
            diagnostics.push(Diagnostic::method(&decl.name, &method.name, message));
            continue;
        }
        seen.insert(rpc.rust_name.clone(), rpc.name.clone());
        methods.push(rpc);
    }

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    Ok(ServiceContract {
        name: decl.name.clone(),
        module_name: to_snake_case(&decl.name),
        methods,
    })
}

fn validate_method(
    service: &str,
    method: &MethodDecl,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<RpcMethod> {
    let before = diagnostics.len();
    let mut report = |message: String| {
        diagnostics.push(Diagnostic::method(service, &method.name, message));
    };

    let rust_name = to_snake_case(&method.name);
    if !is_identifier(&method.name) || is_keyword(&rust_name) {
        report("method name must be an identifier that is not a keyword".to_string());
    }

    let input = match method.params.as_slice() {
        [param] => Some(param),
        params => {
            report(format!(
                "method must take exactly one input record, found {}",
                params.len()
            ));
            None
        }
    };

    if let Some(param) = input {
        let lower = param.name.starts_with(|c: char| c.is_ascii_lowercase() || c == '_');
        if !is_identifier(&param.name) || is_keyword(&param.name) || !lower {
            report(format!(
                "parameter name {} must be a lowercase identifier that is not a keyword",
                param.name
            ));
        }
        if let Err(reason) = check_record_type(&param.ty) {
            report(format!("input type {} {}", param.ty, reason));
        }
    }

    if let Some(output) = &method.output {
        if let Err(reason) = check_record_type(output) {
            report(format!("output type {} {}", output, reason));
        }
    }

    if diagnostics.len() > before {
        return None;
    }
    let param = input?;
    Some(RpcMethod {
        name: method.name.clone(),
        rust_name,
        input_name: param.name.clone(),
        input_type: param.ty.clone(),
        output_type: method
            .output
            .clone()
            .unwrap_or_else(|| EMPTY_TYPE.to_string()),
    })
}

/// A record type reference is a plain path such as `crate::api::GetRequest`.
///
/// The path must resolve from inside the generated module, so it needs a
/// root: a bare `GetRequest` or a `self::` path names nothing there.
fn check_record_type(ty: &str) -> Result<(), &'static str> {
    if ty.chars().any(|c| "<>&()[],; *'".contains(c)) {
        return Err("must be a plain path to a concrete record type");
    }

    let path = ty.strip_prefix("::").unwrap_or(ty);
    let segments: Vec<&str> = path.split("::").collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err("is empty"),
    };
    if parents.is_empty() || parents[0] == "self" {
        return Err("must be a path such as crate::Record");
    }

    for (i, segment) in parents.iter().enumerate() {
        let path_keyword = matches!(*segment, "crate" | "self" | "super") && i == 0;
        if !is_identifier(segment) || (is_keyword(segment) && !path_keyword) {
            return Err("is not a valid path");
        }
    }
    if NON_RECORD_TYPES.contains(last) {
        return Err("is not a record type");
    }
    if !is_upper_camel(last) {
        return Err("must name a record type");
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

fn is_upper_camel(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// `getUser` -> `get_user`, `HTTPStatus` -> `http_status`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
