//! Rust source generation for validated contracts.
//!
//! For a contract `UserService` the generated module holds:
//!
//! - `trait UserService`, implemented by the server and by the stub
//! - `UserServiceStub`, calling through an [`Endpoint`](crate::client::Endpoint)
//! - `UserServiceHandler<S>`, a [`ServiceHandler`](crate::handler::ServiceHandler)
//! - `client(endpoint)` and `handler(service)` factories
//!
//! Record types are referenced by the paths given in the declaration, so
//! they must resolve from where the module is included.

use super::validate::{RpcMethod, ServiceContract};

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Module name, also the file stem.
    pub module_name: String,
    /// File name, `{module_name}.rs`.
    pub file_name: String,
    pub source: String,
}

/// Generate the module for one contract.
pub fn generate(contract: &ServiceContract) -> GeneratedFile {
    let mut out = Source::default();

    out.line(&format!(
        "// Generated by rpcwire from the {} contract. Do not edit.",
        contract.name
    ));
    out.blank();
    out.line("use std::sync::Arc;");
    out.blank();
    out.line("use rpcwire::client::Endpoint;");
    out.line("use rpcwire::handler::{RpcHandler, ServiceHandler, TypedRpcHandler};");
    out.line("use rpcwire::result::{Fault, Try};");
    out.line("use rpcwire::BoxFuture;");
    out.blank();
    out.line("/// Wire name of the service.");
    out.line(&format!("pub const SERVICE_NAME: &str = \"{}\";", contract.name));
    out.blank();

    emit_trait(&mut out, contract);
    emit_stub(&mut out, contract);
    emit_handler(&mut out, contract);
    emit_factories(&mut out, contract);
    emit_record_assertions(&mut out, contract);

    GeneratedFile {
        module_name: contract.module_name.clone(),
        file_name: format!("{}.rs", contract.module_name),
        source: out.finish(),
    }
}

fn emit_trait(out: &mut Source, contract: &ServiceContract) {
    out.line(&format!("/// The `{}` contract.", contract.name));
    out.line(&format!(
        "pub trait {}: Send + Sync + 'static {{",
        contract.name
    ));
    for (i, method) in contract.methods.iter().enumerate() {
        if i > 0 {
            out.blank();
        }
        out.indented(1, &format!("/// `{}`", method.name));
        out.indented(1, &format!("{};", signature(method)));
    }
    out.line("}");
    out.blank();
}

fn emit_stub(out: &mut Source, contract: &ServiceContract) {
    let stub = format!("{}Stub", contract.name);

    out.line(&format!("/// Client stub for `{}`.", contract.name));
    out.line("#[derive(Clone, Debug)]");
    out.line(&format!("pub struct {} {{", stub));
    out.indented(1, "endpoint: Endpoint,");
    out.line("}");
    out.blank();

    out.line(&format!("impl {} {{", stub));
    out.indented(1, "pub fn new(endpoint: Endpoint) -> Self {");
    out.indented(2, "Self { endpoint }");
    out.indented(1, "}");
    for method in &contract.methods {
        out.blank();
        out.indented(
            1,
            &format!(
                "pub async fn try_{}(&self, {}: {}) -> Try<{}> {{",
                method.rust_name, method.input_name, method.input_type, method.output_type
            ),
        );
        out.indented(
            2,
            &format!(
                "self.endpoint.call(SERVICE_NAME, \"{}\", &{}).await",
                method.name, method.input_name
            ),
        );
        out.indented(1, "}");
    }
    out.line("}");
    out.blank();

    out.line(&format!("impl {} for {} {{", contract.name, stub));
    for (i, method) in contract.methods.iter().enumerate() {
        if i > 0 {
            out.blank();
        }
        out.indented(1, &format!("{} {{", signature(method)));
        out.indented(2, "Box::pin(async move {");
        out.indented(
            3,
            &format!(
                "self.try_{}({}).await.into_result().map_err(Fault::from)",
                method.rust_name, method.input_name
            ),
        );
        out.indented(2, "})");
        out.indented(1, "}");
    }
    out.line("}");
    out.blank();
}

fn emit_handler(out: &mut Source, contract: &ServiceContract) {
    let name = &contract.name;
    let handler = format!("{}Handler", name);

    out.line(&format!("/// Server dispatch table for `{}`.", name));
    out.line(&format!("pub struct {}<S: {}> {{", handler, name));
    for method in &contract.methods {
        out.indented(
            1,
            &format!(
                "{}: TypedRpcHandler<S, {}, {}>,",
                method.rust_name, method.input_type, method.output_type
            ),
        );
    }
    out.line("}");
    out.blank();

    out.line(&format!("impl<S: {}> {}<S> {{", name, handler));
    out.indented(1, "pub fn new(service: Arc<S>) -> Self {");
    out.indented(2, "Self {");
    for method in &contract.methods {
        out.indented(
            3,
            &format!(
                "{}: TypedRpcHandler::new(Arc::clone(&service), S::{}),",
                method.rust_name, method.rust_name
            ),
        );
    }
    out.indented(2, "}");
    out.indented(1, "}");
    out.line("}");
    out.blank();

    out.line(&format!("impl<S: {}> ServiceHandler for {}<S> {{", name, handler));
    out.indented(1, "fn service_name(&self) -> &str {");
    out.indented(2, "SERVICE_NAME");
    out.indented(1, "}");
    out.blank();
    out.indented(1, "fn rpc_names(&self) -> Vec<&str> {");
    let names: Vec<String> = contract
        .methods
        .iter()
        .map(|method| format!("\"{}\"", method.name))
        .collect();
    out.indented(2, &format!("vec![{}]", names.join(", ")));
    out.indented(1, "}");
    out.blank();
    out.indented(1, "fn rpc_handler(&self, rpc: &str) -> Option<&dyn RpcHandler> {");
    out.indented(2, "match rpc {");
    for method in &contract.methods {
        out.indented(
            3,
            &format!("\"{}\" => Some(&self.{}),", method.name, method.rust_name),
        );
    }
    out.indented(3, "_ => None,");
    out.indented(2, "}");
    out.indented(1, "}");
    out.line("}");
    out.blank();
}

fn emit_factories(out: &mut Source, contract: &ServiceContract) {
    let name = &contract.name;

    out.line(&format!("/// Stub calling `{}` through `endpoint`.", name));
    out.line(&format!("pub fn client(endpoint: Endpoint) -> {}Stub {{", name));
    out.indented(1, &format!("{}Stub::new(endpoint)", name));
    out.line("}");
    out.blank();
    out.line(&format!("/// Handler serving `{}` with `service`.", name));
    out.line(&format!(
        "pub fn handler<S: {}>(service: Arc<S>) -> {}Handler<S> {{",
        name, name
    ));
    out.indented(1, &format!("{}Handler::new(service)", name));
    out.line("}");
}

fn emit_record_assertions(out: &mut Source, contract: &ServiceContract) {
    let mut types: Vec<&str> = Vec::new();
    for method in &contract.methods {
        for ty in [method.input_type.as_str(), method.output_type.as_str()] {
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
    }

    out.blank();
    out.line("const _: fn() = || {");
    for ty in types {
        out.indented(1, &format!("rpcwire::codec::assert_record::<{}>();", ty));
    }
    out.line("};");
}

fn signature(method: &RpcMethod) -> String {
    format!(
        "fn {}(&self, {}: {}) -> BoxFuture<'_, Result<{}, Fault>>",
        method.rust_name, method.input_name, method.input_type, method.output_type
    )
}

#[derive(Default)]
struct Source {
    text: String,
}

impl Source {
    fn line(&mut self, line: &str) {
        self.indented(0, line);
    }

    fn indented(&mut self, depth: usize, line: &str) {
        for _ in 0..depth {
            self.text.push_str("    ");
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn finish(self) -> String {
        self.text
    }
}
