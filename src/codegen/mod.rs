//! Codegen module - contract validation and Rust source generation.
//!
//! Contracts are declared in a JSON [`Schema`]. Each declared service is
//! validated on its own: a contract with a broken method is skipped and
//! reported as a [`Diagnostic`] while its siblings are still generated.
//!
//! Typical use is from a build script:
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     println!("cargo:rerun-if-changed=contracts.json");
//!     let schema = rpcwire::codegen::Schema::from_path("contracts.json").unwrap();
//!     let generation = rpcwire::codegen::generate_all(&schema);
//!     for diagnostic in &generation.diagnostics {
//!         println!("{}", diagnostic.cargo_warning());
//!     }
//!     let out_dir = std::env::var("OUT_DIR").unwrap();
//!     generation.write_to(format!("{out_dir}/contracts")).unwrap();
//! }
//! ```

mod generate;
mod schema;
mod validate;

use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;

pub use generate::{generate, GeneratedFile};
pub use schema::{MethodDecl, ParamDecl, Schema, ServiceDecl};
pub use validate::{to_snake_case, validate, Diagnostic, RpcMethod, ServiceContract, EMPTY_TYPE};

/// Output of generating a whole schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    /// One file per valid contract, in declaration order.
    pub files: Vec<GeneratedFile>,
    /// Why the remaining contracts were skipped.
    pub diagnostics: Vec<Diagnostic>,
}

impl Generation {
    /// Whether every declared contract was generated.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Source of a `mod.rs` declaring every generated module.
    pub fn mod_source(&self) -> String {
        let mut source = String::from("// Generated by rpcwire. Do not edit.\n\n");
        for file in &self.files {
            source.push_str(&format!("pub mod {};\n", file.module_name));
        }
        source
    }

    /// Write every generated file and a `mod.rs` into `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or a file cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for file in &self.files {
            std::fs::write(dir.join(&file.file_name), &file.source)?;
        }
        std::fs::write(dir.join("mod.rs"), self.mod_source())?;
        tracing::debug!(
            "Wrote {} generated modules to {}",
            self.files.len(),
            dir.display()
        );
        Ok(())
    }
}

/// Validate and generate every service of `schema`.
///
/// A service whose name, or module name, repeats an earlier one is
/// rejected.
pub fn generate_all(schema: &Schema) -> Generation {
    let mut generation = Generation::default();
    let mut names = HashSet::new();
    let mut modules = HashSet::new();

    for decl in &schema.services {
        if !names.insert(decl.name.as_str()) {
            generation.diagnostics.push(Diagnostic {
                service: decl.name.clone(),
                method: None,
                message: "service is declared more than once".to_string(),
            });
            continue;
        }

        let contract = match validate(decl) {
            Ok(contract) => contract,
            Err(diagnostics) => {
                generation.diagnostics.extend(diagnostics);
                continue;
            }
        };

        if !modules.insert(contract.module_name.clone()) {
            generation.diagnostics.push(Diagnostic {
                service: decl.name.clone(),
                method: None,
                message: format!(
                    "module name {} is already used by another service",
                    contract.module_name
                ),
            });
            continue;
        }

        generation.files.push(generate(&contract));
    }

    for diagnostic in &generation.diagnostics {
        tracing::warn!("Skipped contract: {}", diagnostic);
    }
    generation
}
