//! Per-method compilation driver.
//!
//! Methods compile independently: each gets its own CFG, variable model, and
//! builder, and fully translates or fails fast. The shared type interner is
//! the only cross-method resource, so [`compile_all`] fans methods out over
//! a rayon parallel iterator without further coordination.

use rayon::prelude::*;
use tracing::{debug, debug_span};

use helios_diagnostic::FrontendResult;
use helios_ir::{Location, Method, MethodInfo};
use helios_types::TypeInterner;

use crate::cfg::ControlFlow;
use crate::resolver::{MethodResolver, Settings};
use crate::translate::Translator;
use crate::variables::VariableModel;

/// Compile one method to SSA form.
pub fn compile_method(
    info: &MethodInfo,
    interner: &TypeInterner,
    resolver: &dyn MethodResolver,
    settings: &Settings,
) -> FrontendResult<Method> {
    let span = debug_span!("compile_method", method = %info.name);
    let _enter = span.enter();

    let result = ControlFlow::build(&info.body).and_then(|cfg| {
        let vars = VariableModel::analyze(info);
        Translator::new(info, interner, resolver, settings, &cfg, &vars).run()
    });

    match result {
        Ok(method) => {
            debug!(
                blocks = method.blocks().len(),
                values = method.value_count(),
                "method compiled"
            );
            Ok(method)
        }
        Err(err) => {
            debug!(%err, "method failed to compile");
            let location = err.location().unwrap_or(Location::UNKNOWN);
            Err(err.with_frame(info.name.as_str(), location))
        }
    }
}

/// Compile every method, in parallel. Results keep the input order; each
/// method succeeds or fails on its own.
pub fn compile_all(
    methods: &[MethodInfo],
    interner: &TypeInterner,
    resolver: &dyn MethodResolver,
    settings: &Settings,
) -> Vec<FrontendResult<Method>> {
    methods
        .par_iter()
        .map(|info| compile_method(info, interner, resolver, settings))
        .collect()
}
