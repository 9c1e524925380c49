//! Factory preloaded with the arithmetic agents

use std::sync::Arc;

use flowmesh_core::{AgentFactory, SharedAgent};

use crate::binary::{BinOpAgent, DIV_KIND, MUL_KIND, PLUS_KIND};
use crate::unary::{DEC_KIND, INC_KIND, UnaryAgent};

/// Register every built-in kind on `factory`
pub fn register_builtins(factory: &mut AgentFactory) {
    factory.register(INC_KIND, |registry, inputs, outputs| {
        Ok(Arc::new(UnaryAgent::increment(Arc::clone(registry), inputs, outputs)?) as SharedAgent)
    });
    factory.register(DEC_KIND, |registry, inputs, outputs| {
        Ok(Arc::new(UnaryAgent::decrement(Arc::clone(registry), inputs, outputs)?) as SharedAgent)
    });
    factory.register(PLUS_KIND, |registry, inputs, outputs| {
        Ok(Arc::new(BinOpAgent::plus(Arc::clone(registry), inputs, outputs)?) as SharedAgent)
    });
    factory.register(MUL_KIND, |registry, inputs, outputs| {
        Ok(Arc::new(BinOpAgent::mul(Arc::clone(registry), inputs, outputs)?) as SharedAgent)
    });
    factory.register(DIV_KIND, |registry, inputs, outputs| {
        Ok(Arc::new(BinOpAgent::div(Arc::clone(registry), inputs, outputs)?) as SharedAgent)
    });
}

/// A factory knowing `IncAgent`, `DecAgent`, `PlusAgent`, `MulAgent` and
/// `DivAgent`
pub fn builtin_factory() -> AgentFactory {
    let mut factory = AgentFactory::new();
    register_builtins(&mut factory);
    factory
}
