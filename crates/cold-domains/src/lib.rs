//! Built-in prompt library for the case analyzer. `base` carries a generic
//! template for every step; `civil` and `common` refine the steps where the
//! legal tradition changes what a good answer looks like; `india` overrides
//! two steps for the one jurisdiction that blends both traditions.

pub mod base;
pub mod civil;
pub mod common;
pub mod india;

use cold_core::registry::PromptRegistry;

/// Registry with every built-in prompt registered. Built once at startup;
/// read-only afterwards.
pub fn builtin_registry() -> PromptRegistry {
    let mut registry = PromptRegistry::new();
    base::register(&mut registry);
    civil::register(&mut registry);
    common::register(&mut registry);
    india::register(&mut registry);
    registry
}
