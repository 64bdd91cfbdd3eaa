//! Scan engine
//!
//! Text in, diagnostics out. The engine tokenizes the document once, computes its
//! structural metrics, runs every registered rule in order and normalizes the
//! result. It performs no I/O and holds no state between documents.

use crate::deps::DependencyTable;
use crate::diagnostic::{Diagnostic, LineIndex};
use crate::policy::Policy;
use crate::rules::{RuleRegistry, ScanContext};
use crate::scanner::{tokenize, StructuralMetrics, VoidElements};

/// Reference data injected into the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub void_elements: VoidElements,
    pub dependencies: DependencyTable,
}

/// The scan engine
pub struct Engine {
    policy: Policy,
    tables: Tables,
    registry: RuleRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

impl Engine {
    /// Engine with the built-in tables and rules
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            tables: Tables::default(),
            registry: RuleRegistry::builtin(),
        }
    }

    /// Replace the reference tables
    pub fn with_tables(mut self, tables: Tables) -> Self {
        self.tables = tables;
        self
    }

    /// Replace the rule registry
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Scan one document
    pub fn scan(&self, text: &str, file_name: &str) -> Vec<Diagnostic> {
        let tags = tokenize(text);
        let metrics = StructuralMetrics::compute(
            text,
            file_name,
            &tags,
            &self.tables.void_elements,
            &self.policy,
        );

        log::debug!(
            "{}: {} bytes, {} tags, {} elements, depth {}, head: {}, managed head: {}",
            file_name,
            metrics.byte_size,
            tags.len(),
            metrics.element_count,
            metrics.max_depth,
            metrics.has_head(),
            metrics.head_managed
        );

        let ctx = ScanContext {
            text,
            file_name,
            tags: &tags,
            metrics: &metrics,
            policy: &self.policy,
            tables: &self.tables,
        };

        let mut diagnostics = Vec::new();
        for rule in self.registry.rules() {
            let found = rule.evaluate(&ctx);
            log::trace!("{}: rule {} -> {} findings", file_name, rule.id(), found.len());
            diagnostics.extend(found);
        }

        assemble(text, diagnostics)
    }
}

/// Clamp spans into the text and attach line/column positions
fn assemble(text: &str, mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let index = LineIndex::new(text);
    for diag in &mut diagnostics {
        diag.span = diag.span.clamp_to(text);
        diag.position = index.position(text, diag.span.start);
    }
    diagnostics
}

/// Scan one document with the built-in tables and rules
pub fn scan(text: &str, file_name: &str, policy: &Policy) -> Vec<Diagnostic> {
    Engine::new(policy.clone()).scan(text, file_name)
}
