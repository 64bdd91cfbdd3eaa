//! Rule definitions
//!
//! Every rule is a pure function of a [`ScanContext`]: the document text, its tag
//! stream, the structural metrics computed once per scan, the resolved policy and
//! the reference tables. Rules never see each other's output, so they can be
//! registered in any order and tested in isolation with synthetic inputs.

pub mod budget;
pub mod perf;
pub mod seo;

use crate::deps::HeavyImportsRule;
use crate::diagnostic::{Diagnostic, RuleCategory};
use crate::engine::Tables;
use crate::policy::Policy;
use crate::scanner::{StructuralMetrics, Tag};

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub text: &'a str,
    pub file_name: &'a str,
    pub tags: &'a [Tag],
    pub metrics: &'a StructuralMetrics,
    pub policy: &'a Policy,
    pub tables: &'a Tables,
}

impl<'a> ScanContext<'a> {
    /// Tag starting at an absolute byte offset
    pub fn tag_at(&self, offset: usize) -> Option<&'a Tag> {
        let index = self
            .tags
            .binary_search_by_key(&offset, |t| t.span.start)
            .ok()?;
        self.tags.get(index)
    }

    /// Opening or self-closing tags with a given name
    pub fn opening(&self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        let tags: &'a [Tag] = self.tags;
        tags.iter().filter(move |t| t.opens(name))
    }
}

/// A lint rule
pub trait Rule: Send + Sync {
    /// Rule identifier (e.g. `title`)
    fn id(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    fn category(&self) -> RuleCategory;

    /// Diagnostic codes this rule can emit
    fn codes(&self) -> &'static [&'static str];

    /// Evaluate the rule against one document
    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic>;
}

/// Ordered set of rules run by the engine
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleRegistry {
    /// Registry without rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// All built-in rules: SEO, performance, render budget, bundle weight
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry.register(Box::new(seo::TitleRule));
        registry.register(Box::new(seo::MetaDescriptionRule));
        registry.register(Box::new(seo::CanonicalRule));
        registry.register(Box::new(seo::StructuredDataRule));
        registry.register(Box::new(seo::OpenGraphRule));
        registry.register(Box::new(seo::HeadOrderRule));

        registry.register(Box::new(perf::BlockingScriptRule));
        registry.register(Box::new(perf::ThirdPartyScriptRule));
        registry.register(Box::new(perf::ImageAttributesRule));
        registry.register(Box::new(perf::ImageComponentRule));
        registry.register(Box::new(perf::InlineImageRule));
        registry.register(Box::new(perf::FontLoadingRule));
        registry.register(Box::new(perf::ResourceHintRule));

        registry.register(Box::new(budget::HtmlSizeRule));
        registry.register(Box::new(budget::DomSizeRule));
        registry.register(Box::new(budget::DomDepthRule));

        registry.register(Box::new(HeavyImportsRule));

        registry
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule that emits a given code
    pub fn find_by_code(&self, code: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.codes().iter().any(|c| c.eq_ignore_ascii_case(code)))
            .map(|r| r.as_ref())
    }
}
