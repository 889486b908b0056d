//! Template instantiation
//!
//! Compilation is a deterministic function of a governance section's current
//! content and its declared templates (given a deterministic extraction
//! provider). Results are cached per `(section id, version)`, so a version
//! bump naturally misses the cache and triggers recompilation.

use crate::error::CompilationError;
use crate::rule::{Constraint, ConstraintRule, RuleTemplate, TemplateKind};
use crate::set::ConstraintSet;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use redline_graph::DocumentGraph;
use redline_model::{ConstraintId, Section, SectionId, TermExtractor};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// First number after the figure name: digits with optional grouping and a
/// decimal part.
static NUMBER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[0-9][0-9_,]*(?:\.[0-9]+)?").ok());

/// Rule declarations for a snapshot, keyed by governance source
///
/// Ingestion supplies these alongside the sections; the compiler instantiates
/// them against each source's current content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateSet {
    declarations: BTreeMap<SectionId, Vec<RuleTemplate>>,
}

impl TemplateSet {
    /// Empty declaration set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a template on `source`, keeping declaration order
    pub fn declare(&mut self, source: impl Into<SectionId>, template: RuleTemplate) -> &mut Self {
        self.declarations.entry(source.into()).or_default().push(template);
        self
    }

    /// Templates declared on `source`
    #[must_use]
    pub fn for_source(&self, source: &SectionId) -> &[RuleTemplate] {
        self.declarations.get(source).map_or(&[], Vec::as_slice)
    }

    /// Declared sources in ascending id order
    pub fn sources(&self) -> impl Iterator<Item = &SectionId> {
        self.declarations.keys()
    }

    /// Total number of declared templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.values().map(Vec::len).sum()
    }

    /// True when nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Compiles declared templates into checkable constraints
///
/// Concurrent readers share the cache through an [`RwLock`]; compilation for
/// an unseen `(id, version)` pair takes the write path once.
#[derive(Debug, Default)]
pub struct ConstraintCompiler {
    templates: TemplateSet,
    cache: RwLock<HashMap<(SectionId, u64), Vec<Constraint>>>,
}

impl ConstraintCompiler {
    /// Compiler over the given declarations
    #[must_use]
    pub fn new(templates: TemplateSet) -> Self {
        Self {
            templates,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Declared templates
    #[must_use]
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Compile one governance section's declared templates
    ///
    /// Sections with no declarations compile to an empty list.
    ///
    /// # Errors
    /// [`CompilationError::NotGovernanceTier`] for Generated sections;
    /// otherwise the per-template instantiation failures.
    pub fn compile(
        &self,
        section: &Section,
        extractor: &dyn TermExtractor,
    ) -> Result<Vec<Constraint>, CompilationError> {
        if !section.tier().is_governance() {
            return Err(CompilationError::NotGovernanceTier {
                id: section.id().clone(),
                tier: section.tier(),
            });
        }

        let key = (section.id().clone(), section.version());
        if let Some(cached) = self.cache.read().get(&key) {
            return Ok(cached.clone());
        }

        let mut compiled = Vec::new();
        for template in self.templates.for_source(section.id()) {
            compiled.push(instantiate(template, section, extractor)?);
        }
        tracing::debug!(
            "compiled {} constraints from {} v{}",
            compiled.len(),
            section.id(),
            section.version()
        );

        self.cache.write().insert(key, compiled.clone());
        Ok(compiled)
    }

    /// Compile every governance section of a published snapshot
    ///
    /// Sources are visited in topological order; the returned set records
    /// each source's version, including sources with no declarations, so
    /// [`ConstraintSet::stale_sources`] can answer recompilation queries.
    ///
    /// # Errors
    /// [`CompilationError::UnknownSource`] when a declaration names a section
    /// absent from the graph, plus the per-section failures of
    /// [`ConstraintCompiler::compile`].
    pub fn compile_constraints(
        &self,
        graph: &DocumentGraph,
        extractor: &dyn TermExtractor,
    ) -> Result<ConstraintSet, CompilationError> {
        for source in self.templates.sources() {
            if !graph.contains(source) {
                return Err(CompilationError::UnknownSource { id: source.clone() });
            }
        }

        let mut set = ConstraintSet::new();
        for id in graph.topological_order() {
            let Some(section) = graph.section(&id) else {
                continue;
            };
            if !section.tier().is_governance() {
                continue;
            }
            for constraint in self.compile(section, extractor)? {
                set.insert(constraint)?;
            }
            set.record_source(id, section.version());
        }
        tracing::debug!(
            "constraint set ready: {} rules across {} sources",
            set.len(),
            set.sources().count()
        );
        Ok(set)
    }

    /// Drop all cached compilations
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }
}

fn instantiate(
    template: &RuleTemplate,
    section: &Section,
    extractor: &dyn TermExtractor,
) -> Result<Constraint, CompilationError> {
    let rule = match &template.kind {
        TemplateKind::EnumeratedSet => {
            let mut allowed: BTreeSet<String> = section
                .content()
                .labels
                .iter()
                .map(|label| label.to_lowercase())
                .collect();
            allowed.extend(
                extractor
                    .extract_terms(&section.content().body)
                    .into_iter()
                    .map(|term| term.to_lowercase()),
            );
            if allowed.is_empty() {
                return Err(CompilationError::EmptyTermSet {
                    source: section.id().clone(),
                });
            }
            ConstraintRule::EnumeratedSet { allowed }
        }
        TemplateKind::NumericCeiling { figure } => {
            let limit = section
                .content()
                .figure(figure)
                .or_else(|| recover_figure(&section.content().body, figure))
                .ok_or_else(|| CompilationError::MissingFigure {
                    source: section.id().clone(),
                    figure: figure.clone(),
                })?;
            ConstraintRule::NumericCeiling {
                figure: figure.clone(),
                limit,
            }
        }
        TemplateKind::RequiredTerm => {
            let terms: BTreeSet<String> = extractor
                .extract_terms(&section.content().body)
                .into_iter()
                .map(|term| term.to_lowercase())
                .collect();
            if terms.is_empty() {
                return Err(CompilationError::EmptyTermSet {
                    source: section.id().clone(),
                });
            }
            ConstraintRule::RequiredTerm { terms }
        }
        TemplateKind::SemanticAlignment { threshold } => {
            if !(0.0..=1.0).contains(threshold) {
                return Err(CompilationError::ThresholdOutOfRange {
                    source: section.id().clone(),
                    threshold: *threshold,
                });
            }
            ConstraintRule::SemanticAlignment {
                threshold: *threshold,
            }
        }
    };

    Ok(Constraint {
        id: ConstraintId::derived(section.id(), &template.kind.slug()),
        source: section.id().clone(),
        source_version: section.version(),
        applies_to: template.scope.clone(),
        severity: template.severity,
        rule,
    })
}

/// Recover a named figure from body text: the first number after the figure
/// name, matched case-insensitively, with `,` and `_` grouping stripped.
fn recover_figure(body: &str, figure: &str) -> Option<f64> {
    let lower = body.to_lowercase();
    let at = lower.find(&figure.to_lowercase())?;
    let found = NUMBER.as_ref()?.find(&lower[at..])?;
    let digits: String = found
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}
