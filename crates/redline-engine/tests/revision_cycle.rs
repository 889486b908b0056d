//! End-to-end revision cycles through the engine facade and driver

use redline_constraint::{ConstraintScope, RuleTemplate, Severity, TemplateSet};
use redline_engine::{
    AgentError, EngineConfig, EngineError, Regenerator, ReviewVerdict, RevisionDriver,
    RevisionEngine,
};
use redline_graph::GraphSnapshot;
use redline_model::{
    ConstraintId, DependencyKind, Edge, GovernanceTier, Section, SectionContent, SectionId,
};
use redline_ripple::{ChangeSummary, RelativeDeltaTolerance, SectionChange};
use redline_test_utils::{program_graph, KeywordExtractor, SteadySimilarity};
use std::collections::BTreeSet;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Regenerations claim `total` at a fixed value; reviews always approve.
struct ScriptedAgent {
    total: f64,
}

#[async_trait::async_trait]
impl Regenerator for ScriptedAgent {
    async fn regenerate(
        &self,
        section: &Section,
        _gating: &[ConstraintId],
    ) -> Result<SectionContent, AgentError> {
        Ok(SectionContent::text(format!("fresh {}", section.id()))
            .with_figure("total", self.total))
    }

    async fn review(&self, _section: &Section) -> Result<ReviewVerdict, AgentError> {
        Ok(ReviewVerdict::Approved)
    }
}

fn engine_with_ceiling() -> RevisionEngine {
    let mut templates = TemplateSet::new();
    templates.declare(
        "mandate",
        RuleTemplate::numeric_ceiling("total", ConstraintScope::Descendants, Severity::Hard),
    );
    RevisionEngine::new(EngineConfig::default()).with_templates(templates)
}

/// The accepted edit the fixture graph already carries: 30M -> 34M.
fn budget_edit() -> SectionChange {
    SectionChange::new(
        "budget",
        ChangeSummary::between(
            &SectionContent::text("allocation plan").with_figure("total", 30_000_000.0),
            &SectionContent::text("allocation plan, revised").with_figure("total", 34_000_000.0),
        ),
    )
}

#[tokio::test]
async fn budget_edit_ripples_to_a_stable_document() {
    init_tracing();
    let driver = RevisionDriver::new(
        engine_with_ceiling(),
        Arc::new(ScriptedAgent { total: 10_000_000.0 }),
    );

    let outcome = driver
        .run_cycle(
            program_graph(),
            vec![budget_edit()],
            &RelativeDeltaTolerance::new(0.10),
            &SteadySimilarity::default(),
            &KeywordExtractor,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.rounds, 1);
    assert_eq!(
        outcome.report.regenerated,
        vec![
            SectionId::new("capex"),
            SectionId::new("opex"),
            SectionId::new("summary"),
        ]
    );
    assert!(outcome.report.reviewed.is_empty());

    // The 13% budget move crosses the 10% tolerance, and the regenerated
    // details moved even further, so both governance ancestors are flagged.
    let expected: BTreeSet<SectionId> =
        [SectionId::new("mandate"), SectionId::new("budget")].into();
    assert_eq!(outcome.report.backward_review, expected);
    let cousins: BTreeSet<SectionId> = [SectionId::new("contingency")].into();
    assert_eq!(outcome.report.lateral_check, cousins);

    for id in ["capex", "opex", "summary"] {
        let section = outcome.graph.section(&SectionId::new(id)).unwrap();
        assert_eq!(section.content().body, format!("fresh {id}"));
        assert_eq!(section.version(), 2);
    }
    assert_eq!(outcome.graph.version_of(&SectionId::new("budget")), Some(1));
    assert_eq!(outcome.constraints.len(), 1);
}

#[tokio::test]
async fn overdrawn_regenerations_escalate_with_diagnostics() {
    init_tracing();
    let driver = RevisionDriver::new(
        engine_with_ceiling(),
        Arc::new(ScriptedAgent { total: 60_000_000.0 }),
    );

    let err = driver
        .run_cycle(
            program_graph(),
            vec![budget_edit()],
            &RelativeDeltaTolerance::new(0.10),
            &SteadySimilarity::default(),
            &KeywordExtractor,
        )
        .await
        .unwrap_err();

    let EngineError::Escalated { escalation } = err else {
        panic!("expected escalation, got {err}");
    };
    assert_eq!(escalation.rounds_completed, 1);

    let blocked_ids: Vec<SectionId> = escalation
        .blocked
        .iter()
        .map(|section| section.id.clone())
        .collect();
    assert_eq!(blocked_ids, vec![SectionId::new("capex"), SectionId::new("opex")]);
    let ceiling = ConstraintId::derived(&SectionId::new("mandate"), "ceiling.total");
    assert!(escalation.blocked.iter().all(|section| section.gating.contains(&ceiling)));

    assert_eq!(escalation.unresolved, vec![SectionId::new("summary")]);
    assert!(escalation
        .suggested_actions
        .iter()
        .any(|action| action.contains("hard constraint")));
}

#[tokio::test]
async fn outcome_survives_a_snapshot_round_trip() {
    init_tracing();
    let driver = RevisionDriver::new(
        engine_with_ceiling(),
        Arc::new(ScriptedAgent { total: 10_000_000.0 }),
    );

    let outcome = driver
        .run_cycle(
            program_graph(),
            vec![budget_edit()],
            &RelativeDeltaTolerance::new(0.10),
            &SteadySimilarity::default(),
            &KeywordExtractor,
        )
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("document.json");
    let snapshot = GraphSnapshot::capture(&outcome.graph);
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();

    let loaded: GraphSnapshot =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let restored = loaded.restore().unwrap();

    assert_eq!(restored.structural_digest(), outcome.graph.structural_digest());
    assert_eq!(restored.version_of(&SectionId::new("capex")), Some(2));
}

#[test]
fn facade_builds_graphs_and_rejects_cycles() {
    let engine = RevisionEngine::default();
    let graph = engine
        .build_graph(
            [
                Section::new("a", GovernanceTier::Reviewable, SectionContent::text("a")),
                Section::new("b", GovernanceTier::Generated, SectionContent::text("b")),
            ],
            [Edge::new("a", "b", DependencyKind::DerivesFrom)],
        )
        .unwrap();
    assert_eq!(graph.len(), 2);

    let err = engine
        .build_graph(
            [
                Section::new("a", GovernanceTier::Reviewable, SectionContent::text("a")),
                Section::new("b", GovernanceTier::Generated, SectionContent::text("b")),
            ],
            [
                Edge::new("a", "b", DependencyKind::DerivesFrom),
                Edge::new("b", "a", DependencyKind::DerivesFrom),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Graph(_)));
}

#[test]
fn config_loads_from_a_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.yaml");
    std::fs::write(&path, "threshold: 0.75\nmax_cycles: 3\n").unwrap();

    let config = EngineConfig::from_yaml_file(&path).unwrap();
    assert!((config.threshold - 0.75).abs() < f64::EPSILON);
    assert_eq!(config.max_cycles, 3);
    assert_eq!(config.match_budget_ms, redline_engine::DEFAULT_MATCH_BUDGET_MS);

    let missing = EngineConfig::from_yaml_file(dir.path().join("absent.yaml"));
    assert!(matches!(missing, Err(EngineError::ConfigIo(_))));
}
