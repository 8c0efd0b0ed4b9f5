use super::*;
use crate::test_support::{FormPage, ScriptedLayer, field};
use autoforms_protocols::driver::LocatorQuery;
use autoforms_protocols::types::{ActionErrorKind, LayerTier, PageButton};

const NEXT_BUTTON: &str = "bottom-navigation-next-button";

fn observation(fields: Vec<FormField>, buttons: &[&str]) -> Observation {
    Observation {
        url: "https://jobs.example.com/apply".to_string(),
        fields,
        buttons: buttons
            .iter()
            .map(|text| PageButton {
                text: text.to_string(),
                locator: Default::default(),
            })
            .collect(),
        blocker: None,
    }
}

fn filled(mut f: FormField, value: &str) -> FormField {
    f.current_value = Some(value.to_string());
    f
}

fn data() -> UserData {
    UserData::from([
        ("email".to_string(), "jane@example.com".to_string()),
        ("first_name".to_string(), "Jane".to_string()),
        ("motivation".to_string(), "I like forms".to_string()),
    ])
}

fn config() -> OrchestratorConfig {
    OrchestratorConfig::default()
}

fn orchestrator(layers: Vec<Arc<dyn Layer>>, config: OrchestratorConfig) -> SectionOrchestrator {
    SectionOrchestrator::new(
        LayerStack::new(layers).unwrap(),
        config,
        LocatorResolver::default(),
    )
}

#[tokio::test]
async fn test_single_page_completes() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(
                vec![
                    field("email", "Email", Some("Contact")),
                    filled(field("first_name", "First name", Some("Contact")), "Jane"),
                ],
                &["Submit"],
            ))
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    let report = orchestrator(vec![dom.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(report.stop, StopReason::Completed);
    assert!(report.is_success());
    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.actions_executed, 1);
    assert_eq!(report.trace.len(), 1);
    assert_eq!(report.trace[0].dom.value.as_deref(), Some("jane@example.com"));
    assert_eq!(
        dom.calls(),
        vec!["observe", "process email", "execute email", "review email", "observe"]
    );
    assert!(page.log().is_empty());
}

#[tokio::test]
async fn test_blocker_returns_without_acting() {
    let mut obs = observation(vec![field("email", "Email", None)], &["Next"]);
    obs.blocker = Some(Blocker::Captcha);
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(obs)
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]).present(LocatorQuery::TestId(NEXT_BUTTON.to_string()));

    let report = orchestrator(vec![dom.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(report.stop, StopReason::Blocked(Blocker::Captcha));
    assert!(!report.is_success());
    assert_eq!(dom.calls(), vec!["observe"]);
    assert!(page.log().is_empty());
}

#[tokio::test]
async fn test_filled_sections_skipped() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(
                vec![
                    filled(field("first_name", "First name", Some("Personal")), "Jane"),
                    field("email", "Email", Some("Contact")),
                ],
                &["Submit"],
            ))
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    orchestrator(vec![dom.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(dom.count("process"), 1);
    assert!(dom.calls().contains(&"process email".to_string()));
}

#[tokio::test]
async fn test_only_unmatched_fields_escalate_to_matcher() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(
                vec![
                    field("email", "Email", None),
                    field("why", "Why do you want this job?", None),
                ],
                &["Submit"],
            ))
            .matching("email", "email", 0.95),
    );
    let llm = Arc::new(
        ScriptedLayer::new(LayerTier::Language, 0.01)
            .matching("email", "first_name", 0.9)
            .matching("why", "motivation", 0.65),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    let report = orchestrator(vec![dom.clone(), llm.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(dom.calls()[1], "process email,why");
    assert_eq!(llm.count("process"), 1);
    assert!(llm.calls().contains(&"process why".to_string()));
    assert_eq!(report.trace.len(), 2);
    assert_eq!(report.trace[0].dom.value.as_deref(), Some("jane@example.com"));
    assert_eq!(report.trace[0].tier, LayerTier::Structural);
    assert_eq!(report.trace[1].dom.value.as_deref(), Some("I like forms"));
    assert_eq!(report.trace[1].tier, LayerTier::Language);
    assert_eq!(llm.count("execute"), 1);
}

#[tokio::test]
async fn test_revealed_fields_are_processed() {
    let first = observation(vec![field("visa", "Need a visa?", None)], &["Next"]);
    let second = observation(
        vec![
            filled(field("visa", "Need a visa?", None), "yes"),
            field("email", "Email", None),
        ],
        &["Submit"],
    );
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(first)
            .observing(second)
            .matching("visa", "first_name", 0.9)
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    let report = orchestrator(vec![dom.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(dom.count("execute"), 2);
    assert!(dom.calls().contains(&"process email".to_string()));
    assert_eq!(dom.count("observe"), 3);
}

#[tokio::test]
async fn test_failed_actions_are_traced_and_reported() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![field("email", "Email", None)], &["Submit"]))
            .matching("email", "email", 0.95)
            .executing("email", vec![Err(ActionErrorKind::ElementNotFound)]),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    let report = orchestrator(vec![dom], config()).run(&page, &data()).await;

    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(report.actions_failed, 1);
    assert!(!report.trace[0].success);
    assert!(!report.is_success());
    assert_eq!(
        report.failures,
        vec!["All layers exhausted for field 'Email'".to_string()]
    );
}

#[tokio::test]
async fn test_multi_page_navigation() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![field("email", "Email", None)], &["Next"]))
            .observing(observation(vec![filled(field("email", "Email", None), "x")], &["Next"]))
            .observing(observation(vec![], &["Submit application"]))
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["https://a.example.com/1", "https://a.example.com/2"])
        .present(LocatorQuery::TestId(NEXT_BUTTON.to_string()));

    let report = orchestrator(vec![dom.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(report.pages_processed, 2);
    assert_eq!(dom.count("advance"), 1);
    assert_eq!(page.log().len(), 1);
    assert!(page.log()[0].starts_with("click TestId"));
}

#[tokio::test]
async fn test_layer_advance_preferred() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![], &["Next"]))
            .observing(observation(vec![], &["Submit"])),
    );
    let vision = Arc::new(ScriptedLayer::new(LayerTier::Vision, 0.05).advancing(true));
    let page = FormPage::with_urls(&["https://a.example.com/1", "https://a.example.com/2"])
        .present(LocatorQuery::TestId(NEXT_BUTTON.to_string()));

    let report = orchestrator(vec![dom, vision.clone()], config())
        .run(&page, &data())
        .await;

    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(vision.count("advance"), 1);
    assert!(page.log().is_empty());
}

#[tokio::test]
async fn test_no_navigation_ends_flow() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![], &["Next"])),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    let report = orchestrator(vec![dom], config()).run(&page, &data()).await;

    assert_eq!(report.stop, StopReason::NoNavigation);
    assert!(report.is_success());
}

#[tokio::test]
async fn test_stuck_on_unchanged_url() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![], &["Next"])),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"])
        .present(LocatorQuery::TestId(NEXT_BUTTON.to_string()));

    let report = orchestrator(vec![dom], config()).run(&page, &data()).await;

    assert_eq!(report.stop, StopReason::Stuck);
    assert_eq!(report.pages_processed, 3);
    assert!(report.error.unwrap().contains("https://jobs.example.com/apply"));
}

#[tokio::test]
async fn test_page_limit() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![], &["Next"])),
    );
    let page = FormPage::with_urls(&[
        "https://a.example.com/1",
        "https://a.example.com/2",
        "https://a.example.com/3",
        "https://a.example.com/4",
    ])
    .present(LocatorQuery::TestId(NEXT_BUTTON.to_string()));
    let config = OrchestratorConfig {
        max_pages: 3,
        ..config()
    };

    let report = orchestrator(vec![dom], config).run(&page, &data()).await;

    assert_eq!(report.stop, StopReason::PageLimit);
    assert_eq!(report.pages_processed, 3);
}

#[tokio::test]
async fn test_budget_checked_before_each_page() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![field("email", "Email", None)], &["Next"]))
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["https://a.example.com/1", "https://a.example.com/2"])
        .present(LocatorQuery::TestId(NEXT_BUTTON.to_string()));
    let config = OrchestratorConfig {
        max_layer_calls: 3,
        ..config()
    };

    let report = orchestrator(vec![dom], config).run(&page, &data()).await;

    assert_eq!(report.stop, StopReason::BudgetExhausted);
    assert_eq!(report.pages_processed, 1);
    assert!(report.error.unwrap().starts_with("Budget exhausted"));
}

#[tokio::test]
async fn test_observation_failure_stops_run() {
    let dom = Arc::new(ScriptedLayer::new(LayerTier::Structural, 0.0));
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);

    let report = orchestrator(vec![dom], config()).run(&page, &data()).await;

    assert_eq!(report.stop, StopReason::Error);
    assert!(report.error.unwrap().contains("structural"));
}

#[tokio::test]
async fn test_assisted_executor_navigates_to_target() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![field("email", "Email", None)], &["Submit"]))
            .matching("email", "email", 0.95),
    );
    let page = FormPage::with_urls(&["about:blank", "https://jobs.example.com/apply"]);
    let job = Job::new("job-1", "apply", "https://jobs.example.com/apply").with_user_data(data());

    let orchestrator = orchestrator(vec![dom], config());
    let report = AssistedExecutor::run(&orchestrator, &page, &job).await;

    assert!(report.success);
    assert_eq!(report.actions_executed, 1);
    assert_eq!(report.trace.len(), 1);
    assert!(report.error.is_none());
    assert_eq!(page.log(), vec!["goto https://jobs.example.com/apply".to_string()]);
}

#[tokio::test]
async fn test_assisted_report_aggregates_failures() {
    let dom = Arc::new(
        ScriptedLayer::new(LayerTier::Structural, 0.0)
            .observing(observation(vec![field("email", "Email", None)], &["Next"]))
            .matching("email", "email", 0.95)
            .verifying("email", vec![false]),
    );
    let page = FormPage::with_urls(&["https://jobs.example.com/apply"]);
    let job = Job::new("job-2", "apply", "https://jobs.example.com/apply").with_user_data(data());

    let orchestrator = orchestrator(vec![dom], config());
    let report = AssistedExecutor::run(&orchestrator, &page, &job).await;

    assert!(!report.success);
    assert_eq!(report.actions_failed, 1);
    assert_eq!(
        report.error.as_deref(),
        Some("All layers exhausted for field 'Email'")
    );
}
