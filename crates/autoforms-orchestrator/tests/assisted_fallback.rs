//! End-to-end: a job with no manual falls to the orchestrator, whose
//! trace is saved and replayed on the next job for the same site.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use autoforms_config::Config;
use autoforms_cookbook::{
    CookbookExecutor, ExecutionEngine, ExecutionMode, FallbackReason, LocatorResolver,
    ManualStore, MemoryManualRepository,
};
use autoforms_orchestrator::{DomLayer, LayerStack, SectionOrchestrator};
use autoforms_protocols::{DriverError, Job, Layer, Locator, LocatorQuery, Page, UserData};

// ============================================================================
// Test Helpers
// ============================================================================

const FIELDS: &[(&str, &str, &str)] = &[
    ("email", "email", "Email"),
    ("first_name", "text", "First name"),
];

/// Single-page form whose inputs keep the values filled into them.
#[derive(Clone)]
struct FormSite {
    url: String,
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl FormSite {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn value(&self, id: &str) -> Option<String> {
        self.values.lock().get(id).cloned()
    }

    fn scan(&self) -> Value {
        let values = self.values.lock();
        let fields: Vec<Value> = FIELDS
            .iter()
            .map(|(id, kind, label)| {
                json!({
                    "id": id,
                    "fieldType": kind,
                    "label": label,
                    "locator": { "id": id },
                    "currentValue": values.get(*id),
                    "section": "Personal information"
                })
            })
            .collect();
        json!({
            "url": self.url,
            "fields": fields,
            "buttons": [{ "text": "Submit application" }]
        })
    }
}

struct SiteInput {
    id: Option<String>,
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl SiteInput {
    fn unsupported(&self) -> Result<(), DriverError> {
        Err(DriverError::ActionFailed("not an input action".to_string()))
    }
}

#[async_trait]
impl Locator for SiteInput {
    async fn count(&self) -> Result<usize, DriverError> {
        Ok(usize::from(self.id.is_some()))
    }

    fn first(&self) -> Arc<dyn Locator> {
        Arc::new(SiteInput {
            id: self.id.clone(),
            values: self.values.clone(),
        })
    }

    async fn click(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn fill(&self, value: &str) -> Result<(), DriverError> {
        let id = self
            .id
            .clone()
            .ok_or_else(|| DriverError::ElementNotFound("input".to_string()))?;
        self.values.lock().insert(id, value.to_string());
        Ok(())
    }

    async fn select_option(&self, _value: &str) -> Result<(), DriverError> {
        self.unsupported()
    }

    async fn check(&self) -> Result<(), DriverError> {
        self.unsupported()
    }

    async fn uncheck(&self) -> Result<(), DriverError> {
        self.unsupported()
    }

    async fn hover(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn press(&self, _key: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[async_trait]
impl Page for FormSite {
    async fn url(&self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn evaluate(&self, _script: &str, args: Value) -> Result<Value, DriverError> {
        // Scans take no arguments; read-backs name the element.
        match args.get("id").and_then(Value::as_str) {
            None => Ok(self.scan()),
            Some(id) => Ok(json!({ "value": self.value(id) })),
        }
    }

    async fn goto(&self, _url: &str) -> Result<(), DriverError> {
        Ok(())
    }

    fn locate(&self, query: &LocatorQuery) -> Arc<dyn Locator> {
        let id = match query {
            LocatorQuery::Id(id) if FIELDS.iter().any(|(f, ..)| f == id) => Some(id.clone()),
            _ => None,
        };
        Arc::new(SiteInput {
            id,
            values: self.values.clone(),
        })
    }
}

fn engine(store: Arc<ManualStore>, site: &FormSite, config: &Config) -> ExecutionEngine {
    let resolver = LocatorResolver::new(&config.locator);
    let dom: Arc<dyn Layer> = Arc::new(DomLayer::new(Arc::new(site.clone()), resolver.clone()));
    let orchestrator = SectionOrchestrator::new(
        LayerStack::new(vec![dom]).unwrap(),
        config.orchestrator.clone(),
        resolver.clone(),
    );

    let mut executor_config = config.executor.clone();
    executor_config.settle_delay_ms = 0;
    ExecutionEngine::new(store, CookbookExecutor::new(resolver, executor_config))
        .with_assisted(Arc::new(orchestrator))
}

fn applicant(email: &str, first_name: &str) -> UserData {
    UserData::from([
        ("email".to_string(), email.to_string()),
        ("first_name".to_string(), first_name.to_string()),
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_assisted_run_seeds_manual_for_replay() {
    let config = Config::default();
    let store = Arc::new(ManualStore::new(
        Arc::new(MemoryManualRepository::new()),
        config.store.clone(),
    ));

    let first_url = "https://acme.wd5.myworkdayjobs.com/en-US/careers/job/NYC/apply";
    let first_site = FormSite::new(first_url);
    let job = Job::new("job-1", "job_application", first_url)
        .with_user_data(applicant("jane@example.com", "Jane"));

    let outcome = engine(store.clone(), &first_site, &config)
        .execute(&first_site, &job)
        .await
        .unwrap();

    assert_eq!(outcome.mode, ExecutionMode::AiAssisted);
    assert_eq!(outcome.reason, Some(FallbackReason::NoManualFound));
    assert!(outcome.success);
    assert_eq!(first_site.value("email").as_deref(), Some("jane@example.com"));
    let saved_id = outcome.saved_manual_id.unwrap();

    let saved = store.get(&saved_id).await.unwrap().unwrap();
    assert_eq!(saved.steps.len(), 2);
    assert_eq!(saved.steps[0].value.as_deref(), Some("{{email}}"));
    assert_eq!(saved.steps[1].value.as_deref(), Some("{{first_name}}"));
    assert_eq!(saved.platform.as_deref(), Some("workday"));

    // Same site, another tenant and applicant: replay instead of assist.
    let second_url = "https://globex.wd1.myworkdayjobs.com/de-DE/careers/job/NYC/apply";
    let second_site = FormSite::new(second_url);
    let job = Job::new("job-2", "job_application", second_url)
        .with_user_data(applicant("sam@example.com", "Sam"));

    let outcome = engine(store.clone(), &second_site, &config)
        .execute(&second_site, &job)
        .await
        .unwrap();

    assert_eq!(outcome.mode, ExecutionMode::Cookbook);
    assert!(outcome.success);
    assert_eq!(outcome.manual_id, Some(saved_id));
    assert_eq!(second_site.value("email").as_deref(), Some("sam@example.com"));
    assert_eq!(second_site.value("first_name").as_deref(), Some("Sam"));

    let replayed = store.get(&saved_id).await.unwrap().unwrap();
    assert_eq!(replayed.success_count, 1);
    assert_eq!(replayed.health_score, 100);
}
