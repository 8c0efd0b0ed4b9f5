//! Scripted layer and page for unit tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use autoforms_protocols::driver::{Locator, LocatorQuery, Page};
use autoforms_protocols::error::{DriverError, LayerError};
use autoforms_protocols::layer::Layer;
use autoforms_protocols::types::{
    ActionError, ActionErrorKind, ActionResult, FieldMatch, FormField, LayerTier, MatchMethod,
    Observation, PlannedAction, UserData, Verification,
};

/// Pops the front entry, repeating the last one.
fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

pub struct ScriptedLayer {
    tier: LayerTier,
    name: String,
    cost: f64,
    observations: Mutex<VecDeque<Observation>>,
    matches: Mutex<HashMap<String, (String, f64)>>,
    exec: Mutex<HashMap<String, VecDeque<Result<(), ActionErrorKind>>>>,
    verify: Mutex<HashMap<String, VecDeque<bool>>>,
    advance: Option<bool>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLayer {
    pub fn new(tier: LayerTier, cost: f64) -> Self {
        Self {
            tier,
            name: tier.as_str().to_string(),
            cost,
            observations: Mutex::new(VecDeque::new()),
            matches: Mutex::new(HashMap::new()),
            exec: Mutex::new(HashMap::new()),
            verify: Mutex::new(HashMap::new()),
            advance: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn observing(self, observation: Observation) -> Self {
        self.observations.lock().push_back(observation);
        self
    }

    /// Match `field_id` to the user-data key `key` with `confidence`.
    pub fn matching(self, field_id: &str, key: &str, confidence: f64) -> Self {
        self.matches
            .lock()
            .insert(field_id.to_string(), (key.to_string(), confidence));
        self
    }

    pub fn executing(self, field_id: &str, results: Vec<Result<(), ActionErrorKind>>) -> Self {
        self.exec
            .lock()
            .insert(field_id.to_string(), results.into());
        self
    }

    pub fn verifying(self, field_id: &str, results: Vec<bool>) -> Self {
        self.verify
            .lock()
            .insert(field_id.to_string(), results.into());
        self
    }

    pub fn advancing(mut self, advanced: bool) -> Self {
        self.advance = Some(advanced);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Layer for ScriptedLayer {
    fn tier(&self) -> LayerTier {
        self.tier
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> f64 {
        self.cost
    }

    async fn observe(&self) -> Result<Observation, LayerError> {
        self.calls.lock().push("observe".to_string());
        next(&mut self.observations.lock())
            .ok_or_else(|| LayerError::Unsupported("observe".to_string()))
    }

    async fn process(
        &self,
        fields: &[FormField],
        data: &UserData,
    ) -> Result<Vec<FieldMatch>, LayerError> {
        let ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        self.calls.lock().push(format!("process {}", ids.join(",")));
        let matches = self.matches.lock();
        Ok(fields
            .iter()
            .filter_map(|field| {
                let (key, confidence) = matches.get(&field.id)?;
                let value = data.get(key)?;
                Some(FieldMatch {
                    field: field.clone(),
                    data_key: key.clone(),
                    value: value.clone(),
                    confidence: *confidence,
                    method: MatchMethod::Inferred,
                    tier: self.tier,
                })
            })
            .collect())
    }

    async fn execute(&self, actions: &[PlannedAction]) -> Result<Vec<ActionResult>, LayerError> {
        let mut exec = self.exec.lock();
        let mut out = Vec::new();
        for action in actions {
            self.calls.lock().push(format!("execute {}", action.field.id));
            let scripted = exec
                .get_mut(&action.field.id)
                .and_then(next)
                .unwrap_or(Ok(()));
            out.push(match scripted {
                Ok(()) => ActionResult::ok(&action.id),
                Err(kind) => ActionResult::failed(&action.id, ActionError::new(kind, "scripted")),
            });
        }
        Ok(out)
    }

    async fn review(
        &self,
        actions: &[PlannedAction],
        results: &[ActionResult],
    ) -> Result<Vec<Verification>, LayerError> {
        let mut verify = self.verify.lock();
        let mut out = Vec::new();
        for action in actions {
            self.calls.lock().push(format!("review {}", action.field.id));
            let executed = results
                .iter()
                .any(|r| r.action_id == action.id && r.success);
            let scripted = verify
                .get_mut(&action.field.id)
                .and_then(next)
                .unwrap_or(true);
            out.push(Verification {
                action_id: action.id.clone(),
                verified: executed && scripted,
                reason: None,
            });
        }
        Ok(out)
    }

    async fn advance(&self) -> Result<bool, LayerError> {
        self.calls.lock().push("advance".to_string());
        match self.advance {
            Some(advanced) => Ok(advanced),
            None => Ok(false),
        }
    }
}

pub fn field(id: &str, label: &str, section: Option<&str>) -> FormField {
    let mut f = FormField::new(
        id,
        autoforms_protocols::types::FieldType::Text,
        label,
    );
    f.locator = autoforms_protocols::types::LocatorDescriptor::default().with_id(id);
    f.section = section.map(str::to_string);
    f
}

/// Page with scripted URLs, evaluate results and present elements.
#[derive(Clone, Default)]
pub struct FormPage {
    state: std::sync::Arc<Mutex<FormPageState>>,
}

#[derive(Default)]
struct FormPageState {
    urls: VecDeque<String>,
    evaluations: VecDeque<serde_json::Value>,
    evaluate_args: Vec<serde_json::Value>,
    present: std::collections::HashSet<LocatorQuery>,
    failing: HashMap<LocatorQuery, DriverError>,
    log: Vec<String>,
}

impl FormPage {
    /// URLs returned by successive `url()` calls; the last repeats.
    pub fn with_urls(urls: &[&str]) -> Self {
        let page = Self::default();
        page.state.lock().urls = urls.iter().map(|u| u.to_string()).collect();
        page
    }

    pub fn present(self, query: LocatorQuery) -> Self {
        self.state.lock().present.insert(query);
        self
    }

    pub fn failing(self, query: LocatorQuery, error: DriverError) -> Self {
        self.state.lock().present.insert(query.clone());
        self.state.lock().failing.insert(query, error);
        self
    }

    pub fn push_evaluate(&self, value: serde_json::Value) {
        self.state.lock().evaluations.push_back(value);
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Arguments of every `evaluate` call, in order.
    pub fn evaluate_args(&self) -> Vec<serde_json::Value> {
        self.state.lock().evaluate_args.clone()
    }
}

struct FormLocator {
    state: std::sync::Arc<Mutex<FormPageState>>,
    query: LocatorQuery,
}

impl FormLocator {
    fn act(&self, entry: String) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if let Some(err) = state.failing.get(&self.query) {
            return Err(err.clone());
        }
        state.log.push(entry);
        Ok(())
    }

    fn label(&self) -> String {
        format!("{:?}", self.query)
    }
}

#[async_trait]
impl Locator for FormLocator {
    async fn count(&self) -> Result<usize, DriverError> {
        Ok(usize::from(self.state.lock().present.contains(&self.query)))
    }

    fn first(&self) -> std::sync::Arc<dyn Locator> {
        std::sync::Arc::new(FormLocator {
            state: self.state.clone(),
            query: self.query.clone(),
        })
    }

    async fn click(&self) -> Result<(), DriverError> {
        self.act(format!("click {}", self.label()))
    }

    async fn fill(&self, value: &str) -> Result<(), DriverError> {
        self.act(format!("fill {} {}", self.label(), value))
    }

    async fn select_option(&self, value: &str) -> Result<(), DriverError> {
        self.act(format!("select {} {}", self.label(), value))
    }

    async fn check(&self) -> Result<(), DriverError> {
        self.act(format!("check {}", self.label()))
    }

    async fn uncheck(&self) -> Result<(), DriverError> {
        self.act(format!("uncheck {}", self.label()))
    }

    async fn hover(&self) -> Result<(), DriverError> {
        self.act(format!("hover {}", self.label()))
    }

    async fn press(&self, key: &str) -> Result<(), DriverError> {
        self.act(format!("press {} {}", self.label(), key))
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        self.act(format!("scroll {}", self.label()))
    }
}

#[async_trait]
impl Page for FormPage {
    async fn url(&self) -> Result<String, DriverError> {
        Ok(next(&mut self.state.lock().urls).unwrap_or_default())
    }

    async fn evaluate(
        &self,
        _script: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, DriverError> {
        let mut state = self.state.lock();
        state.evaluate_args.push(args);
        Ok(state
            .evaluations
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.state.lock().log.push(format!("goto {}", url));
        Ok(())
    }

    fn locate(&self, query: &LocatorQuery) -> std::sync::Arc<dyn Locator> {
        std::sync::Arc::new(FormLocator {
            state: self.state.clone(),
            query: query.clone(),
        })
    }
}
