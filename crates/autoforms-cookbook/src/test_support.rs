//! Scripted in-memory page for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use autoforms_protocols::driver::{Locator, LocatorQuery, Page};
use autoforms_protocols::error::DriverError;

#[derive(Default)]
struct FakeState {
    url: String,
    /// Scripted `count()` results; the last entry repeats.
    counts: HashMap<LocatorQuery, VecDeque<Result<usize, DriverError>>>,
    count_calls: HashMap<LocatorQuery, usize>,
    action_errors: HashMap<LocatorQuery, DriverError>,
    evaluate_results: VecDeque<Result<Value, DriverError>>,
    goto_error: Option<DriverError>,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let page = Self::default();
        page.state.lock().url = url.to_string();
        page
    }

    /// Make `query` match `n` elements.
    pub fn with_count(self, query: LocatorQuery, n: usize) -> Self {
        self.script_counts(query, vec![Ok(n)])
    }

    pub fn script_counts(
        self,
        query: LocatorQuery,
        results: Vec<Result<usize, DriverError>>,
    ) -> Self {
        self.state.lock().counts.insert(query, results.into());
        self
    }

    pub fn fail_action(self, query: LocatorQuery, error: DriverError) -> Self {
        self.state.lock().action_errors.insert(query, error);
        self
    }

    pub fn push_evaluate(&self, result: Result<Value, DriverError>) {
        self.state.lock().evaluate_results.push_back(result);
    }

    pub fn fail_goto(self, error: DriverError) -> Self {
        self.state.lock().goto_error = Some(error);
        self
    }

    pub fn count_calls(&self, query: &LocatorQuery) -> usize {
        self.state.lock().count_calls.get(query).copied().unwrap_or(0)
    }

    /// Action log, e.g. `fill css=#email jane@example.com`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn current_url(&self) -> String {
        self.state.lock().url.clone()
    }
}

pub fn describe(query: &LocatorQuery) -> String {
    match query {
        LocatorQuery::TestId(v) => format!("testId={}", v),
        LocatorQuery::Role { role, name } => match name {
            Some(n) => format!("role={}:{}", role, n),
            None => format!("role={}", role),
        },
        LocatorQuery::AriaLabel(v) => format!("ariaLabel={}", v),
        LocatorQuery::Name(v) => format!("name={}", v),
        LocatorQuery::Id(v) => format!("id={}", v),
        LocatorQuery::Text(v) => format!("text={}", v),
        LocatorQuery::Css(v) => format!("css={}", v),
        LocatorQuery::Xpath(v) => format!("xpath={}", v),
    }
}

struct FakeLocator {
    state: Arc<Mutex<FakeState>>,
    query: LocatorQuery,
}

impl FakeLocator {
    fn act(&self, verb: &str, arg: Option<&str>) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if let Some(err) = state.action_errors.get(&self.query) {
            return Err(err.clone());
        }
        let entry = match arg {
            Some(a) => format!("{} {} {}", verb, describe(&self.query), a),
            None => format!("{} {}", verb, describe(&self.query)),
        };
        state.calls.push(entry);
        Ok(())
    }
}

#[async_trait]
impl Locator for FakeLocator {
    async fn count(&self) -> Result<usize, DriverError> {
        let mut state = self.state.lock();
        *state.count_calls.entry(self.query.clone()).or_default() += 1;
        match state.counts.get_mut(&self.query) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(0)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(0)),
            None => Ok(0),
        }
    }

    fn first(&self) -> Arc<dyn Locator> {
        Arc::new(FakeLocator {
            state: self.state.clone(),
            query: self.query.clone(),
        })
    }

    async fn click(&self) -> Result<(), DriverError> {
        self.act("click", None)
    }

    async fn fill(&self, value: &str) -> Result<(), DriverError> {
        self.act("fill", Some(value))
    }

    async fn select_option(&self, value: &str) -> Result<(), DriverError> {
        self.act("select", Some(value))
    }

    async fn check(&self) -> Result<(), DriverError> {
        self.act("check", None)
    }

    async fn uncheck(&self) -> Result<(), DriverError> {
        self.act("uncheck", None)
    }

    async fn hover(&self) -> Result<(), DriverError> {
        self.act("hover", None)
    }

    async fn press(&self, key: &str) -> Result<(), DriverError> {
        self.act("press", Some(key))
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        self.act("scroll", None)
    }
}

#[async_trait]
impl Page for FakePage {
    async fn url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().url.clone())
    }

    async fn evaluate(&self, _script: &str, _args: Value) -> Result<Value, DriverError> {
        self.state
            .lock()
            .evaluate_results
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if let Some(err) = &state.goto_error {
            return Err(err.clone());
        }
        state.calls.push(format!("goto {}", url));
        state.url = url.to_string();
        Ok(())
    }

    fn locate(&self, query: &LocatorQuery) -> Arc<dyn Locator> {
        Arc::new(FakeLocator {
            state: self.state.clone(),
            query: query.clone(),
        })
    }
}
