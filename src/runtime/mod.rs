//! Story session: variables, navigation, statement execution and event
//! dispatch.
//!
//! A [`Session`] is an explicitly owned value; there is no global store.
//! Hosts drive it by calling navigation and dispatch methods, advance
//! animations through [`Session::tick`], and observe changes through
//! [`Session::subscribe`].

pub mod event;
pub mod navigation;
mod statement;

pub use event::{Listener, RuntimeEvent, Schedule};
pub use navigation::Navigation;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::animation::{AnimationEngine, NodeLookup};
use crate::ast::{Agent, EventType, Expression, Page, Position, Story};
use crate::config::{FableConfig, RuntimeConfig};
use crate::eval::{Environment, ExpressionEvaluator, Value, Variables};

/// Serializable view of the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current_page_id: Option<i64>,
    pub variables: BTreeMap<String, Value>,
    pub history: Vec<i64>,
}

pub struct Session<N: NodeLookup> {
    config: RuntimeConfig,
    story: Option<Arc<Story>>,
    variables: Variables,
    declared: HashSet<String>,
    navigation: Navigation,
    positions: HashMap<String, Position>,
    engine: AnimationEngine,
    nodes: N,
    evaluator: ExpressionEvaluator<StdRng>,
    listeners: Vec<Listener>,
}

/// Names written by `init`/`set` anywhere in the story.
pub fn declared_variables(story: &Story) -> HashSet<String> {
    let mut names = HashSet::new();
    story.visit_statements(&mut |statement| {
        if let Some(name) = statement.declared_variable() {
            names.insert(name.to_string());
        }
    });
    names
}

impl<N: NodeLookup> Session<N> {
    pub fn new(config: FableConfig, nodes: N) -> Self {
        let evaluator = match config.runtime.random_seed {
            Some(seed) => ExpressionEvaluator::seeded(seed),
            None => ExpressionEvaluator::new(),
        };
        Self {
            config: config.runtime,
            story: None,
            variables: Variables::new(),
            declared: HashSet::new(),
            navigation: Navigation::default(),
            positions: HashMap::new(),
            engine: AnimationEngine::new(config.animation),
            nodes,
            evaluator,
            listeners: Vec::new(),
        }
    }

    /// Loads a story, replacing the previous one.
    ///
    /// Declared variables are reset; undeclared ones survive when
    /// `preserve_external_vars` is set. Top-level and first-page `init`/`set`
    /// statements run, the first page becomes current, and history,
    /// recorded positions and animations are cleared.
    #[instrument(level = "debug", skip(self, story), fields(title = %story.title))]
    pub fn load(&mut self, story: Story, preserve_external_vars: bool) {
        let story = Arc::new(story);
        let declared = declared_variables(&story);

        let mut variables = Variables::new();
        if preserve_external_vars {
            for (name, value) in self.variables.iter() {
                if !declared.contains(name) {
                    variables.set(name.clone(), value.clone());
                }
            }
        }

        self.engine.stop_all(&mut self.nodes);
        self.positions.clear();
        self.variables = variables;
        self.declared = declared;
        self.story = Some(story.clone());

        let from = self.navigation.current();
        let first = story.first_page().map(|page| page.id);
        self.navigation.reset(first);
        info!(pages = story.pages.len(), first_page = ?first, "story loaded");

        let initializers = story
            .statements
            .iter()
            .chain(story.first_page().into_iter().flat_map(|page| &page.statements))
            .filter(|statement| statement.declared_variable().is_some());
        for statement in initializers {
            self.execute_statement(statement);
        }
        self.emit(RuntimeEvent::PageChanged { from, to: first });
    }

    /// [`Session::load`] with the configured preservation policy.
    pub fn open(&mut self, story: Story) {
        let preserve = self.config.preserve_external_vars;
        self.load(story, preserve);
    }

    pub fn story(&self) -> Option<&Arc<Story>> {
        self.story.as_ref()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn get_variable(&self, name: &str) -> Value {
        self.variables.get_variable(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.has_variable(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        debug!(variable = name, value = %value, "set variable");
        self.variables.set(name, value.clone());
        self.emit(RuntimeEvent::VariableChanged {
            name: name.to_string(),
            value,
        });
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Evaluates against the session variables with the session RNG.
    pub fn evaluate(&mut self, expr: &Expression) -> Value {
        self.evaluator.evaluate(expr, &self.variables)
    }

    pub fn current_page_id(&self) -> Option<i64> {
        self.navigation.current()
    }

    pub fn current_page(&self) -> Option<&Page> {
        let id = self.navigation.current()?;
        self.story.as_ref()?.page(id)
    }

    pub fn history(&self) -> &[i64] {
        self.navigation.history()
    }

    /// Page after the current one in story order, the target of
    /// `auto_advance`.
    pub fn next_page_id(&self) -> Option<i64> {
        let story = self.story.as_ref()?;
        let current = self.navigation.current()?;
        let index = story.pages.iter().position(|page| page.id == current)?;
        story.pages.get(index + 1).map(|page| page.id)
    }

    /// Returns `false` when strict navigation rejects the target.
    pub fn go_to_page(&mut self, id: i64) -> bool {
        if self.config.strict_navigation
            && !self.story.as_ref().is_some_and(|story| story.has_page(id))
        {
            warn!(page = id, "ignoring navigation to a page that does not exist");
            return false;
        }
        let from = self.navigation.current();
        self.navigation.go_to(id);
        self.emit(RuntimeEvent::PageChanged { from, to: Some(id) });
        true
    }

    /// Returns `false` when there is no history.
    pub fn go_back(&mut self) -> bool {
        match self.navigation.back() {
            Some(from) => {
                let to = self.navigation.current();
                self.emit(RuntimeEvent::PageChanged { from, to });
                true
            }
            None => false,
        }
    }

    /// Runs every statement of the current page.
    pub fn enter_page(&mut self) {
        let Some(story) = self.story.clone() else {
            return;
        };
        if let Some(page) = self
            .navigation
            .current()
            .and_then(|id| story.page(id))
        {
            self.execute_statements(&page.statements);
        }
    }

    /// Runs the first handler of `event_type` on `agent`. Returns whether
    /// one ran.
    pub fn dispatch_event(&mut self, event_type: EventType, agent: &Agent) -> bool {
        match agent
            .events()
            .iter()
            .find(|event| event.event_type == event_type)
        {
            Some(event) => {
                debug!(agent = ?agent.id(), event = %event_type, "dispatch");
                self.execute_statements(&event.statements);
                true
            }
            None => false,
        }
    }

    /// [`Session::dispatch_event`] for an agent of the current page.
    pub fn dispatch_event_by_id(&mut self, event_type: EventType, id: &str) -> bool {
        let Some(story) = self.story.clone() else {
            return false;
        };
        let agent = self
            .navigation
            .current()
            .and_then(|page| story.page(page))
            .and_then(|page| page.find_agent(id));
        match agent {
            Some(agent) => self.dispatch_event(event_type, agent),
            None => {
                debug!(id, "no such agent on the current page");
                false
            }
        }
    }

    /// Last position set by `move`, else the declared one.
    pub fn agent_position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied().or_else(|| {
            self.story
                .as_ref()
                .and_then(|story| story.find_agent(id))
                .and_then(Agent::position)
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_page_id: self.navigation.current(),
            variables: self.variables.to_sorted(),
            history: self.navigation.history().to_vec(),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&RuntimeEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: RuntimeEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Advances animations by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: f64) {
        self.engine.tick(&mut self.nodes, elapsed_ms);
    }

    pub fn animations(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn nodes(&self) -> &N {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut N {
        &mut self.nodes
    }
}
