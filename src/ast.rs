//! # Story AST
//!
//! Plain, serializable records produced by the [`crate::builder`] and
//! consumed by the [`crate::runtime`] and by external renderers.
//!
//! Every enum is internally tagged with a `type` field written in
//! `snake_case`; multi-word fields serialize as `camelCase`. This JSON shape
//! is the contract renderers and editor tooling rely on.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// `[x, y]` in story coordinates.
pub type Position = [f64; 2];

/// Root of a parsed story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub pages: Vec<Page>,
    /// Top-level statements (initializers, music).
    pub statements: Vec<Statement>,
}

impl Story {
    pub fn page(&self, id: i64) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }

    pub fn first_page(&self) -> Option<&Page> {
        self.pages.first()
    }

    pub fn has_page(&self, id: i64) -> bool {
        self.page(id).is_some()
    }

    /// Finds a renderable agent by id anywhere in the story, including
    /// agents nested in control agents.
    pub fn find_agent(&self, id: &str) -> Option<&Agent> {
        self.pages
            .iter()
            .find_map(|page| find_agent_in(&page.agents, id))
    }

    /// Visits every statement of the story in source order: top-level
    /// statements, page statements, nested agent actions and event bodies.
    pub fn visit_statements<F>(&self, visit: &mut F)
    where
        F: FnMut(&Statement),
    {
        for statement in &self.statements {
            statement.visit(visit);
        }
        for page in &self.pages {
            for statement in &page.statements {
                statement.visit(visit);
            }
            for agent in &page.agents {
                agent.visit_statements(visit);
            }
        }
    }

    /// Visits every agent of the story, depth first.
    pub fn visit_agents<F>(&self, visit: &mut F)
    where
        F: FnMut(&Agent),
    {
        for page in &self.pages {
            for agent in &page.agents {
                agent.visit(visit);
            }
        }
    }
}

pub(crate) fn find_agent_in<'a>(agents: &'a [Agent], id: &str) -> Option<&'a Agent> {
    agents.iter().find_map(|agent| {
        if agent.id() == Some(id) {
            return Some(agent);
        }
        agent
            .children()
            .find_map(|children| find_agent_in(children, id))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub agents: Vec<Agent>,
    /// Run once when the page becomes current.
    pub statements: Vec<Statement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_advance_ms: Option<u64>,
}

impl Page {
    pub fn find_agent(&self, id: &str) -> Option<&Agent> {
        find_agent_in(&self.agents, id)
    }
}

/// Visual and control elements of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Agent {
    Text {
        id: String,
        /// Always an interpolated string.
        content: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        animation: Option<AnimationSpec>,
    },
    Button {
        id: String,
        label: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        animation: Option<AnimationSpec>,
        #[serde(default)]
        events: Vec<Event>,
    },
    Image {
        id: String,
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        animation: Option<AnimationSpec>,
    },
    Video {
        id: String,
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Position>,
        #[serde(default)]
        autoplay: bool,
        #[serde(default)]
        looping: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        animation: Option<AnimationSpec>,
    },
    If {
        condition: Expression,
        agents: Vec<Agent>,
        #[serde(default)]
        else_agents: Vec<Agent>,
    },
    For {
        variable: String,
        range: Expression,
        agents: Vec<Agent>,
    },
    Wait {
        duration_ms: u64,
        agents: Vec<Agent>,
        actions: Vec<Statement>,
    },
    Timer {
        interval_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repeat: Option<u32>,
        actions: Vec<Statement>,
    },
}

impl Agent {
    /// The id of a renderable agent; control agents have none.
    pub fn id(&self) -> Option<&str> {
        match self {
            Agent::Text { id, .. }
            | Agent::Button { id, .. }
            | Agent::Image { id, .. }
            | Agent::Video { id, .. } => Some(id),
            Agent::If { .. } | Agent::For { .. } | Agent::Wait { .. } | Agent::Timer { .. } => {
                None
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Agent::Text { .. } => "text",
            Agent::Button { .. } => "button",
            Agent::Image { .. } => "image",
            Agent::Video { .. } => "video",
            Agent::If { .. } => "if",
            Agent::For { .. } => "for",
            Agent::Wait { .. } => "wait",
            Agent::Timer { .. } => "timer",
        }
    }

    pub fn events(&self) -> &[Event] {
        match self {
            Agent::Button { events, .. } => events,
            _ => &[],
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Agent::Text { position, .. }
            | Agent::Button { position, .. }
            | Agent::Image { position, .. }
            | Agent::Video { position, .. } => *position,
            _ => None,
        }
    }

    pub fn animation(&self) -> Option<&AnimationSpec> {
        match self {
            Agent::Text { animation, .. }
            | Agent::Button { animation, .. }
            | Agent::Image { animation, .. }
            | Agent::Video { animation, .. } => animation.as_ref(),
            _ => None,
        }
    }

    /// Nested agent lists owned by control agents.
    pub fn children(&self) -> impl Iterator<Item = &[Agent]> {
        let lists: Vec<&[Agent]> = match self {
            Agent::If {
                agents,
                else_agents,
                ..
            } => vec![agents.as_slice(), else_agents.as_slice()],
            Agent::For { agents, .. } | Agent::Wait { agents, .. } => vec![agents.as_slice()],
            _ => Vec::new(),
        };
        lists.into_iter()
    }

    pub fn visit<F>(&self, visit: &mut F)
    where
        F: FnMut(&Agent),
    {
        visit(self);
        for children in self.children() {
            for child in children {
                child.visit(visit);
            }
        }
    }

    fn visit_statements<F>(&self, visit: &mut F)
    where
        F: FnMut(&Statement),
    {
        match self {
            Agent::Button { events, .. } => {
                for event in events {
                    for statement in &event.statements {
                        statement.visit(visit);
                    }
                }
            }
            Agent::Wait { actions, .. } | Agent::Timer { actions, .. } => {
                for statement in actions {
                    statement.visit(visit);
                }
            }
            _ => {}
        }
        for children in self.children() {
            for child in children {
                child.visit_statements(visit);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub statements: Vec<Statement>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    OnClick,
    OnHover,
    OnDrag,
    OnDrop,
}

/// Procedural animation request as written in source; the kind is kept as
/// text so unknown kinds surface at run time as warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweenOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicOptions {
    #[serde(default)]
    pub looping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Statement {
    Init {
        name: String,
        value: Expression,
    },
    Set {
        name: String,
        value: Expression,
    },
    Add {
        name: String,
        amount: Expression,
    },
    Subtract {
        name: String,
        amount: Expression,
    },
    GoToPage {
        page: i64,
    },
    GoBack,
    Move {
        target: String,
        x: Expression,
        y: Expression,
        #[serde(default)]
        options: TweenOptions,
    },
    Tween {
        target: String,
        properties: BTreeMap<String, Expression>,
        #[serde(default)]
        options: TweenOptions,
    },
    Animate {
        target: String,
        animation: AnimationSpec,
    },
    StopAnimation {
        target: String,
    },
    PlaySound {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<f64>,
    },
    StopSound {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },
    StopMusic,
    Music {
        src: String,
        #[serde(default)]
        options: MusicOptions,
    },
    Wait {
        duration_ms: u64,
        actions: Vec<Statement>,
    },
    Timer {
        interval_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repeat: Option<u32>,
        actions: Vec<Statement>,
    },
    /// Statement kinds this version does not know about, as found in
    /// deserialized ASTs. Skipped at run time.
    #[serde(other)]
    Unknown,
}

impl Statement {
    /// Variable written by `init`/`set`.
    pub fn declared_variable(&self) -> Option<&str> {
        match self {
            Statement::Init { name, .. } | Statement::Set { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Init { .. } => "init",
            Statement::Set { .. } => "set",
            Statement::Add { .. } => "add",
            Statement::Subtract { .. } => "subtract",
            Statement::GoToPage { .. } => "go_to_page",
            Statement::GoBack => "go_back",
            Statement::Move { .. } => "move",
            Statement::Tween { .. } => "tween",
            Statement::Animate { .. } => "animate",
            Statement::StopAnimation { .. } => "stop_animation",
            Statement::PlaySound { .. } => "play_sound",
            Statement::StopSound { .. } => "stop_sound",
            Statement::StopMusic => "stop_music",
            Statement::Music { .. } => "music",
            Statement::Wait { .. } => "wait",
            Statement::Timer { .. } => "timer",
            Statement::Unknown => "unknown",
        }
    }

    fn visit<F>(&self, visit: &mut F)
    where
        F: FnMut(&Statement),
    {
        visit(self);
        if let Statement::Wait { actions, .. } | Statement::Timer { actions, .. } = self {
            for action in actions {
                action.visit(visit);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Expression {
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Boolean {
        value: bool,
    },
    Variable {
        name: String,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    /// Inclusive integer range `start..end`.
    Range {
        start: Box<Expression>,
        end: Box<Expression>,
    },
    Random {
        range: Box<Expression>,
    },
    PickOne {
        options: Vec<Expression>,
    },
    InterpolatedString {
        parts: Vec<StringPart>,
    },
    #[serde(other)]
    Unknown,
}

impl Expression {
    pub fn number(value: f64) -> Self {
        Expression::Number { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::String {
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Boolean { value }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable { name: name.into() }
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn range(start: Expression, end: Expression) -> Self {
        Expression::Range {
            start: Box::new(start),
            end: Box::new(end),
        }
    }
}

/// One segment of an interpolated string. Literal text serializes as a bare
/// JSON string, placeholders as `{"type": "variable", "name": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringPart {
    Text(String),
    Variable(VariableRef),
}

impl StringPart {
    pub fn text(text: impl Into<String>) -> Self {
        StringPart::Text(text.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        StringPart::Variable(VariableRef { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "variable")]
pub struct VariableRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<=")]
    LessThanEqual,
    #[serde(rename = ">=")]
    GreaterThanEqual,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Negate,
    #[serde(rename = "!")]
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOperator::Negate => f.write_str("-"),
            UnaryOperator::Not => f.write_str("!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpolated_string_json_shape() {
        let expr = Expression::InterpolatedString {
            parts: vec![StringPart::text("Hi "), StringPart::variable("name")],
        };
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "interpolated_string",
                "parts": ["Hi ", {"type": "variable", "name": "name"}]
            })
        );
        let back: Expression = serde_json::from_value(value).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn test_page_uses_camel_case_fields() {
        let page = Page {
            id: 3,
            agents: vec![],
            statements: vec![Statement::GoToPage { page: 4 }],
            auto_advance_ms: Some(5000),
        };
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["autoAdvanceMs"], json!(5000));
        assert_eq!(value["statements"][0]["type"], json!("go_to_page"));
    }

    #[test]
    fn test_unknown_kinds_deserialize_to_catch_all() {
        let statement: Statement =
            serde_json::from_value(json!({"type": "teleport", "where": 1})).unwrap();
        assert_eq!(statement, Statement::Unknown);

        let expr: Expression = serde_json::from_value(json!({"type": "matrix"})).unwrap();
        assert_eq!(expr, Expression::Unknown);
    }

    #[test]
    fn test_find_agent_descends_into_control_agents() {
        let nested = Agent::Image {
            id: "cat".to_string(),
            src: "cat.png".to_string(),
            position: None,
            size: None,
            animation: None,
        };
        let story = Story {
            title: "t".to_string(),
            pages: vec![Page {
                id: 1,
                agents: vec![Agent::If {
                    condition: Expression::boolean(true),
                    agents: vec![],
                    else_agents: vec![nested.clone()],
                }],
                statements: vec![],
                auto_advance_ms: None,
            }],
            statements: vec![],
        };
        assert_eq!(story.find_agent("cat"), Some(&nested));
        assert!(story.find_agent("dog").is_none());
    }
}
