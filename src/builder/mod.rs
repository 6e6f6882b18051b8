//! Syntax tree to AST.
//!
//! One pass over the tree: block children are split into agents and
//! statements, agents get their ids, durations become milliseconds, strings
//! become interpolated strings and option lists are flattened into records.

pub mod id;
pub mod interpolation;

pub use id::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};

use std::collections::{BTreeMap, HashSet};

use tracing::{instrument, warn};

use self::interpolation::{interpolated, string_expression};
use crate::analyzer::core::Pos;
use crate::analyzer::syntax::*;
use crate::analyzer::ParseError;
use crate::ast::{
    Agent, AnimationSpec, Event, Expression, MusicOptions, Page, Position, Statement, Story,
    TweenOptions,
};

pub struct AstBuilder<'g> {
    ids: &'g mut dyn IdGenerator,
    seen_ids: HashSet<String>,
}

#[derive(Default)]
struct Block {
    agents: Vec<Agent>,
    statements: Vec<Statement>,
    auto_advance_ms: Option<u64>,
}

#[derive(Default)]
struct AgentAttrs {
    id: Option<(Pos, String)>,
    position: Option<Position>,
    size: Option<Position>,
    color: Option<String>,
    font_size: Option<f64>,
    autoplay: Option<bool>,
    looping: Option<bool>,
    animation: Option<AnimationSpec>,
}

/// Rejects a second occurrence of the same option key.
#[derive(Default)]
struct KeySet(HashSet<&'static str>);

impl KeySet {
    fn claim(&mut self, key: &'static str, pos: Pos) -> Result<(), ParseError> {
        if self.0.insert(key) {
            Ok(())
        } else {
            Err(ParseError::at(pos, format!("duplicate '{}'", key)))
        }
    }
}

const TEXT_ATTRS: &[&str] = &["#id", "at", "color", "font_size", "animate"];
const BUTTON_ATTRS: &[&str] = &["#id", "at", "size", "color", "animate"];
const IMAGE_ATTRS: &[&str] = &["#id", "at", "size", "animate"];
const VIDEO_ATTRS: &[&str] = &["#id", "at", "size", "autoplay", "loop", "animate"];

impl<'g> AstBuilder<'g> {
    pub fn new(ids: &'g mut dyn IdGenerator) -> Self {
        Self {
            ids,
            seen_ids: HashSet::new(),
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn build(mut self, story: SyntaxStory) -> Result<Story, ParseError> {
        let mut pages: Vec<Page> = Vec::new();
        let mut statements = Vec::new();
        for Item { pos, node } in story.items {
            match node {
                Node::Page { id, items } => {
                    if pages.iter().any(|page| page.id == id) {
                        warn!(page = id, line = pos.line, "duplicate page id");
                    }
                    let block = self.block(items, true)?;
                    pages.push(Page {
                        id,
                        agents: block.agents,
                        statements: block.statements,
                        auto_advance_ms: block.auto_advance_ms,
                    });
                }
                Node::Statement(statement) => statements.push(self.statement(pos, statement)?),
                other => {
                    return Err(ParseError::at(
                        pos,
                        format!("{} is not allowed at story level", other.describe()),
                    ))
                }
            }
        }
        Ok(Story {
            title: story.title,
            pages,
            statements,
        })
    }

    fn block(&mut self, items: Vec<Item>, in_page: bool) -> Result<Block, ParseError> {
        let mut block = Block::default();
        for Item { pos, node } in items {
            match node {
                Node::AutoAdvance(duration) if in_page => {
                    if block.auto_advance_ms.replace(duration.to_millis()).is_some() {
                        return Err(ParseError::at(pos, "duplicate 'auto_advance'"));
                    }
                }
                Node::Statement(statement) => block.statements.push(self.statement(pos, statement)?),
                node if node.is_agent() => block.agents.push(self.agent(pos, node)?),
                node => {
                    return Err(ParseError::at(
                        pos,
                        format!("{} is not allowed here", node.describe()),
                    ))
                }
            }
        }
        Ok(block)
    }

    fn agents(&mut self, items: Vec<Item>) -> Result<Vec<Agent>, ParseError> {
        items
            .into_iter()
            .map(|Item { pos, node }| {
                if node.is_agent() {
                    self.agent(pos, node)
                } else {
                    Err(ParseError::at(
                        pos,
                        format!("{} is not allowed here", node.describe()),
                    ))
                }
            })
            .collect()
    }

    fn statements(&mut self, items: Vec<Item>) -> Result<Vec<Statement>, ParseError> {
        items
            .into_iter()
            .map(|Item { pos, node }| match node {
                Node::Statement(statement) => self.statement(pos, statement),
                other => Err(ParseError::at(
                    pos,
                    format!("{} is not allowed here", other.describe()),
                )),
            })
            .collect()
    }

    fn agent_id(&mut self, kind: &str, explicit: Option<(Pos, String)>) -> String {
        match explicit {
            Some((pos, id)) => {
                if !self.seen_ids.insert(id.clone()) {
                    warn!(
                        id = %id,
                        line = pos.line,
                        column = pos.column,
                        "agent id is used more than once"
                    );
                }
                id
            }
            None => {
                let id = self.ids.next_id(kind);
                if !self.seen_ids.insert(id.clone()) {
                    warn!(id = %id, "generated agent id collides with an existing id");
                }
                id
            }
        }
    }

    fn agent(&mut self, pos: Pos, node: Node) -> Result<Agent, ParseError> {
        let agent = match node {
            Node::Text { content, attrs } => {
                let attrs = self.attributes("text", attrs, TEXT_ATTRS)?;
                Agent::Text {
                    id: self.agent_id("text", attrs.id),
                    content: interpolated(&content),
                    position: attrs.position,
                    font_size: attrs.font_size,
                    color: attrs.color,
                    animation: attrs.animation,
                }
            }
            Node::Button {
                label,
                attrs,
                events,
            } => {
                let attrs = self.attributes("button", attrs, BUTTON_ATTRS)?;
                let id = self.agent_id("button", attrs.id);
                let events = events
                    .into_iter()
                    .map(|event| {
                        Ok(Event {
                            event_type: event.event_type,
                            statements: self.statements(event.body)?,
                        })
                    })
                    .collect::<Result<_, ParseError>>()?;
                Agent::Button {
                    id,
                    label: interpolated(&label),
                    position: attrs.position,
                    size: attrs.size,
                    color: attrs.color,
                    animation: attrs.animation,
                    events,
                }
            }
            Node::Image { src, attrs } => {
                let attrs = self.attributes("image", attrs, IMAGE_ATTRS)?;
                Agent::Image {
                    id: self.agent_id("image", attrs.id),
                    src,
                    position: attrs.position,
                    size: attrs.size,
                    animation: attrs.animation,
                }
            }
            Node::Video { src, attrs } => {
                let attrs = self.attributes("video", attrs, VIDEO_ATTRS)?;
                Agent::Video {
                    id: self.agent_id("video", attrs.id),
                    src,
                    position: attrs.position,
                    size: attrs.size,
                    autoplay: attrs.autoplay.unwrap_or(false),
                    looping: attrs.looping.unwrap_or(false),
                    animation: attrs.animation,
                }
            }
            Node::If {
                condition,
                then_items,
                else_items,
            } => Agent::If {
                condition: expression(condition),
                agents: self.agents(then_items)?,
                else_agents: self.agents(else_items)?,
            },
            Node::For {
                variable,
                range,
                items,
            } => Agent::For {
                variable,
                range: expression(range),
                agents: self.agents(items)?,
            },
            Node::Wait { duration, items } => {
                let block = self.block(items, false)?;
                Agent::Wait {
                    duration_ms: duration.to_millis(),
                    agents: block.agents,
                    actions: block.statements,
                }
            }
            Node::Timer {
                interval,
                repeat,
                items,
            } => Agent::Timer {
                interval_ms: interval.to_millis(),
                repeat,
                actions: self.statements(items)?,
            },
            other => {
                return Err(ParseError::at(
                    pos,
                    format!("{} is not an agent", other.describe()),
                ))
            }
        };
        Ok(agent)
    }

    fn attributes(
        &self,
        kind: &str,
        attrs: Vec<Attr>,
        allowed: &[&str],
    ) -> Result<AgentAttrs, ParseError> {
        let mut keys = KeySet::default();
        let mut out = AgentAttrs::default();
        for Attr { pos, value } in attrs {
            let key = value.key();
            if !allowed.contains(&key) {
                return Err(ParseError::at(
                    pos,
                    format!("'{}' is not an attribute of {}", key, kind),
                ));
            }
            keys.claim(key, pos)?;
            match value {
                AttrValue::Id(id) => out.id = Some((pos, id)),
                AttrValue::At(position) => out.position = Some(position),
                AttrValue::Size(size) => out.size = Some(size),
                AttrValue::Color(color) => out.color = Some(color),
                AttrValue::FontSize(size) => out.font_size = Some(size),
                AttrValue::Autoplay(autoplay) => out.autoplay = Some(autoplay),
                AttrValue::Loop(looping) => out.looping = Some(looping),
                AttrValue::Animate { kind, options } => {
                    out.animation = Some(animation_spec(kind, options)?)
                }
            }
        }
        Ok(out)
    }

    fn statement(&mut self, pos: Pos, node: StatementNode) -> Result<Statement, ParseError> {
        let statement = match node {
            StatementNode::Init { name, value } => Statement::Init {
                name,
                value: expression(value),
            },
            StatementNode::Set { name, value } => Statement::Set {
                name,
                value: expression(value),
            },
            StatementNode::Add { name, amount } => Statement::Add {
                name,
                amount: expression(amount),
            },
            StatementNode::Subtract { name, amount } => Statement::Subtract {
                name,
                amount: expression(amount),
            },
            StatementNode::GoToPage(page) => Statement::GoToPage { page },
            StatementNode::GoBack => Statement::GoBack,
            StatementNode::Move {
                target,
                x,
                y,
                options,
            } => Statement::Move {
                target,
                x: expression(x),
                y: expression(y),
                options: tween_options(options)?,
            },
            StatementNode::Tween {
                target,
                properties,
                options,
            } => {
                let mut values = BTreeMap::new();
                for Property { pos, name, value } in properties {
                    if values.contains_key(&name) {
                        return Err(ParseError::at(
                            pos,
                            format!("duplicate property '{}'", name),
                        ));
                    }
                    values.insert(name, expression(value));
                }
                Statement::Tween {
                    target,
                    properties: values,
                    options: tween_options(options)?,
                }
            }
            StatementNode::Animate {
                target,
                kind,
                options,
            } => Statement::Animate {
                target,
                animation: animation_spec(kind, options)?,
            },
            StatementNode::StopAnimation(target) => Statement::StopAnimation { target },
            StatementNode::PlaySound { src, volume } => Statement::PlaySound { src, volume },
            StatementNode::StopSound(src) => Statement::StopSound { src },
            StatementNode::StopMusic => Statement::StopMusic,
            StatementNode::Music { src, options } => Statement::Music {
                src,
                options: music_options(options)?,
            },
            StatementNode::Wait { duration, body } => Statement::Wait {
                duration_ms: duration.to_millis(),
                actions: self.statements(body)?,
            },
            StatementNode::Timer {
                interval,
                repeat,
                body,
            } => Statement::Timer {
                interval_ms: interval.to_millis(),
                repeat,
                actions: self.statements(body)?,
            },
        };
        tracing::trace!(line = pos.line, kind = statement.kind(), "built statement");
        Ok(statement)
    }
}

fn unsupported(pos: Pos, key: &str, what: &str) -> ParseError {
    ParseError::at(pos, format!("'{}' is not an option of {}", key, what))
}

fn animation_spec(kind: String, options: Vec<Opt>) -> Result<AnimationSpec, ParseError> {
    let mut keys = KeySet::default();
    let mut spec = AnimationSpec {
        kind,
        duration_ms: None,
        repeat: None,
    };
    for Opt { pos, value } in options {
        keys.claim(value.key(), pos)?;
        match value {
            OptValue::Duration(duration) => spec.duration_ms = Some(duration.to_millis()),
            OptValue::Repeat(repeat) => spec.repeat = Some(repeat),
            other => return Err(unsupported(pos, other.key(), "animate")),
        }
    }
    Ok(spec)
}

fn tween_options(options: Vec<Opt>) -> Result<TweenOptions, ParseError> {
    let mut keys = KeySet::default();
    let mut out = TweenOptions::default();
    for Opt { pos, value } in options {
        keys.claim(value.key(), pos)?;
        match value {
            OptValue::Duration(duration) => out.duration_ms = Some(duration.to_millis()),
            OptValue::Easing(easing) => out.easing = Some(easing),
            other => return Err(unsupported(pos, other.key(), "move/tween")),
        }
    }
    Ok(out)
}

fn music_options(options: Vec<Opt>) -> Result<MusicOptions, ParseError> {
    let mut keys = KeySet::default();
    let mut out = MusicOptions::default();
    for Opt { pos, value } in options {
        keys.claim(value.key(), pos)?;
        match value {
            OptValue::Loop(looping) => out.looping = looping,
            OptValue::Volume(volume) => out.volume = Some(volume),
            other => return Err(unsupported(pos, other.key(), "music")),
        }
    }
    Ok(out)
}

/// Rewrites string literals into interpolated strings where they carry
/// placeholders.
fn expression(expr: Expression) -> Expression {
    match expr {
        Expression::String { value } => string_expression(value),
        Expression::BinaryOp { op, left, right } => {
            Expression::binary(op, expression(*left), expression(*right))
        }
        Expression::UnaryOp { op, operand } => Expression::unary(op, expression(*operand)),
        Expression::Range { start, end } => Expression::range(expression(*start), expression(*end)),
        Expression::Random { range } => Expression::Random {
            range: Box::new(expression(*range)),
        },
        Expression::PickOne { options } => Expression::PickOne {
            options: options.into_iter().map(expression).collect(),
        },
        other => other,
    }
}
