//! Concrete syntax tree.
//!
//! Mirrors the source closely: option lists are kept as written (so
//! duplicates can be reported) and every node remembers where it started.
//! [`crate::builder::AstBuilder`] turns it into the public [`crate::ast`].

use crate::ast::{EventType, Expression};

use super::core::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Milliseconds,
    Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    pub amount: u64,
    pub unit: DurationUnit,
}

impl Duration {
    pub fn to_millis(self) -> u64 {
        match self.unit {
            DurationUnit::Milliseconds => self.amount,
            DurationUnit::Seconds => self.amount.saturating_mul(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxStory {
    pub title: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub pos: Pos,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Page {
        id: i64,
        items: Vec<Item>,
    },
    AutoAdvance(Duration),
    Text {
        content: String,
        attrs: Vec<Attr>,
    },
    Button {
        label: String,
        attrs: Vec<Attr>,
        events: Vec<EventNode>,
    },
    Image {
        src: String,
        attrs: Vec<Attr>,
    },
    Video {
        src: String,
        attrs: Vec<Attr>,
    },
    If {
        condition: Expression,
        then_items: Vec<Item>,
        else_items: Vec<Item>,
    },
    For {
        variable: String,
        range: Expression,
        items: Vec<Item>,
    },
    Wait {
        duration: Duration,
        items: Vec<Item>,
    },
    Timer {
        interval: Duration,
        repeat: Option<u32>,
        items: Vec<Item>,
    },
    Statement(StatementNode),
}

impl Node {
    pub fn is_agent(&self) -> bool {
        matches!(
            self,
            Node::Text { .. }
                | Node::Button { .. }
                | Node::Image { .. }
                | Node::Video { .. }
                | Node::If { .. }
                | Node::For { .. }
                | Node::Wait { .. }
                | Node::Timer { .. }
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Node::Page { .. } => "page",
            Node::AutoAdvance(_) => "auto_advance",
            Node::Text { .. } => "text",
            Node::Button { .. } => "button",
            Node::Image { .. } => "image",
            Node::Video { .. } => "video",
            Node::If { .. } => "if",
            Node::For { .. } => "for",
            Node::Wait { .. } => "wait",
            Node::Timer { .. } => "timer",
            Node::Statement(_) => "statement",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventNode {
    pub pos: Pos,
    pub event_type: EventType,
    pub body: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub pos: Pos,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Id(String),
    At([f64; 2]),
    Size([f64; 2]),
    Color(String),
    FontSize(f64),
    Autoplay(bool),
    Loop(bool),
    Animate { kind: String, options: Vec<Opt> },
}

impl AttrValue {
    pub fn key(&self) -> &'static str {
        match self {
            AttrValue::Id(_) => "#id",
            AttrValue::At(_) => "at",
            AttrValue::Size(_) => "size",
            AttrValue::Color(_) => "color",
            AttrValue::FontSize(_) => "font_size",
            AttrValue::Autoplay(_) => "autoplay",
            AttrValue::Loop(_) => "loop",
            AttrValue::Animate { .. } => "animate",
        }
    }
}

/// One `key value` option after `animate`, `move`, `tween`, `music`.
#[derive(Debug, Clone, PartialEq)]
pub struct Opt {
    pub pos: Pos,
    pub value: OptValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptValue {
    Duration(Duration),
    Repeat(i64),
    Easing(String),
    Loop(bool),
    Volume(f64),
}

impl OptValue {
    pub fn key(&self) -> &'static str {
        match self {
            OptValue::Duration(_) => "duration",
            OptValue::Repeat(_) => "repeat",
            OptValue::Easing(_) => "easing",
            OptValue::Loop(_) => "loop",
            OptValue::Volume(_) => "volume",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub pos: Pos,
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementNode {
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
    GoToPage(i64),
    GoBack,
    Move {
        target: String,
        x: Expression,
        y: Expression,
        options: Vec<Opt>,
    },
    Tween {
        target: String,
        properties: Vec<Property>,
        options: Vec<Opt>,
    },
    Animate {
        target: String,
        kind: String,
        options: Vec<Opt>,
    },
    StopAnimation(String),
    PlaySound {
        src: String,
        volume: Option<f64>,
    },
    StopSound(Option<String>),
    StopMusic,
    Music {
        src: String,
        options: Vec<Opt>,
    },
    Wait {
        duration: Duration,
        body: Vec<Item>,
    },
    Timer {
        interval: Duration,
        repeat: Option<u32>,
        body: Vec<Item>,
    },
}
