use serde::Serialize;

use crate::ast::Statement;
use crate::eval::Value;

/// When scheduled actions should run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Schedule {
    After {
        delay_ms: u64,
    },
    Every {
        interval_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        repeat: Option<u32>,
    },
}

/// Published to subscribers as the session changes or needs the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RuntimeEvent {
    PageChanged {
        from: Option<i64>,
        to: Option<i64>,
    },
    VariableChanged {
        name: String,
        value: Value,
    },
    PlaySound {
        src: String,
        volume: f64,
    },
    StopSound {
        src: Option<String>,
    },
    PlayMusic {
        src: String,
        looping: bool,
        volume: f64,
    },
    StopMusic,
    /// The host runs `actions` through `Session::execute_statements` when
    /// the schedule fires.
    Scheduled {
        schedule: Schedule,
        actions: Vec<Statement>,
    },
}

pub type Listener = Box<dyn FnMut(&RuntimeEvent)>;
