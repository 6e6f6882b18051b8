//! # Fable: interactive story DSL
//!
//! Fable describes multi-page animated stories: pages of agents (text,
//! buttons, images, video), variables, conditionals, loops, timers and
//! event-driven actions.
//!
//! ## Pipeline
//! - Grammar and diagnostics ([`analyzer`]): source text to a positioned
//!   syntax tree, errors carry line and column.
//! - AST building ([`builder`]): agent ids, durations in milliseconds,
//!   interpolated strings. The result is the serializable [`ast`].
//! - Evaluation ([`eval`]): expressions over a variable environment.
//! - Runtime ([`runtime`]): a [`Session`] owns variables, navigation and
//!   statement execution, and publishes [`RuntimeEvent`]s to the host.
//! - Animation ([`animation`]): tweens and procedural animations on
//!   host-provided render nodes, advanced by a frame clock.
//!
//! ```no_run
//! use fable::{parse, runtime::Session, animation::SceneGraph};
//!
//! let story = parse(r#"fable "Demo" do page 1 do text "Hi" end end"#)?;
//! let nodes = SceneGraph::from_story(&story);
//! let mut session = Session::new(Default::default(), nodes);
//! session.load(story, true);
//! assert_eq!(session.current_page_id(), Some(1));
//! # Ok::<(), fable::Error>(())
//! ```

pub mod analyzer;
pub mod animation;
pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod eval;
pub mod runtime;

pub use analyzer::{parse, parse_with, validate, ParseError, Validation};
pub use ast::{Agent, Event, EventType, Expression, Page, Statement, Story};
pub use config::FableConfig;
pub use error::*;
pub use eval::Value;
pub use runtime::{RuntimeEvent, Session, Snapshot};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
