use tracing::{debug, instrument, warn};

use super::{RuntimeEvent, Schedule, Session};
use crate::animation::{AnimationOptions, MoveOptions, NodeLookup, TweenRequest};
use crate::ast::{BinaryOperator, Statement};
use crate::eval::expression::apply_binary;

impl<N: NodeLookup> Session<N> {
    /// Runs statements in order. Problems are logged and skipped; nothing
    /// here fails.
    pub fn execute_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.execute_statement(statement);
        }
    }

    #[instrument(level = "debug", skip(self, statement), fields(kind = statement.kind()))]
    pub fn execute_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Init { name, value } | Statement::Set { name, value } => {
                let value = self.evaluate(value);
                self.set_variable(name, value);
            }
            Statement::Add { name, amount } => {
                let amount = self.evaluate(amount);
                let value = apply_binary(BinaryOperator::Add, self.get_variable(name), amount);
                self.set_variable(name, value);
            }
            Statement::Subtract { name, amount } => {
                let amount = self.evaluate(amount);
                let value =
                    apply_binary(BinaryOperator::Subtract, self.get_variable(name), amount);
                self.set_variable(name, value);
            }
            Statement::GoToPage { page } => {
                self.go_to_page(*page);
            }
            Statement::GoBack => {
                self.go_back();
            }
            Statement::Move {
                target,
                x,
                y,
                options,
            } => {
                let x = self.evaluate(x).to_number();
                let y = self.evaluate(y).to_number();
                if !(x.is_finite() && y.is_finite()) {
                    warn!(agent = %target, "move coordinates are not numbers");
                    return;
                }
                let request = MoveOptions {
                    x,
                    y,
                    duration_ms: options.duration_ms,
                    easing: options.easing.clone(),
                };
                if self
                    .engine
                    .move_agent(&mut self.nodes, target, request, None)
                    .is_ok()
                {
                    self.positions.insert(target.clone(), [x, y]);
                }
            }
            Statement::Tween {
                target,
                properties,
                options,
            } => {
                let mut values = Vec::with_capacity(properties.len());
                for (name, expr) in properties {
                    let value = self.evaluate(expr).to_number();
                    if value.is_finite() {
                        values.push((name.clone(), value));
                    } else {
                        warn!(agent = %target, property = %name, "tween value is not a number");
                    }
                }
                let request = TweenRequest {
                    properties: values,
                    duration_ms: options.duration_ms,
                    easing: options.easing.clone(),
                };
                if let Err(error) = self.engine.tween_agent(&mut self.nodes, target, request, None) {
                    debug!(%error, "tween skipped");
                }
            }
            Statement::Animate { target, animation } => {
                let options = AnimationOptions {
                    duration_ms: animation.duration_ms,
                    repeat: animation.repeat,
                };
                if let Err(error) =
                    self.engine
                        .start_animation(&mut self.nodes, target, &animation.kind, options)
                {
                    debug!(%error, "animate skipped");
                }
            }
            Statement::StopAnimation { target } => {
                if let Err(error) = self.engine.stop_animation(&mut self.nodes, target) {
                    debug!(%error, "stop animation skipped");
                }
            }
            Statement::PlaySound { src, volume } => self.emit(RuntimeEvent::PlaySound {
                src: src.clone(),
                volume: volume.unwrap_or(1.0),
            }),
            Statement::StopSound { src } => {
                self.emit(RuntimeEvent::StopSound { src: src.clone() })
            }
            Statement::Music { src, options } => self.emit(RuntimeEvent::PlayMusic {
                src: src.clone(),
                looping: options.looping,
                volume: options.volume.unwrap_or(1.0),
            }),
            Statement::StopMusic => self.emit(RuntimeEvent::StopMusic),
            Statement::Wait {
                duration_ms,
                actions,
            } => self.emit(RuntimeEvent::Scheduled {
                schedule: Schedule::After {
                    delay_ms: *duration_ms,
                },
                actions: actions.clone(),
            }),
            Statement::Timer {
                interval_ms,
                repeat,
                actions,
            } => self.emit(RuntimeEvent::Scheduled {
                schedule: Schedule::Every {
                    interval_ms: *interval_ms,
                    repeat: *repeat,
                },
                actions: actions.clone(),
            }),
            Statement::Unknown => warn!("skipping unknown statement"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::analyzer::parse_with;
    use crate::animation::SceneGraph;
    use crate::builder::SequentialIdGenerator;
    use crate::config::FableConfig;
    use crate::eval::Value;

    fn session(source: &str) -> Session<SceneGraph> {
        let story = parse_with(source, &mut SequentialIdGenerator::default()).unwrap();
        let nodes = SceneGraph::from_story(&story);
        let mut session = Session::new(FableConfig::default(), nodes);
        session.load(story, false);
        session
    }

    #[test]
    fn test_add_and_subtract() {
        let mut session = session(r#"fable "T" do init score to 0 page 1 do end end"#);
        let story = crate::parse(
            r#"fable "U" do page 1 do add 5 to score subtract 2 from score end end"#,
        )
        .unwrap();
        session.execute_statements(&story.pages[0].statements);
        assert_eq!(session.get_variable("score"), Value::from(3.0));
    }

    #[test]
    fn test_add_to_string_concatenates() {
        let mut session = session(r#"fable "T" do init log to "a" page 1 do end end"#);
        session.execute_statement(&Statement::Add {
            name: "log".to_string(),
            amount: crate::ast::Expression::string("b"),
        });
        assert_eq!(session.get_variable("log"), Value::from("ab"));
    }

    #[test]
    fn test_move_records_position_only_for_known_nodes() {
        let mut session = session(
            r#"fable "T" do page 1 do image "a.png" #box at [0, 0] end end"#,
        );
        let moves = crate::parse(
            r#"fable "U" do move #box to [10 * 2, 5] move #ghost to [1, 1] end"#,
        )
        .unwrap();
        session.execute_statements(&moves.statements);
        assert_eq!(session.agent_position("box"), Some([20.0, 5.0]));
        assert_eq!(session.agent_position("ghost"), None);
        assert!(session.animations().is_tweening("box"));
    }

    #[test]
    fn test_audio_and_scheduling_are_published() {
        let mut session = session(r#"fable "T" do page 1 do end end"#);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        let story = crate::parse(
            r#"fable "U" do
                play sound "ding.mp3" volume 0.5
                music "theme.mp3" loop true
                wait 2s do stop music end
            end"#,
        )
        .unwrap();
        session.execute_statements(&story.statements);
        let seen = seen.borrow();
        assert_eq!(
            seen[0],
            RuntimeEvent::PlaySound {
                src: "ding.mp3".to_string(),
                volume: 0.5,
            }
        );
        assert_eq!(
            seen[1],
            RuntimeEvent::PlayMusic {
                src: "theme.mp3".to_string(),
                looping: true,
                volume: 1.0,
            }
        );
        assert_eq!(
            seen[2],
            RuntimeEvent::Scheduled {
                schedule: Schedule::After { delay_ms: 2000 },
                actions: vec![Statement::StopMusic],
            }
        );
    }

    #[test]
    fn test_unknown_statement_is_skipped() {
        let mut session = session(r#"fable "T" do page 1 do end end"#);
        session.execute_statements(&[Statement::Unknown, Statement::GoToPage { page: 2 }]);
        assert_eq!(session.current_page_id(), Some(2));
    }
}
