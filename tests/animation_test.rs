use std::cell::RefCell;
use std::rc::Rc;

use fable::animation::{
    AnimationEngine, AnimationKind, AnimationOptions, MoveOptions, SceneGraph, SceneNode,
    Transform,
};
use fable::builder::SequentialIdGenerator;
use fable::{parse_with, EventType, FableConfig, Session};

fn scene() -> SceneGraph {
    let mut graph = SceneGraph::new();
    graph.insert("hero", SceneNode::at(50.0, 80.0));
    graph
}

fn transform(nodes: &SceneGraph) -> Transform {
    nodes.get("hero").unwrap().transform
}

#[test]
fn it_pulse_repeats_then_restores_snapshot() {
    let mut nodes = scene();
    let mut engine = AnimationEngine::default();
    let before = transform(&nodes);
    engine
        .start_animation(
            &mut nodes,
            "hero",
            "pulse",
            AnimationOptions {
                duration_ms: Some(400),
                repeat: Some(3),
            },
        )
        .unwrap();
    assert_eq!(engine.active_animation("hero"), Some(AnimationKind::Pulse));

    engine.tick(&mut nodes, 100.0);
    assert!(transform(&nodes).scale > before.scale);

    for _ in 0..10 {
        engine.tick(&mut nodes, 100.0);
    }
    assert!(engine.is_animating("hero"));

    engine.tick(&mut nodes, 100.0);
    assert!(!engine.is_animating("hero"));
    assert_eq!(transform(&nodes), before);
}

#[test]
fn it_second_move_cancels_first() {
    let mut nodes = scene();
    let mut engine = AnimationEngine::default();
    let done = Rc::new(RefCell::new(Vec::new()));

    let sink = done.clone();
    engine
        .move_agent(
            &mut nodes,
            "hero",
            MoveOptions {
                x: 500.0,
                y: 80.0,
                duration_ms: Some(1000),
                easing: Some("linear".to_string()),
            },
            Some(Box::new(move |_: &str| sink.borrow_mut().push("first"))),
        )
        .unwrap();
    engine.tick(&mut nodes, 200.0);

    let sink = done.clone();
    engine
        .move_agent(
            &mut nodes,
            "hero",
            MoveOptions {
                x: 0.0,
                y: 0.0,
                duration_ms: Some(300),
                easing: Some("linear".to_string()),
            },
            Some(Box::new(move |_: &str| sink.borrow_mut().push("second"))),
        )
        .unwrap();
    engine.tick(&mut nodes, 1000.0);

    assert_eq!(*done.borrow(), vec!["second"]);
    let end = transform(&nodes);
    assert_eq!((end.x, end.y), (0.0, 0.0));
}

#[test]
fn it_stop_animation_restores_snapshot() {
    let mut nodes = scene();
    let mut engine = AnimationEngine::default();
    let before = transform(&nodes);
    engine
        .start_animation(&mut nodes, "hero", "shake", AnimationOptions::default())
        .unwrap();
    engine.tick(&mut nodes, 130.0);
    assert_ne!(transform(&nodes).x, before.x);

    assert_eq!(engine.stop_animation(&mut nodes, "hero"), Ok(true));
    assert_eq!(transform(&nodes), before);
    assert_eq!(engine.stop_animation(&mut nodes, "hero"), Ok(false));
}

#[test]
fn it_fade_in_keeps_final_opacity() {
    let mut nodes = scene();
    let mut engine = AnimationEngine::default();
    engine
        .start_animation(
            &mut nodes,
            "hero",
            "fade_in",
            AnimationOptions {
                duration_ms: Some(200),
                repeat: None,
            },
        )
        .unwrap();
    assert_eq!(transform(&nodes).opacity, 0.0);
    engine.tick(&mut nodes, 250.0);
    assert_eq!(transform(&nodes).opacity, 1.0);
    assert!(engine.is_idle());
}

#[test]
fn it_session_drives_story_animations() {
    let story = parse_with(
        r#"fable "T" do
            page 1 do
                image "hero.png" #hero at [0, 0]
                button "Go" #go do
                    on_click do
                        move #hero to [100, 40] duration 1s easing linear
                    end
                end
                button "Spin" #spin do
                    on_click do
                        animate #hero spin duration 1s repeat 1
                    end
                end
            end
        end"#,
        &mut SequentialIdGenerator::default(),
    )
    .unwrap();
    let mut session = Session::new(FableConfig::default(), SceneGraph::from_story(&story));
    session.load(story, false);

    assert!(session.dispatch_event_by_id(EventType::OnClick, "go"));
    assert_eq!(session.agent_position("hero"), Some([100.0, 40.0]));

    session.tick(500.0);
    let mid = session.nodes().get("hero").unwrap().transform;
    assert_eq!((mid.x, mid.y), (50.0, 20.0));

    session.tick(600.0);
    let end = session.nodes().get("hero").unwrap().transform;
    assert_eq!((end.x, end.y), (100.0, 40.0));
    assert!(session.animations().is_idle());

    assert!(session.dispatch_event_by_id(EventType::OnClick, "spin"));
    session.tick(500.0);
    assert_eq!(session.nodes().get("hero").unwrap().transform.rotation, 180.0);

    session.tick(600.0);
    let restored = session.nodes().get("hero").unwrap().transform;
    assert_eq!(restored.rotation, 0.0);
    assert_eq!((restored.x, restored.y), (100.0, 40.0));
    assert!(session.animations().is_idle());
}

#[test]
fn it_stop_all_leaves_tween_in_place() {
    let mut nodes = scene();
    let mut engine = AnimationEngine::default();
    engine
        .move_agent(
            &mut nodes,
            "hero",
            MoveOptions {
                x: 150.0,
                y: 80.0,
                duration_ms: Some(1000),
                easing: Some("linear".to_string()),
            },
            None,
        )
        .unwrap();
    engine.tick(&mut nodes, 500.0);
    assert_eq!(transform(&nodes).x, 100.0);

    engine.stop_all(&mut nodes);
    assert!(engine.is_idle());
    engine.tick(&mut nodes, 500.0);
    assert_eq!((transform(&nodes).x, transform(&nodes).y), (100.0, 80.0));
}
