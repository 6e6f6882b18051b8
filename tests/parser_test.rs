use fable::ast::{Agent, Expression, StringPart};
use fable::builder::SequentialIdGenerator;
use fable::{parse, parse_with, validate, Statement};
use pretty_assertions::assert_eq;

extern crate fable;

const STORY: &str = r#"
fable "The Forest" do
    init name to "Bob"
    page 1 do
        text "Hello {name}!" #greeting at [100, 50]
        button "Enter" #enter at [100, 200] do
            on_click do
                go to page 2
            end
        end
    end
    page 2 do
        auto_advance 3s
        text "Deep in the forest"
        image "tree.png" at [10, 10] animate bounce duration 2s
        go back
    end
end
"#;

#[test]
fn it_parse_story_shape() {
    let story = parse(STORY).unwrap();
    assert_eq!(story.title, "The Forest");
    assert_eq!(story.pages.len(), 2);
    assert_eq!(story.statements.len(), 1);

    let first = &story.pages[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.agents.len(), 2);
    assert_eq!(first.agents[0].id(), Some("greeting"));
    assert_eq!(first.agents[0].position(), Some([100.0, 50.0]));

    let button = &first.agents[1];
    assert_eq!(button.kind(), "button");
    assert_eq!(
        button.events()[0].statements,
        vec![Statement::GoToPage { page: 2 }]
    );

    let second = &story.pages[1];
    assert_eq!(second.auto_advance_ms, Some(3000));
    assert_eq!(second.statements, vec![Statement::GoBack]);
    let animation = second.agents[1].animation().unwrap();
    assert_eq!(animation.kind, "bounce");
    assert_eq!(animation.duration_ms, Some(2000));
}

#[test]
fn it_parse_interpolates_text() {
    let story = parse(STORY).unwrap();
    match &story.pages[0].agents[0] {
        Agent::Text { content, .. } => assert_eq!(
            *content,
            Expression::InterpolatedString {
                parts: vec![
                    StringPart::text("Hello "),
                    StringPart::variable("name"),
                    StringPart::text("!"),
                ],
            }
        ),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn it_parse_is_deterministic_with_explicit_ids() {
    let source = r#"fable "T" do page 1 do text "a" #a button "b" #b end end"#;
    let first = serde_json::to_string(&parse(source).unwrap()).unwrap();
    let second = serde_json::to_string(&parse(source).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn it_parse_generates_missing_ids() {
    let source = r#"fable "T" do page 1 do text "a" text "b" #b image "c.png" end end"#;
    let story = parse_with(source, &mut SequentialIdGenerator::default()).unwrap();
    let ids: Vec<_> = story.pages[0].agents.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec![Some("text_1"), Some("b"), Some("image_2")]);

    let random = parse(source).unwrap();
    let generated = random.pages[0].agents[0].id().unwrap();
    assert_eq!(generated.len(), 36);
}

#[test]
fn it_parse_reports_position() {
    let error = parse("fable \"T\" do\n  page 1 do\n    text \"x\" at [1, ]\n  end\nend").unwrap_err();
    assert_eq!(error.line, 3);
    assert!(error.to_string().contains("line 3"), "{}", error);
}

#[test]
fn it_validate_agrees_with_parse() {
    let validation = validate(STORY);
    assert!(validation.valid);
    assert_eq!(validation.error, None);

    let broken = "fable \"T\" do page 1 do end";
    let validation = validate(broken);
    assert!(!validation.valid);
    assert_eq!(
        validation.error,
        Some(parse(broken).unwrap_err().to_string())
    );
}

#[test]
fn it_ast_json_round_trip() {
    let story = parse(STORY).unwrap();
    let json = serde_json::to_value(&story).unwrap();
    assert_eq!(json["pages"][1]["autoAdvanceMs"], 3000);
    assert_eq!(json["pages"][0]["agents"][1]["type"], "button");
    let back: fable::Story = serde_json::from_value(json).unwrap();
    assert_eq!(back, story);
}

#[test]
fn it_parse_simple_story() {
    let story = parse_with(
        r#"fable "Simple Story" do page 1 do text "Hello World" at [100, 100] end end"#,
        &mut SequentialIdGenerator::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&story).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "title": "Simple Story",
            "pages": [{
                "id": 1,
                "agents": [{
                    "type": "text",
                    "id": "text_1",
                    "content": {"type": "interpolated_string", "parts": ["Hello World"]},
                    "position": [100.0, 100.0]
                }],
                "statements": []
            }],
            "statements": []
        })
    );
}
