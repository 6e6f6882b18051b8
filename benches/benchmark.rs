use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fable::{
    animation::SceneGraph, builder::SequentialIdGenerator, parse_with, runtime::Session,
    EventType,
};

const STORY: &str = r#"
fable "Benchmark" do
    init score to 0
    init name to "Bob"
    page 1 do
        text "Hello {name}, score {score}" #greeting at [100, 50] animate pulse repeat 3
        button "Next" #next at [100, 200] size [120, 40] do
            on_click do
                add 10 to score
                move #greeting to [200, 50] duration 300ms easing ease_in_out
                go to page 2
            end
        end
        for i in 1..5 do
            text "Row {i}"
        end
    end
    page 2 do
        if score >= 10 && name == "Bob" do
            text "Well done"
        else
            text "Try again"
        end
        image "star.png" #star at [10, 10]
        timer every 1s repeat 3 do
            tween #star to { opacity: 0.5, scale: 1.2 } duration 500ms
        end
    end
end
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse story", |b| {
        b.iter(|| parse_with(black_box(STORY), &mut SequentialIdGenerator::default()))
    });
}

fn bench_session(c: &mut Criterion) {
    let story = match parse_with(STORY, &mut SequentialIdGenerator::default()) {
        Ok(story) => story,
        Err(e) => panic!("benchmark story does not parse: {}", e),
    };
    c.bench_function("click and tick", |b| {
        b.iter(|| {
            let mut session = Session::new(Default::default(), SceneGraph::from_story(&story));
            session.load(story.clone(), false);
            session.dispatch_event_by_id(EventType::OnClick, "next");
            for _ in 0..20 {
                session.tick(16.0);
            }
            black_box(session.snapshot())
        })
    });
}

criterion_group!(benches, bench_parse, bench_session);
criterion_main!(benches);
