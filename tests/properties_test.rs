use fable::eval::{ExpressionEvaluator, Variables};
use fable::{parse, validate, Value};
use proptest::prelude::*;

const OPERATORS: [&str; 5] = ["+", "-", "*", "/", "%"];

fn binds_tighter(op: usize, than: usize) -> bool {
    op >= 2 && than < 2
}

fn apply(op: usize, x: f64, y: f64) -> f64 {
    match OPERATORS[op] {
        "+" => x + y,
        "-" => x - y,
        "*" => x * y,
        "/" => x / y,
        _ => x % y,
    }
}

proptest! {
    #[test]
    fn it_validate_matches_parse(source in "[a-z\"#\\[\\]0-9 {}.,\n]{0,60}") {
        let wrapped = format!("fable \"P\" do page 1 do {} end end", source);
        prop_assert_eq!(validate(&wrapped).valid, parse(&wrapped).is_ok());
        prop_assert_eq!(validate(&source).valid, parse(&source).is_ok());
    }

    #[test]
    fn it_arithmetic_matches_f64(
        a in -1000i32..1000,
        b in 1i32..1000,
        c in 1i32..100,
        first in 0usize..5,
        second in 0usize..5,
    ) {
        let source = format!(
            "fable \"P\" do init r to ({a}) {} ({b}) {} ({c}) page 1 do end end",
            OPERATORS[first],
            OPERATORS[second],
        );
        let story = parse(&source).unwrap();
        let expr = match &story.statements[0] {
            fable::Statement::Init { value, .. } => value.clone(),
            other => panic!("expected init, got {:?}", other),
        };
        let (a, b, c) = (a as f64, b as f64, c as f64);
        let expected = if binds_tighter(second, first) {
            apply(first, a, apply(second, b, c))
        } else {
            apply(second, apply(first, a, b), c)
        };
        let value = ExpressionEvaluator::seeded(1).evaluate(&expr, &Variables::new());
        prop_assert_eq!(value, Value::Number(expected), "{}", source);
    }

    #[test]
    fn it_random_stays_in_range(low in -50i64..50, span in 0i64..50, seed in any::<u64>()) {
        let high = low + span;
        let source = format!(
            "fable \"P\" do init roll to random({low}..{high}) page 1 do end end"
        );
        let story = parse(&source).unwrap();
        let expr = match &story.statements[0] {
            fable::Statement::Init { value, .. } => value.clone(),
            other => panic!("expected init, got {:?}", other),
        };
        let roll = ExpressionEvaluator::seeded(seed)
            .evaluate(&expr, &Variables::new())
            .to_number();
        prop_assert!(roll >= low as f64 && roll <= high as f64);
        prop_assert_eq!(roll.fract(), 0.0);
    }
}
