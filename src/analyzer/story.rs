//! Story, page, agent and statement rules.
//!
//! Every rule commits with `cut` once its leading keyword has matched, so a
//! malformed construct is reported where it breaks instead of being skipped
//! by the enclosing `many0`.

use nom::{
    branch::alt,
    combinator::{cut, map, opt, value},
    error::context,
    multi::{many0, separated_list1},
    sequence::{pair, preceded, separated_pair, terminated, tuple},
};
use tracing::instrument;

use super::core::*;
use super::expression::parse_expression;
use super::literal::*;
use super::syntax::*;
use crate::ast::{EventType, Expression};

#[instrument(level = "debug", skip(input))]
pub fn parse_story(input: Span) -> PResult<SyntaxStory> {
    let (input, _) = ws(keyword("fable"))(input)?;
    let (input, title) = cut(ws(string_literal))(input)?;
    let (input, items) = cut(do_block(story_item, "page, statement or 'end'"))(input)?;
    Ok((input, SyntaxStory { title, items }))
}

/// `do item* end`, where `expected` names what may appear before `end`.
fn do_block<'a, F>(item: F, expected: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, Vec<Item>>
where
    F: FnMut(Span<'a>) -> PResult<'a, Item>,
{
    preceded(
        ws(keyword("do")),
        terminated(
            nested("block", many0(item)),
            context(expected, ws(keyword("end"))),
        ),
    )
}

fn item<'a, F>(inner: F) -> impl FnMut(Span<'a>) -> PResult<'a, Item>
where
    F: FnMut(Span<'a>) -> PResult<'a, Node>,
{
    map(ws(positioned(inner)), |(pos, node)| Item { pos, node })
}

fn story_item(input: Span) -> PResult<Item> {
    item(alt((parse_page, map(parse_statement, Node::Statement))))(input)
}

fn page_item(input: Span) -> PResult<Item> {
    item(alt((
        parse_auto_advance,
        parse_agent,
        map(parse_statement, Node::Statement),
    )))(input)
}

fn agent_item(input: Span) -> PResult<Item> {
    item(parse_agent)(input)
}

fn agent_or_statement_item(input: Span) -> PResult<Item> {
    item(alt((parse_agent, map(parse_statement, Node::Statement))))(input)
}

fn statement_item(input: Span) -> PResult<Item> {
    item(map(parse_statement, Node::Statement))(input)
}

#[instrument(level = "debug", skip(input))]
fn parse_page(input: Span) -> PResult<Node> {
    let (input, _) = keyword("page")(input)?;
    let (input, id) = cut(ws(integer))(input)?;
    let (input, items) = cut(do_block(page_item, "agent, statement or 'end'"))(input)?;
    Ok((input, Node::Page { id, items }))
}

fn parse_auto_advance(input: Span) -> PResult<Node> {
    map(
        preceded(keyword("auto_advance"), cut(ws(duration))),
        Node::AutoAdvance,
    )(input)
}

#[instrument(level = "debug", skip(input))]
fn parse_agent(input: Span) -> PResult<Node> {
    alt((
        parse_text,
        parse_button,
        parse_image,
        parse_video,
        parse_if,
        parse_for,
        parse_wait_agent,
        parse_timer_agent,
    ))(input)
}

fn attributes(input: Span) -> PResult<Vec<Attr>> {
    many0(map(ws(positioned(attribute)), |(pos, value)| Attr {
        pos,
        value,
    }))(input)
}

fn attribute(input: Span) -> PResult<AttrValue> {
    alt((
        map(preceded(nom::character::complete::char('#'), cut(identifier)), AttrValue::Id),
        map(preceded(keyword("at"), cut(ws(position))), AttrValue::At),
        map(preceded(keyword("size"), cut(ws(position))), AttrValue::Size),
        map(preceded(keyword("color"), cut(ws(string_literal))), AttrValue::Color),
        map(
            preceded(keyword("font_size"), cut(ws(signed_number))),
            AttrValue::FontSize,
        ),
        map(preceded(keyword("autoplay"), cut(ws(boolean))), AttrValue::Autoplay),
        map(preceded(keyword("loop"), cut(ws(boolean))), AttrValue::Loop),
        animate_attribute,
    ))(input)
}

// Not committed after `animate`: `animate #target ...` on the next line is a
// statement, not an attribute.
fn animate_attribute(input: Span) -> PResult<AttrValue> {
    let (input, _) = keyword("animate")(input)?;
    let (input, kind) = ws(identifier)(input)?;
    let (input, options) = options(animation_option)(input)?;
    Ok((input, AttrValue::Animate { kind, options }))
}

fn options<'a, F>(option: F) -> impl FnMut(Span<'a>) -> PResult<'a, Vec<Opt>>
where
    F: FnMut(Span<'a>) -> PResult<'a, OptValue>,
{
    many0(map(ws(positioned(option)), |(pos, value)| Opt { pos, value }))
}

fn duration_option(input: Span) -> PResult<OptValue> {
    map(preceded(keyword("duration"), cut(ws(duration))), OptValue::Duration)(input)
}

fn animation_option(input: Span) -> PResult<OptValue> {
    alt((
        duration_option,
        map(preceded(keyword("repeat"), cut(ws(integer))), OptValue::Repeat),
    ))(input)
}

fn tween_option(input: Span) -> PResult<OptValue> {
    alt((
        duration_option,
        map(preceded(keyword("easing"), cut(ws(identifier))), OptValue::Easing),
    ))(input)
}

fn music_option(input: Span) -> PResult<OptValue> {
    alt((
        map(preceded(keyword("loop"), cut(ws(boolean))), OptValue::Loop),
        map(preceded(keyword("volume"), cut(ws(signed_number))), OptValue::Volume),
    ))(input)
}

fn parse_text(input: Span) -> PResult<Node> {
    let (input, _) = keyword("text")(input)?;
    let (input, content) = cut(ws(string_literal))(input)?;
    let (input, attrs) = attributes(input)?;
    Ok((input, Node::Text { content, attrs }))
}

#[instrument(level = "debug", skip(input))]
fn parse_button(input: Span) -> PResult<Node> {
    let (input, _) = keyword("button")(input)?;
    let (input, label) = cut(ws(string_literal))(input)?;
    let (input, attrs) = attributes(input)?;
    let (input, events) = opt(preceded(
        ws(keyword("do")),
        cut(terminated(
            many0(ws(parse_event)),
            context("event or 'end'", ws(keyword("end"))),
        )),
    ))(input)?;
    Ok((
        input,
        Node::Button {
            label,
            attrs,
            events: events.unwrap_or_default(),
        },
    ))
}

fn event_type(input: Span) -> PResult<EventType> {
    alt((
        value(EventType::OnClick, keyword("on_click")),
        value(EventType::OnHover, keyword("on_hover")),
        value(EventType::OnDrag, keyword("on_drag")),
        value(EventType::OnDrop, keyword("on_drop")),
    ))(input)
}

fn parse_event(input: Span) -> PResult<EventNode> {
    let (input, (pos, event_type)) = positioned(event_type)(input)?;
    let (input, body) = cut(do_block(statement_item, "statement or 'end'"))(input)?;
    Ok((
        input,
        EventNode {
            pos,
            event_type,
            body,
        },
    ))
}

fn parse_image(input: Span) -> PResult<Node> {
    let (input, _) = keyword("image")(input)?;
    let (input, src) = cut(ws(string_literal))(input)?;
    let (input, attrs) = attributes(input)?;
    Ok((input, Node::Image { src, attrs }))
}

fn parse_video(input: Span) -> PResult<Node> {
    let (input, _) = keyword("video")(input)?;
    let (input, src) = cut(ws(string_literal))(input)?;
    let (input, attrs) = attributes(input)?;
    Ok((input, Node::Video { src, attrs }))
}

#[instrument(level = "debug", skip(input))]
fn parse_if(input: Span) -> PResult<Node> {
    let (input, _) = keyword("if")(input)?;
    let (input, condition) = cut(ws(parse_expression))(input)?;
    let (input, _) = cut(ws(keyword("do")))(input)?;
    let (input, then_items) = nested("block", many0(agent_item))(input)?;
    let (input, else_items) = opt(preceded(
        ws(keyword("else")),
        nested("block", many0(agent_item)),
    ))(input)?;
    let (input, _) = cut(context("agent, 'else' or 'end'", ws(keyword("end"))))(input)?;
    Ok((
        input,
        Node::If {
            condition,
            then_items,
            else_items: else_items.unwrap_or_default(),
        },
    ))
}

#[instrument(level = "debug", skip(input))]
fn parse_for(input: Span) -> PResult<Node> {
    let (input, _) = keyword("for")(input)?;
    let (input, (variable, _, range)) = cut(tuple((
        ws(variable_name),
        ws(keyword("in")),
        ws(parse_expression),
    )))(input)?;
    let (input, items) = cut(do_block(agent_item, "agent or 'end'"))(input)?;
    Ok((
        input,
        Node::For {
            variable,
            range,
            items,
        },
    ))
}

fn parse_wait_agent(input: Span) -> PResult<Node> {
    let (input, _) = keyword("wait")(input)?;
    let (input, duration) = cut(ws(duration))(input)?;
    let (input, items) = cut(do_block(
        agent_or_statement_item,
        "agent, statement or 'end'",
    ))(input)?;
    Ok((input, Node::Wait { duration, items }))
}

fn timer_header(input: Span) -> PResult<(Duration, Option<u32>)> {
    let (input, _) = keyword("timer")(input)?;
    cut(pair(
        preceded(ws(keyword("every")), ws(duration)),
        opt(preceded(
            ws(keyword("repeat")),
            cut(ws(nom::combinator::map_res(integer, u32::try_from))),
        )),
    ))(input)
}

fn parse_timer_agent(input: Span) -> PResult<Node> {
    let (input, (interval, repeat)) = timer_header(input)?;
    let (input, items) = cut(do_block(statement_item, "statement or 'end'"))(input)?;
    Ok((
        input,
        Node::Timer {
            interval,
            repeat,
            items,
        },
    ))
}

#[instrument(level = "debug", skip(input))]
pub fn parse_statement(input: Span) -> PResult<StatementNode> {
    alt((
        parse_assignment,
        parse_add,
        parse_subtract,
        parse_go,
        parse_move,
        parse_tween,
        parse_animate,
        parse_stop,
        parse_play,
        parse_music,
        parse_wait_statement,
        parse_timer_statement,
    ))(input)
}

fn parse_assignment(input: Span) -> PResult<StatementNode> {
    let (input, is_init) = alt((value(true, keyword("init")), value(false, keyword("set"))))(input)?;
    let (input, (name, _, value)) = cut(tuple((
        ws(variable_name),
        ws(keyword("to")),
        ws(parse_expression),
    )))(input)?;
    Ok((
        input,
        if is_init {
            StatementNode::Init { name, value }
        } else {
            StatementNode::Set { name, value }
        },
    ))
}

fn parse_add(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("add")(input)?;
    let (input, (amount, name)) = cut(separated_pair(
        ws(parse_expression),
        ws(keyword("to")),
        ws(variable_name),
    ))(input)?;
    Ok((input, StatementNode::Add { name, amount }))
}

fn parse_subtract(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("subtract")(input)?;
    let (input, (amount, name)) = cut(separated_pair(
        ws(parse_expression),
        ws(keyword("from")),
        ws(variable_name),
    ))(input)?;
    Ok((input, StatementNode::Subtract { name, amount }))
}

fn parse_go(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("go")(input)?;
    cut(context(
        "'to page' or 'back'",
        alt((
            map(
                preceded(
                    pair(ws(keyword("to")), ws(keyword("page"))),
                    cut(ws(integer)),
                ),
                StatementNode::GoToPage,
            ),
            value(StatementNode::GoBack, ws(keyword("back"))),
        )),
    ))(input)
}

fn expression_pair(input: Span) -> PResult<(Expression, Expression)> {
    let (input, _) = symbol("[")(input)?;
    cut(terminated(
        separated_pair(ws(parse_expression), symbol(","), ws(parse_expression)),
        symbol("]"),
    ))(input)
}

#[instrument(level = "debug", skip(input))]
fn parse_move(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("move")(input)?;
    let (input, (target, _, (x, y), options)) = cut(tuple((
        ws(target),
        ws(keyword("to")),
        expression_pair,
        options(tween_option),
    )))(input)?;
    Ok((
        input,
        StatementNode::Move {
            target,
            x,
            y,
            options,
        },
    ))
}

fn property(input: Span) -> PResult<Property> {
    let (input, (pos, name)) = positioned(identifier)(input)?;
    let (input, value) = cut(preceded(symbol(":"), ws(parse_expression)))(input)?;
    Ok((input, Property { pos, name, value }))
}

#[instrument(level = "debug", skip(input))]
fn parse_tween(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("tween")(input)?;
    let (input, (target, _, _, properties, _, options)) = cut(tuple((
        ws(target),
        ws(keyword("to")),
        symbol("{"),
        separated_list1(symbol(","), ws(property)),
        symbol("}"),
        options(tween_option),
    )))(input)?;
    Ok((
        input,
        StatementNode::Tween {
            target,
            properties,
            options,
        },
    ))
}

fn parse_animate(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("animate")(input)?;
    let (input, (target, kind, options)) = cut(tuple((
        ws(target),
        ws(identifier),
        options(animation_option),
    )))(input)?;
    Ok((
        input,
        StatementNode::Animate {
            target,
            kind,
            options,
        },
    ))
}

fn parse_stop(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("stop")(input)?;
    cut(context(
        "'animation', 'sound' or 'music'",
        alt((
            map(
                preceded(ws(keyword("animation")), cut(ws(target))),
                StatementNode::StopAnimation,
            ),
            map(
                preceded(ws(keyword("sound")), opt(ws(string_literal))),
                StatementNode::StopSound,
            ),
            value(StatementNode::StopMusic, ws(keyword("music"))),
        )),
    ))(input)
}

fn parse_play(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("play")(input)?;
    let (input, (_, src, volume)) = cut(tuple((
        ws(keyword("sound")),
        ws(string_literal),
        opt(preceded(ws(keyword("volume")), cut(ws(signed_number)))),
    )))(input)?;
    Ok((input, StatementNode::PlaySound { src, volume }))
}

fn parse_music(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("music")(input)?;
    let (input, (src, options)) = cut(pair(ws(string_literal), options(music_option)))(input)?;
    Ok((input, StatementNode::Music { src, options }))
}

fn parse_wait_statement(input: Span) -> PResult<StatementNode> {
    let (input, _) = keyword("wait")(input)?;
    let (input, duration) = cut(ws(duration))(input)?;
    let (input, body) = cut(do_block(statement_item, "statement or 'end'"))(input)?;
    Ok((input, StatementNode::Wait { duration, body }))
}

fn parse_timer_statement(input: Span) -> PResult<StatementNode> {
    let (input, (interval, repeat)) = timer_header(input)?;
    let (input, body) = cut(do_block(statement_item, "statement or 'end'"))(input)?;
    Ok((
        input,
        StatementNode::Timer {
            interval,
            repeat,
            body,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn statement(source: &str) -> StatementNode {
        let (rest, statement) = parse_statement(Span::new(source)).unwrap();
        assert_eq!(*rest.fragment(), "");
        statement
    }

    #[test]
    fn test_assignment_statements() {
        assert_eq!(
            statement("init score to 0"),
            StatementNode::Init {
                name: "score".to_string(),
                value: Expression::number(0.0),
            }
        );
        assert_eq!(
            statement("subtract 2 from score"),
            StatementNode::Subtract {
                name: "score".to_string(),
                amount: Expression::number(2.0),
            }
        );
    }

    #[test]
    fn test_navigation_statements() {
        assert_eq!(statement("go to page 3"), StatementNode::GoToPage(3));
        assert_eq!(statement("go back"), StatementNode::GoBack);
    }

    #[test]
    fn test_stop_statements() {
        assert_eq!(
            statement("stop animation #hero"),
            StatementNode::StopAnimation("hero".to_string())
        );
        assert_eq!(statement("stop sound"), StatementNode::StopSound(None));
        assert_eq!(
            statement(r#"stop sound "ding.mp3""#),
            StatementNode::StopSound(Some("ding.mp3".to_string()))
        );
        assert_eq!(statement("stop music"), StatementNode::StopMusic);
    }

    #[test]
    fn test_move_with_options() {
        let StatementNode::Move {
            target, options, ..
        } = statement("move #box to [200, 100 + 5] duration 2s easing linear")
        else {
            panic!("expected move");
        };
        assert_eq!(target, "box");
        let keys: Vec<_> = options.iter().map(|o| o.value.key()).collect();
        assert_eq!(keys, vec!["duration", "easing"]);
    }

    #[test]
    fn test_tween_properties() {
        let StatementNode::Tween { properties, .. } =
            statement("tween #box to { opacity: 0.5, scale: 2 }")
        else {
            panic!("expected tween");
        };
        let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["opacity", "scale"]);
    }

    #[test]
    fn test_animate_attribute_does_not_swallow_statement() {
        let source = "page 1 do\n  image \"a.png\" #box animate spin\n  animate #box bounce repeat 2\nend";
        let (_, node) = parse_page(Span::new(source)).unwrap();
        let Node::Page { items, .. } = node else {
            panic!("expected page");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[1].node,
            Node::Statement(StatementNode::Animate { .. })
        ));
        assert_eq!(items[1].pos, Pos { line: 3, column: 3 });
    }

    #[test]
    fn test_button_events() {
        let source = r#"button "Go" #go do on_click do go to page 2 end on_hover do play sound "tick.mp3" end end"#;
        let (_, node) = parse_button(Span::new(source)).unwrap();
        let Node::Button { events, attrs, .. } = node else {
            panic!("expected button");
        };
        assert_eq!(attrs.len(), 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EventType::OnHover);
    }

    #[test]
    fn test_if_else_agents() {
        let source = r#"if score >= 10 do text "win" else text "lose" image "sad.png" end"#;
        let (_, node) = parse_if(Span::new(source)).unwrap();
        let Node::If {
            then_items,
            else_items,
            ..
        } = node
        else {
            panic!("expected if");
        };
        assert_eq!(then_items.len(), 1);
        assert_eq!(else_items.len(), 2);
    }

    #[test]
    fn test_timer_repeat() {
        assert_eq!(
            statement("timer every 1s repeat 3 do add 1 to ticks end"),
            StatementNode::Timer {
                interval: Duration {
                    amount: 1,
                    unit: DurationUnit::Seconds,
                },
                repeat: Some(3),
                body: vec![Item {
                    pos: Pos { line: 1, column: 28 },
                    node: Node::Statement(StatementNode::Add {
                        name: "ticks".to_string(),
                        amount: Expression::number(1.0),
                    }),
                }],
            }
        );
    }

    #[test]
    fn test_missing_to_is_failure_at_value() {
        let Err(nom::Err::Failure(error)) = parse_statement(Span::new("set x 1")) else {
            panic!("expected failure");
        };
        assert_eq!(error.column(), 7);
        assert_eq!(error.describe(), "expected 'to', found '1'");
    }
}
