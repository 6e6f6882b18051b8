use crate::analyzer::core::{is_ident_char, is_ident_start};
use crate::ast::{Expression, StringPart};

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

/// Splits `text` into literal runs and `{identifier}` placeholders. Braces
/// that do not enclose an identifier stay literal.
pub fn split_parts(text: &str) -> Vec<StringPart> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_identifier(&after[..close]) => {
                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    parts.push(StringPart::Text(std::mem::take(&mut literal)));
                }
                parts.push(StringPart::variable(&after[..close]));
                rest = &after[close + 1..];
            }
            _ => {
                literal.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(StringPart::Text(literal));
    }
    parts
}

pub fn has_placeholder(parts: &[StringPart]) -> bool {
    parts
        .iter()
        .any(|part| matches!(part, StringPart::Variable(_)))
}

/// Display text: always interpolated.
pub fn interpolated(text: &str) -> Expression {
    Expression::InterpolatedString {
        parts: split_parts(text),
    }
}

/// String inside an expression: interpolated only when it has a placeholder.
pub fn string_expression(text: String) -> Expression {
    let parts = split_parts(&text);
    if has_placeholder(&parts) {
        Expression::InterpolatedString { parts }
    } else {
        Expression::String { value: text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholders() {
        assert_eq!(
            split_parts("{name} scored {score} points!"),
            vec![
                StringPart::variable("name"),
                StringPart::text(" scored "),
                StringPart::variable("score"),
                StringPart::text(" points!"),
            ]
        );
    }

    #[test]
    fn test_plain_text_is_one_part() {
        assert_eq!(
            split_parts("Hello World"),
            vec![StringPart::text("Hello World")]
        );
        assert!(split_parts("").is_empty());
    }

    #[test]
    fn test_malformed_braces_stay_literal() {
        assert_eq!(
            split_parts("a {not an id} b {open"),
            vec![StringPart::text("a {not an id} b {open")]
        );
        assert_eq!(
            split_parts("{{x}}"),
            vec![
                StringPart::text("{"),
                StringPart::variable("x"),
                StringPart::text("}"),
            ]
        );
    }

    #[test]
    fn test_string_expression() {
        assert_eq!(string_expression("plain".into()), Expression::string("plain"));
        assert!(matches!(
            string_expression("hi {who}".into()),
            Expression::InterpolatedString { .. }
        ));
    }
}
