//! Minimal slot templates: `{name}` is replaced by the slot's value,
//! `{{` and `}}` produce literal braces.

/// Render `template`, asking `fill` for each slot. `fill` returns `None`
/// for a slot it cannot supply; rendering then fails with that slot name.
pub(crate) fn render<F>(template: &str, mut fill: F) -> Result<String, String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut slot = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => slot.push(ch),
                        None => return Err(format!("unterminated slot '{{{}'", slot)),
                    }
                }
                match fill(&slot) {
                    Some(value) => out.push_str(&value),
                    None => return Err(slot),
                }
            }
            '}' => return Err("unmatched '}'".to_string()),
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positional<'a>(args: &'a [&'a str]) -> impl FnMut(&str) -> Option<String> + 'a {
        move |slot| match slot {
            "*" => Some(args.join(", ")),
            n => n.parse::<usize>().ok().and_then(|i| args.get(i)).map(|s| s.to_string()),
        }
    }

    #[test]
    fn fills_positional_and_variadic_slots() {
        assert_eq!(
            render("ROUND({0}, {1})", positional(&["x", "2"])).unwrap(),
            "ROUND(x, 2)"
        );
        assert_eq!(
            render("GREATEST({*})", positional(&["a", "b", "c"])).unwrap(),
            "GREATEST(a, b, c)"
        );
    }

    #[test]
    fn escaped_braces_pass_through() {
        assert_eq!(render("{{{0}}}", positional(&["v"])).unwrap(), "{v}");
    }

    #[test]
    fn missing_slot_is_reported_by_name() {
        assert_eq!(render("F({3})", positional(&["a"])).unwrap_err(), "3");
    }

    #[test]
    fn unterminated_slot_is_an_error() {
        assert!(render("F({0", positional(&["a"])).is_err());
    }
}
