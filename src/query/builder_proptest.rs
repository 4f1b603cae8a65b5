//! Property-based tests for operation rendering
//!
//! These check that any argument text survives rendering intact and that the
//! generated document stays structurally balanced.

#[cfg(test)]
mod tests {
    use crate::query::*;
    use proptest::prelude::*;

    fn field_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_]{0,20}"
    }

    /// Counts braces and parens outside string literals
    fn balanced(text: &str) -> bool {
        let mut depth: i64 = 0;
        let mut in_string = false;
        let mut escaped = false;
        for c in text.chars() {
            if in_string {
                match (escaped, c) {
                    (true, _) => escaped = false,
                    (false, '\\') => escaped = true,
                    (false, '"') => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' | '(' | '[' => depth += 1,
                '}' | ')' | ']' => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0 && !in_string
    }

    proptest! {
        #[test]
        fn test_escaped_string_decodes_to_original(value in ".*") {
            let literal = escape_string(&value);
            let decoded: String = serde_json::from_str(&literal).unwrap();
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn test_rendered_operation_is_balanced(
            field in field_name(),
            keys in prop::collection::vec(field_name(), 0..6),
            value in ".*",
            paths in prop::collection::vec("[a-z]{1,6}(\\.[a-z]{1,6}){0,2}", 0..6),
        ) {
            let mut input = InputObject::new();
            for key in &keys {
                input.set(key.clone(), value.clone());
            }
            let op = Operation::mutation(field.clone())
                .arg("input", input)
                .select_all(&paths);
            let text = op.render();

            prop_assert!(text.starts_with("mutation { "), "missing mutation prefix: {}", text);
            prop_assert!(text.contains(&field));
            prop_assert!(balanced(&text), "unbalanced: {}", text);
        }

        #[test]
        fn test_set_keeps_last_value(
            key in field_name(),
            first in ".*",
            second in ".*",
        ) {
            let object = InputObject::new().field(key.clone(), first).field(key.clone(), second.clone());
            prop_assert_eq!(object.len(), 1);
            prop_assert_eq!(object.get(&key).and_then(InputValue::as_str), Some(second.as_str()));
        }
    }
}
