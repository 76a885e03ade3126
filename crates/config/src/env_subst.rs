/// Replace `${ENV_VAR}` placeholders with the variable's value.
///
/// Placeholders whose variable is unset, and malformed placeholders, are
/// emitted verbatim.
pub fn substitute_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                out.push_str("${");
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(unsafe_code)] // std::env::set_var is unsafe in edition 2024
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        unsafe { std::env::set_var("AMORIS_TEST_VAR", "hello") };
        assert_eq!(substitute_env("url=${AMORIS_TEST_VAR}"), "url=hello");
        unsafe { std::env::remove_var("AMORIS_TEST_VAR") };
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env("${AMORIS_NONEXISTENT_XYZ}"),
            "${AMORIS_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn leaves_unterminated_placeholder() {
        assert_eq!(substitute_env("prefix ${NOPE"), "prefix ${NOPE");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
