//! Identifier sanitization.
//!
//! Lua reserved words that are legal JavaScript identifiers get a `_K_`
//! prefix; `$` is not a valid Lua identifier character and becomes `_S`.
//! Both mappings are idempotent: sanitizing a sanitized name is a no-op.

/// Lua keywords that can appear as identifiers in JavaScript source.
const LUA_RESERVED: [&str; 11] = [
    "and", "do", "elseif", "end", "local", "nil", "not", "or", "repeat", "then", "until",
];

/// The full Lua reserved-word set, for deciding whether a property name can
/// use `.name` / `:name` syntax.
const LUA_KEYWORDS: [&str; 21] = [
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Whether `name` is usable verbatim as a Lua identifier (dot member
/// access, method-call syntax).
pub fn is_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    !LUA_KEYWORDS.contains(&name)
}

pub fn sanitize(name: &str) -> String {
    if LUA_RESERVED.contains(&name) {
        return format!("_K_{name}");
    }
    name.replace('$', "_S")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_lua_keywords() {
        assert_eq!(sanitize("end"), "_K_end");
        assert_eq!(sanitize("nil"), "_K_nil");
        assert_eq!(sanitize("local"), "_K_local");
    }

    #[test]
    fn escapes_dollar_signs() {
        assert_eq!(sanitize("$"), "_S");
        assert_eq!(sanitize("jQuery$x$"), "jQuery_Sx_S");
    }

    #[test]
    fn is_idempotent() {
        for name in ["end", "do", "$x", "a$b", "plain", "_K_end", "_S"] {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn leaves_ordinary_names_alone() {
        assert_eq!(sanitize("console"), "console");
        assert_eq!(sanitize("arguments"), "arguments");
    }

    #[test]
    fn lua_identifier_check() {
        assert!(is_lua_identifier("log"));
        assert!(is_lua_identifier("_private2"));
        assert!(!is_lua_identifier("end"));
        assert!(!is_lua_identifier("break"));
        assert!(!is_lua_identifier("$x"));
        assert!(!is_lua_identifier("2x"));
        assert!(!is_lua_identifier(""));
    }
}
