//! Program prologue/epilogue and scope-body assembly.

/// Import of the runtime support library every output file depends on.
pub const RUNTIME_REQUIRE: &str = "local _JS = require('colony-lib');";

/// Source-language globals deliberately shadowed to nil.
pub const MASKED_GLOBALS: [&str; 1] = ["undefined"];

/// Intrinsic globals bound to their runtime-library equivalents at the top
/// of every program.
pub const INTRINSIC_GLOBALS: [&str; 14] = [
    "this", "global", "Object", "Array", "Number", "String", "RegExp", "Date", "Math", "JSON",
    "require", "console", "sleep", "null",
];

/// A function or program body: one `local` line for the hoisted names,
/// then function declarations (hoisted above ordinary statements, matching
/// source-language function hoisting), then everything else.
pub fn scope_body(ids: &[String], function_decls: &[String], statements: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !ids.is_empty() {
        parts.push(format!("local {};", ids.join(", ")));
    }
    parts.extend(function_decls.iter().filter(|s| !s.is_empty()).cloned());
    parts.extend(statements.iter().filter(|s| !s.is_empty()).cloned());
    parts.join("\n")
}

/// Wrap a fully rewritten program body with the runtime import, masked
/// globals, intrinsic bindings, and module scaffold.
pub fn assemble_program(body: &str) -> String {
    let masked = format!(
        "local {} = {};",
        MASKED_GLOBALS.join(", "),
        MASKED_GLOBALS.map(|_| "nil").join(", ")
    );
    let intrinsics = format!(
        "local {} = {};",
        INTRINSIC_GLOBALS.join(", "),
        INTRINSIC_GLOBALS
            .map(|name| format!("_JS.{name}"))
            .join(", ")
    );
    [
        RUNTIME_REQUIRE,
        &masked,
        &intrinsics,
        "local _module = {exports={}}; local exports = _module.exports;",
        "",
        body,
        "",
        "return _module.exports;",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_scaffold_shape() {
        let out = assemble_program("x = (1);");
        assert!(out.starts_with(RUNTIME_REQUIRE));
        assert!(out.contains("local undefined = nil;"));
        assert!(out.contains("_JS.console"));
        assert!(out.ends_with("return _module.exports;"));
    }

    #[test]
    fn function_declarations_rise_above_statements() {
        let out = scope_body(
            &["a".to_string()],
            &["f = _JS._func(function (this) end);".to_string()],
            &["a = (1);".to_string()],
        );
        let f_at = out.find("f = ").unwrap();
        let a_at = out.find("a = (1)").unwrap();
        assert!(out.starts_with("local a;"));
        assert!(f_at < a_at);
    }
}
