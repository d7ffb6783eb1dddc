use lunify_emitter::transpile;

fn lua(source: &str) -> String {
    transpile("test.js", source).expect("transpile failed")
}

// ==================== Program scaffold ====================

#[test]
fn program_prologue_and_epilogue() {
    let out = lua("var x = 1;");
    assert!(out.starts_with("local _JS = require('colony-lib');"));
    assert!(out.contains("local undefined = nil;"));
    assert!(out.contains(
        "local this, global, Object, Array, Number, String, RegExp, Date, Math, JSON, require, console, sleep, null = _JS.this"
    ));
    assert!(out.contains("local _module = {exports={}}; local exports = _module.exports;"));
    assert!(out.ends_with("return _module.exports;"));
}

// ==================== Hoisting ====================

#[test]
fn variables_hoist_to_scope_top_at_any_depth() {
    let out = lua("function f(x) { if (x) { var deep = 1; while (x) { var deeper = 2; } } var top = 3; }");
    let body_start = out.find("_JS._func(function (this, x)").expect("function emitted");
    let locals = out[body_start..]
        .find("local deep, deeper, top;")
        .expect("hoisted locals present");
    // The hoisted local line precedes every use.
    assert!(locals < out[body_start..].find("deep = (1);").unwrap());
    assert!(locals < out[body_start..].find("top = (3);").unwrap());
}

#[test]
fn declaration_site_becomes_plain_assignment() {
    let out = lua("var a = 1, b, c = 2;");
    assert!(out.contains("local a, b, c;"));
    assert!(out.contains("a, b, c = (1), nil, (2);"));
}

#[test]
fn function_declarations_hoist_above_statements() {
    let out = lua("go();\nfunction go() {}");
    let decl = out.find("go = _JS._func(function (this)").expect("declaration");
    let call = out.find("go(global)").expect("call site");
    assert!(decl < call);
}

// ==================== Identifiers ====================

#[test]
fn lua_keywords_and_dollars_are_mangled() {
    let out = lua("var end = 1; var $jq = 2; end = $jq;");
    assert!(out.contains("local _K_end, _Sjq;"));
    assert!(out.contains("_K_end = _Sjq;"));
}

// ==================== Literals ====================

#[test]
fn literal_forms() {
    let out = lua("var a = 3, b = 1.5, c = 'hi\\n\"x\"', d = true, e = null;");
    assert!(out.contains("a, b, c, d, e = (3), (1.5), (\"hi\\n\\\"x\\\"\"), (true), (null);"));
}

#[test]
fn regex_literal_wraps_pattern_and_flags() {
    let out = lua("var r = /a+[/]b/gi;");
    assert!(out.contains("r = _JS._new(RegExp, (\"/a+[/]b/gi\"));"));
}

// ==================== Operators ====================

#[test]
fn equality_maps_to_single_operator() {
    let out = lua("x = a == b; y = a === b; z = a !== b;");
    assert!(out.contains("x = (a == b);"));
    assert!(out.contains("y = (a == b);"));
    assert!(out.contains("z = (a ~= b);"));
}

#[test]
fn bitwise_operators_route_through_runtime() {
    let out = lua("x = a & b; y = a | b; z = a << 2; w = a >>> 1;");
    assert!(out.contains("x = _JS._bit.band(a, b);"));
    assert!(out.contains("y = _JS._bit.bor(a, b);"));
    assert!(out.contains("z = _JS._bit.lshift(a, (2));"));
    assert!(out.contains("w = _JS._bit.rshift(a, (1));"));
}

#[test]
fn compound_assignment_desugars_through_the_same_mapping() {
    let out = lua("a += 1; b |= c;");
    assert!(out.contains("a = (a + (1));"));
    assert!(out.contains("b = _JS._bit.bor(b, c);"));
}

#[test]
fn typeof_instanceof_delete() {
    let out = lua("x = typeof a; y = b instanceof C; delete o.k;");
    assert!(out.contains("x = _JS._typeof(a);"));
    assert!(out.contains("y = _JS._instanceof(b, C);"));
    assert!(out.contains("o.k = nil;"));
}

#[test]
fn logical_operators_and_statement_wrapping() {
    let out = lua("x = a && b; a || b();");
    assert!(out.contains("x = (a and b);"));
    assert!(out.contains("if (a or b(global)) then end;"));
}

#[test]
fn assignment_in_expression_position_becomes_a_closure() {
    let out = lua("f(x = 2);");
    assert!(out.contains("f(global, (function () local _r = (2); x = _r; return _r; end)())"));
}

#[test]
fn update_expressions_become_closures() {
    let out = lua("var a = i++; var b = --j;");
    assert!(out.contains("(function () local _r = i; i = _r + 1; return _r end)()"));
    assert!(out.contains("(function () j = j - 1; return j; end)()"));
}

#[test]
fn conditional_uses_table_selection() {
    let out = lua("var x = a ? b : c;");
    assert!(out.contains("x = (_JS._truthy(a) and {b} or {c})[1];"));
}

// ==================== Calls, members, new ====================

#[test]
fn free_calls_pass_the_global_receiver() {
    let out = lua("f(1, 2);");
    assert!(out.contains("f(global, (1), (2))"));
}

#[test]
fn method_calls_use_colon_syntax() {
    let out = lua("list.push(4);");
    assert!(out.contains("list:push((4))"));
}

#[test]
fn console_log_gains_a_trailing_empty_string() {
    let out = lua("console.log(x);");
    assert!(out.contains("console:log(x, \"\")"));
}

#[test]
fn computed_method_calls_evaluate_the_receiver_once() {
    let out = lua("obj[k](1);");
    assert!(out.contains("(function (_o) return _o[k](_o, (1)); end)(obj)"));
}

#[test]
fn keyword_property_names_use_bracket_indexing() {
    let out = lua("x = o.end; o.until = 1;");
    assert!(out.contains("x = o[\"end\"];"));
    assert!(out.contains("o[\"until\"] = (1);"));
}

#[test]
fn new_routes_through_the_runtime_constructor() {
    let out = lua("var d = new Date(2020, 1);");
    assert!(out.contains("d = _JS._new(Date, (2020), (1));"));
}

#[test]
fn object_and_array_literals_use_runtime_constructors() {
    let out = lua("var o = {a: 1, 'b c': 2}; var e = [], n = [7, 8];");
    assert!(out.contains("[\"a\"]=(1)"));
    assert!(out.contains("[\"b c\"]=(2)"));
    assert!(out.contains("e, n = _JS._arr({}), _JS._arr({[0]=(7), (8)});"));
}

// ==================== Control flow ====================

#[test]
fn if_statements_coerce_truthiness_only_when_needed() {
    let out = lua("if (x) { f(); } if (x < 2) { g(); }");
    assert!(out.contains("if _JS._truthy(x) then"));
    assert!(out.contains("if (x < (2)) then"));
}

#[test]
fn return_wraps_in_a_conditional() {
    let out = lua("function f() { return 1; return; }");
    assert!(out.contains("if true then return (1); end;"));
    assert!(out.contains("if true then return; end;"));
}

#[test]
fn throw_becomes_error() {
    let out = lua("throw x;");
    assert!(out.contains("error(x)"));
}

#[test]
fn for_in_iterates_pairs() {
    let out = lua("for (var k in o) { console.log(k); }");
    assert!(out.contains("for k in pairs(o) do"));
}

// ==================== Loops and break/continue ====================

#[test]
fn scenario_continue_skips_one_iteration() {
    let out = lua("for (var i = 0; i < 3; i++) { if (i == 1) continue; console.log(i); }");
    assert!(out.contains("local i;"));
    assert!(out.contains("i = (0);"));
    assert!(out.contains("while (i < (3)) do"));
    // The continue wraps the body in a single-iteration block...
    assert!(out.contains("local _c = nil; repeat"));
    assert!(out.contains("_c = _JS._cont; break;"));
    // ...whose closing check only exits the loop for a break sentinel.
    assert!(out.contains("until true;\nif _c == _JS._break then break end"));
    // The update still runs after a continue, before `end`.
    let check = out.find("if _c == _JS._break then break end").unwrap();
    let update = out
        .find("(function () local _r = i; i = _r + 1; return _r end)();")
        .unwrap();
    assert!(check < update);
    assert!(out.contains("console:log(i, \"\")"));
}

#[test]
fn plain_break_stays_native() {
    let out = lua("while (x) { break; }");
    assert!(out.contains("break;"));
    // No continue anywhere: no wrapper, no flag.
    assert!(!out.contains("local _c = nil; repeat"));
    assert!(!out.contains("_c = _JS._break"));
}

#[test]
fn labeled_break_sets_the_label_flag_and_unwinds() {
    let out =
        lua("outer: for (var i = 0; i < 3; i++) { for (var j = 0; j < 3; j++) { break outer; } }");
    assert!(out.contains("_couter = _JS._break; break;"));
    // Inner loop checks the outer label flag to keep unwinding.
    assert!(out.contains("if _c == _JS._break or _couter then break end"));
    // Outer loop reacts to its own flag.
    assert!(out.contains("local _couter = nil; repeat"));
    assert!(out.contains("if _couter == _JS._break then break end"));
}

#[test]
fn continue_inside_try_returns_the_sentinel() {
    let out = lua("for (var i = 0; i < 3; i++) { try { if (i == 1) continue; } catch (e) {} console.log(i); }");
    // Inside the protected call, continue must travel by return value.
    assert!(out.contains("_c = _JS._cont; return _JS._cont;"));
    // The try re-issues the pending jump after the handler/finalizer.
    assert!(out.contains("if _r == _JS._break then\nbreak;\nelseif _r == _JS._cont then\nbreak;\nend"));
    // And the loop is wrapped so that break only ends the iteration.
    assert!(out.contains("local _c = nil; repeat"));
}

#[test]
fn do_while_uses_repeat_until_negation() {
    let out = lua("do { f(); } while (x);");
    assert!(out.contains("repeat"));
    assert!(out.contains("until not _JS._truthy(x);"));
}

#[test]
fn break_inside_nested_unwrapped_loop_does_not_leak_a_flag() {
    // The outer loop is wrapped (it has a continue); the inner loop's plain
    // break must not set the outer loop's `_c`.
    let out = lua("while (a) { if (p) continue; while (b) { break; } f(); }");
    assert!(!out.contains("_c = _JS._break"));
}

// ==================== Switch ====================

#[test]
fn switch_fallthrough_and_default() {
    let out = lua(
        "switch (x) { case 1: a(); case 2: b(); break; case 3: c(); break; default: d(); }",
    );
    // Discriminant first, then each test, in source order.
    let r = out.find("local _r = x;").unwrap();
    let t0 = out.find("local _0 = (1);").unwrap();
    let t1 = out.find("local _1 = (2);").unwrap();
    assert!(r < t0 && t0 < t1);
    // The default slot is a fresh unique value, selected only on no-match.
    assert!(out.contains("local _3 = {};"));
    assert!(out.contains("if _r ~= _0 and _r ~= _1 and _r ~= _2 then _r = _3 end"));
    // Case 1 has no break: it advances into case 2.
    assert!(out.contains("_r = _1;"));
    // Case 2 ends with break: no advance into case 3.
    assert!(!out.contains("_r = _2;"));
    assert!(out.contains("until true"));
}

#[test]
fn default_position_does_not_matter() {
    let out = lua("switch (x) { default: d(); break; case 1: a(); }");
    assert!(out.contains("local _0 = {};"));
    assert!(out.contains("if _r ~= _1 then _r = _0 end"));
}

#[test]
fn continue_crossing_a_switch_is_reissued_after_it() {
    let out = lua("while (x) { switch (y) { case 1: continue; } f(); }");
    // Continue exits the switch's repeat natively, then the check after
    // `until true` forwards it to the loop wrapper.
    assert!(out.contains("_c = _JS._cont; break;"));
    assert!(out.contains("if _c ~= nil then break end"));
    assert!(out.contains("if _c == _JS._break then break end"));
}

// ==================== Try / catch / finally ====================

#[test]
fn try_catch_shape() {
    let out = lua("try { f(); } catch (e) { g(e); }");
    assert!(out.contains("local _e = nil"));
    assert!(out.contains("local _s, _r = xpcall(function ()"));
    assert!(out.contains("if _s == false then"));
    assert!(out.contains("local e = _e;"));
    assert!(out.contains("g(global, e)"));
}

#[test]
fn finally_runs_after_catch_and_once() {
    let out = lua("try { f(); } catch (e) { g(); } finally { h(); }");
    let catch_at = out.find("g(global)").unwrap();
    let finally_at = out.find("h(global)").unwrap();
    assert!(catch_at < finally_at);
    assert_eq!(out.matches("h(global)").count(), 1);
}

#[test]
fn try_finally_without_catch_reraises() {
    let out = lua("try { f(); } finally { h(); }");
    let finally_at = out.find("h(global)").unwrap();
    let reraise = out.find("if _s == false then error(_e) end").unwrap();
    assert!(finally_at < reraise);
}

// ==================== Functions ====================

#[test]
fn functions_take_an_explicit_receiver() {
    let out = lua("var f = function (a, b) { return a; };");
    assert!(out.contains("f = _JS._func(function (this, a, b)"));
}

#[test]
fn arguments_usage_switches_to_varargs() {
    let out = lua("function f(a) { return arguments[0]; }");
    assert!(out.contains("_JS._func(function (this, ...)"));
    assert!(out.contains(
        "local arguments = _JS._arr((function (...) return arg; end)(...)); arguments:shift();"
    ));
    assert!(out.contains("local a = ...;"));
    // `arguments` is bound by the capture, not the hoisted locals.
    assert!(!out.contains("local arguments;"));
}

#[test]
fn named_function_expression_gets_a_self_alias() {
    let out = lua("var g = function fact(n) { return fact(n - 1); };");
    assert!(out.contains("local fact = debug.getinfo(1, 'f').func;"));
}

#[test]
fn plain_recursion_through_the_outer_binding_needs_no_alias() {
    let out = lua("function fib(n) { return fib(n - 1); }");
    assert!(!out.contains("debug.getinfo"));
}

// ==================== Statement-position wrapping ====================

#[test]
fn expression_statements_that_are_not_lua_statements_get_wrapped() {
    let out = lua("x; a.b; a < b;");
    assert!(out.contains("if x then end;"));
    assert!(out.contains("if a.b then end;"));
    assert!(out.contains("if (a < b) then end;"));
}

// ==================== Error reporting ====================

#[test]
fn parse_errors_carry_the_file_name() {
    let err = transpile("broken.js", "function () {").unwrap_err();
    assert_eq!(err.file, "broken.js");
    assert!(!err.message_text.is_empty());
}
