use descent::*;

/// A word that is logged to the external state as soon as it is read.
fn logged_word() -> impl Parser<Vec<String>, Output = String> + Clone {
    token(all_with(
        |out: &mut String, (word,): (String,), log: &mut Vec<String>| {
            log.push(word.clone());
            out.push_str(&word);
            Ok(())
        },
        (some(accept(Alpha)),),
    ))
}

#[test]
fn attempt_restores_cursor_state_and_output() {
    let call = sequence(logged_word(), token(accept(Char('('))));
    let assignment = sequence(logged_word(), token(accept(Char('='))));
    let statement = choice(attempt(call), assignment);

    let mut log = Vec::new();
    let out = parse(&statement, "x = ", &mut log).unwrap();
    assert_eq!(out.as_deref(), Some("x="));
    assert_eq!(log, ["x"]);

    let mut log = Vec::new();
    let out = parse(&statement, "f(", &mut log).unwrap();
    assert_eq!(out.as_deref(), Some("f("));
    assert_eq!(log, ["f"]);
}

#[test]
fn without_attempt_the_grammar_is_rejected() {
    let call = sequence(logged_word(), token(accept(Char('('))));
    let assignment = sequence(logged_word(), token(accept(Char('='))));
    let statement = choice(call, assignment);

    let mut log = Vec::new();
    let err = parse(&statement, "x = ", &mut log).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Consumed);
    assert_eq!(err.column, 3);
    assert_eq!(log, ["x"]);
}

#[test]
fn fatal_errors_pass_through_attempt() {
    let call = sequence(
        logged_word(),
        token(strict("expected an argument list", accept(Char('(')))),
    );
    let statement = attempt(call);

    let mut log = vec!["before".to_string()];
    let mut cursor = Cursor::new("f = 1");
    let mut out = String::new();
    let err = statement
        .parse(&mut cursor, Some(&mut out), &mut log)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Strict);
    assert_eq!(err.column, 3);
    assert_eq!(cursor.offset(), 0);
    assert_eq!(cursor.depth(), 0);
    assert_eq!(log, ["before"]);
    assert!(out.is_empty());
}

#[test]
fn state_is_only_snapshotted_for_actions() {
    // `String` is the external state here; recognizers never touch it.
    let keyword = attempt(sequence(literal("for"), accept(Space)));
    let mut state = "untouched".to_string();
    let mut cursor = Cursor::new("format");
    assert_eq!(keyword.parse(&mut cursor, None, &mut state), Ok(false));
    assert_eq!(cursor.offset(), 0);
    assert!(!keyword.has_side_effects());
    assert!(attempt(logged_word()).has_side_effects());
}

#[test]
fn many_attempts() {
    // pairs = {attempt(word, "=", word)}, word
    let pair = attempt(sequence(
        logged_word(),
        sequence(token(accept(Char('='))), logged_word()),
    ));
    let program = sequence(many(pair), logged_word());

    let mut log = Vec::new();
    let out = parse(&program, "a = b c = d e", &mut log).unwrap();
    assert_eq!(out.as_deref(), Some("a=bc=de"));
    assert_eq!(log, ["a", "b", "c", "d", "e"]);
}
