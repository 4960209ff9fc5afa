use std::collections::BTreeSet;

use descent::*;

#[derive(Debug, Default, Clone)]
struct Scope {
    variables: BTreeSet<String>,
    repeated: BTreeSet<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Clause {
    functor: String,
    repeated_in_head: Vec<String>,
    variables: Vec<String>,
    is_rule: bool,
}

#[derive(Debug, Default, Clone)]
struct Database {
    scope: Scope,
    clauses: Vec<Clause>,
}

/// program = {clause | comment}
/// clause = term, [":-", term, {",", term}], "."
/// term = variable | atom, ["(", term, {",", term}, ")"]
fn program() -> impl Parser<Database, Output = ()> {
    let term = fix("term", |term: Reference<Recur<String, Database>>| {
        let variable = token(all_with(
            |name: &mut String, (v,): (String,), db: &mut Database| {
                if !db.scope.variables.insert(v.clone()) {
                    db.scope.repeated.insert(v.clone());
                }
                *name = v;
                Ok(())
            },
            (sequence(
                accept(Upper.or(Char('_'))),
                many(accept(Alnum.or(Char('_')))),
            ),),
        ));
        let atom = token(sequence(
            accept(Lower),
            many(accept(Alnum.or(Char('_')))),
        ));
        let arguments = sequence(
            token(accept(Char('('))),
            sequence(
                sep_by(term, token(accept(Char(',')))),
                token(strict("unclosed argument list", accept(Char(')')))),
            ),
        );
        any(
            |out: &mut String, alt: Alt2<String, String>| {
                match alt {
                    Alt2::A(text) | Alt2::B(text) => out.push_str(&text),
                }
                Ok(())
            },
            (variable, sequence(atom, option(arguments))),
        )
    });

    let head = all_with(
        |clause: &mut Clause, (head,): (String,), db: &mut Database| {
            clause.functor = head.split('(').next().unwrap_or_default().to_string();
            clause.repeated_in_head = db.scope.repeated.iter().cloned().collect();
            Ok(())
        },
        (term.clone(),),
    );
    let body = option(all(
        |clause: &mut Clause, _: (String, String)| {
            clause.is_rule = true;
            Ok(())
        },
        (
            token(literal(":-")),
            sep_by(term, token(accept(Char(',')))),
        ),
    ));
    let clause = all_with(
        |_: &mut (), (mut clause, _): (Clause, String), db: &mut Database| {
            clause.variables = db.scope.variables.iter().cloned().collect();
            db.clauses.push(clause);
            db.scope = Scope::default();
            Ok(())
        },
        (
            sequence(head, body),
            token(strict("missing full stop", accept(Char('.')))),
        ),
    );
    let comment = discard(token(sequence(
        accept(Char('%')),
        many(accept(Eol.not())),
    )));

    sequence(first_token(), many(choice(clause, comment)))
}

fn load(source: &str) -> Vec<Clause> {
    let mut db = Database::default();
    parse_complete(&program(), source, &mut db).unwrap();
    db.clauses
}

#[test]
fn repeated_variable_in_head() {
    let clauses = load("bar(X,X).");
    assert_eq!(clauses.len(), 1);
    assert_eq!(clauses[0].functor, "bar");
    assert_eq!(clauses[0].repeated_in_head, ["X"]);
    assert_eq!(clauses[0].variables, ["X"]);
    assert!(!clauses[0].is_rule);
}

#[test]
fn distinct_variables() {
    let clauses = load("foo(X,Y).");
    assert!(clauses[0].repeated_in_head.is_empty());
    assert_eq!(clauses[0].variables, ["X", "Y"]);
}

#[test]
fn scope_is_per_clause() {
    let clauses = load(
        "% family\n\
         parent(tom, bob).\n\
         grandparent(X, Z) :- parent(X, Y), parent(Y, Z).\n\
         same(X, X).\n",
    );
    let summary: Vec<_> = clauses
        .iter()
        .map(|c| (c.functor.as_str(), c.repeated_in_head.len(), c.variables.len(), c.is_rule))
        .collect();
    assert_eq!(
        summary,
        [
            ("parent", 0, 0, false),
            ("grandparent", 0, 3, true),
            ("same", 1, 1, false),
        ]
    );
}

#[test]
fn nested_terms() {
    let clauses = load("  likes(mary, food(Kind, Kind)).");
    assert_eq!(clauses[0].functor, "likes");
    assert_eq!(clauses[0].repeated_in_head, ["Kind"]);
}

#[test]
fn missing_full_stop() {
    let mut db = Database::default();
    let err = parse_complete(&program(), "foo(a)\nbar(b).", &mut db).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Strict);
    assert_eq!(err.message, "missing full stop");
    assert_eq!((err.row, err.column), (2, 1));
    assert_eq!(err.expected, "'.'");
}

#[test]
fn unclosed_arguments() {
    let mut db = Database::default();
    let err = parse_complete(&program(), "foo(a b).", &mut db).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Strict);
    assert_eq!(err.column, 7);
    assert_eq!(err.found, Symbol(Some('b')));
}
