//! Integer calculator with the usual precedence.
//!
//! ```text
//! cargo run --example calc -- "11 + 2 * (3 + 4) / 5"
//! ```

use std::rc::Rc;

use descent::*;

type Ops = Vec<(String, i64)>;

fn apply(lhs: i64, op: &str, rhs: i64) -> anyhow::Result<i64> {
    Ok(match op {
        "+" => lhs + rhs,
        "-" => lhs - rhs,
        "*" => lhs * rhs,
        "/" => lhs
            .checked_div(rhs)
            .ok_or_else(|| anyhow::anyhow!("division by zero"))?,
        _ => anyhow::bail!("unknown operator {op}"),
    })
}

/// `operand, {op, operand}`, folded to the left.
fn chain<P>(operand: P, op: impl Predicate + Clone) -> impl Parser<Output = i64> + Clone
where
    P: Parser<Output = i64> + Clone,
{
    let tail = all(
        |ops: &mut Ops, (op, rhs): (String, i64)| {
            ops.push((op, rhs));
            Ok(())
        },
        (token(accept(op)), operand.clone()),
    );
    all(
        |value: &mut i64, (first, rest): (i64, Ops)| {
            *value = rest
                .iter()
                .try_fold(first, |lhs, (op, rhs)| apply(lhs, op, *rhs))?;
            Ok(())
        },
        (operand, many(tail)),
    )
}

/// expr = term, {("+" | "-"), term}
/// term = factor, {("*" | "/"), factor}
/// factor = number | "(", expr, ")"
fn calculator(arena: &Rc<Arena>) -> impl Parser<Output = i64> {
    let expr = Handle::<i64>::declare(arena);

    let number = define(
        "number",
        token(all(
            |n: &mut i64, (digits,): (String,)| {
                *n = digits.parse()?;
                Ok(())
            },
            (some(accept(Digit)),),
        )),
    );
    let group = all(
        |value: &mut i64, (_, inner, _): (String, i64, String)| {
            *value = inner;
            Ok(())
        },
        (
            token(accept(Char('('))),
            reference("expr", expr.clone()),
            token(strict("unclosed parenthesis", accept(Char(')')))),
        ),
    );
    let factor = define(
        "factor",
        any(
            |value: &mut i64, alt: Alt2<i64, i64>| {
                *value = match alt {
                    Alt2::A(v) | Alt2::B(v) => v,
                };
                Ok(())
            },
            (number, group),
        ),
    );
    let term = define("term", chain(factor, Char('*').or(Char('/'))));
    expr.define(chain(term, Char('+').or(Char('-'))));

    sequence(first_token(), reference("expr", expr))
}

fn main() {
    let input = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let input = if input.is_empty() {
        "11 + 2 * (3 + 4) / 5".to_string()
    } else {
        input
    };

    let arena = Arena::new();
    let parser = calculator(&arena);
    match parse_complete(&parser, &input, &mut ()) {
        Ok(value) => println!("{input} = {value}"),
        Err(err) => {
            eprint!("{}", err.report());
            std::process::exit(1);
        }
    }
}
