use descent::*;

type Table = Vec<Vec<i64>>;

/// table = {row}
/// row = cell, {",", cell}, (EOL | end of input)
fn table() -> impl Parser<Output = Table> {
    let cell = all(
        |row: &mut Vec<i64>, (digits,): (String,)| {
            row.push(digits.parse()?);
            Ok(())
        },
        (some(accept(Digit)),),
    );
    let row = all(
        |table: &mut Table, (cells, _): (Vec<i64>, String)| {
            table.push(cells);
            Ok(())
        },
        (sep_by(cell, accept(Char(','))), accept(Eol.or(Eof))),
    );
    many(row)
}

#[test]
fn rows_and_columns() {
    let table = table();
    assert_eq!(
        parse_complete(&table, "1,2,3\n4,5,6\n", &mut ()).unwrap(),
        vec![vec![1, 2, 3], vec![4, 5, 6]]
    );
}

#[test]
fn last_line_without_newline() {
    let table = table();
    assert_eq!(
        parse_complete(&table, "10,20\n30", &mut ()).unwrap(),
        vec![vec![10, 20], vec![30]]
    );
    assert_eq!(parse_complete(&table, "", &mut ()).unwrap(), Table::new());
}

#[test]
fn bad_cell_is_located() {
    let table = table();
    let err = parse(&table, "7,8,x", &mut ()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Consumed);
    assert_eq!((err.row, err.column), (1, 5));
    assert_eq!(err.found, Symbol(Some('x')));
    assert!(err.to_string().contains("found 'x'"), "{err}");
}

#[test]
fn bad_cell_on_a_later_line() {
    let table = table();
    let err = parse(&table, "1,2\n3,,4\n", &mut ()).unwrap_err();
    assert_eq!((err.row, err.column), (2, 3));
    assert_eq!(err.found, Symbol(Some(',')));
    assert!(err.report().to_string().contains("\n3,,4\n ^^\n"));
}

#[test]
fn trailing_garbage() {
    let table = table();
    let err = parse_complete(&table, "1,2\n;", &mut ()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Trailing);
    assert_eq!((err.row, err.column), (2, 1));

    let err = parse_complete(&table, "1,2;", &mut ()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Consumed);
    assert_eq!(err.column, 4);
}
