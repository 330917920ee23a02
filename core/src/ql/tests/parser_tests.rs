use pretty_assertions::assert_eq;

use crate::ql::ast::*;
use crate::ql::{Error, parse};

fn parse_single(input: &str) -> Statement {
    let query = parse(input, "/root").unwrap();
    assert_eq!(query.statements.len(), 1, "expected exactly one statement");
    query.statements.into_iter().next().unwrap()
}

fn comparison(property: &str, op: BinaryOp, value: &str) -> Expression {
    Expression::binary(
        op,
        Expression::Literal(property.to_string()),
        Expression::Literal(value.to_string()),
    )
}

#[test]
fn test_simple_select() {
    let statement = parse_single("SELECT 'files' FROM ''");

    assert_eq!(
        statement,
        Statement::Select(Selection {
            target: "files".to_string(),
            from: String::new(),
            where_clause: None,
        })
    );
}

#[test]
fn test_select_with_where() {
    let statement = parse_single("SELECT 'files' FROM 'docs' WHERE 'name' LIKE 'test'");

    match statement {
        Statement::Select(selection) => {
            assert_eq!(selection.from, "docs");
            assert_eq!(
                selection.where_clause,
                Some(comparison("name", BinaryOp::Like, "test"))
            );
        }
        other => panic!("Expected select statement, got {:?}", other),
    }
}

#[test]
fn test_destination_statements() {
    let cases = [
        ("MOVE 'files' FROM '' TO 'moved'", "MOVE"),
        ("COPY 'folders' FROM 'a' TO 'b'", "COPY"),
        ("ARCHIVE 'files' FROM '' TO 'archive.zip'", "ARCHIVE"),
        ("UNARCHIVE 'files' FROM '' TO 'out'", "UNARCHIVE"),
        ("CONVERT 'files' FROM '' WHERE 'extension' = 'jpg' TO 'png'", "CONVERT"),
    ];

    for (input, keyword) in cases {
        let statement = parse_single(input);
        assert_eq!(statement.keyword(), keyword);
        assert!(statement.destination().is_some(), "{} has no destination", input);
    }
}

#[test]
fn test_convert_keeps_where_before_to() {
    let statement = parse_single("CONVERT 'files' FROM '' WHERE 'extension' = 'jpg' TO 'png'");

    match statement {
        Statement::Convert(transfer) => {
            assert_eq!(transfer.to, "png");
            assert_eq!(
                transfer.selection.where_clause,
                Some(comparison("extension", BinaryOp::Eq, "jpg"))
            );
        }
        other => panic!("Expected convert statement, got {:?}", other),
    }
}

#[test]
fn test_every_comparison_operator() {
    let cases = [
        ("LIKE", BinaryOp::Like),
        ("=", BinaryOp::Eq),
        ("!=", BinaryOp::NotEq),
        ("<>", BinaryOp::NotEq),
        ("<", BinaryOp::Lt),
        (">", BinaryOp::Gt),
        ("<=", BinaryOp::LtEq),
        (">=", BinaryOp::GtEq),
    ];

    for (symbol, op) in cases {
        let input = format!("SELECT 'files' FROM '' WHERE 'size' {} '10'", symbol);
        let statement = parse_single(&input);
        assert_eq!(
            statement.selection().where_clause,
            Some(comparison("size", op, "10")),
            "operator {}",
            symbol
        );
    }
}

#[test]
fn test_and_or_fold_left_without_precedence() {
    let a = || comparison("name", BinaryOp::Like, "a");
    let b = || comparison("size", BinaryOp::Gt, "1");
    let c = || comparison("extension", BinaryOp::Eq, "txt");

    let and_or = parse_single(
        "SELECT 'files' FROM '' WHERE 'name' LIKE 'a' AND 'size' > '1' OR 'extension' = 'txt'",
    );
    assert_eq!(
        and_or.selection().where_clause,
        Some(Expression::binary(
            BinaryOp::Or,
            Expression::binary(BinaryOp::And, a(), b()),
            c()
        ))
    );

    let or_and = parse_single(
        "SELECT 'files' FROM '' WHERE 'name' LIKE 'a' OR 'size' > '1' AND 'extension' = 'txt'",
    );
    assert_eq!(
        or_and.selection().where_clause,
        Some(Expression::binary(
            BinaryOp::And,
            Expression::binary(BinaryOp::Or, a(), b()),
            c()
        ))
    );
}

#[test]
fn test_multiple_statements_and_semicolons() {
    let input = r#"
        -- tidy up downloads
        SELECT 'files' FROM 'downloads';
        ;;
        DELETE "folders" FROM "tmp" WHERE "name" = 'cache'
        MOVE 'files' FROM '' WHERE 'extension' = 'pdf' TO 'pdfs';
    "#;

    let query = parse(input, "/home/me").unwrap();
    assert_eq!(query.directory, std::path::PathBuf::from("/home/me"));

    let keywords: Vec<_> = query.statements.iter().map(|s| s.keyword()).collect();
    assert_eq!(keywords, vec!["SELECT", "DELETE", "MOVE"]);
}

#[test]
fn test_empty_input_has_no_statements() {
    assert!(parse("", "/").unwrap().statements.is_empty());
    assert!(parse("  -- only a comment", "/").unwrap().statements.is_empty());
}

#[test]
fn test_parse_is_deterministic() {
    let input = "COPY 'files' FROM 'a' WHERE 'size' >= '10' OR 'name' LIKE 'x' TO 'b'; SELECT 'folders' FROM ''";
    assert_eq!(parse(input, "/r").unwrap(), parse(input, "/r").unwrap());
}

#[test]
fn test_display_round_trips() {
    let input = "MOVE 'files' FROM 'in' WHERE 'name' LIKE 'a' AND 'size' > '1' OR 'extension' != \"it's\" TO 'out'";
    let statement = parse_single(input);

    let reparsed = parse_single(&statement.to_string());
    assert_eq!(reparsed, statement);
}

#[test]
fn test_missing_to_clause_is_syntax_error() {
    let err = parse("MOVE 'files' FROM ''", "/").unwrap_err();
    assert_eq!(
        err,
        Error::SyntaxError("Unexpected end of input, expected TO".to_string())
    );
}

#[test]
fn test_unexpected_token_names_literal() {
    let err = parse("SELECT 'files' WHERE 'name' = 'x'", "/").unwrap_err();
    match err {
        Error::SyntaxError(msg) => assert!(msg.contains("'WHERE'"), "{}", msg),
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_bare_literal_where_is_rejected() {
    assert!(parse("SELECT 'files' FROM '' WHERE 'name'", "/").is_err());
}

#[test]
fn test_error_discards_earlier_statements() {
    let err = parse("SELECT 'files' FROM ''; DELETE 'files'", "/").unwrap_err();
    assert!(matches!(err, Error::SyntaxError(_)));
}

#[test]
fn test_lexical_error_reports_position() {
    let err = parse("SELECT 'files' FROM '' WHERE 'size' ~ '1'", "/").unwrap_err();
    match err {
        Error::LexicalError { pos, msg } => {
            assert_eq!(pos, 36);
            assert!(msg.contains("~ '1'"), "{}", msg);
        }
        other => panic!("Expected lexical error, got {:?}", other),
    }
}

#[test]
fn test_lowercase_keywords_are_not_keywords() {
    assert!(matches!(
        parse("select 'files' from ''", "/"),
        Err(Error::LexicalError { .. })
    ));
}
