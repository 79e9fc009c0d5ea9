use std::collections::BTreeMap;

use clickhouse_columns::{
    escape_params, resolve, substitute_params, ClientSettings, ColumnKind, Context, EscapeError,
    ResolveError, Value, ValueKind,
};
use maplit::{btreemap, hashmap};
use pretty_assertions::assert_eq;

// set up logging for all the tests
use test_log::test;

#[test]
fn settings_load_from_json_with_defaults() {
    let context: Context = serde_json::from_str(
        r#"{
            "settings": { "strings_as_bytes": true },
            "server_info": { "timezone": "Europe/Berlin" }
        }"#,
    )
    .unwrap();
    assert_eq!(
        context.settings,
        ClientSettings::default().with_strings_as_bytes(true)
    );

    let col = resolve("String", &context).unwrap();
    assert_eq!(col.accepts(), &[ValueKind::Bytes]);
    assert_eq!(
        resolve("DateTime", &context).unwrap().ch_type(),
        "DateTime('Europe/Berlin')"
    );

    let empty: Context = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, Context::default());
}

#[test]
fn resolved_kinds_carry_their_parameters() {
    let col = resolve("Decimal(20, 5)", &Context::default()).unwrap();
    match col.kind() {
        ColumnKind::Decimal(d) => {
            assert_eq!((d.precision(), d.scale()), (20, 5));
        }
        other => panic!("expected a decimal, got {:?}", other),
    }

    let col = resolve("Enum8('x' = 0, 'y' = 1)", &Context::default()).unwrap();
    assert_eq!(col.null_value(), Value::str("x"));
    match col.kind() {
        ColumnKind::Enum(e) => assert_eq!(e.table().len(), 2),
        other => panic!("expected an enum, got {:?}", other),
    }
}

#[test]
fn strictness_comes_from_the_settings() {
    let relaxed = resolve("UInt8", &Context::default()).unwrap();
    assert!(!relaxed.types_check());

    let context =
        Context::default().with_settings(ClientSettings::default().with_types_check(true));
    let strict = resolve("Nullable(UInt8)", &context).unwrap();
    assert!(strict.types_check());
    assert!(strict.nullable());
}

#[test]
fn malformed_specs_fail() {
    let cases = vec![
        "Decimal(x, 2)",
        "FixedString(-1)",
        "Enum8()",
        "Enum8('a' = 1, 'a' = 2)",
        "Map(String, String)",
    ];
    for spec in cases {
        assert!(resolve(spec, &Context::default()).is_err(), "{}", spec);
    }
    assert_eq!(
        resolve("Enum16('a' = 1, 'b' = 1)", &Context::default()).unwrap_err(),
        ResolveError::DuplicateEnumMember("b".to_string())
    );
}

#[test]
fn params_are_escaped_as_a_set() {
    let params = btreemap! {
        "s" => Value::str("a'b"),
        "n" => Value::Null,
        "list" => Value::Array(vec![Value::Int(1), Value::str("x")]),
    };
    let escaped = escape_params(params.iter().map(|(k, v)| (*k, v)));
    let expected: BTreeMap<&str, String> = btreemap! {
        "s" => r"'a\'b'".to_string(),
        "n" => "NULL".to_string(),
        "list" => "[1, 'x']".to_string(),
    };
    assert_eq!(escaped, expected);
}

#[test]
fn queries_are_substituted() {
    let params = hashmap! {
        "id".to_string() => Value::Int(7),
        "name".to_string() => Value::str("O'Brien"),
    };
    let query = substitute_params(
        "SELECT * FROM t WHERE id = %(id)s AND name = %(name)s AND pct LIKE '5%%'",
        &params,
    )
    .unwrap();
    assert_eq!(
        query,
        r"SELECT * FROM t WHERE id = 7 AND name = 'O\'Brien' AND pct LIKE '5%'"
    );

    assert_eq!(
        substitute_params("SELECT %(other)s", &params),
        Err(EscapeError::MissingParameter("other".to_string()))
    );
}
