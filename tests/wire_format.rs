use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clickhouse_columns::{
    resolve, ClientSettings, Column, Context, EnumValue, IoBuffer, PackError, ReadError,
    SliceBuffer, Value, WriteError,
};
use pretty_assertions::assert_eq;
use uuid::Uuid;

// set up logging for all the tests
use test_log::test;

fn strict() -> Context {
    Context::default().with_settings(ClientSettings::default().with_types_check(true))
}

fn column(type_name: &str) -> Column {
    resolve(type_name, &strict()).unwrap()
}

fn encode(column: &Column, items: &[Value]) -> Vec<u8> {
    let mut bytes = Vec::new();
    column.write_data(items, &mut bytes).unwrap();
    bytes
}

fn decode(column: &Column, n_items: usize, bytes: Vec<u8>) -> Vec<Value> {
    let mut buf = SliceBuffer::from(bytes);
    let values = column.read_data(n_items, &mut buf).unwrap();
    assert!(buf.done());
    values
}

fn dec(s: &str) -> Value {
    Value::Decimal(BigDecimal::from_str(s).unwrap())
}

#[test]
fn int8_strict_truncation_preserves_sign() {
    let col = column("Int8");
    assert_eq!(encode(&col, &[Value::Int(-300)]), vec![0xd4]);
    assert_eq!(decode(&col, 1, vec![0xd4]), vec![Value::Int(-44)]);
}

#[test]
fn decimal128_sign_boundaries() {
    let col = column("Decimal(38, 0)");
    let boundaries: Vec<i128> = vec![
        0,
        1,
        -1,
        i128::from(i64::MAX),
        i128::from(i64::MIN),
        1 << 126,
        -(1 << 126),
    ];
    for raw in boundaries {
        let value = dec(&raw.to_string());
        let bytes = encode(&col, &[value.clone()]);
        assert_eq!(bytes, raw.to_le_bytes().to_vec(), "encoding {}", raw);
        assert_eq!(decode(&col, 1, bytes), vec![value], "decoding {}", raw);
    }
}

#[test]
fn uuid_and_decimal128_use_opposite_word_orders() {
    let uuid = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
    let uuid_bytes = encode(&column("UUID"), &[Value::Uuid(uuid)]);
    let decimal_bytes = encode(&column("Decimal(38, 0)"), &[Value::Int(1)]);

    let (high, low) = uuid_bytes.split_at(8);
    assert_eq!(high, &[0_u8; 8][..]);
    assert_eq!(low, &1_u64.to_le_bytes()[..]);

    let (low, high) = decimal_bytes.split_at(8);
    assert_eq!(low, &1_u64.to_le_bytes()[..]);
    assert_eq!(high, &[0_u8; 8][..]);
}

#[test]
fn decimal_sizes_follow_precision() {
    for (type_name, width) in [
        ("Decimal(9, 2)", 4),
        ("Decimal(18, 2)", 8),
        ("Decimal(38, 2)", 16),
    ] {
        let col = column(type_name);
        let bytes = encode(&col, &[dec("-12.34")]);
        assert_eq!(bytes.len(), width, "{}", type_name);
        assert_eq!(decode(&col, 1, bytes), vec![dec("-12.34")], "{}", type_name);
    }
}

#[test]
fn fixed_string_overflow_exact_length_and_trimming() {
    let col = column("FixedString(3)");

    let mut bytes = Vec::new();
    let err = col
        .write_data(&[Value::str("abcd")], &mut bytes)
        .unwrap_err();
    assert!(matches!(err, WriteError::ValueTooLarge { len: 4, width: 3, .. }));
    assert!(bytes.is_empty());

    assert_eq!(encode(&col, &[Value::str("abc")]), b"abc".to_vec());

    let bytes = encode(&col, &[Value::str("a"), Value::str("")]);
    assert_eq!(bytes, b"a\0\0\0\0\0".to_vec());
    assert_eq!(decode(&col, 2, bytes), vec![Value::str("a"), Value::str("")]);
}

#[test]
fn raw_fixed_strings_return_the_whole_slot() {
    let context = strict().with_settings(
        ClientSettings::default()
            .with_types_check(true)
            .with_strings_as_bytes(true),
    );
    let col = resolve("FixedString(4)", &context).unwrap();
    let bytes = encode(&col, &[Value::bytes(b"ab".to_vec())]);
    assert_eq!(decode(&col, 1, bytes), vec![Value::bytes(b"ab\0\0".to_vec())]);
}

#[test]
fn enum_errors_list_every_choice() {
    let col = column("Enum8('a' = 1, 'b' = 2)");
    let mut bytes = Vec::new();
    let err = col
        .write_data(&[Value::str("a"), Value::str("x")], &mut bytes)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown element 'x' for type Enum8('a' = 1, 'b' = 2)"
    );

    let err = col.write_data(&[Value::Int(3)], &mut bytes).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown element '3' for type Enum8('a' = 1, 'b' = 2)"
    );
    assert!(bytes.is_empty());
}

#[test]
fn enums_decode_to_names() {
    let col = column("Nullable(Enum16('low' = -1000, 'high' = 1000))");
    let items = vec![
        Value::Enum(EnumValue::new("high", 1000)),
        Value::Null,
        Value::Int(-1000),
    ];
    let bytes = encode(&col, &items);
    assert_eq!(
        decode(&col, 3, bytes),
        vec![Value::str("high"), Value::Null, Value::str("low")]
    );
}

#[test]
fn datetime_raw_integers_skip_timezone_math() {
    let server = clickhouse_columns::ServerInfo::default().with_timezone("Asia/Kolkata");
    let col = resolve("DateTime", &strict().with_server_info(server)).unwrap();
    let bytes = encode(&col, &[Value::Int(1_234_567_890)]);
    assert_eq!(bytes, 1_234_567_890_u32.to_le_bytes().to_vec());
}

#[test]
fn datetime_round_trips_in_its_timezone() {
    let col = column("DateTime('America/New_York')");
    let noon = NaiveDate::from_ymd_opt(2023, 7, 4)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let bytes = encode(&col, &[Value::DateTime(noon)]);
    // EDT is UTC-4
    assert_eq!(bytes, 1_688_486_400_u32.to_le_bytes().to_vec());
    assert_eq!(decode(&col, 1, bytes), vec![Value::DateTime(noon)]);
}

#[test]
fn dates_round_trip() {
    let col = column("Nullable(Date)");
    let items = vec![
        Value::Date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()),
        Value::Null,
        Value::Date(NaiveDate::from_ymd_opt(2149, 6, 6).unwrap()),
    ];
    let bytes = encode(&col, &items);
    assert_eq!(bytes, vec![0, 1, 0, 1, 0, 0, 0, 0xff, 0xff]);
    assert_eq!(decode(&col, 3, bytes), items);
}

#[test]
fn null_in_a_plain_column_writes_nothing() {
    let col = column("String");
    let mut bytes = Vec::new();
    let err = col
        .write_data(&[Value::str("a"), Value::Null], &mut bytes)
        .unwrap_err();
    assert!(matches!(err, WriteError::Pack(PackError::UnexpectedNull(1))));
    assert!(bytes.is_empty());
}

#[test]
fn relaxed_mode_accepts_mismatched_kinds_the_packer_can_handle() {
    let col = resolve("Float64", &Context::default()).unwrap();
    let bytes = encode(&col, &[Value::Int(2)]);
    assert_eq!(bytes, 2.0_f64.to_le_bytes().to_vec());

    let col = resolve("String", &Context::default()).unwrap();
    let bytes = encode(&col, &[Value::bytes(vec![0xc3, 0xa9])]);
    assert_eq!(decode(&col, 1, bytes), vec![Value::str("é")]);
}

#[test]
fn short_reads_surface_as_buffer_errors() {
    let col = column("UInt32");
    let mut buf = IoBuffer::new(std::io::Cursor::new(vec![1_u8, 2, 3]));
    assert!(matches!(
        col.read_data(1, &mut buf),
        Err(ReadError::Buffer(_))
    ));
}

#[test]
fn huge_row_counts_on_empty_input_are_short_reads() {
    for type_name in ["String", "Nullable(String)", "Int32", "FixedString(4)"] {
        let col = column(type_name);
        let result = col.read_data(usize::MAX / 8, &mut SliceBuffer::from(&[][..]));
        assert!(
            matches!(result, Err(ReadError::Buffer(_))),
            "{}",
            type_name
        );
    }
}

#[test]
fn columns_write_through_io_streams() {
    let col = column("Nullable(IPv4)");
    let mut sink = IoBuffer::new(Vec::new());
    col.write_data(
        &[Value::str("127.0.0.1"), Value::Null],
        &mut sink,
    )
    .unwrap();
    let bytes = sink.into_inner();
    assert_eq!(bytes, vec![0, 1, 1, 0, 0, 127, 0, 0, 0, 0]);
    assert_eq!(
        decode(&col, 2, bytes),
        vec![Value::Ipv4("127.0.0.1".parse().unwrap()), Value::Null]
    );
}
