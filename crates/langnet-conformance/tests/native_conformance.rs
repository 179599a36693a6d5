//! Runs every shipped suite through the in-process codecs and checks the
//! binary payloads against bytes other implementations must reproduce.

use langnet_conformance::{
    CanonicalPayload, Format, Harness, Implementation, NativeImplementation, Suite,
};

#[test]
fn every_suite_passes_natively() {
    for suite in Suite::all().unwrap() {
        let native = NativeImplementation::new(suite.registry.clone());
        let report = Harness::new(&suite.registry)
            .with_implementation(&native)
            .run_suite(&suite);
        assert!(report.is_strict_success(), "suite {}:\n{report}", suite.name);
        assert_eq!(report.total, suite.fixtures.len() * Format::ALL.len());
    }
}

#[test]
fn search_request_golden_bytes() {
    let suite = Suite::langnet().unwrap();
    let native = NativeImplementation::new(suite.registry.clone());
    let fixture = suite.fixture("search_request").unwrap();
    let bytes = native.write(fixture, Format::Binary).unwrap();

    let mut expected = vec![0x0a, 27];
    expected.extend_from_slice(b"protocol buffers python zig");
    expected.extend_from_slice(&[0x10, 0x01, 0x18, 0x14]);
    assert_eq!(bytes, expected);
}

#[test]
fn timestamp_bounds_golden_bytes() {
    let suite = Suite::langnet().unwrap();
    let native = NativeImplementation::new(suite.registry.clone());
    let bytes = native
        .write(suite.fixture("timestamp_negative").unwrap(), Format::Binary)
        .unwrap();
    // Negative int64 and int32 both take ten bytes.
    let mut expected = vec![0x08];
    expected.extend_from_slice(&[0xff; 9]);
    expected.push(0x01);
    expected.push(0x10);
    expected.extend_from_slice(&[0xff; 9]);
    expected.push(0x01);
    assert_eq!(bytes, expected);
}

#[test]
fn json_payloads_keep_64_bit_integers_exact() {
    let suite = Suite::langnet().unwrap();
    let native = NativeImplementation::new(suite.registry.clone());
    let payload = native
        .write(suite.fixture("json_unsafe_seconds").unwrap(), Format::Json)
        .unwrap();
    let canonical = CanonicalPayload::new(Format::Json, &payload).unwrap();
    assert_eq!(canonical.as_bytes(), br#"{"seconds":"9007199254740993"}"#);
}

#[test]
fn zigzag_fixture_packs_small_negatives_into_single_bytes() {
    let suite = Suite::scalars().unwrap();
    let native = NativeImplementation::new(suite.registry.clone());
    let bytes = native
        .write(suite.fixture("zigzag_small_negatives").unwrap(), Format::Binary)
        .unwrap();
    // packed_sint32 = [1, -1, 63, -64] is field 16: tag 0x82 0x01, length 4.
    let packed = [0x82, 0x01, 0x04, 0x02, 0x01, 0x7e, 0x7f];
    assert!(
        bytes.windows(packed.len()).any(|w| w == packed),
        "{bytes:02x?}"
    );
}

#[test]
fn deep_list_and_map_nesting_agrees_across_codecs() {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use langnet_conformance::Fixture;
    use langnet_core::{MapKey, MessageValue, Value};
    use langnet_schema::{FieldDef, MessageDef, Registry, ScalarKind, SchemaDescription};

    let desc = SchemaDescription::new("tree").message(
        MessageDef::new("Node")
            .field(FieldDef::scalar("n", 1, ScalarKind::Int32))
            .field(FieldDef::message("kids", 2, "Node").repeated())
            .field(FieldDef::message("named", 3, "Node").map(ScalarKind::String)),
    );
    let registry = Arc::new(Registry::new(desc).unwrap());

    let mut node = MessageValue::new("Node").with("n", 1i32);
    for level in 0..70 {
        let parent = MessageValue::new("Node").with("n", 1i32);
        node = if level % 2 == 0 {
            parent.with("kids", Value::List(vec![node.into()]))
        } else {
            parent.with(
                "named",
                Value::Map(BTreeMap::from([(MapKey::from("k"), Value::Message(node))])),
            )
        };
    }

    let native = NativeImplementation::new(registry.clone());
    let report = Harness::new(&registry)
        .with_implementation(&native)
        .run(&[Fixture::new("deep_tree", node)]);
    assert!(report.is_strict_success(), "{report}");
    assert_eq!(report.total, 2);
}
