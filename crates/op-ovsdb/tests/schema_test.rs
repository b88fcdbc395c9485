//! End-to-end tests against a trimmed Open_vSwitch schema

use op_ovsdb::prelude::*;
use op_ovsdb::{required_column, Version, UNLIMITED, UUID_COLUMN, VERSION_COLUMN};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

const VSWITCH_SCHEMA: &str = include_str!("fixtures/vswitch.ovsschema");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("op_ovsdb=trace")
        .try_init();
}

fn vswitch() -> DatabaseSchema {
    init_tracing();
    let json: Value = serde_json::from_str(VSWITCH_SCHEMA).unwrap();
    DatabaseSchema::from_json("Open_vSwitch", &json).unwrap()
}

/// Typed facade over the Bridge table
struct Bridge {
    table: Arc<TableSchema>,
    name: ColumnSchema,
    protocols: ColumnSchema,
}

impl Bridge {
    fn name_column(&self) -> &ColumnSchema {
        &self.name
    }

    fn protocols_column(&self) -> &ColumnSchema {
        &self.protocols
    }
}

impl TypedTable for Bridge {
    fn from_table_schema(table: Arc<TableSchema>) -> op_ovsdb::Result<Self> {
        Ok(Self {
            name: required_column(&table, "name")?,
            protocols: required_column(&table, "protocols")?,
            table,
        })
    }
}

#[test]
fn test_bridge_scenario() {
    let schema = DatabaseSchema::from_json(
        "Open_vSwitch",
        &json!({
            "version": "7.12.1",
            "tables": {
                "Bridge": {
                    "columns": {
                        "name": {"type": "string"},
                        "protocols": {"type": {"key": "string", "min": 0, "max": "unlimited"}}
                    }
                }
            }
        }),
    )
    .unwrap();

    assert!(schema.has_table("Bridge"));
    assert_eq!(schema.version(), Version::new(7, 12, 1));

    let bridge = schema.table_schema("Bridge").unwrap();
    let name = bridge.column("name").unwrap();
    assert!(matches!(name.column_type.base_type(), BaseType::String(_)));
    assert_eq!(name.column_type.multiplicity(), Multiplicity::Single);

    let protocols = bridge.column("protocols").unwrap();
    assert!(matches!(protocols.column_type.base_type(), BaseType::String(_)));
    assert_eq!(protocols.column_type.multiplicity(), Multiplicity::Multi);
    assert_eq!(protocols.column_type.max(), UNLIMITED);
}

#[test]
fn test_missing_version_fails_whole_build() {
    let result = DatabaseSchema::from_json(
        "Open_vSwitch",
        &json!({"tables": {"Bridge": {"columns": {"name": {"type": "string"}}}}}),
    );
    match result {
        Err(OvsdbSchemaError::SchemaParsing(msg)) => assert!(msg.contains("version")),
        other => panic!("expected schema parsing error, got {:?}", other),
    }
}

#[test]
fn test_bad_column_anywhere_fails_whole_build() {
    let mut json: Value = serde_json::from_str(VSWITCH_SCHEMA).unwrap();
    json["tables"]["Mirror"]["columns"]["select_src_port"]["type"]["key"]["refType"] =
        json!("medium");

    let err = DatabaseSchema::from_json("Open_vSwitch", &json).unwrap_err();
    assert_eq!(err, OvsdbSchemaError::invalid_enum("refType", "medium"));
}

#[test]
fn test_full_schema_parses() {
    let schema = vswitch();
    let tables: BTreeSet<&str> = schema.tables().collect();
    let expected: BTreeSet<&str> = [
        "Open_vSwitch",
        "Bridge",
        "Port",
        "Interface",
        "Mirror",
        "QoS",
        "Queue",
        "Manager",
        "Flow_Sample_Collector_Set",
    ]
    .into_iter()
    .collect();
    assert_eq!(tables, expected);

    let root = schema.table_schema("Open_vSwitch").unwrap();
    assert!(root.is_root);
    assert_eq!(root.max_rows, Some(1));

    let mirror = schema.table_schema("Mirror").unwrap();
    let src = mirror.column("select_src_port").unwrap();
    let uuid_type = src.column_type.base_type().as_uuid().unwrap();
    assert_eq!(uuid_type.ref_table.as_deref(), Some("Port"));
    assert_eq!(uuid_type.ref_type, RefType::Weak);

    let port = schema.table_schema("Port").unwrap();
    let trunks = port.column("trunks").unwrap();
    assert_eq!(trunks.column_type.max(), 4096);
    match trunks.column_type.base_type() {
        BaseType::Integer(i) => assert_eq!((i.min, i.max), (0, 4095)),
        other => panic!("expected integer, got {:?}", other),
    }

    let collector = schema.table_schema("Flow_Sample_Collector_Set").unwrap();
    let bridge = collector.column("bridge").unwrap();
    assert_eq!(bridge.column_type.multiplicity(), Multiplicity::Single);
    assert_eq!(
        bridge.column_type.base_type().as_uuid().unwrap().ref_table.as_deref(),
        Some("Bridge")
    );

    let statistics = schema
        .table_schema("Interface")
        .and_then(|t| t.column("statistics"))
        .unwrap();
    assert!(statistics.ephemeral);
    assert!(statistics.column_type.is_map());
}

#[test]
fn test_round_trip_preserves_declared_structure() {
    let source: Value = serde_json::from_str(VSWITCH_SCHEMA).unwrap();
    let schema = vswitch();
    let emitted = schema.to_json();

    assert_eq!(emitted["name"], json!("Open_vSwitch"));
    assert_eq!(emitted["version"], source["version"]);

    let source_tables = source["tables"].as_object().unwrap();
    let emitted_tables = emitted["tables"].as_object().unwrap();
    assert_eq!(
        source_tables.keys().collect::<BTreeSet<_>>(),
        emitted_tables.keys().collect::<BTreeSet<_>>()
    );

    let reparsed = DatabaseSchema::from_json("Open_vSwitch", &emitted).unwrap();
    for (table_name, table_json) in source_tables {
        let source_columns = table_json["columns"].as_object().unwrap();
        let table = reparsed.table_schema(table_name).unwrap();
        assert_eq!(
            source_columns.keys().map(String::as_str).collect::<BTreeSet<_>>(),
            table.column_names().collect::<BTreeSet<_>>()
        );
        for (column_name, column_json) in source_columns {
            let declared = ColumnType::from_json(&column_json["type"]).unwrap();
            assert_eq!(table.column(column_name).unwrap().column_type.tag(), declared.tag());
        }
    }
    assert_eq!(schema, reparsed);
}

#[test]
fn test_internal_columns_on_every_table() {
    let mut schema = vswitch();
    schema.populate_internally_generated_columns();
    let once = schema.clone();
    schema.populate_internally_generated_columns();
    assert_eq!(schema, once);

    for name in schema.tables() {
        let table = schema.table_schema(name).unwrap();
        assert!(table.has_column(UUID_COLUMN), "{} lacks _uuid", name);
        assert!(table.has_column(VERSION_COLUMN), "{} lacks _version", name);
    }
}

#[test]
fn test_typed_bridge_wrapper() {
    let schema = vswitch();
    let mut registry = TableFactoryRegistry::new();
    registry.register::<Bridge>();

    let bridge: Bridge = schema.table("Bridge", &registry).unwrap().unwrap();
    assert_eq!(bridge.table.name, "Bridge");
    assert_eq!(bridge.name_column().name, "name");
    match bridge.protocols_column().column_type.base_type() {
        BaseType::String(s) => {
            let enums = s.enums.as_ref().unwrap();
            assert!(enums.contains("OpenFlow13"));
            assert_eq!(enums.len(), 6);
        }
        other => panic!("expected string, got {:?}", other),
    }

    // Port has no protocols column: the wrapper cannot be built on it
    let err = schema.table::<Bridge>("Port", &registry).unwrap().err().unwrap();
    assert!(err.is_programming_error());

    assert!(schema.table::<Bridge>("Flow_Table", &registry).is_none());
}

#[test]
fn test_monitor_row_against_schema() {
    let mut schema = vswitch();
    schema.populate_internally_generated_columns();
    let port = schema.table_schema("Port").unwrap();

    let row = port
        .create_row(&json!({
            "_uuid": ["uuid", "3e0f7c4d-8b6e-4a43-9f8c-5b9e0d0c1a2b"],
            "name": "eth0",
            "interfaces": ["uuid", "11111111-2222-3333-4444-555555555555"],
            "tag": 100,
            "trunks": ["set", [10, 20, 30]],
            "vlan_mode": ["set", []],
            "qos": {"type": "linux-htb", "queues": ["map", []]}
        }))
        .unwrap();

    assert_eq!(row.uuid().map(|u| u.to_string()).as_deref(), Some("3e0f7c4d-8b6e-4a43-9f8c-5b9e0d0c1a2b"));
    assert_eq!(row.get("trunks").map(Datum::len), Some(3));
    assert_eq!(row.get("vlan_mode").map(Datum::is_empty), Some(true));

    let qos = row.get("qos").and_then(Datum::as_atom).unwrap();
    let referenced = qos.as_referenced_row().unwrap();
    assert_eq!(referenced.ref_table.as_deref(), Some("QoS"));

    for (name, datum) in row.columns() {
        port.column(name).unwrap().validate(datum).unwrap();
    }

    let bad_tag = port.column("tag").unwrap();
    let datum = bad_tag.value_from_json(&json!(5000)).unwrap();
    assert!(bad_tag.validate(&datum).is_err());
}

#[test]
fn test_schema_shared_across_threads() {
    let schema = Arc::new(vswitch());
    let registry = Arc::new({
        let mut r = TableFactoryRegistry::new();
        r.register::<Bridge>();
        r
    });

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let schema = Arc::clone(&schema);
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let bridge: Bridge = schema.table("Bridge", &registry).unwrap().unwrap();
                bridge.protocols_column().name.clone()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "protocols");
    }
}
