//! Catalog resolution behavior against a schema test double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use flaredb_device::{
    ChangeNotifier, CollationId, DeviceCatalog, DeviceFlags, Error, FuncId, FunctionProperties,
    OpCode, Result, SchemaProvider, TypeId, TypeLength, TypeProperties, TypeShape,
};

const BOOL: TypeId = TypeId(16);
const INT2: TypeId = TypeId(21);
const INT4: TypeId = TypeId(23);
const INT8: TypeId = TypeId(20);
const TEXT: TypeId = TypeId(25);
const JSONB: TypeId = TypeId(3802);
const INT1: TypeId = TypeId(606);
const FAKE_INT4: TypeId = TypeId(90001);
const INT4_ARRAY: TypeId = TypeId(1007);
const JSONB_ARRAY: TypeId = TypeId(3807);
const PAIR: TypeId = TypeId(70001);
const BAD_PAIR: TypeId = TypeId(70002);

const F_INT4EQ: FuncId = FuncId(65);
const F_TEXTEQ: FuncId = FuncId(67);
const F_TEXT_LT: FuncId = FuncId(740);
const F_INT4SHL: FuncId = FuncId(79);

const ICU_COLLATION: CollationId = CollationId(12345);

struct TestSchema {
    types: HashMap<TypeId, TypeProperties>,
    funcs: HashMap<FuncId, FunctionProperties>,
    type_lookups: AtomicUsize,
    func_lookups: AtomicUsize,
}

impl SchemaProvider for TestSchema {
    fn type_properties(&self, type_id: TypeId) -> Result<TypeProperties> {
        self.type_lookups.fetch_add(1, Ordering::SeqCst);
        self.types
            .get(&type_id)
            .cloned()
            .ok_or_else(|| Error::SchemaLookup(format!("no such type {}", type_id)))
    }

    fn function_properties(&self, func_id: FuncId) -> Result<FunctionProperties> {
        self.func_lookups.fetch_add(1, Ordering::SeqCst);
        self.funcs
            .get(&func_id)
            .cloned()
            .ok_or_else(|| Error::SchemaLookup(format!("no such function {}", func_id)))
    }
}

fn base(name: &str, length: TypeLength, by_val: bool) -> TypeProperties {
    TypeProperties {
        name: name.into(),
        extension: None,
        in_system_namespace: true,
        length,
        align: 4,
        by_val,
        eq_func: None,
        cmp_func: None,
        element: None,
        fields: None,
    }
}

fn func(name: &str, arg_types: &[TypeId]) -> FunctionProperties {
    FunctionProperties {
        name: name.into(),
        extension: None,
        in_system_namespace: true,
        arg_types: arg_types.to_vec(),
    }
}

fn fixture() -> Arc<TestSchema> {
    let mut types = HashMap::new();
    types.insert(BOOL, base("bool", TypeLength::Fixed(1), true));
    types.insert(INT2, base("int2", TypeLength::Fixed(2), true));
    types.insert(INT4, base("int4", TypeLength::Fixed(4), true));
    types.insert(INT8, base("int8", TypeLength::Fixed(8), true));
    types.insert(TEXT, base("text", TypeLength::Variable, false));
    // Exists in the schema, absent from the device type table.
    types.insert(JSONB, base("jsonb", TypeLength::Variable, false));
    // Extension-owned type.
    types.insert(INT1, {
        let mut p = base("int1", TypeLength::Fixed(1), true);
        p.extension = Some("flare_device".into());
        p.in_system_namespace = false;
        p
    });
    // Same name as the built-in, but living in a user namespace.
    types.insert(FAKE_INT4, {
        let mut p = base("int4", TypeLength::Fixed(4), true);
        p.in_system_namespace = false;
        p
    });
    types.insert(INT4_ARRAY, {
        let mut p = base("_int4", TypeLength::Variable, false);
        p.element = Some(INT4);
        p
    });
    types.insert(JSONB_ARRAY, {
        let mut p = base("_jsonb", TypeLength::Variable, false);
        p.element = Some(JSONB);
        p
    });
    types.insert(PAIR, {
        let mut p = base("pair", TypeLength::Variable, false);
        p.in_system_namespace = false;
        p.fields = Some(vec![INT4, TEXT]);
        p
    });
    types.insert(BAD_PAIR, {
        let mut p = base("bad_pair", TypeLength::Variable, false);
        p.in_system_namespace = false;
        p.fields = Some(vec![INT4, JSONB]);
        p
    });

    let mut funcs = HashMap::new();
    funcs.insert(F_INT4EQ, func("int4eq", &[INT4, INT4]));
    funcs.insert(F_TEXTEQ, func("texteq", &[TEXT, TEXT]));
    funcs.insert(F_TEXT_LT, func("text_lt", &[TEXT, TEXT]));
    // Exists in the schema, absent from the device function table.
    funcs.insert(F_INT4SHL, func("int4shl", &[INT4, INT4]));

    Arc::new(TestSchema {
        types,
        funcs,
        type_lookups: AtomicUsize::new(0),
        func_lookups: AtomicUsize::new(0),
    })
}

#[test]
fn type_resolution_is_idempotent_and_cached() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    let first = catalog.resolve_type(INT4).unwrap().unwrap();
    let second = catalog.resolve_type(INT4).unwrap().unwrap();
    assert_eq!(first.name, "int4");
    assert_eq!(first.flags, second.flags);
    assert_eq!(first.type_id, second.type_id);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(schema.type_lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn unsupported_type_is_negatively_cached() {
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    assert!(catalog.resolve_type(JSONB).unwrap().is_none());
    assert!(catalog.resolve_type(JSONB).unwrap().is_none());
    assert_eq!(schema.type_lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_schema_entry_is_fatal() {
    let catalog = DeviceCatalog::new(fixture());
    assert!(matches!(
        catalog.resolve_type(TypeId(99999)),
        Err(Error::SchemaLookup(_))
    ));
}

#[test]
fn extension_ownership_must_match() {
    let catalog = DeviceCatalog::new(fixture());

    // Extension type matches its table entry.
    let int1 = catalog.resolve_type(INT1).unwrap().unwrap();
    assert_eq!(int1.extension.as_deref(), Some("flare_device"));

    // A user-namespace type with a built-in's name does not match.
    assert!(catalog.resolve_type(FAKE_INT4).unwrap().is_none());
}

#[test]
fn array_type_wraps_its_element() {
    let catalog = DeviceCatalog::new(fixture());

    let arr = catalog.resolve_type(INT4_ARRAY).unwrap().unwrap();
    assert_eq!(arr.name, "int4[]");
    assert_eq!(arr.flags, DeviceFlags::ANY);
    match &arr.shape {
        TypeShape::Array { element } => assert_eq!(element.type_id, INT4),
        other => panic!("unexpected shape: {:?}", other),
    }

    // Unsupported element poisons the array.
    assert!(catalog.resolve_type(JSONB_ARRAY).unwrap().is_none());
}

#[test]
fn composite_flags_are_the_and_of_field_flags() {
    let catalog = DeviceCatalog::new(fixture());

    let pair = catalog.resolve_type(PAIR).unwrap().unwrap();
    assert_eq!(pair.flags, DeviceFlags::ANY);
    match &pair.shape {
        TypeShape::Composite { fields } => {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].type_id, INT4);
            assert_eq!(fields[1].type_id, TEXT);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    // Containers expose no device hash.
    assert!(pair.codec().is_none());

    // One unsupported field makes the whole composite unsupported.
    assert!(catalog.resolve_type(BAD_PAIR).unwrap().is_none());
}

#[test]
fn function_resolution_is_idempotent_and_cached() {
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    let first = catalog
        .resolve_function(F_INT4EQ, &[INT4, INT4], CollationId::NONE)
        .unwrap()
        .unwrap();
    let second = catalog
        .resolve_function(F_INT4EQ, &[INT4, INT4], CollationId::NONE)
        .unwrap()
        .unwrap();
    assert_eq!(first.opcode, OpCode::Int4Eq);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(schema.func_lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn signature_mismatch_is_a_distinct_cache_entry() {
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    assert!(catalog
        .resolve_function(F_INT4EQ, &[INT4, INT4], CollationId::NONE)
        .unwrap()
        .is_some());
    // Same function id, different argument types: no table match.
    assert!(catalog
        .resolve_function(F_INT4EQ, &[INT4, INT8], CollationId::NONE)
        .unwrap()
        .is_none());
    assert_eq!(schema.func_lookups.load(Ordering::SeqCst), 2);
}

#[test]
fn unknown_function_is_negatively_cached() {
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    assert!(catalog
        .resolve_function(F_INT4SHL, &[INT4, INT4], CollationId::NONE)
        .unwrap()
        .is_none());
    assert!(catalog
        .resolve_function(F_INT4SHL, &[INT4, INT4], CollationId::NONE)
        .unwrap()
        .is_none());
    assert_eq!(schema.func_lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn collation_gates_locale_aware_functions_only() {
    let catalog = DeviceCatalog::new(fixture());

    // Integer equality does not care about collation.
    assert!(catalog
        .resolve_function(F_INT4EQ, &[INT4, INT4], ICU_COLLATION)
        .unwrap()
        .is_some());

    // Byte-wise text equality does not either.
    assert!(catalog
        .resolve_function(F_TEXTEQ, &[TEXT, TEXT], ICU_COLLATION)
        .unwrap()
        .is_some());

    // Text ordering passes under the byte-ordering collation and under
    // no collation at all.
    assert!(catalog
        .resolve_function(F_TEXT_LT, &[TEXT, TEXT], CollationId::C)
        .unwrap()
        .is_some());
    assert!(catalog
        .resolve_function(F_TEXT_LT, &[TEXT, TEXT], CollationId::NONE)
        .unwrap()
        .is_some());

    // But not under anything locale-sensitive.
    assert!(catalog
        .resolve_function(F_TEXT_LT, &[TEXT, TEXT], ICU_COLLATION)
        .unwrap()
        .is_none());
}

#[test]
fn collation_gate_applies_to_cache_hits() {
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    let hit = catalog
        .resolve_function(F_TEXT_LT, &[TEXT, TEXT], CollationId::C)
        .unwrap();
    assert!(hit.is_some());

    // The cached positive descriptor must still be refused.
    assert!(catalog
        .resolve_function(F_TEXT_LT, &[TEXT, TEXT], ICU_COLLATION)
        .unwrap()
        .is_none());
    assert_eq!(schema.func_lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn invalidation_drops_both_caches() {
    let schema = fixture();
    let catalog = DeviceCatalog::new(schema.clone());

    catalog.resolve_type(INT4).unwrap();
    catalog
        .resolve_function(F_INT4EQ, &[INT4, INT4], CollationId::NONE)
        .unwrap();
    let types_before = schema.type_lookups.load(Ordering::SeqCst);
    let funcs_before = schema.func_lookups.load(Ordering::SeqCst);

    catalog.invalidate();

    catalog.resolve_type(INT4).unwrap();
    catalog
        .resolve_function(F_INT4EQ, &[INT4, INT4], CollationId::NONE)
        .unwrap();
    assert!(schema.type_lookups.load(Ordering::SeqCst) > types_before);
    assert!(schema.func_lookups.load(Ordering::SeqCst) > funcs_before);
}

#[derive(Default)]
struct TestBus {
    callbacks: Mutex<Vec<Box<dyn Fn() + Send + Sync>>>,
}

impl ChangeNotifier for TestBus {
    fn on_schema_change(&self, callback: Box<dyn Fn() + Send + Sync>) {
        self.callbacks.lock().push(callback);
    }
}

impl TestBus {
    fn fire(&self) {
        for callback in self.callbacks.lock().iter() {
            callback();
        }
    }
}

#[test]
fn change_notification_invalidates() {
    let schema = fixture();
    let catalog = Arc::new(DeviceCatalog::new(schema.clone()));
    let bus = TestBus::default();
    catalog.register_invalidation(&bus);

    catalog.resolve_type(INT4).unwrap();
    assert_eq!(schema.type_lookups.load(Ordering::SeqCst), 1);

    bus.fire();

    catalog.resolve_type(INT4).unwrap();
    assert_eq!(schema.type_lookups.load(Ordering::SeqCst), 2);
}
