use std::{cell::RefCell, rc::Rc};

use shapeheap::{
    Exported, Heap, HeapSettings, IntegerKey, MapKind, PairAttributes, PropertyKey, Value,
};

fn init() -> Heap {
    let _ = env_logger::builder().is_test(true).try_init();
    Heap::new(HeapSettings::default())
}

fn int(n: i64) -> Value {
    Value::from_i64(n)
}

fn ikey(n: i64) -> PropertyKey {
    PropertyKey::integer(n).expect("fixnum range")
}

#[test]
fn slot_round_trip_for_mixed_keys() {
    let mut heap = init();
    let object = heap.new_object(None);
    let names: Vec<_> = (0..50).map(|n| heap.intern(&format!("p{n}"))).collect();

    for (n, &name) in names.iter().enumerate() {
        object.set(&mut heap, name.into(), int(n as i64));
        object.set(&mut heap, ikey(-(n as i64)), int(n as i64 * 2));
    }
    for (n, &name) in names.iter().enumerate() {
        assert_eq!(object.get(&mut heap, name.into()), int(n as i64));
        assert_eq!(
            object.get(&mut heap, ikey(-(n as i64))),
            int(n as i64 * 2)
        );
    }
}

#[test]
fn growth_keeps_every_entry_within_the_probe_budget() {
    let mut heap = Heap::new(HeapSettings {
        max_probes: 4,
        ..Default::default()
    });
    let object = heap.new_object(None);
    let n = 1_000;
    for k in 0..n {
        object.set(&mut heap, ikey(k * 31), int(k));
    }

    assert_eq!(object.len(&heap), n as usize);
    assert!(heap.stats().grows > 0);
    for k in 0..n {
        let key = ikey(k * 31);
        // a lookup resolves only within the probe budget
        let slot = object
            .get_property_slot(&mut heap, key)
            .expect("every inserted key resolves");
        assert_eq!(object.dict(&heap).value(slot), int(k));
    }
}

#[test]
fn dense_fast_path_then_single_transition() {
    let mut heap = init();
    let object = heap.new_dense_object(None);
    let map = heap.object(object).map();

    for k in 0..100 {
        object.set(&mut heap, ikey(k), int(k * k));
    }
    assert!(heap.object(object).is_dense());
    assert_eq!(heap.object(object).map(), map);
    assert_eq!(heap.stats().shape_transitions, 0);
    assert_eq!(heap.stats().dense_to_keyed, 0);

    let name = heap.intern("length");
    object.set(&mut heap, name.into(), int(100));
    assert!(!heap.object(object).is_dense());
    assert_eq!(heap.stats().dense_to_keyed, 1);

    for k in 0..100 {
        assert_eq!(object.get(&mut heap, ikey(k)), int(k * k));
    }
    assert_eq!(object.get(&mut heap, name.into()), int(100));
    assert_eq!(object.len(&heap), 101);

    let other = heap.intern("other");
    object.set(&mut heap, other.into(), int(0));
    assert_eq!(heap.stats().dense_to_keyed, 1);
}

#[test]
fn overwrite_is_idempotent() {
    let mut heap = init();
    let object = heap.new_object(None);
    let key = PropertyKey::Name(heap.intern("k"));
    object.set(&mut heap, key, int(1));
    let len = object.len(&heap);
    let capacity = object.capacity(&heap);
    let map = heap.object(object).map();

    object.set(&mut heap, key, int(2));
    assert_eq!(object.len(&heap), len);
    assert_eq!(object.capacity(&heap), capacity);
    assert_eq!(heap.object(object).map(), map);
    assert_eq!(object.get(&mut heap, key), int(2));
}

#[test]
fn accessor_protocol_routes_through_pair() {
    let mut heap = init();
    let object = heap.new_object(None);
    let calls = Rc::new(RefCell::new(Vec::new()));

    let log = calls.clone();
    let setter = heap.alloc_function("set", move |_, this, args| {
        log.borrow_mut().push((this, args[0]));
        Value::UNDEFINED
    });
    let getter = heap.alloc_function("get", |_, _, _| Value::from_i64(-7));
    let pair = heap.alloc_pair(getter.value(), setter.value(), PairAttributes::ENUMERABLE);
    let key = PropertyKey::Name(heap.intern("value"));

    object.set(&mut heap, key, pair.value());
    assert!(heap.object(object).has_access_pairs());
    assert!(calls.borrow().is_empty());

    object.set(&mut heap, key, int(3));
    object.set(&mut heap, key, int(4));
    assert_eq!(
        calls.borrow().as_slice(),
        &[(object.value(), int(3)), (object.value(), int(4))]
    );
    assert_eq!(object.get(&mut heap, key), int(-7));

    // plain keys still store raw values on an accessor object
    object.set(&mut heap, ikey(0), int(9));
    assert_eq!(object.get(&mut heap, ikey(0)), int(9));
    assert!(heap.object(object).has_access_pairs());
}

#[test]
fn prototype_fallback_and_cycle_termination() {
    let mut heap = init();
    let b = heap.new_object(None);
    let a = heap.new_object(Some(b));
    let x = PropertyKey::Name(heap.intern("x"));
    let y = PropertyKey::Name(heap.intern("y"));
    b.set(&mut heap, x, int(5));

    assert_eq!(a.get(&mut heap, x), int(5));

    b.set_prototype(&mut heap, Some(a));
    assert_eq!(a.get(&mut heap, y), Value::UNDEFINED);
    assert_eq!(b.get(&mut heap, y), Value::UNDEFINED);
    assert_eq!(a.get(&mut heap, x), int(5));
}

#[test]
fn longer_prototype_cycles_terminate() {
    let mut heap = init();
    let objects: Vec<_> = (0..5).map(|_| heap.new_object(None)).collect();
    for pair in objects.windows(2) {
        pair[0].set_prototype(&mut heap, Some(pair[1]));
    }
    objects[4].set_prototype(&mut heap, Some(objects[0]));
    objects[3].set(&mut heap, ikey(1), int(1));

    assert_eq!(objects[0].get(&mut heap, ikey(1)), int(1));
    assert_eq!(objects[0].get(&mut heap, ikey(2)), Value::UNDEFINED);
}

#[test]
fn self_reference_exports_as_the_root() {
    let mut heap = init();
    let a = heap.new_object(None);
    let me = PropertyKey::Name(heap.intern("me"));
    a.set(&mut heap, me, a.value());
    a.set(&mut heap, ikey(0), int(1));

    let exported = a.export(&mut heap);
    let me = exported
        .borrow()
        .get("me")
        .and_then(Exported::as_object)
        .expect("self reference exported");
    assert!(Rc::ptr_eq(&me, &exported));
    assert_eq!(me.borrow().len(), 2);
}

#[test]
fn hidden_accessors_are_not_exported() {
    let mut heap = init();
    let object = heap.new_object(None);
    let getter = heap.alloc_function("secret", |_, _, _| Value::from_i64(1));
    let hidden = heap.alloc_pair(getter.value(), Value::UNDEFINED, PairAttributes::empty());
    let shown = heap.alloc_pair(getter.value(), Value::UNDEFINED, PairAttributes::ENUMERABLE);
    let secret = PropertyKey::Name(heap.intern("secret"));
    let public = PropertyKey::Name(heap.intern("public"));
    object.set(&mut heap, secret, hidden.value());
    object.set(&mut heap, public, shown.value());

    let exported = object.export(&mut heap);
    let exported = exported.borrow();
    assert!(exported.get("secret").is_none());
    assert_eq!(exported.get("public").and_then(Exported::as_integer), Some(1));
}

#[test]
fn shapes_are_shared_until_too_deep() {
    let mut heap = Heap::new(HeapSettings {
        max_transition_depth: 4,
        ..Default::default()
    });
    let a = heap.new_object(None);
    let b = heap.new_object(None);
    for k in 0..4 {
        a.set(&mut heap, ikey(k), int(k));
        b.set(&mut heap, ikey(k), int(k));
    }
    assert_eq!(heap.object(a).map(), heap.object(b).map());
    assert_eq!(heap.map(heap.object(a).map()).depth(), 4);

    a.set(&mut heap, ikey(4), int(4));
    assert_eq!(heap.map(heap.object(a).map()).kind(), MapKind::Generic);
    a.set(&mut heap, ikey(5), int(5));
    assert_eq!(heap.map(heap.object(a).map()).kind(), MapKind::Generic);
    assert_eq!(a.get(&mut heap, ikey(0)), int(0));
}

#[test]
fn collection_keeps_reachable_objects() {
    let mut heap = init();
    let root = heap.new_object(None);
    let child = heap.new_object(None);
    root.set(&mut heap, ikey(0), child.value());
    child.set(&mut heap, ikey(0), int(42));
    for _ in 0..10 {
        heap.new_object(None);
    }

    let stats = heap.collect(&[root.value()]);
    assert!(stats.freed >= 10);
    let child = root.get(&mut heap, ikey(0));
    let shapeheap::ValueKind::Object(child) = heap.kind(child) else {
        panic!("child survived collection");
    };
    assert_eq!(child.get(&mut heap, ikey(0)), int(42));
}

#[test]
fn collection_frees_discarded_fields() {
    let mut heap = init();
    let object = heap.new_object(None);
    for k in 0..64 {
        object.set(&mut heap, ikey(k), int(k));
    }
    let live = heap.live_cells();
    let stats = heap.collect(&[object.value()]);
    assert!(stats.freed > 0);
    assert_eq!(heap.live_cells(), live - stats.freed);
    for k in 0..64 {
        assert_eq!(object.get(&mut heap, ikey(k)), int(k));
    }
}

#[test]
fn fixnum_extremes_are_distinct_keys() {
    let mut heap = init();
    let object = heap.new_object(None);
    assert_eq!(PropertyKey::integer(1 << 62), None);
    assert_eq!(PropertyKey::integer(-(1 << 62) - 1), None);

    let max = PropertyKey::from(IntegerKey::MAX);
    let min = PropertyKey::from(IntegerKey::MIN);
    object.set(&mut heap, max, int(1));
    object.set(&mut heap, min, int(2));
    assert_eq!(object.len(&heap), 2);
    assert_eq!(object.get(&mut heap, max), int(1));
    assert_eq!(object.get(&mut heap, min), int(2));

    let exported = object.export(&mut heap);
    let exported = exported.borrow();
    let max_name = IntegerKey::MAX.get().to_string();
    let min_name = IntegerKey::MIN.get().to_string();
    assert_eq!(exported.get(&max_name).and_then(Exported::as_integer), Some(1));
    assert_eq!(exported.get(&min_name).and_then(Exported::as_integer), Some(2));
}

#[test]
fn single_slot_budget_terminates_on_clustered_keys() {
    let mut heap = Heap::new(HeapSettings {
        max_probes: 1,
        ..Default::default()
    });
    let object = heap.new_object(None);
    let n = 5_000;
    for k in 0..n {
        object.set(&mut heap, ikey(k * 1024), int(k));
    }
    assert_eq!(object.len(&heap), n as usize);
    assert!(object.capacity(&heap) <= 8 * (n as usize + 1));
    for k in 0..n {
        assert_eq!(object.get(&mut heap, ikey(k * 1024)), int(k));
    }
}

#[test]
fn regrowth_never_adds_shape_transitions() {
    let mut heap = Heap::new(HeapSettings {
        max_transition_depth: 10_000,
        ..Default::default()
    });
    let object = heap.new_object(None);
    let n = 500;
    for k in 0..n {
        object.set(&mut heap, ikey(k), int(k));
    }
    assert!(heap.stats().grows > 2);
    assert_eq!(heap.stats().shape_transitions, n as usize);
    let map = heap.map(heap.object(object).map());
    assert_eq!(map.kind(), MapKind::Object);
    assert_eq!(map.depth(), n as usize);
}
