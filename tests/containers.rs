use scoperc::{Context, ElemKind, RuntimeError, Value};

#[test]
fn test_set_from_duplicates() {
    let mut cx = Context::new();
    let values: Vec<Value> = [1, 2, 2, 3].iter().map(|&i| Value::Int(i)).collect();
    let set = cx.new_set(&values, ElemKind::Int);

    assert!(cx.set_contains(set, Value::Int(2)));
    assert_eq!(cx.set_len(set), 4);
    cx.dec_stack(set);
}

#[test]
fn test_dict_of_text_to_lists() {
    let mut cx = Context::new();
    let evens = cx.new_list(&[Value::Int(2), Value::Int(4)], ElemKind::Int);
    let odds = cx.new_list(&[Value::Int(1), Value::Int(3)], ElemKind::Int);
    let ek = cx.new_text("evens");
    let ok = cx.new_text("odds");

    let dict = cx.new_dict(
        &[Value::Text(Some(ek)), Value::Text(Some(ok))],
        &[Value::Obj(Some(evens)), Value::Obj(Some(odds))],
        ElemKind::Text,
        ElemKind::Obj,
    );
    for obj in [evens, odds, ek, ok] {
        cx.dec_stack(obj);
    }

    let probe = cx.new_text("odds");
    let found = cx.dict_at(dict, Value::Text(Some(probe))).reference();
    assert_eq!(found, Some(odds));
    assert_eq!(cx.list_at(odds, -1), Value::Int(3));
    assert!(cx.dict_contains_value(dict, Value::Obj(Some(evens))));
    cx.dec_stack(probe);

    cx.dec_stack(dict);
    assert_eq!(cx.stats().live_objects, 0);
}

#[test]
fn test_missing_key_via_try() {
    let mut cx = Context::new();
    let dict = cx.new_dict(&[], &[], ElemKind::Float, ElemKind::Float);
    assert_eq!(cx.try_dict_at(dict, Value::Float(1.0)), Err(RuntimeError::KeyNotFound));
    assert!(!cx.dict_contains_key(dict, Value::Float(1.0)));
    assert_eq!(cx.dict_len(dict), 0);
}

#[test]
#[should_panic(expected = "Comparing object elements is not implemented")]
fn test_generic_object_comparison_is_fatal() {
    let mut cx = Context::new();
    let stored = cx.new_list(&[], ElemKind::Int);
    let probe = cx.new_list(&[], ElemKind::Int);
    let list = cx.new_list(&[Value::Obj(Some(stored))], ElemKind::Obj);
    cx.list_contains(list, Value::Obj(Some(probe)));
}

#[test]
fn test_generic_objects_holding_text_compare_content() {
    let mut cx = Context::new();
    let stored = cx.new_text("same");
    let probe = cx.new_text("same");
    let list = cx.new_list(&[Value::Obj(Some(stored))], ElemKind::Obj);
    assert!(cx.list_contains(list, Value::Obj(Some(probe))));
}

#[test]
#[should_panic(expected = "Expected list object, found dict")]
fn test_wrong_container_is_fatal() {
    let mut cx = Context::new();
    let dict = cx.new_dict(&[], &[], ElemKind::Int, ElemKind::Int);
    cx.list_len(dict);
}

#[test]
fn test_nested_lists_release_recursively() {
    let mut cx = Context::new();
    let leaf = cx.new_str(b"leaf");
    let inner = cx.new_list(&[Value::Str(Some(leaf))], ElemKind::Str);
    let outer = cx.new_list(&[Value::Obj(Some(inner))], ElemKind::Obj);
    cx.dec_stack(leaf);
    cx.dec_stack(inner);

    cx.dec_stack(outer);
    assert!(!cx.is_live(leaf));
    assert!(!cx.is_live(inner));
    assert_eq!(cx.stats().destroyed, 3);
}
