use esrt::interpreter::{BindingError, Bindings, DeclarativeEnvironmentRecord, ErrorKind, Interpreter};
use esrt::types::JsValue;
use proptest::prelude::*;

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn arb_value() -> impl Strategy<Value = JsValue> {
    prop_oneof![
        Just(JsValue::Null),
        any::<bool>().prop_map(JsValue::Boolean),
        (-1_000_000i32..1_000_000).prop_map(|n| JsValue::Number(n as f64)),
        "[a-z ]{0,12}".prop_map(|s| JsValue::string(&s)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn mutable_bindings_read_back_what_was_written(
        name in arb_name(),
        first in arb_value(),
        second in arb_value(),
        strict in any::<bool>(),
    ) {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding(&name, first.clone(), false).unwrap();
        prop_assert_eq!(rec.get_binding_value(&name, strict).unwrap(), first);
        rec.set_mutable_binding(&name, second.clone(), strict).unwrap();
        prop_assert_eq!(rec.get_binding_value(&name, strict).unwrap(), second);
    }

    #[test]
    fn immutable_bindings_never_change(
        name in arb_name(),
        value in arb_value(),
        other in arb_value(),
    ) {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_immutable_binding(&name, value.clone()).unwrap();
        let err = rec.set_mutable_binding(&name, other.clone(), true).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::TypeError);
        prop_assert!(rec.set_mutable_binding(&name, other, false).is_ok());
        prop_assert_eq!(rec.get_binding_value(&name, false).unwrap(), value);
    }

    #[test]
    fn uninitialized_immutable_reads_depend_on_strictness(name in arb_name()) {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_immutable_binding(&name, JsValue::Undefined).unwrap();
        prop_assert_eq!(rec.get_binding_value(&name, false).unwrap(), JsValue::Undefined);
        let err = rec.get_binding_value(&name, true).unwrap_err();
        prop_assert_eq!(err, BindingError::Uninitialized(name.clone()));
        prop_assert_eq!(
            BindingError::Uninitialized(name).kind(),
            ErrorKind::ReferenceError
        );
    }

    #[test]
    fn delete_follows_deletability(
        name in arb_name(),
        absent in arb_name(),
        value in arb_value(),
        deletable in any::<bool>(),
    ) {
        prop_assume!(name != absent);
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding(&name, value.clone(), deletable).unwrap();
        prop_assert_eq!(rec.delete_binding(&name), deletable);
        prop_assert_eq!(rec.has_binding(&name), !deletable);
        if !deletable {
            prop_assert_eq!(rec.get_binding_value(&name, true).unwrap(), value);
        }
        prop_assert!(rec.delete_binding(&absent));
    }

    #[test]
    fn arguments_slot_is_never_enumerated(
        names in prop::collection::btree_set(arb_name(), 0..8),
        value in arb_value(),
    ) {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding("arguments", value.clone(), false).unwrap();
        for name in &names {
            rec.create_mutable_binding(name, value.clone(), false).unwrap();
        }
        let listed = rec.get_all_binding_names();
        prop_assert!(!listed.iter().any(|n| n == "arguments"));
        prop_assert_eq!(listed, names.into_iter().collect::<Vec<_>>());
        prop_assert!(rec.has_binding("arguments"));
    }

    #[test]
    fn duplicate_creation_is_rejected(name in arb_name(), value in arb_value()) {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding(&name, value.clone(), true).unwrap();
        prop_assert_eq!(
            rec.create_mutable_binding(&name, value, true),
            Err(BindingError::AlreadyDeclared(name))
        );
    }

    #[test]
    fn eval_of_sum_matches_host_arithmetic(a in -10_000i32..10_000, b in -10_000i32..10_000) {
        let mut interp = Interpreter::new();
        let src = format!("eval('{a} + {b}')");
        prop_assert_eq!(
            interp.run_source(&src).unwrap(),
            JsValue::Number(f64::from(a) + f64::from(b))
        );
        prop_assert_eq!(interp.context_depth(), 0);
    }
}
