//! Behavioural tests for the proxification gate.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow_array::{Int64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use proptest::prelude::*;

use common_error::{SpillwayError, SpillwayResult};
use spillway_core::{Partition, ProxyCapability, ProxyObject, Value};
use spillway_frame::{ConcatArgs, DispatchTable, FrameEngine, Interception, PartitionedFrame};
use spillway_proxify::{proxify, unproxify, DeviceProxies, ProxifyGate};

fn schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new("key", DataType::Int64, false)]))
}

fn batch(values: Vec<i64>) -> RecordBatch {
    RecordBatch::try_new(schema(), vec![Arc::new(Int64Array::from(values))]).unwrap()
}

fn capability() -> (Arc<DeviceProxies>, Arc<dyn ProxyCapability>) {
    let proxies = Arc::new(DeviceProxies::new());
    let dynamic: Arc<dyn ProxyCapability> = proxies.clone();
    (proxies, dynamic)
}

#[test]
fn test_proxify_wraps_device_result() {
    let (stats, proxies) = capability();
    let part = Partition::device(batch(vec![1, 2]), 0);
    let source = part.clone();
    let wrapped = proxify(proxies, move |(): ()| -> SpillwayResult<Value> {
        Ok(Value::from(source.clone()))
    });

    let out = wrapped(()).unwrap();
    let proxy = out.as_proxy().expect("device result should be proxied");
    assert!(proxy.partition().ptr_eq(&part));
    assert_eq!(stats.stats().wrapped, 1);
}

#[test]
fn test_proxify_wraps_each_device_element() {
    let (_, proxies) = capability();
    let wrapped = proxify(proxies, |n: usize| -> SpillwayResult<BTreeMap<usize, Value>> {
        Ok((0..n)
            .map(|i| (i, Value::from(Partition::device(batch(vec![i as i64]), 0))))
            .collect())
    });

    let out = wrapped(3).unwrap();
    assert_eq!(out.len(), 3);
    assert!(out.values().all(Value::is_proxy));
}

#[test]
fn test_proxify_leaves_host_data_alone() {
    let (stats, proxies) = capability();
    let host = Partition::host(batch(vec![5]));
    let source = host.clone();
    let wrapped = proxify(proxies, move |(): ()| -> SpillwayResult<Value> {
        Ok(Value::Array(vec![Value::from(source.clone()), Value::from("label")]))
    });

    let out = wrapped(()).unwrap();
    let items = out.as_array().unwrap();
    assert!(items[0].as_partition().unwrap().ptr_eq(&host));
    assert_eq!(items[1].as_str(), Some("label"));
    assert_eq!(stats.stats().wrapped, 0);
}

#[test]
fn test_unproxify_passes_raw_partitions() {
    let (stats, proxies) = capability();
    let part = Partition::device(batch(vec![1]), 0);
    let proxy = proxies.wrap(part.clone()).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let wrapped = unproxify(Arc::clone(&proxies), move |args: Vec<Value>| {
        assert!(args.iter().all(|v| !v.is_proxy()));
        counter.fetch_add(args.len(), Ordering::SeqCst);
        Ok(args)
    });

    let out = wrapped(vec![
        Value::from(proxy),
        Value::Array(vec![Value::from(part.clone())]),
        Value::Int64(4),
    ])
    .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert!(out[0].as_partition().unwrap().ptr_eq(&part));
    assert_eq!(stats.stats().unwrapped, 1);
}

#[test]
fn test_unproxify_result_untouched() {
    let (_, proxies) = capability();
    let made = proxies.wrap(Partition::device(batch(vec![1]), 0)).unwrap();
    let returned = made.clone();
    let wrapped = unproxify(proxies, move |_args: Vec<Value>| -> SpillwayResult<Value> {
        Ok(Value::from(returned.clone()))
    });

    let out = wrapped(vec![]).unwrap();
    assert!(out.as_proxy().unwrap().ptr_eq(&made));
}

#[test]
fn test_original_error_propagates_unchanged() {
    let (stats, proxies) = capability();
    let wrapped = proxify(proxies, |(): ()| -> SpillwayResult<Value> {
        Err(SpillwayError::execution("worker lost"))
    });

    let err = wrapped(()).unwrap_err();
    assert!(matches!(err, SpillwayError::ExecutionError(ref msg) if msg == "worker lost"));
    assert_eq!(stats.stats().wrapped, 0);
}

#[test]
fn test_capability_error_propagates() {
    #[derive(Debug)]
    struct Failing;

    impl ProxyCapability for Failing {
        fn wrap(&self, _partition: Partition) -> SpillwayResult<ProxyObject> {
            Err(SpillwayError::resource_exhausted("device pool full"))
        }

        fn unwrap(&self, _proxy: ProxyObject) -> SpillwayResult<Partition> {
            Err(SpillwayError::internal("unreachable"))
        }
    }

    let wrapped = proxify(Arc::new(Failing), |(): ()| -> SpillwayResult<Value> {
        Ok(Value::from(Partition::device(batch(vec![1]), 0)))
    });
    let err = wrapped(()).unwrap_err();
    assert!(err.to_string().contains("device pool full"));
}

#[test]
fn test_gate_install_is_once() {
    let gate = ProxifyGate::new(Arc::new(DeviceProxies::new()));
    let mut table = DispatchTable::new();
    let original_concat = table.concat_fn();

    assert!(gate.install(&mut table));
    assert!(table.is_intercepted(Interception::Proxification));
    let installed_concat = table.concat_fn();
    assert!(!Arc::ptr_eq(&original_concat, &installed_concat));

    assert!(!gate.install(&mut table));
    assert!(Arc::ptr_eq(&installed_concat, &table.concat_fn()));
}

#[test]
fn test_installed_concat_accepts_proxies() {
    let proxies = Arc::new(DeviceProxies::new());
    let gate = ProxifyGate::new(proxies.clone());
    let mut table = DispatchTable::new();

    let proxy = proxies.wrap(Partition::device(batch(vec![1, 2]), 0)).unwrap();
    let args = ConcatArgs {
        parts: vec![Value::from(proxy), Value::from(Partition::device(batch(vec![3]), 0))],
        schema: schema(),
    };

    assert!(table.concat(args.clone()).is_err());
    gate.install(&mut table);
    let out = table.concat(args).unwrap();
    assert_eq!(out.as_partition().unwrap().num_rows(), 3);
}

#[test]
fn test_shuffle_through_gate() {
    let proxies = Arc::new(DeviceProxies::new());
    let mut table = DispatchTable::new();
    ProxifyGate::new(proxies.clone()).install(&mut table);
    let engine = FrameEngine::new(table);

    let frame = PartitionedFrame::on_device(
        schema(),
        vec![batch(vec![1, 2, 3]), batch(vec![4, 5, 6]), batch(vec![1, 4])],
        0,
    );
    let out = engine.shuffle(frame, &["key"], Some(2)).unwrap();

    assert_eq!(out.num_partitions(), 2);
    assert_eq!(out.num_rows().unwrap(), 8);
    assert_eq!(out.proxy_count(), 0);

    // every split piece went through a proxy and was unwrapped before concat
    let stats = proxies.stats();
    assert_eq!(stats.wrapped, 3 * 2);
    assert_eq!(stats.unwrapped, 3 * 2);
}

#[test]
fn test_concurrent_invocations() {
    let (stats, proxies) = capability();
    let wrapped = Arc::new(proxify(proxies, |rows: i64| -> SpillwayResult<Value> {
        Ok(Value::from(Partition::device(batch(vec![rows]), 0)))
    }));

    std::thread::scope(|scope| {
        for i in 0..8 {
            let wrapped = Arc::clone(&wrapped);
            scope.spawn(move || {
                for _ in 0..16 {
                    assert!(wrapped(i).unwrap().is_proxy());
                }
            });
        }
    });

    assert_eq!(stats.stats().wrapped, 8 * 16);
}

fn arb_plain_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int64),
        "[a-z]{0,8}".prop_map(Value::String),
        prop::collection::vec(any::<i64>(), 0..4)
            .prop_map(|v| Value::from(Partition::host(batch(v)))),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

fn shape(value: &Value) -> String {
    match value {
        Value::Partition(p) => format!("P{}", p.num_rows()),
        Value::Proxy(p) => format!("X{}", p.partition().num_rows()),
        Value::Array(items) => format!("[{}]", items.iter().map(shape).collect::<Vec<_>>().join(",")),
        Value::Map(entries) => format!(
            "{{{}}}",
            entries
                .iter()
                .map(|(k, v)| format!("{k}:{}", shape(v)))
                .collect::<Vec<_>>()
                .join(",")
        ),
        other => format!("{other:?}"),
    }
}

fn arb_device_rows() -> impl Strategy<Value = Vec<Vec<i64>>> {
    prop::collection::vec(prop::collection::vec(any::<i64>(), 0..5), 0..5)
}

proptest! {
    #[test]
    fn prop_non_device_values_pass_through(value in arb_plain_value()) {
        let (stats, proxies) = capability();
        let expected = shape(&value);

        let identity = |v: Value| -> SpillwayResult<Value> { Ok(v) };
        let through_proxify = proxify(Arc::clone(&proxies), identity)(value.clone()).unwrap();
        let through_unproxify = unproxify(proxies, identity)(value).unwrap();

        prop_assert_eq!(shape(&through_proxify), expected.clone());
        prop_assert_eq!(shape(&through_unproxify), expected);
        prop_assert_eq!(stats.stats().wrapped, 0);
    }

    #[test]
    fn prop_unproxify_after_proxify_matches_original(rows in arb_device_rows()) {
        let (stats, proxies) = capability();
        let make = move |input: Vec<Vec<i64>>| -> SpillwayResult<Vec<Value>> {
            Ok(input
                .into_iter()
                .map(|v| Value::from(Partition::device(batch(v), 0)))
                .collect())
        };
        let consume = |parts: Vec<Value>| -> SpillwayResult<Vec<String>> {
            Ok(parts.iter().map(shape).collect())
        };

        let produce = proxify(Arc::clone(&proxies), make);
        let gated_consume = unproxify(proxies, consume);

        let direct = consume(make(rows.clone()).unwrap()).unwrap();
        let gated = gated_consume(produce(rows.clone()).unwrap()).unwrap();

        prop_assert_eq!(gated, direct);
        prop_assert_eq!(stats.stats().wrapped, rows.len() as u64);
        prop_assert_eq!(stats.stats().outstanding(), 0);
    }
}
