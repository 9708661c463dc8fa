//! Spill-aware proxies and the walk that finds them.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use arrow_schema::SchemaRef;
use common_error::SpillwayResult;

use crate::partition::Partition;
use crate::value::Value;

/// Identifier assigned to a proxy by the capability that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(pub u64);

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proxy#{}", self.0)
    }
}

#[derive(Debug)]
struct ProxyInner {
    id: ProxyId,
    partition: Partition,
}

/// A device-resident partition behind a proxy.
///
/// Clones refer to the same proxy.
#[derive(Debug, Clone)]
pub struct ProxyObject {
    inner: Arc<ProxyInner>,
}

impl ProxyObject {
    /// Create a proxy around a partition.
    pub fn new(id: ProxyId, partition: Partition) -> Self {
        Self {
            inner: Arc::new(ProxyInner { id, partition }),
        }
    }

    /// Proxy identifier.
    pub fn id(&self) -> ProxyId {
        self.inner.id
    }

    /// The proxied partition.
    pub fn partition(&self) -> &Partition {
        &self.inner.partition
    }

    /// Give up the proxy and return the partition it refers to.
    pub fn into_partition(self) -> Partition {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => inner.partition,
            Err(shared) => shared.partition.clone(),
        }
    }

    /// Whether both handles refer to the same proxy.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Wraps device partitions in proxies and unwraps them again.
pub trait ProxyCapability: Send + Sync + Debug {
    /// Wrap a device-resident partition.
    fn wrap(&self, partition: Partition) -> SpillwayResult<ProxyObject>;

    /// Recover the partition behind a proxy.
    fn unwrap(&self, proxy: ProxyObject) -> SpillwayResult<Partition>;
}

/// A type whose device-resident leaves can be proxified and unproxified.
///
/// Both walks leave everything but the relevant leaves untouched: host
/// partitions, scalars and already-proxied values survive `proxify_with`,
/// and only proxies are rewritten by `unproxify_with`.
pub trait ProxyTree: Sized {
    /// Replace every device partition with a proxy.
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self>;

    /// Replace every proxy with the partition it refers to.
    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self>;
}

impl ProxyTree for Value {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        match self {
            Self::Partition(p) if p.is_device() => Ok(Self::Proxy(proxies.wrap(p)?)),
            Self::Array(values) => Ok(Self::Array(values.proxify_with(proxies)?)),
            Self::Map(entries) => Ok(Self::Map(entries.proxify_with(proxies)?)),
            other => Ok(other),
        }
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        match self {
            Self::Proxy(proxy) => Ok(Self::Partition(proxies.unwrap(proxy)?)),
            Self::Array(values) => Ok(Self::Array(values.unproxify_with(proxies)?)),
            Self::Map(entries) => Ok(Self::Map(entries.unproxify_with(proxies)?)),
            other => Ok(other),
        }
    }
}

impl<T: ProxyTree> ProxyTree for Vec<T> {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        self.into_iter().map(|v| v.proxify_with(proxies)).collect()
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        self.into_iter().map(|v| v.unproxify_with(proxies)).collect()
    }
}

impl<T: ProxyTree> ProxyTree for Option<T> {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        self.map(|v| v.proxify_with(proxies)).transpose()
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        self.map(|v| v.unproxify_with(proxies)).transpose()
    }
}

impl<K: Ord, T: ProxyTree> ProxyTree for BTreeMap<K, T> {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        self.into_iter()
            .map(|(k, v)| v.proxify_with(proxies).map(|v| (k, v)))
            .collect()
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        self.into_iter()
            .map(|(k, v)| v.unproxify_with(proxies).map(|v| (k, v)))
            .collect()
    }
}

macro_rules! impl_proxy_tree_tuple {
    ($($name:ident),+) => {
        impl<$($name: ProxyTree),+> ProxyTree for ($($name,)+) {
            #[allow(non_snake_case)]
            fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
                let ($($name,)+) = self;
                Ok(($($name.proxify_with(proxies)?,)+))
            }

            #[allow(non_snake_case)]
            fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
                let ($($name,)+) = self;
                Ok(($($name.unproxify_with(proxies)?,)+))
            }
        }
    };
}

impl_proxy_tree_tuple!(A);
impl_proxy_tree_tuple!(A, B);
impl_proxy_tree_tuple!(A, B, C);
impl_proxy_tree_tuple!(A, B, C, D);

macro_rules! impl_proxy_tree_leaf {
    ($($ty:ty),+) => {
        $(
            impl ProxyTree for $ty {
                fn proxify_with(self, _proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
                    Ok(self)
                }

                fn unproxify_with(self, _proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
                    Ok(self)
                }
            }
        )+
    };
}

impl_proxy_tree_leaf!((), bool, i64, u32, u64, usize, f64, String, SchemaRef);

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Int64Array, RecordBatch};
    use arrow_schema::{DataType, Field, Schema};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Default)]
    struct CountingProxies {
        next: AtomicU64,
    }

    impl ProxyCapability for CountingProxies {
        fn wrap(&self, partition: Partition) -> SpillwayResult<ProxyObject> {
            let id = self.next.fetch_add(1, Ordering::Relaxed);
            Ok(ProxyObject::new(ProxyId(id), partition))
        }

        fn unwrap(&self, proxy: ProxyObject) -> SpillwayResult<Partition> {
            Ok(proxy.into_partition())
        }
    }

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap()
    }

    #[test]
    fn test_proxify_only_device_partitions() {
        let proxies = CountingProxies::default();
        let value = Value::Array(vec![
            Value::from(Partition::device(batch(), 0)),
            Value::from(Partition::host(batch())),
            Value::Int64(3),
        ]);

        let wrapped = value.proxify_with(&proxies).unwrap();
        let items = wrapped.as_array().unwrap();
        assert!(items[0].is_proxy());
        assert!(items[1].as_partition().is_some());
        assert_eq!(items[2].as_int64(), Some(3));
    }

    #[test]
    fn test_existing_proxy_not_rewrapped() {
        let proxies = CountingProxies::default();
        let proxy = proxies.wrap(Partition::device(batch(), 0)).unwrap();
        let wrapped = Value::from(proxy.clone()).proxify_with(&proxies).unwrap();
        assert!(wrapped.as_proxy().unwrap().ptr_eq(&proxy));
    }

    #[test]
    fn test_unproxify_restores_same_batch() {
        let proxies = CountingProxies::default();
        let part = Partition::device(batch(), 0);
        let mut map = BTreeMap::new();
        map.insert(0usize, Value::from(part.clone()));

        let wrapped = map.proxify_with(&proxies).unwrap();
        assert!(wrapped[&0].is_proxy());

        let restored = wrapped.unproxify_with(&proxies).unwrap();
        assert!(restored[&0].as_partition().unwrap().ptr_eq(&part));
    }

    #[test]
    fn test_tuple_and_option_walk() {
        let proxies = CountingProxies::default();
        let input = (
            Some(Value::from(Partition::device(batch(), 0))),
            String::from("key"),
            7usize,
        );
        let (first, name, n) = input.proxify_with(&proxies).unwrap();
        assert!(first.unwrap().is_proxy());
        assert_eq!(name, "key");
        assert_eq!(n, 7);
    }

    #[test]
    fn test_into_partition_shared_proxy() {
        let part = Partition::device(batch(), 0);
        let proxy = ProxyObject::new(ProxyId(9), part.clone());
        let other = proxy.clone();
        assert_eq!(proxy.id().to_string(), "proxy#9");
        assert!(proxy.into_partition().ptr_eq(&part));
        assert!(other.into_partition().ptr_eq(&part));
    }

    fn leaves(value: &Value, out: &mut Vec<Partition>) {
        match value {
            Value::Partition(p) => out.push(p.clone()),
            Value::Proxy(p) => out.push(p.partition().clone()),
            Value::Array(items) => items.iter().for_each(|v| leaves(v, out)),
            Value::Map(entries) => entries.values().for_each(|v| leaves(v, out)),
            _ => {}
        }
    }

    proptest! {
        #[test]
        fn prop_nested_walk_restores_same_batches(
            shape in prop::collection::vec(
                prop::collection::btree_map("[a-z]{1,3}", any::<bool>(), 0..4),
                0..4,
            ),
        ) {
            let value = Value::Array(
                shape
                    .iter()
                    .map(|entries| {
                        Value::Map(
                            entries
                                .iter()
                                .map(|(k, &on_device)| {
                                    let part = if on_device {
                                        Partition::device(batch(), 0)
                                    } else {
                                        Partition::host(batch())
                                    };
                                    (k.clone(), Value::from(part))
                                })
                                .collect(),
                        )
                    })
                    .collect(),
            );
            let device_leaves = shape.iter().flat_map(|m| m.values()).filter(|&&d| d).count();

            let mut before = Vec::new();
            leaves(&value, &mut before);

            let proxies = CountingProxies::default();
            let wrapped = value.proxify_with(&proxies).unwrap();
            prop_assert_eq!(wrapped.count_proxies(), device_leaves);

            let restored = wrapped.unproxify_with(&proxies).unwrap();
            prop_assert_eq!(restored.count_proxies(), 0);

            let mut after = Vec::new();
            leaves(&restored, &mut after);
            prop_assert_eq!(before.len(), after.len());
            for (a, b) in before.iter().zip(&after) {
                prop_assert!(a.ptr_eq(b));
                prop_assert_eq!(a.residency(), b.residency());
            }
        }
    }
}
