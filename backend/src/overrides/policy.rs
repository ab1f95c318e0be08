use std::sync::Arc;

use catalog::ItemId;

use crate::overrides::model::PurchasabilityOverride;
use crate::overrides::store::OverrideStore;

/// Read-side answer to "can this item be bought right now?".
///
/// Called synchronously by the catalog on every purchasability check, so it
/// is a single keyed lookup with no I/O.
#[derive(Clone)]
pub struct PurchasabilityPolicy {
    store: Arc<OverrideStore>,
}

impl PurchasabilityPolicy {
    pub fn new(store: Arc<OverrideStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, item: ItemId, default_value: bool) -> bool {
        decide(self.store.get(item), default_value)
    }
}

/// Applies an override to the catalog's own answer.
pub fn decide(value: PurchasabilityOverride, default_value: bool) -> bool {
    match value {
        PurchasabilityOverride::Purchasable => true,
        PurchasabilityOverride::Unpurchasable => false,
        PurchasabilityOverride::Unset => default_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::repository::OverrideRepository;
    use async_trait::async_trait;
    use proptest::prelude::*;

    struct NullRepo;

    #[async_trait]
    impl OverrideRepository for NullRepo {
        async fn load_all(&self) -> anyhow::Result<Vec<(ItemId, PurchasabilityOverride)>> {
            Ok(vec![])
        }

        async fn save(&self, _: ItemId, _: PurchasabilityOverride, _: u64) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn untouched_item_falls_back_to_default() {
        let policy = PurchasabilityPolicy::new(Arc::new(OverrideStore::new(Arc::new(NullRepo))));

        assert!(policy.resolve(ItemId(1), true));
        assert!(!policy.resolve(ItemId(1), false));
    }

    #[tokio::test]
    async fn written_override_wins_over_default() {
        let store = Arc::new(OverrideStore::new(Arc::new(NullRepo)));
        let policy = PurchasabilityPolicy::new(store.clone());

        store
            .set(ItemId(1), PurchasabilityOverride::Unpurchasable, 0)
            .await
            .unwrap();
        store
            .set(ItemId(2), PurchasabilityOverride::Purchasable, 0)
            .await
            .unwrap();

        assert!(!policy.resolve(ItemId(1), true));
        assert!(policy.resolve(ItemId(2), false));
    }

    fn any_override() -> impl Strategy<Value = PurchasabilityOverride> {
        prop_oneof![
            Just(PurchasabilityOverride::Unset),
            Just(PurchasabilityOverride::Purchasable),
            Just(PurchasabilityOverride::Unpurchasable),
        ]
    }

    proptest! {
        #[test]
        fn false_only_when_unpurchasable(value in any_override()) {
            let out = decide(value, true);
            prop_assert_eq!(out, value != PurchasabilityOverride::Unpurchasable);
        }

        #[test]
        fn unset_passes_default_through(default_value in any::<bool>()) {
            prop_assert_eq!(decide(PurchasabilityOverride::Unset, default_value), default_value);
        }
    }
}
