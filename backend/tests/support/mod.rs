#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use catalog::{
    Catalog, CategoryId, CategorySet, CategoryTree, DEFAULT_ITEM_TTL, ItemId, ItemSet, LookupError,
};
use chrono::{DateTime, Offset, TimeZone, Utc};
use common::time::ManualClock;
use parking_lot::Mutex;
use purchase_window::logger::ActivityLog;
use purchase_window::overrides::PurchasabilityOverride;
use purchase_window::overrides::repository::OverrideRepository;
use purchase_window::purge::PurgeTransport;
use purchase_window::scheduler::PlannerConfig;
use purchase_window::service::{PurchaseWindowService, ServiceDeps};
use purchase_window::settings::{Configuration, SettingsRepository};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

pub fn categories(ids: &[u64]) -> CategorySet {
    ids.iter().copied().map(CategoryId).collect()
}

pub fn items(ids: &[u64]) -> ItemSet {
    ids.iter().copied().map(ItemId).collect()
}

#[derive(Default)]
pub struct MemSettings {
    pub value: Mutex<Option<Configuration>>,
}

#[async_trait]
impl SettingsRepository for MemSettings {
    async fn load(&self) -> anyhow::Result<Option<Configuration>> {
        Ok(self.value.lock().clone())
    }

    async fn save(&self, config: &Configuration, _now_ms: u64) -> anyhow::Result<()> {
        *self.value.lock() = Some(config.clone());
        Ok(())
    }
}

/// Override storage that can be told to reject one item.
#[derive(Default)]
pub struct MemOverrides {
    pub rows: Mutex<BTreeMap<ItemId, PurchasabilityOverride>>,
    pub reject: Mutex<Option<ItemId>>,
}

#[async_trait]
impl OverrideRepository for MemOverrides {
    async fn load_all(&self) -> anyhow::Result<Vec<(ItemId, PurchasabilityOverride)>> {
        Ok(self.rows.lock().iter().map(|(k, v)| (*k, *v)).collect())
    }

    async fn save(
        &self,
        item: ItemId,
        value: PurchasabilityOverride,
        _now_ms: u64,
    ) -> anyhow::Result<()> {
        if *self.reject.lock() == Some(item) {
            anyhow::bail!("write rejected for {item}");
        }
        self.rows.lock().insert(item, value);
        Ok(())
    }
}

/// Category hierarchy plus item membership, all in memory.
#[derive(Default)]
pub struct FakeShop {
    children: HashMap<CategoryId, Vec<CategoryId>>,
    members: HashMap<CategoryId, Vec<ItemId>>,
    broken_item_urls: HashSet<ItemId>,
    pub items_in_calls: AtomicUsize,
}

impl FakeShop {
    pub fn with_child(mut self, parent: u64, child: u64) -> Self {
        self.children
            .entry(CategoryId(parent))
            .or_default()
            .push(CategoryId(child));
        self
    }

    pub fn with_items(mut self, category: u64, ids: &[u64]) -> Self {
        self.members
            .entry(CategoryId(category))
            .or_default()
            .extend(ids.iter().copied().map(ItemId));
        self
    }

    pub fn with_broken_item_url(mut self, id: u64) -> Self {
        self.broken_item_urls.insert(ItemId(id));
        self
    }

    fn descendants(&self, id: CategoryId) -> CategorySet {
        let mut out = CategorySet::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            for child in self.children.get(&cur).into_iter().flatten() {
                if out.insert(*child) {
                    stack.push(*child);
                }
            }
        }
        out
    }
}

#[async_trait]
impl CategoryTree for FakeShop {
    async fn children_of(&self, id: CategoryId) -> Result<CategorySet, LookupError> {
        Ok(self.descendants(id))
    }

    async fn url_of(&self, id: CategoryId) -> Result<String, LookupError> {
        Ok(format!("https://shop.test/product-category/c{id}/"))
    }
}

#[async_trait]
impl Catalog for FakeShop {
    async fn items_in(
        &self,
        categories: &CategorySet,
        include_descendants: bool,
    ) -> Result<ItemSet, LookupError> {
        self.items_in_calls.fetch_add(1, Ordering::SeqCst);

        let mut scope = categories.clone();
        if include_descendants {
            for c in categories {
                scope.extend(self.descendants(*c));
            }
        }

        Ok(scope
            .iter()
            .filter_map(|c| self.members.get(c))
            .flatten()
            .copied()
            .collect())
    }

    async fn url_of(&self, id: ItemId) -> Result<String, LookupError> {
        if self.broken_item_urls.contains(&id) {
            return Err(LookupError::ItemNotFound(id));
        }
        Ok(format!("https://shop.test/product/p{id}/"))
    }

    fn storefront_index_url(&self) -> String {
        "https://shop.test/shop/".to_string()
    }
}

#[derive(Default)]
pub struct RecordingPurges {
    pub urls: Mutex<Vec<String>>,
}

impl RecordingPurges {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.urls.lock())
    }
}

impl PurgeTransport for RecordingPurges {
    fn purge(&self, url: &str) {
        self.urls.lock().push(url.to_string());
    }
}

pub struct Harness {
    pub service: PurchaseWindowService,
    pub settings: Arc<MemSettings>,
    pub overrides: Arc<MemOverrides>,
    pub shop: Arc<FakeShop>,
    pub purges: Arc<RecordingPurges>,
    pub clock: Arc<ManualClock>,
    pub log: ActivityLog,
}

/// Default shop: category 5 has child 6; items 50, 51 in 5, 60 in 6,
/// 70 in unrelated category 7.
pub fn default_shop() -> FakeShop {
    FakeShop::default()
        .with_child(5, 6)
        .with_items(5, &[50, 51])
        .with_items(6, &[60])
        .with_items(7, &[70])
}

pub async fn harness(shop: FakeShop) -> Harness {
    harness_with(shop, MemOverrides::default()).await
}

pub async fn harness_with(shop: FakeShop, overrides: MemOverrides) -> Harness {
    let settings = Arc::new(MemSettings::default());
    let overrides = Arc::new(overrides);
    let shop = Arc::new(shop);
    let purges = Arc::new(RecordingPurges::default());
    let clock = Arc::new(ManualClock::new(t0()));
    let log = ActivityLog::in_memory(Utc.fix(), clock.clone());

    let service = PurchaseWindowService::build(ServiceDeps {
        settings_repo: settings.clone(),
        override_repo: overrides.clone(),
        catalog: shop.clone(),
        tree: shop.clone(),
        transport: purges.clone(),
        clock: clock.clone(),
        log: log.clone(),
        planner: PlannerConfig::default(),
        item_cache_ttl: DEFAULT_ITEM_TTL,
    })
    .await
    .unwrap();

    Harness {
        service,
        settings,
        overrides,
        shop,
        purges,
        clock,
        log,
    }
}

pub fn config(start: Option<&str>, end: Option<&str>, cats: &[u64]) -> Configuration {
    Configuration {
        start: start.map(str::to_string),
        end: end.map(str::to_string),
        categories: categories(cats),
        logging_enabled: true,
    }
}
