#![allow(dead_code)]

use core_config::ListConfig;
use core_list::OnDemandList;
use core_render::headless::{HeadlessLayout, HeadlessRenderer};
use core_store::{MemoryStore, RangeResponse, RangeStore, StoreError};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: usize,
    pub fields: Vec<String>,
}

pub fn make_data(items: usize, fields: usize) -> Vec<Row> {
    (0..items)
        .map(|n| Row {
            id: n,
            fields: (0..fields).map(|i| format!("Data {n} - {i}")).collect(),
        })
        .collect()
}

pub type Layout = HeadlessLayout<Row>;
pub type MemList = OnDemandList<Row, MemoryStore<Row>, HeadlessRenderer<Row>, Layout>;

pub const VIEWPORT: f64 = 400.0;
pub const ROW_PX: f64 = 20.0;

pub fn layout() -> Layout {
    HeadlessLayout::new(VIEWPORT, ROW_PX)
}

pub fn memory_list(config: ListConfig, items: usize) -> (MemList, Layout, MemoryStore<Row>) {
    let layout = layout();
    let store = MemoryStore::new(make_data(items, 3));
    let list = OnDemandList::new(config, Some(store.clone()), layout.renderer(), layout.clone());
    (list, layout, store)
}

/// Ids of the rows currently laid out.
pub fn rendered_ids(layout: &Layout) -> Vec<usize> {
    layout.snapshot().rows.iter().map(|r| r.id).collect()
}

type DelayFn = dyn Fn(&Range<usize>) -> Duration + Send + Sync;

/// Store whose response latency depends on the requested range.
#[derive(Clone)]
pub struct ScriptedStore {
    rows: Arc<Vec<Row>>,
    delay: Arc<DelayFn>,
}

impl ScriptedStore {
    pub fn new(items: usize, delay: impl Fn(&Range<usize>) -> Duration + Send + Sync + 'static) -> Self {
        Self {
            rows: Arc::new(make_data(items, 1)),
            delay: Arc::new(delay),
        }
    }
}

impl RangeStore<Row> for ScriptedStore {
    fn fetch_range(&self, range: Range<usize>) -> RangeResponse<Row> {
        let delay = (self.delay)(&range);
        let total = self.rows.len();
        let rows = self.rows.clone();
        RangeResponse {
            total_length: Box::pin(async move { Ok::<_, StoreError>(total) }),
            items: Box::pin(async move {
                tokio::time::sleep(delay).await;
                let end = range.end.min(rows.len());
                let start = range.start.min(end);
                Ok::<_, StoreError>(rows[start..end].to_vec())
            }),
        }
    }
}

pub type ScriptedList = OnDemandList<Row, ScriptedStore, HeadlessRenderer<Row>, Layout>;

pub fn scripted_list(config: ListConfig, store: ScriptedStore) -> (ScriptedList, Layout) {
    let layout = layout();
    let list = OnDemandList::new(config, Some(store), layout.renderer(), layout.clone());
    (list, layout)
}
