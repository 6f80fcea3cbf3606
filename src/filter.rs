use crate::types::{AccidentRecord, FilterState, RecordStore, Schema, Statistic, View};
use std::collections::BTreeSet;

/// Records selected by the current filter, shared read-only by every
/// pipeline in one recomputation.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub statistic: Statistic,
    pub records: Vec<&'a AccidentRecord>,
    pub qualifier: String,
    pub schema: Schema,
}

impl FilteredView<'_> {
    pub fn title(&self, view: View) -> String {
        let stem = view.title_stem(self.statistic);
        if self.qualifier.is_empty() {
            stem
        } else {
            format!("{} {}", stem, self.qualifier)
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn evaluate<'a>(store: &'a RecordStore, filter: &FilterState) -> FilteredView<'a> {
    let records = if filter.provinces.is_empty() {
        store.records().iter().collect()
    } else {
        store
            .records()
            .iter()
            .filter(|r| {
                r.province
                    .as_ref()
                    .is_some_and(|p| filter.provinces.contains(p))
            })
            .collect()
    };
    FilteredView {
        statistic: filter.statistic,
        records,
        qualifier: qualifier(&filter.provinces),
        schema: store.schema(),
    }
}

/// Title suffix describing the province filter: empty for no filter, the
/// names for up to three provinces, otherwise just the count.
pub fn qualifier(provinces: &BTreeSet<String>) -> String {
    match provinces.len() {
        0 => String::new(),
        1..=3 => format!(
            "- province: {}",
            provinces.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        ),
        n => format!("- {} provinces", n),
    }
}
