//! Spending Statistics
//!
//! Read-only aggregates over the current user's data. Only records owned by
//! `state.user_id` are counted.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub list_id: String,
    pub item_count: usize,
    pub purchased_count: usize,
    /// Sum of every line total
    pub planned_total: f64,
    /// Sum of checked line totals
    pub spent: f64,
    /// Budget minus planned total; `None` when the list has no budget
    pub remaining: Option<f64>,
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category_id: String,
    pub name: String,
    pub item_count: usize,
    pub planned_total: f64,
    pub spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySpend {
    pub year: i32,
    pub month: u32,
    pub purchased_count: usize,
    pub spent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTotals {
    pub list_count: usize,
    pub item_count: usize,
    pub purchased_count: usize,
    pub planned_total: f64,
    pub spent: f64,
    pub total_budget: f64,
}

pub fn list_summary(state: &AppState, list_id: &str) -> Option<ListSummary> {
    let list = state
        .owned_lists()
        .find(|l| l.id == list_id)?;

    let mut summary = ListSummary {
        list_id: list.id.clone(),
        item_count: 0,
        purchased_count: 0,
        planned_total: 0.0,
        spent: 0.0,
        remaining: None,
        over_budget: false,
    };
    for item in state.items_for_list(list_id) {
        summary.item_count += 1;
        summary.planned_total += item.line_total();
        if item.checked {
            summary.purchased_count += 1;
            summary.spent += item.line_total();
        }
    }

    // A zero budget means "no budget"
    if list.has_budget() {
        let remaining = list.budget_limit - summary.planned_total;
        summary.remaining = Some(remaining);
        summary.over_budget = remaining < 0.0;
    }
    Some(summary)
}

/// Per-category totals for one list, in the order categories are listed.
/// Items pointing at a category that no longer exists are grouped under
/// their raw id at the end.
pub fn category_breakdown(state: &AppState, list_id: &str) -> Vec<CategorySpend> {
    let mut buckets: Vec<CategorySpend> = Vec::new();

    for item in state.items_for_list(list_id) {
        let index = match buckets.iter().position(|b| b.category_id == item.category) {
            Some(index) => index,
            None => {
                let name = state
                    .find_category(&item.category)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| item.category.clone());
                buckets.push(CategorySpend {
                    category_id: item.category.clone(),
                    name,
                    item_count: 0,
                    planned_total: 0.0,
                    spent: 0.0,
                });
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[index];
        bucket.item_count += 1;
        bucket.planned_total += item.line_total();
        if item.checked {
            bucket.spent += item.line_total();
        }
    }

    let rank = |id: &str| {
        state
            .categories
            .iter()
            .position(|c| c.id == id)
            .unwrap_or(usize::MAX)
    };
    buckets.sort_by_key(|b| rank(&b.category_id));
    buckets
}

/// Purchased items grouped by the month of `date_added`, oldest first
pub fn monthly_spending(state: &AppState) -> Vec<MonthlySpend> {
    let mut months: BTreeMap<(i32, u32), MonthlySpend> = BTreeMap::new();

    for item in state
        .shopping_list_items
        .iter()
        .filter(|i| i.checked && i.user_id == state.user_id)
    {
        let key = (item.date_added.year(), item.date_added.month());
        let entry = months.entry(key).or_insert(MonthlySpend {
            year: key.0,
            month: key.1,
            purchased_count: 0,
            spent: 0.0,
        });
        entry.purchased_count += 1;
        entry.spent += item.line_total();
    }

    months.into_values().collect()
}

pub fn user_totals(state: &AppState) -> SpendingTotals {
    let mut totals = SpendingTotals::default();
    for list in state.owned_lists() {
        totals.list_count += 1;
        totals.total_budget += list.budget_limit;
        if let Some(summary) = list_summary(state, &list.id) {
            totals.item_count += summary.item_count;
            totals.purchased_count += summary.purchased_count;
            totals.planned_total += summary.planned_total;
            totals.spent += summary.spent;
        }
    }
    totals
}
