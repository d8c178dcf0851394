//! Store and reducer tests

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::*;
use crate::domain::{Category, Currency, ShoppingList, ShoppingListItem, Theme, UserId, UNCATEGORIZED_ID};
use crate::repository::{KeyValueStore, MemoryStore, SnapshotRepository};

fn user(id: &str) -> UserId {
    UserId::from(id)
}

fn state_for(id: &str) -> AppState {
    AppState::fresh(user(id), Currency::usd(), Theme::default())
}

fn apply(state: &AppState, action: Action) -> AppState {
    reduce(state, action, &Policy::default()).expect("action rejected").state
}

fn with_list(state: &AppState, name: &str) -> (AppState, String) {
    let list = ShoppingList::new(state.user_id.clone(), name, 0.0);
    let id = list.id.clone();
    let next = apply(state, Action::AddList { user_id: state.user_id.clone(), list });
    (next, id)
}

fn with_item(state: &AppState, list_id: &str, name: &str, category: &str) -> (AppState, String) {
    let item = ShoppingListItem::new(state.user_id.clone(), list_id, name, 1, 2.0, category);
    let id = item.id.clone();
    let next = apply(state, Action::AddItem { user_id: state.user_id.clone(), item });
    (next, id)
}

fn memory_store() -> (Store, MemoryStore) {
    let kv = MemoryStore::new();
    let repo = SnapshotRepository::new(Arc::new(kv.clone()), "basket");
    (Store::new(repo, Policy::default()), kv)
}

// ========================
// Lists
// ========================

#[test]
fn test_first_list_is_selected() {
    let state = state_for("anon_1");
    let list = ShoppingList::new(user("anon_1"), "Groceries", 100.0);
    let id = list.id.clone();

    let next = apply(&state, Action::AddList { user_id: user("anon_1"), list });

    assert_eq!(next.lists.len(), 1);
    assert_eq!(next.selected_list_id, Some(id));
    assert_eq!(next.lists[0].budget_limit, 100.0);
}

#[test]
fn test_later_lists_keep_selection() {
    let (state, first) = with_list(&state_for("u1"), "One");
    let (state, _) = with_list(&state, "Two");
    assert_eq!(state.selected_list_id, Some(first));
}

#[test]
fn test_free_user_list_cap() {
    let mut state = state_for("u1");
    for i in 0..3 {
        state = with_list(&state, &format!("List {}", i)).0;
    }

    let fourth = ShoppingList::new(user("u1"), "Fourth", 0.0);
    let result = reduce(&state, Action::AddList { user_id: user("u1"), list: fourth }, &Policy::default());

    assert_eq!(result, Err(Rejection::ListLimit(3)));
    assert_eq!(state.lists.len(), 3);
}

#[test]
fn test_free_user_never_exceeds_list_cap() {
    let mut state = state_for("u1");
    for i in 0..10 {
        let list = ShoppingList::new(user("u1"), format!("L{}", i), 0.0);
        if let Ok(reduction) = reduce(&state, Action::AddList { user_id: user("u1"), list }, &Policy::default()) {
            state = reduction.state;
        }
        assert!(state.owned_list_count() <= 3);
    }
    assert_eq!(state.owned_list_count(), 3);
}

#[test]
fn test_premium_user_has_no_list_cap() {
    let mut state = state_for("u1");
    state.is_premium = true;
    for i in 0..5 {
        state = with_list(&state, &format!("List {}", i)).0;
    }
    assert_eq!(state.lists.len(), 5);
}

#[test]
fn test_list_rejected_without_user() {
    let state = AppState::default();
    let list = ShoppingList::new(UserId::default(), "Orphan", 0.0);
    let result = reduce(&state, Action::AddList { user_id: UserId::default(), list }, &Policy::default());
    assert_eq!(result, Err(Rejection::MissingUser));
}

#[test]
fn test_update_list_requires_owner() {
    let (state, list_id) = with_list(&state_for("u1"), "Mine");
    let mut renamed = state.find_list(&list_id).unwrap().clone();
    renamed.name = "Renamed".to_string();
    renamed.budget_limit = 50.0;

    let next = apply(&state, Action::UpdateList { user_id: user("u1"), list: renamed.clone() });
    assert_eq!(next.find_list(&list_id).unwrap().name, "Renamed");

    let mut stolen = renamed;
    stolen.user_id = user("u2");
    let result = reduce(&next, Action::UpdateList { user_id: user("u1"), list: stolen }, &Policy::default());
    assert!(matches!(result, Err(Rejection::NotOwner(_))));
}

#[test]
fn test_delete_list_cascades_to_own_items_only() {
    let (state, keep) = with_list(&state_for("u1"), "Keep");
    let (state, doomed) = with_list(&state, "Doomed");
    let (state, _) = with_item(&state, &doomed, "Milk", "dairy");
    let (state, _) = with_item(&state, &doomed, "Bread", "bakery");
    let (mut state, kept_item) = with_item(&state, &keep, "Rice", "pantry");

    // A stray record from another user pointing at the same list id
    let stray = ShoppingListItem::new(user("u2"), doomed.clone(), "Foreign", 1, 1.0, "dairy");
    state.shopping_list_items.push(stray.clone());

    let next = apply(&state, Action::DeleteList { user_id: user("u1"), list_id: doomed.clone() });

    assert!(next.find_list(&doomed).is_none());
    assert_eq!(next.shopping_list_items.len(), 2);
    assert!(next.find_item(&kept_item).is_some());
    assert!(next.find_item(&stray.id).is_some());
}

#[test]
fn test_delete_selected_list_falls_back() {
    let (state, first) = with_list(&state_for("u1"), "First");
    let (state, second) = with_list(&state, "Second");

    let next = apply(&state, Action::DeleteList { user_id: user("u1"), list_id: first });
    assert_eq!(next.selected_list_id, Some(second.clone()));

    let next = apply(&next, Action::DeleteList { user_id: user("u1"), list_id: second });
    assert_eq!(next.selected_list_id, None);
}

#[test]
fn test_select_list_rules() {
    let (mut state, mine) = with_list(&state_for("u1"), "Mine");
    let mut theirs = ShoppingList::new(user("u2"), "Theirs", 0.0);
    theirs.id = "theirs".to_string();
    state.lists.push(theirs);

    let deselected = apply(&state, Action::SelectList { user_id: user("u1"), list_id: None });
    assert_eq!(deselected.selected_list_id, None);

    let selected = apply(&deselected, Action::SelectList { user_id: user("u1"), list_id: Some(mine.clone()) });
    assert_eq!(selected.selected_list_id, Some(mine));

    let result = reduce(
        &selected,
        Action::SelectList { user_id: user("u1"), list_id: Some("theirs".to_string()) },
        &Policy::default(),
    );
    assert!(result.is_err());
}

// ========================
// Items
// ========================

#[test]
fn test_add_item_requires_owned_list_and_known_category() {
    let (state, list_id) = with_list(&state_for("u1"), "Groceries");

    let missing_list = ShoppingListItem::new(user("u1"), "nope", "Milk", 1, 1.0, "dairy");
    let result = reduce(&state, Action::AddItem { user_id: user("u1"), item: missing_list }, &Policy::default());
    assert_eq!(result, Err(Rejection::UnknownList("nope".to_string())));

    let bad_category = ShoppingListItem::new(user("u1"), list_id.clone(), "Milk", 1, 1.0, "ghost");
    let result = reduce(&state, Action::AddItem { user_id: user("u1"), item: bad_category }, &Policy::default());
    assert_eq!(result, Err(Rejection::UnknownCategory("ghost".to_string())));

    let invalid = ShoppingListItem::new(user("u1"), list_id, "Milk", 0, 1.0, "dairy");
    let result = reduce(&state, Action::AddItem { user_id: user("u1"), item: invalid }, &Policy::default());
    assert!(matches!(result, Err(Rejection::Invalid(_))));
}

#[test]
fn test_update_and_remove_item() {
    let (state, list_id) = with_list(&state_for("u1"), "Groceries");
    let (state, item_id) = with_item(&state, &list_id, "Milk", "dairy");

    let mut edited = state.find_item(&item_id).unwrap().clone();
    edited.quantity = 3;
    edited.price = 1.5;
    let next = apply(&state, Action::UpdateItem { user_id: user("u1"), item: edited });
    assert_eq!(next.find_item(&item_id).unwrap().line_total(), 4.5);

    let next = apply(&next, Action::RemoveItem { user_id: user("u1"), item_id: item_id.clone() });
    assert!(next.find_item(&item_id).is_none());
}

#[test]
fn test_toggle_item_stamps_date() {
    let (state, list_id) = with_list(&state_for("u1"), "Groceries");
    let (state, item_id) = with_item(&state, &list_id, "Milk", "dairy");
    let at = Utc::now() + Duration::hours(2);

    let next = apply(&state, Action::ToggleItem { user_id: user("u1"), item_id: item_id.clone(), at });

    let item = next.find_item(&item_id).unwrap();
    assert!(item.checked);
    assert_eq!(item.date_added, at);

    let back = apply(&next, Action::ToggleItem { user_id: user("u1"), item_id: item_id.clone(), at });
    assert!(!back.find_item(&item_id).unwrap().checked);
}

#[test]
fn test_clear_checked_items() {
    let (state, list_id) = with_list(&state_for("u1"), "Groceries");
    let (state, bought) = with_item(&state, &list_id, "Milk", "dairy");
    let (state, pending) = with_item(&state, &list_id, "Eggs", "dairy");
    let state = apply(&state, Action::ToggleItem { user_id: user("u1"), item_id: bought.clone(), at: Utc::now() });

    let next = apply(&state, Action::ClearCheckedItems { user_id: user("u1"), list_id });

    assert!(next.find_item(&bought).is_none());
    assert!(next.find_item(&pending).is_some());
}

// ========================
// Categories
// ========================

#[test]
fn test_free_user_category_cap() {
    let mut state = state_for("u1");
    for i in 0..8 {
        let category = Category::custom(user("u1"), format!("Custom {}", i));
        if let Ok(reduction) = reduce(&state, Action::AddCategory { user_id: user("u1"), category }, &Policy::default()) {
            state = reduction.state;
        }
        assert!(state.owned_category_count() <= 5);
    }
    assert_eq!(state.owned_category_count(), 5);
}

#[test]
fn test_category_names_unique_per_scope() {
    let state = state_for("u1");
    let clash = Category::custom(user("u1"), "bakery");
    let result = reduce(&state, Action::AddCategory { user_id: user("u1"), category: clash }, &Policy::default());
    assert_eq!(result, Err(Rejection::DuplicateCategoryName("bakery".to_string())));
}

#[test]
fn test_uncategorized_cannot_be_removed() {
    let mut state = state_for("u1");
    state.is_premium = true;

    let result = reduce(
        &state,
        Action::RemoveCategory {
            user_id: user("u1"),
            category_id: UNCATEGORIZED_ID.to_string(),
            reassign_to: None,
        },
        &Policy::default(),
    );

    assert_eq!(result, Err(Rejection::ProtectedCategory(UNCATEGORIZED_ID.to_string())));
    assert!(state.find_category(UNCATEGORIZED_ID).is_some());
}

#[test]
fn test_global_category_edits_need_premium() {
    let state = state_for("u1");
    let renamed = Category::global("dairy", "Milk Products");

    let result = reduce(
        &state,
        Action::UpdateCategory { user_id: user("u1"), category: renamed.clone() },
        &Policy::default(),
    );
    assert!(matches!(result, Err(Rejection::NotOwner(_))));

    let mut premium = state.clone();
    premium.is_premium = true;
    let next = apply(&premium, Action::UpdateCategory { user_id: user("u1"), category: renamed.clone() });
    assert_eq!(next.find_category("dairy").unwrap().name, "Milk Products");

    let locked = Policy {
        premium_edits_global_categories: false,
        ..Policy::default()
    };
    let result = reduce(&premium, Action::UpdateCategory { user_id: user("u1"), category: renamed }, &locked);
    assert!(result.is_err());
}

#[test]
fn test_remove_category_reassigns_items_and_lists() {
    let state = state_for("u1");
    let custom = Category::custom(user("u1"), "X");
    let custom_id = custom.id.clone();
    let state = apply(&state, Action::AddCategory { user_id: user("u1"), category: custom });

    let list = ShoppingList::new(user("u1"), "Groceries", 0.0).with_default_category(custom_id.clone());
    let list_id = list.id.clone();
    let state = apply(&state, Action::AddList { user_id: user("u1"), list });
    let (state, item_id) = with_item(&state, &list_id, "Thing", &custom_id);

    let next = apply(
        &state,
        Action::RemoveCategory {
            user_id: user("u1"),
            category_id: custom_id.clone(),
            reassign_to: Some(UNCATEGORIZED_ID.to_string()),
        },
    );

    assert!(next.find_category(&custom_id).is_none());
    assert_eq!(next.find_item(&item_id).unwrap().category, UNCATEGORIZED_ID);
    assert_eq!(next.find_list(&list_id).unwrap().default_category, UNCATEGORIZED_ID);
}

#[test]
fn test_remove_category_with_invalid_target_uses_uncategorized() {
    let state = state_for("u1");
    let custom = Category::custom(user("u1"), "X");
    let custom_id = custom.id.clone();
    let state = apply(&state, Action::AddCategory { user_id: user("u1"), category: custom });
    let (state, list_id) = with_list(&state, "Groceries");
    let (state, item_id) = with_item(&state, &list_id, "Thing", &custom_id);

    let next = apply(
        &state,
        Action::RemoveCategory {
            user_id: user("u1"),
            category_id: custom_id.clone(),
            reassign_to: Some(custom_id),
        },
    );
    assert_eq!(next.find_item(&item_id).unwrap().category, UNCATEGORIZED_ID);

    let produce = apply(&state, Action::RemoveCategory {
        user_id: user("u1"),
        category_id: state.categories.last().unwrap().id.clone(),
        reassign_to: Some("produce".to_string()),
    });
    assert_eq!(produce.find_item(&item_id).unwrap().category, "produce");
}

// ========================
// Ownership
// ========================

#[test]
fn test_foreign_user_actions_leave_state_unchanged() {
    let (state, list_id) = with_list(&state_for("u1"), "Groceries");
    let (state, item_id) = with_item(&state, &list_id, "Milk", "dairy");
    let intruder = user("u2");

    let actions = vec![
        Action::AddList { user_id: intruder.clone(), list: ShoppingList::new(intruder.clone(), "X", 0.0) },
        Action::DeleteList { user_id: intruder.clone(), list_id: list_id.clone() },
        Action::SelectList { user_id: intruder.clone(), list_id: None },
        Action::RemoveItem { user_id: intruder.clone(), item_id: item_id.clone() },
        Action::ToggleItem { user_id: intruder.clone(), item_id: item_id.clone(), at: Utc::now() },
        Action::AddCategory { user_id: intruder.clone(), category: Category::custom(intruder.clone(), "Y") },
        Action::LoadRemoteSnapshot { user_id: intruder.clone(), data: RemoteSnapshot::default() },
    ];

    for action in actions {
        let name = action.name();
        let result = reduce(&state, action, &Policy::default());
        assert!(
            matches!(result, Err(Rejection::ForeignUser { .. })),
            "{} was not rejected",
            name
        );
    }
}

#[test]
fn test_uncategorized_survives_any_sequence() {
    let mut state = state_for("u1");
    state.is_premium = true;
    let policy = Policy::default();

    let ids: Vec<String> = state.categories.iter().map(|c| c.id.clone()).collect();
    for id in ids {
        if let Ok(reduction) = reduce(
            &state,
            Action::RemoveCategory { user_id: user("u1"), category_id: id, reassign_to: None },
            &policy,
        ) {
            state = reduction.state;
        }
    }
    state = apply(&state, Action::SetUserContext { user_id: user("u2"), is_premium: false });
    state = apply(&state, Action::ResetForLogout { new_user_id: UserId::new_anonymous() });

    assert!(state.find_category(UNCATEGORIZED_ID).is_some());
}

// ========================
// Loading and sessions
// ========================

#[test]
fn test_load_snapshot_merges_and_selects() {
    let (saved, list_id) = with_list(&state_for("u1"), "Groceries");
    let mut snapshot = Snapshot::from(&saved);
    snapshot.selected_list_id = Some("stale".to_string());
    snapshot.categories = vec![Category::custom(user("u1"), "Snacks")];
    snapshot.theme = None;

    let next = apply(&AppState::default(), Action::LoadSnapshot { user_id: user("u1"), snapshot });

    assert_eq!(next.user_id, user("u1"));
    assert_eq!(next.selected_list_id, Some(list_id));
    assert_eq!(next.categories.len(), Category::defaults().len() + 1);
    assert_eq!(next.theme, Theme::default());
    assert!(next.is_loading, "loading flag is transient and kept");
}

#[test]
fn test_load_snapshot_never_grants_anonymous_premium() {
    let snapshot = Snapshot {
        is_premium: true,
        ..Snapshot::default()
    };
    let next = apply(&AppState::default(), Action::LoadSnapshot { user_id: user("anon_x"), snapshot });
    assert!(!next.is_premium);
}

#[test]
fn test_set_user_context_wipes_on_switch() {
    let (state, list_id) = with_list(&state_for("anon_1"), "Local");
    let (state, _) = with_item(&state, &list_id, "Milk", "dairy");

    let next = apply(&state, Action::SetUserContext { user_id: user("42"), is_premium: true });

    assert_eq!(next.user_id, user("42"));
    assert!(next.lists.is_empty());
    assert!(next.shopping_list_items.is_empty());
    assert_eq!(next.selected_list_id, None);
    assert_eq!(next.categories, Category::defaults());
    assert!(next.is_loading);
    assert!(next.is_premium);

    let anon = apply(&next, Action::SetUserContext { user_id: user("anon_2"), is_premium: true });
    assert!(!anon.is_loading);
    assert!(!anon.is_premium);
}

#[test]
fn test_set_user_context_same_user_only_updates_premium() {
    let (mut state, _) = with_list(&state_for("42"), "Kept");
    state.is_loading = false;
    let next = apply(&state, Action::SetUserContext { user_id: user("42"), is_premium: true });
    assert_eq!(next.lists.len(), 1);
    assert!(next.is_premium);
    assert!(!next.is_loading);
}

#[test]
fn test_remote_snapshot_overlay() {
    let mut state = state_for("42");
    state.is_loading = true;

    let list = ShoppingList::new(user("42"), "Server list", 20.0);
    let foreign = ShoppingList::new(user("7"), "Not mine", 0.0);
    let item = ShoppingListItem::new(user("42"), list.id.clone(), "Tea", 1, 4.0, "beverages");
    let orphan = ShoppingListItem::new(user("42"), "missing", "Ghost", 1, 1.0, "beverages");
    let data = RemoteSnapshot {
        lists: vec![list.clone(), foreign],
        items: vec![item, orphan],
        categories: vec![Category::custom(user("42"), "Tea time")],
        preferences: RemotePreferences {
            currency: Currency::for_code("INR"),
            is_premium: Some(true),
        },
    };

    let next = apply(&state, Action::LoadRemoteSnapshot { user_id: user("42"), data });

    assert_eq!(next.lists, vec![list.clone()]);
    assert_eq!(next.shopping_list_items.len(), 1);
    assert_eq!(next.selected_list_id, Some(list.id));
    assert_eq!(next.currency.code, "INR");
    assert!(next.is_premium);
    assert!(!next.is_loading);
    assert_eq!(next.categories.len(), Category::defaults().len() + 1);
}

#[test]
fn test_reset_for_logout() {
    let (mut state, _) = with_list(&state_for("42"), "Mine");
    state.currency = Currency::for_code("GBP").unwrap();
    state.theme = Theme::new("dark");
    state.is_premium = true;
    let new_id = UserId::new_anonymous();

    let reduction = reduce(&state, Action::ResetForLogout { new_user_id: new_id.clone() }, &Policy::default()).unwrap();

    let next = reduction.state;
    assert_eq!(next.user_id, new_id);
    assert!(next.lists.is_empty());
    assert!(next.shopping_list_items.is_empty());
    assert_eq!(next.currency, state.currency);
    assert_eq!(next.theme, state.theme);
    assert!(!next.is_premium);
    assert_eq!(
        reduction.effects,
        vec![Effect::Evict(user("42")), Effect::Persist, Effect::RememberUser(new_id)]
    );
}

#[test]
fn test_reset_for_logout_requires_anonymous_target() {
    let state = state_for("42");
    let result = reduce(&state, Action::ResetForLogout { new_user_id: user("43") }, &Policy::default());
    assert!(result.is_err());
}

#[test]
fn test_set_loading_does_not_persist() {
    let state = state_for("u1");
    let reduction = reduce(&state, Action::SetLoading(true), &Policy::default()).unwrap();
    assert!(reduction.effects.is_empty());

    let reduction = reduce(&state, Action::SetTheme(Theme::new("dark")), &Policy::default()).unwrap();
    assert_eq!(reduction.effects, vec![Effect::Persist]);
}

// ========================
// Store
// ========================

#[tokio::test]
async fn test_store_persists_under_user_key() {
    let (store, kv) = memory_store();
    let anon = UserId::new_anonymous();
    assert!(store.dispatch(Action::LoadSnapshot { user_id: anon.clone(), snapshot: Snapshot::default() }).await);

    let list_id = store.add_list("Groceries", 100.0).await.expect("list rejected");

    let state = store.state().await;
    assert_eq!(state.lists.len(), 1);
    assert_eq!(state.selected_list_id, Some(list_id));

    let raw = kv.get(&format!("basket_{}", anon)).await.unwrap().expect("not persisted");
    assert!(raw.contains("Groceries"));
    assert!(!raw.contains("isLoading"));
}

#[tokio::test]
async fn test_store_loading_flag_is_not_written() {
    let (store, kv) = memory_store();
    store.dispatch(Action::LoadSnapshot { user_id: user("u1"), snapshot: Snapshot::default() }).await;
    kv.remove("basket_u1").await.unwrap();

    store.dispatch(Action::SetLoading(false)).await;

    assert!(kv.get("basket_u1").await.unwrap().is_none());
    assert!(!store.state().await.is_loading);
}

#[tokio::test]
async fn test_store_rejection_keeps_state() {
    let (store, _) = memory_store();
    store.dispatch(Action::LoadSnapshot { user_id: user("u1"), snapshot: Snapshot::default() }).await;
    for name in ["A", "B", "C"] {
        assert!(store.add_list(name, 0.0).await.is_some());
    }
    let before = store.state().await;

    assert!(store.add_list("D", 0.0).await.is_none());
    assert_eq!(store.state().await, before);
}

#[tokio::test]
async fn test_store_add_item_uses_list_default_category() {
    let (store, _) = memory_store();
    store.dispatch(Action::LoadSnapshot { user_id: user("u1"), snapshot: Snapshot::default() }).await;
    let list_id = store.add_list("Groceries", 0.0).await.unwrap();

    let item_id = store.add_item(&list_id, "Milk", 1, 0.99, None).await.unwrap();
    let state = store.state().await;
    assert_eq!(state.find_item(&item_id).unwrap().category, UNCATEGORIZED_ID);

    assert!(store.toggle_item(&item_id).await);
    assert!(store.state().await.find_item(&item_id).unwrap().checked);
}

#[tokio::test]
async fn test_store_logout_evicts_and_remembers() {
    let (store, kv) = memory_store();
    store.dispatch(Action::LoadSnapshot { user_id: user("42"), snapshot: Snapshot::default() }).await;
    store.dispatch(Action::SetTheme(Theme::new("dark"))).await;
    store.add_list("Mine", 10.0).await.unwrap();
    assert!(kv.get("basket_42").await.unwrap().is_some());

    assert!(store.logout().await);

    let state = store.state().await;
    assert!(state.user_id.is_anonymous());
    assert!(state.lists.is_empty());
    assert_eq!(state.theme, Theme::new("dark"));
    assert!(kv.get("basket_42").await.unwrap().is_none());
    assert!(kv.get(&format!("basket_{}", state.user_id)).await.unwrap().is_some());
    assert_eq!(store.snapshots().last_active_user().await, Some(state.user_id));
}

#[tokio::test]
async fn test_store_broadcasts_updates() {
    let (store, _) = memory_store();
    let mut updates = store.subscribe();

    store.dispatch(Action::LoadSnapshot { user_id: user("u1"), snapshot: Snapshot::default() }).await;

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().user_id, user("u1"));
}

// ========================
// Generated sequences
// ========================

mod generated {
    use super::*;
    use proptest::prelude::*;

    /// One user gesture; indices pick targets from the current state
    #[derive(Debug, Clone)]
    enum Step {
        AddList,
        DeleteList(usize),
        SelectList(usize),
        AddCategory(u8),
        RemoveCategory(usize, Option<usize>),
        AddItem(usize, usize),
        ToggleItem(usize),
        ClearChecked(usize),
        Logout,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => Just(Step::AddList),
            1 => any::<usize>().prop_map(Step::DeleteList),
            1 => any::<usize>().prop_map(Step::SelectList),
            3 => (0u8..10).prop_map(Step::AddCategory),
            2 => (any::<usize>(), proptest::option::of(any::<usize>()))
                .prop_map(|(c, to)| Step::RemoveCategory(c, to)),
            2 => (any::<usize>(), any::<usize>()).prop_map(|(l, c)| Step::AddItem(l, c)),
            1 => any::<usize>().prop_map(Step::ToggleItem),
            1 => any::<usize>().prop_map(Step::ClearChecked),
            1 => Just(Step::Logout),
        ]
    }

    fn pick<T>(items: &[T], index: usize) -> Option<&T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[index % items.len()])
        }
    }

    fn action_for(state: &AppState, step: &Step) -> Option<Action> {
        let user_id = state.user_id.clone();
        let action = match step {
            Step::AddList => Action::AddList {
                list: ShoppingList::new(user_id.clone(), "Generated", 10.0),
                user_id,
            },
            Step::DeleteList(i) => Action::DeleteList {
                list_id: pick(&state.lists, *i)?.id.clone(),
                user_id,
            },
            Step::SelectList(i) => Action::SelectList {
                list_id: pick(&state.lists, *i).map(|l| l.id.clone()),
                user_id,
            },
            Step::AddCategory(n) => Action::AddCategory {
                category: Category::custom(user_id.clone(), format!("Generated {}", n)),
                user_id,
            },
            Step::RemoveCategory(i, to) => Action::RemoveCategory {
                category_id: pick(&state.categories, *i)?.id.clone(),
                reassign_to: to.and_then(|t| pick(&state.categories, t)).map(|c| c.id.clone()),
                user_id,
            },
            Step::AddItem(l, c) => Action::AddItem {
                item: ShoppingListItem::new(
                    user_id.clone(),
                    pick(&state.lists, *l)?.id.clone(),
                    "Thing",
                    1,
                    2.0,
                    pick(&state.categories, *c)?.id.clone(),
                ),
                user_id,
            },
            Step::ToggleItem(i) => Action::ToggleItem {
                item_id: pick(&state.shopping_list_items, *i)?.id.clone(),
                at: Utc::now(),
                user_id,
            },
            Step::ClearChecked(i) => Action::ClearCheckedItems {
                list_id: pick(&state.lists, *i)?.id.clone(),
                user_id,
            },
            Step::Logout => Action::ResetForLogout {
                new_user_id: UserId::new_anonymous(),
            },
        };
        Some(action)
    }

    fn run(mut state: AppState, steps: &[Step], mut check: impl FnMut(&AppState)) -> AppState {
        let policy = Policy::default();
        for step in steps {
            if let Some(action) = action_for(&state, step) {
                if let Ok(reduction) = reduce(&state, action, &policy) {
                    state = reduction.state;
                }
            }
            check(&state);
        }
        state
    }

    /// Every mutating action, issued by `intruder` against targets in `state`
    fn foreign_actions(state: &AppState, intruder: &UserId, seed: usize) -> Vec<Action> {
        let list = pick(&state.lists, seed).cloned();
        let item = pick(&state.shopping_list_items, seed).cloned();
        let category = pick(&state.categories, seed).cloned();
        let list_id = list.as_ref().map(|l| l.id.clone()).unwrap_or_else(|| "missing".to_string());
        let item_id = item.as_ref().map(|i| i.id.clone()).unwrap_or_else(|| "missing".to_string());

        let mut renamed_list = list.unwrap_or_else(|| ShoppingList::new(state.user_id.clone(), "L", 0.0));
        renamed_list.name = "Hijacked".to_string();
        let mut edited_item = item.unwrap_or_else(|| {
            ShoppingListItem::new(state.user_id.clone(), list_id.clone(), "I", 1, 1.0, UNCATEGORIZED_ID)
        });
        edited_item.price = 999.0;
        let mut edited_category = category.unwrap_or_else(|| Category::custom(state.user_id.clone(), "C"));
        edited_category.name = "Hijacked".to_string();

        vec![
            Action::AddList { user_id: intruder.clone(), list: ShoppingList::new(intruder.clone(), "X", 0.0) },
            Action::UpdateList { user_id: intruder.clone(), list: renamed_list },
            Action::DeleteList { user_id: intruder.clone(), list_id: list_id.clone() },
            Action::SelectList { user_id: intruder.clone(), list_id: None },
            Action::AddItem {
                user_id: intruder.clone(),
                item: ShoppingListItem::new(intruder.clone(), list_id.clone(), "X", 1, 1.0, UNCATEGORIZED_ID),
            },
            Action::UpdateItem { user_id: intruder.clone(), item: edited_item },
            Action::RemoveItem { user_id: intruder.clone(), item_id: item_id.clone() },
            Action::ToggleItem { user_id: intruder.clone(), item_id, at: Utc::now() },
            Action::ClearCheckedItems { user_id: intruder.clone(), list_id },
            Action::AddCategory { user_id: intruder.clone(), category: Category::custom(intruder.clone(), "Y") },
            Action::UpdateCategory { user_id: intruder.clone(), category: edited_category.clone() },
            Action::RemoveCategory {
                user_id: intruder.clone(),
                category_id: edited_category.id,
                reassign_to: None,
            },
            Action::LoadRemoteSnapshot { user_id: intruder.clone(), data: RemoteSnapshot::default() },
        ]
    }

    proptest! {
        #[test]
        fn test_free_caps_hold_for_any_sequence(steps in proptest::collection::vec(step(), 0..60)) {
            let policy = Policy::default();
            run(state_for("u1"), &steps, |state| {
                if !state.is_premium {
                    assert!(state.owned_list_count() <= policy.max_free_lists);
                    assert!(state.owned_category_count() <= policy.max_free_categories);
                }
            });
        }

        #[test]
        fn test_uncategorized_survives_generated_sequences(
            premium in any::<bool>(),
            steps in proptest::collection::vec(step(), 0..60),
        ) {
            let mut start = state_for("u1");
            start.is_premium = premium;
            run(start, &steps, |state| {
                assert!(state.find_category(UNCATEGORIZED_ID).is_some());
            });
        }

        #[test]
        fn test_foreign_user_never_changes_state(
            steps in proptest::collection::vec(step(), 0..30),
            seed in any::<usize>(),
        ) {
            let state = run(state_for("u1"), &steps, |_| {});
            let intruder = if state.user_id == user("u2") { user("u3") } else { user("u2") };

            for action in foreign_actions(&state, &intruder, seed) {
                let name = action.name();
                let result = reduce(&state, action, &Policy::default());
                prop_assert!(
                    matches!(result, Err(Rejection::ForeignUser { .. })),
                    "{} was not rejected",
                    name
                );
            }
        }
    }
}
