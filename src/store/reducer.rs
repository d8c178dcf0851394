//! Reducer
//!
//! Pure transition function `(state, action) -> state'`. Side effects are
//! returned as [`Effect`] values for the effect runner; a [`Rejection`]
//! means the caller keeps its current state.

use thiserror::Error;

use crate::domain::{
    merge_with_defaults, Category, DomainError, Entity, ShoppingListItem, UserId, UNCATEGORIZED_ID,
};

use super::action::{Action, RemoteSnapshot};
use super::state::{resolve_selection, AppState, Policy, Snapshot};

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the new state under its user's key
    Persist,
    /// Delete the stored snapshot of a user
    Evict(UserId),
    /// Point the next cold start at this user
    RememberUser(UserId),
}

/// Result of an accepted action
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

/// Why an action was dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("no acting user")]
    MissingUser,
    #[error("action from {acting} while {current} is active")]
    ForeignUser { acting: UserId, current: UserId },
    #[error("{0} is not owned by the acting user")]
    NotOwner(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{0} already exists")]
    DuplicateId(String),
    #[error("free plan is limited to {0} lists")]
    ListLimit(usize),
    #[error("free plan is limited to {0} custom categories")]
    CategoryLimit(usize),
    #[error("a category named {0:?} already exists")]
    DuplicateCategoryName(String),
    #[error("category {0} cannot be removed")]
    ProtectedCategory(String),
    #[error("category {0} is not available")]
    UnknownCategory(String),
    #[error("list {0} is not available")]
    UnknownList(String),
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

type Outcome = Result<Reduction, Rejection>;

/// Apply `action` to `state`
pub fn reduce(state: &AppState, action: Action, policy: &Policy) -> Outcome {
    let persists = action.persists();
    let next_state = match action {
        Action::LoadSnapshot { user_id, snapshot } => load_snapshot(state, user_id, snapshot),
        Action::LoadRemoteSnapshot { user_id, data } => load_remote_snapshot(state, user_id, data),
        Action::SetUserContext { user_id, is_premium } => set_user_context(state, user_id, is_premium),
        Action::SetLoading(is_loading) => Ok(AppState {
            is_loading,
            ..state.clone()
        }),

        Action::AddList { user_id, list } => {
            check_actor(state, &user_id)?;
            owned_payload(&list.user_id, &user_id, &list.id)?;
            list.validate()?;
            if state.find_list(&list.id).is_some() {
                return Err(Rejection::DuplicateId(list.id));
            }
            let owned_before = state.owned_list_count();
            if !state.is_premium && owned_before >= policy.max_free_lists {
                return Err(Rejection::ListLimit(policy.max_free_lists));
            }
            require_category(state, &list.default_category)?;

            let mut next = state.clone();
            if owned_before == 0 || next.selected_list_id.is_none() {
                next.selected_list_id = Some(list.id.clone());
            }
            next.lists.push(list);
            Ok(next)
        }

        Action::UpdateList { user_id, list } => {
            check_actor(state, &user_id)?;
            let index = owned_list_index(state, &list.id, &user_id)?;
            owned_payload(&list.user_id, &user_id, &list.id)?;
            list.validate()?;
            require_category(state, &list.default_category)?;

            let mut next = state.clone();
            next.lists[index] = list;
            Ok(next)
        }

        Action::DeleteList { user_id, list_id } => {
            check_actor(state, &user_id)?;
            let index = owned_list_index(state, &list_id, &user_id)?;

            let mut next = state.clone();
            next.lists.remove(index);
            next.shopping_list_items
                .retain(|i| !(i.list_id == list_id && i.user_id == user_id));
            if next.selected_list_id.as_deref() == Some(list_id.as_str()) {
                next.selected_list_id = resolve_selection(&next.lists, &user_id, None);
            }
            Ok(next)
        }

        Action::SelectList { user_id, list_id } => {
            check_actor(state, &user_id)?;
            if let Some(id) = &list_id {
                owned_list_index(state, id, &user_id)?;
            }
            Ok(AppState {
                selected_list_id: list_id,
                ..state.clone()
            })
        }

        Action::AddItem { user_id, item } => {
            check_actor(state, &user_id)?;
            owned_payload(&item.user_id, &user_id, &item.id)?;
            check_item(state, &item)?;
            if state.find_item(&item.id).is_some() {
                return Err(Rejection::DuplicateId(item.id));
            }

            let mut next = state.clone();
            next.shopping_list_items.push(item);
            Ok(next)
        }

        Action::UpdateItem { user_id, item } => {
            check_actor(state, &user_id)?;
            let index = owned_item_index(state, &item.id, &user_id)?;
            owned_payload(&item.user_id, &user_id, &item.id)?;
            check_item(state, &item)?;

            let mut next = state.clone();
            next.shopping_list_items[index] = item;
            Ok(next)
        }

        Action::RemoveItem { user_id, item_id } => {
            check_actor(state, &user_id)?;
            let index = owned_item_index(state, &item_id, &user_id)?;

            let mut next = state.clone();
            next.shopping_list_items.remove(index);
            Ok(next)
        }

        Action::ToggleItem { user_id, item_id, at } => {
            check_actor(state, &user_id)?;
            let index = owned_item_index(state, &item_id, &user_id)?;

            let mut next = state.clone();
            let item = &mut next.shopping_list_items[index];
            item.checked = !item.checked;
            item.date_added = at;
            Ok(next)
        }

        Action::ClearCheckedItems { user_id, list_id } => {
            check_actor(state, &user_id)?;
            owned_list_index(state, &list_id, &user_id)?;

            let mut next = state.clone();
            next.shopping_list_items
                .retain(|i| !(i.list_id == list_id && i.user_id == user_id && i.checked));
            Ok(next)
        }

        Action::AddCategory { user_id, category } => {
            check_actor(state, &user_id)?;
            owned_payload_opt(category.user_id.as_ref(), &user_id, &category.id)?;
            category.validate()?;
            if state.find_category(&category.id).is_some() {
                return Err(Rejection::DuplicateId(category.id));
            }
            check_unique_name(state, &category, &user_id)?;
            if !state.is_premium && state.owned_category_count() >= policy.max_free_categories {
                return Err(Rejection::CategoryLimit(policy.max_free_categories));
            }

            let mut next = state.clone();
            next.categories.push(category);
            Ok(next)
        }

        Action::UpdateCategory { user_id, category } => {
            check_actor(state, &user_id)?;
            let index = editable_category_index(state, &category.id, &user_id, policy)?;
            if category.user_id != state.categories[index].user_id {
                return Err(Rejection::NotOwner(category.id));
            }
            category.validate()?;
            check_unique_name(state, &category, &user_id)?;

            let mut next = state.clone();
            next.categories[index] = category;
            Ok(next)
        }

        Action::RemoveCategory { user_id, category_id, reassign_to } => {
            check_actor(state, &user_id)?;
            if category_id == UNCATEGORIZED_ID {
                return Err(Rejection::ProtectedCategory(category_id));
            }
            let index = editable_category_index(state, &category_id, &user_id, policy)?;

            let target = reassign_to
                .filter(|id| *id != category_id)
                .filter(|id| {
                    state
                        .find_category(id)
                        .is_some_and(|c| c.is_visible_to(&user_id))
                })
                .unwrap_or_else(|| UNCATEGORIZED_ID.to_string());

            let mut next = state.clone();
            next.categories.remove(index);
            for item in next
                .shopping_list_items
                .iter_mut()
                .filter(|i| i.category == category_id && i.user_id == user_id)
            {
                item.category = target.clone();
            }
            for list in next
                .lists
                .iter_mut()
                .filter(|l| l.default_category == category_id && l.user_id == user_id)
            {
                list.default_category = target.clone();
            }
            Ok(next)
        }

        Action::SetCurrency(currency) => Ok(AppState {
            currency,
            ..state.clone()
        }),

        Action::SetTheme(theme) => Ok(AppState {
            theme,
            ..state.clone()
        }),

        Action::ResetForLogout { new_user_id } => {
            if !new_user_id.is_anonymous() {
                return Err(Rejection::Invalid(DomainError::InvalidInput(format!(
                    "logout must switch to an anonymous identity, got {}",
                    new_user_id
                ))));
            }
            let next = AppState::fresh(new_user_id.clone(), state.currency.clone(), state.theme.clone());

            let mut effects = Vec::new();
            if state.user_id.is_authenticated() {
                effects.push(Effect::Evict(state.user_id.clone()));
            }
            effects.push(Effect::Persist);
            effects.push(Effect::RememberUser(new_user_id));
            return Ok(Reduction { state: next, effects });
        }
    }?;

    let effects = if persists { vec![Effect::Persist] } else { Vec::new() };
    Ok(Reduction {
        state: next_state,
        effects,
    })
}

fn load_snapshot(state: &AppState, user_id: UserId, snapshot: Snapshot) -> Result<AppState, Rejection> {
    if user_id.is_absent() {
        return Err(Rejection::MissingUser);
    }

    let lists: Vec<_> = snapshot
        .lists
        .into_iter()
        .filter(|l| l.user_id == user_id)
        .collect();
    let items = snapshot
        .shopping_list_items
        .into_iter()
        .filter(|i| i.user_id == user_id)
        .collect();
    let visible: Vec<Category> = snapshot
        .categories
        .into_iter()
        .filter(|c| c.is_visible_to(&user_id))
        .collect();
    let selected_list_id = resolve_selection(&lists, &user_id, snapshot.selected_list_id.as_deref());

    Ok(AppState {
        is_premium: snapshot.is_premium && user_id.is_authenticated(),
        user_id,
        currency: snapshot.currency.unwrap_or_default(),
        theme: snapshot.theme.unwrap_or_default(),
        categories: merge_with_defaults(&visible),
        lists,
        selected_list_id,
        shopping_list_items: items,
        is_loading: state.is_loading,
    })
}

fn load_remote_snapshot(state: &AppState, user_id: UserId, data: RemoteSnapshot) -> Result<AppState, Rejection> {
    check_actor(state, &user_id)?;

    let lists: Vec<_> = data.lists.into_iter().filter(|l| l.user_id == user_id).collect();
    let items = data
        .items
        .into_iter()
        .filter(|i| i.user_id == user_id && lists.iter().any(|l| l.id == i.list_id))
        .collect();
    let visible: Vec<Category> = data
        .categories
        .into_iter()
        .filter(|c| c.is_visible_to(&user_id))
        .collect();
    let selected_list_id = resolve_selection(&lists, &user_id, state.selected_list_id.as_deref());

    Ok(AppState {
        currency: data.preferences.currency.unwrap_or_else(|| state.currency.clone()),
        is_premium: data.preferences.is_premium.unwrap_or(state.is_premium),
        categories: merge_with_defaults(&visible),
        lists,
        selected_list_id,
        shopping_list_items: items,
        is_loading: false,
        ..state.clone()
    })
}

fn set_user_context(state: &AppState, user_id: UserId, is_premium: bool) -> Result<AppState, Rejection> {
    if user_id.is_absent() {
        return Err(Rejection::MissingUser);
    }
    let is_premium = is_premium && user_id.is_authenticated();

    if user_id == state.user_id {
        return Ok(AppState {
            is_premium,
            ..state.clone()
        });
    }

    Ok(AppState {
        is_loading: user_id.is_authenticated(),
        user_id,
        is_premium,
        lists: Vec::new(),
        selected_list_id: None,
        shopping_list_items: Vec::new(),
        categories: Category::defaults(),
        ..state.clone()
    })
}

fn check_actor(state: &AppState, acting: &UserId) -> Result<(), Rejection> {
    if acting.is_absent() {
        return Err(Rejection::MissingUser);
    }
    if *acting != state.user_id {
        return Err(Rejection::ForeignUser {
            acting: acting.clone(),
            current: state.user_id.clone(),
        });
    }
    Ok(())
}

fn owned_payload(owner: &UserId, acting: &UserId, id: &str) -> Result<(), Rejection> {
    owned_payload_opt(Some(owner), acting, id)
}

fn owned_payload_opt(owner: Option<&UserId>, acting: &UserId, id: &str) -> Result<(), Rejection> {
    if owner != Some(acting) {
        return Err(Rejection::NotOwner(id.to_string()));
    }
    Ok(())
}

fn owned_list_index(state: &AppState, list_id: &str, acting: &UserId) -> Result<usize, Rejection> {
    let index = state
        .lists
        .iter()
        .position(|l| l.id == list_id)
        .ok_or_else(|| Rejection::NotFound {
            kind: "list",
            id: list_id.to_string(),
        })?;
    if !state.lists[index].is_owned_by(acting) {
        return Err(Rejection::NotOwner(list_id.to_string()));
    }
    Ok(index)
}

fn owned_item_index(state: &AppState, item_id: &str, acting: &UserId) -> Result<usize, Rejection> {
    let index = state
        .shopping_list_items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| Rejection::NotFound {
            kind: "item",
            id: item_id.to_string(),
        })?;
    if !state.shopping_list_items[index].is_owned_by(acting) {
        return Err(Rejection::NotOwner(item_id.to_string()));
    }
    Ok(index)
}

fn require_category(state: &AppState, category_id: &str) -> Result<(), Rejection> {
    match state.find_category(category_id) {
        Some(category) if category.is_visible_to(&state.user_id) => Ok(()),
        _ => Err(Rejection::UnknownCategory(category_id.to_string())),
    }
}

fn check_item(state: &AppState, item: &ShoppingListItem) -> Result<(), Rejection> {
    item.validate()?;
    match state.find_list(&item.list_id) {
        Some(list) if list.user_id == item.user_id => {}
        _ => return Err(Rejection::UnknownList(item.list_id.clone())),
    }
    require_category(state, &item.category)
}

/// Names are unique among the categories the user can see
fn check_unique_name(state: &AppState, category: &Category, acting: &UserId) -> Result<(), Rejection> {
    let wanted = category.name.trim().to_lowercase();
    let taken = state.categories.iter().any(|c| {
        c.id != category.id && c.is_visible_to(acting) && c.name.trim().to_lowercase() == wanted
    });
    if taken {
        return Err(Rejection::DuplicateCategoryName(category.name.clone()));
    }
    Ok(())
}

/// Own categories are editable; global ones only by premium users when
/// the policy allows it.
fn editable_category_index(
    state: &AppState,
    category_id: &str,
    acting: &UserId,
    policy: &Policy,
) -> Result<usize, Rejection> {
    let index = state
        .categories
        .iter()
        .position(|c| c.id == category_id)
        .ok_or_else(|| Rejection::NotFound {
            kind: "category",
            id: category_id.to_string(),
        })?;
    let category = &state.categories[index];
    let allowed = category.is_owned_by(acting)
        || (category.is_global() && state.is_premium && policy.premium_edits_global_categories);
    if !allowed {
        return Err(Rejection::NotOwner(category_id.to_string()));
    }
    Ok(index)
}
