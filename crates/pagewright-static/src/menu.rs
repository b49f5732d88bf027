//! Menu aggregation from page variables and config directives.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::collection::PageCollection;
use crate::config::MenuEntryConfig;
use crate::page::{permalink_to_url, Value};

/// Weight of entries that do not state one.
pub const DEFAULT_MENU_WEIGHT: i64 = 0;

/// Menu memberships declared by a page's `menu` variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuSpec {
    /// `menu: main`
    Single(String),
    /// `menu: {main: {weight: 5}, footer: {}}`
    Multiple(BTreeMap<String, Option<i64>>),
}

impl MenuSpec {
    /// Read a `menu` variable. A list of names is a multiple membership
    /// without weights; anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) if !name.trim().is_empty() => {
                Some(Self::Single(name.trim().to_string()))
            }
            Value::Map(menus) if !menus.is_empty() => Some(Self::Multiple(
                menus
                    .iter()
                    .map(|(name, options)| {
                        let weight = options
                            .as_map()
                            .and_then(|o| o.get("weight"))
                            .and_then(Value::as_i64);
                        (name.clone(), weight)
                    })
                    .collect(),
            )),
            Value::List(names) => {
                let menus: BTreeMap<_, _> = names
                    .iter()
                    .filter_map(Value::to_text)
                    .map(|name| (name, None))
                    .collect();
                (!menus.is_empty()).then_some(Self::Multiple(menus))
            }
            _ => None,
        }
    }

    /// `(menu name, weight)` pairs.
    pub fn memberships(&self) -> Vec<(&str, i64)> {
        match self {
            Self::Single(name) => vec![(name.as_str(), DEFAULT_MENU_WEIGHT)],
            Self::Multiple(menus) => menus
                .iter()
                .map(|(name, weight)| (name.as_str(), weight.unwrap_or(DEFAULT_MENU_WEIGHT)))
                .collect(),
        }
    }
}

/// One rendered menu link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub id: String,
    pub name: String,
    pub url: String,
    pub weight: i64,
}

/// Menus by name, each sorted by weight.
pub type Menus = BTreeMap<String, Vec<MenuEntry>>;

/// Build every menu from the final pages, then apply config directives.
///
/// Directives add entries, override fields of an entry with the same id, or
/// remove it when `disabled` is set. Entries with equal weight keep page order.
pub fn collect_menus(
    pages: &PageCollection,
    directives: &BTreeMap<String, Vec<MenuEntryConfig>>,
) -> Menus {
    let mut menus = Menus::new();

    for page in pages {
        let Some(spec) = page.menu() else {
            continue;
        };
        for (menu, weight) in spec.memberships() {
            menus.entry(menu.to_string()).or_default().push(MenuEntry {
                id: page.id().to_string(),
                name: page.title().to_string(),
                url: page.url(),
                weight,
            });
        }
    }

    for (menu, entries) in directives {
        let items = menus.entry(menu.clone()).or_default();
        for directive in entries {
            apply_directive(items, directive);
        }
    }

    menus.retain(|_, items| !items.is_empty());
    for items in menus.values_mut() {
        items.sort_by_key(|entry| entry.weight);
    }

    menus
}

fn apply_directive(items: &mut Vec<MenuEntry>, directive: &MenuEntryConfig) {
    if directive.disabled {
        items.retain(|entry| entry.id != directive.id);
        return;
    }

    if let Some(entry) = items.iter_mut().find(|entry| entry.id == directive.id) {
        if let Some(name) = &directive.name {
            entry.name = name.clone();
        }
        if let Some(url) = &directive.url {
            entry.url = url.clone();
        }
        if let Some(weight) = directive.weight {
            entry.weight = weight;
        }
        return;
    }

    items.push(MenuEntry {
        id: directive.id.clone(),
        name: directive.name.clone().unwrap_or_else(|| directive.id.clone()),
        url: directive
            .url
            .clone()
            .unwrap_or_else(|| permalink_to_url(&directive.id)),
        weight: directive.weight.unwrap_or(DEFAULT_MENU_WEIGHT),
    });
}
