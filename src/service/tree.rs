//! Menu tree assembly, scope filtering and checked-id extraction
//!
//! Everything here is pure: the services load rows, these functions shape
//! them. Trees are assembled from a parent -> children index built once per
//! call, so rendering is O(n log n) regardless of depth or breadth.

use crate::domain::{AuthTreeNode, Menu, MenuAuth, MenuMeta, MenuTreeNode, ROOT_MENU_ID};
use crate::error::{AppError, Result};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Which ids a filter lets through.
///
/// Call sites choose explicitly; an empty `Only` set lets nothing through.
#[derive(Debug, Clone, Copy)]
pub enum Allowed<'a> {
    Everything,
    Only(&'a HashSet<u64>),
}

impl Allowed<'_> {
    pub fn permits(&self, id: u64) -> bool {
        match self {
            Allowed::Everything => true,
            Allowed::Only(ids) => ids.contains(&id),
        }
    }
}

/// Sibling order: non-zero weights ascending, weight 0 after them, ties by id
pub fn sibling_order(a: &Menu, b: &Menu) -> Ordering {
    let key = |menu: &Menu| (menu.sort == 0, menu.sort, menu.id);
    key(a).cmp(&key(b))
}

struct TreeIndex<'a> {
    children: HashMap<u64, Vec<&'a Menu>>,
    auths: HashMap<u64, Vec<&'a MenuAuth>>,
    granted_menus: &'a HashSet<u64>,
    granted_auths: &'a HashSet<u64>,
    include_disabled: bool,
}

impl<'a> TreeIndex<'a> {
    fn assemble(&self, parent_id: u64) -> Vec<MenuTreeNode> {
        let Some(siblings) = self.children.get(&parent_id) else {
            return Vec::new();
        };

        siblings
            .iter()
            .filter(|menu| self.include_disabled || menu.is_enabled())
            .map(|menu| self.node(menu))
            .collect()
    }

    fn node(&self, menu: &Menu) -> MenuTreeNode {
        let auth_list = self
            .auths
            .get(&menu.id)
            .map(|auths| {
                auths
                    .iter()
                    .map(|auth| AuthTreeNode {
                        id: auth.id,
                        mark: auth.mark.clone(),
                        title: auth.title.clone(),
                        has_permission: self.granted_auths.contains(&auth.id),
                    })
                    .collect()
            })
            .unwrap_or_default();

        MenuTreeNode {
            id: menu.id,
            parent_id: menu.parent_id,
            path: menu.path.clone(),
            name: menu.name.clone(),
            component: menu.component.clone(),
            meta: MenuMeta {
                title: menu.title.clone(),
                icon: menu.icon.clone(),
                hidden: menu.hidden,
                hide_tab: menu.hide_tab,
                is_iframe: menu.is_iframe,
                keep_alive: menu.keep_alive,
                is_first_level: menu.is_first_level,
                sort: menu.sort,
                is_enabled: menu.is_enabled(),
                has_permission: self.granted_menus.contains(&menu.id),
                auth_list,
            },
            children: self.assemble(menu.id),
        }
    }
}

/// Build the nested tree rooted at `ROOT_MENU_ID`.
///
/// Menus whose parent is not part of `menus` are unreachable and left out.
/// With `include_disabled == false` a disabled menu is dropped together with
/// its whole subtree.
pub fn build_tree(
    menus: &[Menu],
    auths: &[MenuAuth],
    granted_menus: &HashSet<u64>,
    granted_auths: &HashSet<u64>,
    include_disabled: bool,
) -> Vec<MenuTreeNode> {
    let mut children: HashMap<u64, Vec<&Menu>> = HashMap::new();
    for menu in menus {
        // A self-parented row would recurse forever
        if menu.id == menu.parent_id {
            continue;
        }
        children.entry(menu.parent_id).or_default().push(menu);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| sibling_order(a, b));
    }

    let mut by_menu: HashMap<u64, Vec<&MenuAuth>> = HashMap::new();
    for auth in auths {
        by_menu.entry(auth.menu_id).or_default().push(auth);
    }
    for entries in by_menu.values_mut() {
        entries.sort_by_key(|auth| auth.id);
    }

    TreeIndex {
        children,
        auths: by_menu,
        granted_menus,
        granted_auths,
        include_disabled,
    }
    .assemble(ROOT_MENU_ID)
}

/// Restrict a flat catalog to the allowed menus and buttons.
///
/// A button survives only if its owning menu survived and `auth_scope`
/// permits it.
pub fn filter_menus(
    menus: &[Menu],
    auths: &[MenuAuth],
    menu_scope: Allowed<'_>,
    auth_scope: Allowed<'_>,
) -> (Vec<Menu>, Vec<MenuAuth>) {
    let kept_menus: Vec<Menu> = menus
        .iter()
        .filter(|menu| menu_scope.permits(menu.id))
        .cloned()
        .collect();
    let kept_ids: HashSet<u64> = kept_menus.iter().map(|menu| menu.id).collect();

    let kept_auths = auths
        .iter()
        .filter(|auth| kept_ids.contains(&auth.menu_id) && auth_scope.permits(auth.id))
        .cloned()
        .collect();

    (kept_menus, kept_auths)
}

/// Ids of `owned` that `allowed` lets through, in their original order
pub fn retain_allowed(owned: &[u64], allowed: Allowed<'_>) -> Vec<u64> {
    owned
        .iter()
        .copied()
        .filter(|id| allowed.permits(*id))
        .collect()
}

/// Insertion-ordered id set
#[derive(Default)]
struct OrderedIds {
    seen: HashSet<u64>,
    ids: Vec<u64>,
}

impl OrderedIds {
    fn insert(&mut self, id: u64) {
        if self.seen.insert(id) {
            self.ids.push(id);
        }
    }
}

fn push_checked_menus(nodes: &[MenuTreeNode], out: &mut OrderedIds) {
    for node in nodes {
        if node.meta.has_permission {
            out.insert(node.id);
        }
        push_checked_menus(&node.children, out);
    }
}

fn push_checked_auths(nodes: &[MenuTreeNode], out: &mut OrderedIds) {
    for node in nodes {
        for auth in node.meta.auth_list.iter().filter(|auth| auth.has_permission) {
            out.insert(auth.id);
        }
        push_checked_auths(&node.children, out);
    }
}

fn push_menu_ids(nodes: &[MenuTreeNode], out: &mut OrderedIds) {
    for node in nodes {
        out.insert(node.id);
        push_menu_ids(&node.children, out);
    }
}

/// Checked menu ids, pre-order, first occurrence wins
pub fn extract_checked_menu_ids(tree: &[MenuTreeNode]) -> Vec<u64> {
    let mut out = OrderedIds::default();
    push_checked_menus(tree, &mut out);
    out.ids
}

/// Checked button ids, pre-order, first occurrence wins
pub fn extract_checked_auth_ids(tree: &[MenuTreeNode]) -> Vec<u64> {
    let mut out = OrderedIds::default();
    push_checked_auths(tree, &mut out);
    out.ids
}

/// Every menu id in the tree, checked or not
pub fn collect_menu_ids(tree: &[MenuTreeNode]) -> Vec<u64> {
    let mut out = OrderedIds::default();
    push_menu_ids(tree, &mut out);
    out.ids
}

fn push_checked_placements(nodes: &[MenuTreeNode], out: &mut Vec<(u64, u64)>) {
    for node in nodes {
        for auth in node.meta.auth_list.iter().filter(|auth| auth.has_permission) {
            out.push((auth.id, node.id));
        }
        push_checked_placements(&node.children, out);
    }
}

/// Checked buttons listed under a node other than the menu owning them
pub fn misplaced_auths(tree: &[MenuTreeNode], auths: &[MenuAuth]) -> Vec<u64> {
    let owners: HashMap<u64, u64> = auths.iter().map(|auth| (auth.id, auth.menu_id)).collect();
    let mut placements = Vec::new();
    push_checked_placements(tree, &mut placements);

    let mut out = OrderedIds::default();
    for (auth_id, node_id) in placements {
        if owners.get(&auth_id) != Some(&node_id) {
            out.insert(auth_id);
        }
    }
    out.ids
}

/// Buttons of `auth_ids` whose owning menu is not in `menu_ids`
pub fn auths_outside_menus(
    auth_ids: &[u64],
    auths: &[MenuAuth],
    menu_ids: &HashSet<u64>,
) -> Vec<u64> {
    let owners: HashMap<u64, u64> = auths.iter().map(|auth| (auth.id, auth.menu_id)).collect();
    auth_ids
        .iter()
        .copied()
        .filter(|id| owners.get(id).map_or(true, |menu_id| !menu_ids.contains(menu_id)))
        .collect()
}

/// Menus of `menu_ids` whose parent is neither the root nor in `menu_ids`
pub fn menus_missing_parent(menu_ids: &[u64], menus: &[Menu]) -> Vec<u64> {
    let parents: HashMap<u64, u64> = menus.iter().map(|menu| (menu.id, menu.parent_id)).collect();
    let present = id_set(menu_ids);
    menu_ids
        .iter()
        .copied()
        .filter(|id| match parents.get(id) {
            Some(parent_id) => *parent_id != ROOT_MENU_ID && !present.contains(parent_id),
            None => false,
        })
        .collect()
}

fn find_zero_id(nodes: &[MenuTreeNode]) -> Option<&'static str> {
    for node in nodes {
        if node.id == 0 {
            return Some("menu");
        }
        if node.meta.auth_list.iter().any(|auth| auth.id == 0) {
            return Some("button permission");
        }
        if let Some(kind) = find_zero_id(&node.children) {
            return Some(kind);
        }
    }
    None
}

/// Reject submissions carrying ids no catalog row can have
pub fn validate_submitted_tree(tree: &[MenuTreeNode]) -> Result<()> {
    match find_zero_id(tree) {
        Some(kind) => Err(AppError::BadRequest(format!(
            "Submitted tree contains a {} with id 0",
            kind
        ))),
        None => Ok(()),
    }
}

pub fn id_set(ids: &[u64]) -> HashSet<u64> {
    ids.iter().copied().collect()
}
