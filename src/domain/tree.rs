//! Menu tree wire types
//!
//! The same shape is rendered to clients and re-submitted by them, so every
//! field except `id` has a serde default on input.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A menu node with its children and permission flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuTreeNode {
    pub id: u64,
    #[serde(default)]
    pub parent_id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub meta: MenuMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(no_recursion)]
    pub children: Vec<MenuTreeNode>,
}

/// Display attributes and flags of a menu node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuMeta {
    pub title: String,
    pub icon: String,
    pub hidden: bool,
    pub hide_tab: bool,
    pub is_iframe: bool,
    pub keep_alive: bool,
    pub is_first_level: bool,
    pub sort: i32,
    pub is_enabled: bool,
    pub has_permission: bool,
    pub auth_list: Vec<AuthTreeNode>,
}

/// A button permission rendered under its menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthTreeNode {
    pub id: u64,
    #[serde(default)]
    pub mark: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub has_permission: bool,
}
