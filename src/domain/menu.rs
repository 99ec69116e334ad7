//! Menu catalog domain models (menus and their button permissions)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Parent id used by top-level menus
pub const ROOT_MENU_ID: u64 = 0;

/// Menu status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MenuStatus {
    #[default]
    Enabled,
    Disabled,
}

impl MenuStatus {
    pub fn is_enabled(&self) -> bool {
        *self == MenuStatus::Enabled
    }
}

impl std::str::FromStr for MenuStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" => Ok(MenuStatus::Enabled),
            "disabled" => Ok(MenuStatus::Disabled),
            _ => Err(format!("Unknown menu status: {}", s)),
        }
    }
}

impl std::fmt::Display for MenuStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuStatus::Enabled => write!(f, "enabled"),
            MenuStatus::Disabled => write!(f, "disabled"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for MenuStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for MenuStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for MenuStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        let s = match self {
            MenuStatus::Enabled => "enabled",
            MenuStatus::Disabled => "disabled",
        };
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s, buf)
    }
}

/// Navigation entry of the shared menu catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Menu {
    pub id: u64,
    /// `ROOT_MENU_ID` for top-level menus
    pub parent_id: u64,
    pub path: String,
    pub name: String,
    pub component: String,
    pub title: String,
    pub icon: String,
    pub hidden: bool,
    pub hide_tab: bool,
    pub is_iframe: bool,
    pub keep_alive: bool,
    /// Render as a first-level entry inside the layout container
    pub is_first_level: bool,
    pub status: MenuStatus,
    /// Sibling weight; 0 means "unweighted" and sorts last
    pub sort: i32,
    pub updated_at: DateTime<Utc>,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            id: 0,
            parent_id: ROOT_MENU_ID,
            path: String::new(),
            name: String::new(),
            component: String::new(),
            title: String::new(),
            icon: String::new(),
            hidden: false,
            hide_tab: false,
            is_iframe: false,
            keep_alive: false,
            is_first_level: false,
            status: MenuStatus::Enabled,
            sort: 0,
            updated_at: Utc::now(),
        }
    }
}

impl Menu {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_MENU_ID
    }

    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }
}

/// Button-level permission attached to exactly one menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MenuAuth {
    pub id: u64,
    pub menu_id: u64,
    /// Machine-readable action tag (e.g. "user:add")
    pub mark: String,
    pub title: String,
}

/// Input for creating a menu
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMenuInput {
    #[serde(default)]
    pub parent_id: u64,
    #[validate(length(min = 1, max = 128))]
    pub path: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub component: String,
    #[validate(length(min = 1, max = 128))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub icon: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub hide_tab: bool,
    #[serde(default)]
    pub is_iframe: bool,
    #[serde(default)]
    pub keep_alive: bool,
    #[serde(default)]
    pub is_first_level: bool,
    #[serde(default)]
    pub status: MenuStatus,
    #[serde(default)]
    pub sort: i32,
}

/// Input for updating a menu; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuInput {
    pub parent_id: Option<u64>,
    #[validate(length(min = 1, max = 128))]
    pub path: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub component: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub title: Option<String>,
    #[validate(length(max = 128))]
    pub icon: Option<String>,
    pub hidden: Option<bool>,
    pub hide_tab: Option<bool>,
    pub is_iframe: Option<bool>,
    pub keep_alive: Option<bool>,
    pub is_first_level: Option<bool>,
    pub status: Option<MenuStatus>,
    pub sort: Option<i32>,
}

impl UpdateMenuInput {
    /// Merge the update onto an existing menu
    pub fn apply_to(&self, existing: &Menu) -> Menu {
        Menu {
            id: existing.id,
            parent_id: self.parent_id.unwrap_or(existing.parent_id),
            path: self.path.clone().unwrap_or_else(|| existing.path.clone()),
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            component: self
                .component
                .clone()
                .unwrap_or_else(|| existing.component.clone()),
            title: self.title.clone().unwrap_or_else(|| existing.title.clone()),
            icon: self.icon.clone().unwrap_or_else(|| existing.icon.clone()),
            hidden: self.hidden.unwrap_or(existing.hidden),
            hide_tab: self.hide_tab.unwrap_or(existing.hide_tab),
            is_iframe: self.is_iframe.unwrap_or(existing.is_iframe),
            keep_alive: self.keep_alive.unwrap_or(existing.keep_alive),
            is_first_level: self.is_first_level.unwrap_or(existing.is_first_level),
            status: self.status.unwrap_or(existing.status),
            sort: self.sort.unwrap_or(existing.sort),
            updated_at: existing.updated_at,
        }
    }
}

/// Input for creating a button permission
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMenuAuthInput {
    pub menu_id: u64,
    #[validate(length(min = 1, max = 100), custom(function = "validate_auth_mark"))]
    pub mark: String,
    #[validate(length(min = 1, max = 128))]
    pub title: String,
}

/// Input for updating a button permission
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuAuthInput {
    #[validate(length(min = 1, max = 100), custom(function = "validate_auth_mark"))]
    pub mark: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub title: Option<String>,
}

/// Validate auth mark format (e.g., "add", "user:add", "report:export_pdf")
fn validate_auth_mark(mark: &str) -> Result<(), validator::ValidationError> {
    if AUTH_MARK_REGEX.is_match(mark) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_auth_mark"))
    }
}

lazy_static::lazy_static! {
    pub static ref AUTH_MARK_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9_]*(?::[a-z][a-z0-9_]*)*$").unwrap();
}
