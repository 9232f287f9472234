use serde::{Deserialize, Serialize};

/// A privilege on a Unity Catalog securable, in the vendor's wire spelling.
/// Deserialization never fails: privileges this build does not know map to
/// `Unknown`, so a listing is still rendered when the vendor adds new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privilege {
    AllPrivileges,
    Select,
    Modify,
    UseCatalog,
    UseSchema,
    CreateSchema,
    CreateTable,
    CreateFunction,
    CreateVolume,
    ReadVolume,
    WriteVolume,
    Execute,
    Browse,
    Unknown,
}

impl<'de> Deserialize<'de> for Privilege {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(Self::Unknown))
    }
}

impl std::fmt::Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AllPrivileges => "ALL_PRIVILEGES",
            Self::Select => "SELECT",
            Self::Modify => "MODIFY",
            Self::UseCatalog => "USE_CATALOG",
            Self::UseSchema => "USE_SCHEMA",
            Self::CreateSchema => "CREATE_SCHEMA",
            Self::CreateTable => "CREATE_TABLE",
            Self::CreateFunction => "CREATE_FUNCTION",
            Self::CreateVolume => "CREATE_VOLUME",
            Self::ReadVolume => "READ_VOLUME",
            Self::WriteVolume => "WRITE_VOLUME",
            Self::Execute => "EXECUTE",
            Self::Browse => "BROWSE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Privilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL_PRIVILEGES" | "ALL PRIVILEGES" => Ok(Self::AllPrivileges),
            "SELECT" => Ok(Self::Select),
            "MODIFY" => Ok(Self::Modify),
            "USE_CATALOG" | "USE CATALOG" => Ok(Self::UseCatalog),
            "USE_SCHEMA" | "USE SCHEMA" => Ok(Self::UseSchema),
            "CREATE_SCHEMA" => Ok(Self::CreateSchema),
            "CREATE_TABLE" => Ok(Self::CreateTable),
            "CREATE_FUNCTION" => Ok(Self::CreateFunction),
            "CREATE_VOLUME" => Ok(Self::CreateVolume),
            "READ_VOLUME" => Ok(Self::ReadVolume),
            "WRITE_VOLUME" => Ok(Self::WriteVolume),
            "EXECUTE" => Ok(Self::Execute),
            "BROWSE" => Ok(Self::Browse),
            other => Err(format!("unknown privilege '{other}'")),
        }
    }
}

/// The kind of securable a permission applies to. Lowercase on the wire
/// (it is a URL path segment in the permissions API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurableType {
    Catalog,
    Schema,
    Table,
}

impl std::fmt::Display for SecurableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Schema => write!(f, "schema"),
            Self::Table => write!(f, "table"),
        }
    }
}

impl std::str::FromStr for SecurableType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "catalog" => Ok(Self::Catalog),
            "schema" => Ok(Self::Schema),
            "table" => Ok(Self::Table),
            other => Err(format!("unknown securable type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    /// Epoch millis, as the vendor reports it.
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    pub catalog_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub full_name: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub catalog_name: String,
    pub schema_name: String,
    #[serde(default)]
    pub table_type: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ListTablesResponse {
    #[serde(default)]
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ListCatalogsResponse {
    #[serde(default)]
    pub catalogs: Vec<CatalogInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ListSchemasResponse {
    #[serde(default)]
    pub schemas: Vec<SchemaInfo>,
}

#[derive(Debug, Serialize)]
pub struct CreateCatalogRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSchemaRequest {
    pub name: String,
    pub catalog_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// -- SCIM principals --

#[derive(Debug, Deserialize)]
pub struct ScimListResponse<T> {
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub id: Option<String>,
}

// -- Permissions --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivilegeAssignment {
    pub principal: String,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsList {
    #[serde(default)]
    pub privilege_assignments: Vec<PrivilegeAssignment>,
}

/// One grant or revoke for a principal. The permissions API takes both in
/// the same PATCH body; an empty list is omitted from the wire payload.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionsChange {
    pub principal: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<Privilege>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<Privilege>,
}

impl PermissionsChange {
    pub fn grant(principal: impl Into<String>, privilege: Privilege) -> Self {
        Self {
            principal: principal.into(),
            add: vec![privilege],
            remove: Vec::new(),
        }
    }

    pub fn revoke(principal: impl Into<String>, privilege: Privilege) -> Self {
        Self {
            principal: principal.into(),
            add: Vec::new(),
            remove: vec![privilege],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdatePermissionsRequest {
    pub changes: Vec<PermissionsChange>,
}
