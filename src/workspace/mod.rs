pub mod client;
pub mod types;

pub use client::WorkspaceClient;
pub use types::{
    CatalogInfo, GroupInfo, PermissionsChange, PermissionsList, PrivilegeAssignment, Privilege,
    SchemaInfo, SecurableType, TableInfo, UserInfo,
};
