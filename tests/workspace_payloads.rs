//! Wire-shape checks against captured vendor payloads: what the workspace
//! API returns must deserialize, and what we send must match the documented
//! request bodies.

use uc_steward::workspace::types::{
    ListSchemasResponse, ListTablesResponse, PermissionsChange, PermissionsList,
    ScimListResponse, UpdatePermissionsRequest,
};
use uc_steward::workspace::{GroupInfo, Privilege};

#[test]
fn schema_listing_deserializes() {
    let body = r#"{
        "schemas": [
            {
                "name": "orders",
                "catalog_name": "sales",
                "owner": "alice@corp.com",
                "full_name": "sales.orders",
                "comment": "Order facts",
                "created_at": 1718000000000,
                "metastore_id": "abc-123"
            },
            {
                "name": "default",
                "catalog_name": "sales"
            }
        ]
    }"#;
    let resp: ListSchemasResponse = serde_json::from_str(body).unwrap();
    assert_eq!(resp.schemas.len(), 2);
    assert_eq!(resp.schemas[0].full_name.as_deref(), Some("sales.orders"));
    assert_eq!(resp.schemas[1].catalog_name, "sales");
    assert!(resp.schemas[1].owner.is_none());
}

#[test]
fn table_listing_deserializes() {
    let body = r#"{
        "tables": [
            {
                "name": "orders_raw",
                "catalog_name": "sales",
                "schema_name": "core",
                "table_type": "MANAGED",
                "owner": "alice@corp.com",
                "full_name": "sales.core.orders_raw",
                "created_at": 1718000000000
            },
            {
                "name": "orders_view",
                "catalog_name": "sales",
                "schema_name": "core"
            }
        ]
    }"#;
    let resp: ListTablesResponse = serde_json::from_str(body).unwrap();
    assert_eq!(resp.tables.len(), 2);
    assert_eq!(resp.tables[0].table_type.as_deref(), Some("MANAGED"));
    assert_eq!(
        resp.tables[0].full_name.as_deref(),
        Some("sales.core.orders_raw")
    );
    assert!(resp.tables[1].table_type.is_none());
}

#[test]
fn grants_update_request_matches_vendor_body() {
    let request = UpdatePermissionsRequest {
        changes: vec![
            PermissionsChange::grant("alice@corp.com", Privilege::Select),
            PermissionsChange::revoke("data-eng", Privilege::Modify),
        ],
    };
    let v = serde_json::to_value(&request).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "changes": [
                {"principal": "alice@corp.com", "add": ["SELECT"]},
                {"principal": "data-eng", "remove": ["MODIFY"]}
            ]
        })
    );
}

#[test]
fn permissions_response_round_trips_known_privileges() {
    let body = r#"{
        "privilege_assignments": [
            {"principal": "admins", "privileges": ["ALL_PRIVILEGES"]},
            {"principal": "alice@corp.com", "privileges": ["USE_CATALOG", "USE_SCHEMA", "SELECT"]}
        ]
    }"#;
    let perms: PermissionsList = serde_json::from_str(body).unwrap();
    assert_eq!(perms.privilege_assignments[0].privileges, vec![Privilege::AllPrivileges]);
    assert_eq!(perms.privilege_assignments[1].privileges.len(), 3);

    let round = serde_json::to_value(&perms).unwrap();
    assert_eq!(round["privilege_assignments"][1]["privileges"][2], "SELECT");
}

#[test]
fn scim_groups_deserialize() {
    let body = r#"{
        "totalResults": 2,
        "Resources": [
            {"displayName": "data-eng", "id": "100"},
            {"displayName": "marketing"}
        ]
    }"#;
    let resp: ScimListResponse<GroupInfo> = serde_json::from_str(body).unwrap();
    assert_eq!(resp.resources.len(), 2);
    assert_eq!(resp.resources[0].display_name, "data-eng");
    assert_eq!(resp.resources[0].id.as_deref(), Some("100"));
    assert!(resp.resources[1].id.is_none());
}

#[test]
fn empty_scim_listing_deserializes() {
    let resp: ScimListResponse<GroupInfo> = serde_json::from_str(r#"{"totalResults": 0}"#).unwrap();
    assert!(resp.resources.is_empty());
}
