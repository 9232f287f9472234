//! Tools the chat agent can call against the workspace.
//!
//! Each tool is a thin wrapper over one `WorkspaceClient` operation. Dispatch
//! returns `(result_text, is_error)` so failures flow back to the model as
//! tool results instead of ending the session.

use crate::llm::ToolDef;
use crate::workspace::{
    CatalogInfo, GroupInfo, PermissionsChange, PermissionsList, Privilege, SchemaInfo,
    SecurableType, TableInfo, UserInfo, WorkspaceClient,
};
use chrono::DateTime;
use serde_json::{Value, json};
use std::str::FromStr;
use tracing::debug;

/// Max chars returned from any single tool invocation.
const MAX_RESULT_CHARS: usize = 5000;

/// Build the tool definitions sent to the LLM.
pub fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "list_catalogs".into(),
            description: "List all catalogs in the metastore with owner and creation date."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: "create_catalog".into(),
            description: "Create a new catalog. Only call this when the user explicitly asks \
                          for a catalog to be created."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Catalog name."
                    },
                    "comment": {
                        "type": "string",
                        "description": "Optional description of the catalog's purpose."
                    }
                },
                "required": ["name"]
            }),
        },
        ToolDef {
            name: "list_schemas".into(),
            description: "List the schemas inside a catalog.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "catalog": {
                        "type": "string",
                        "description": "Name of the catalog to list schemas for."
                    }
                },
                "required": ["catalog"]
            }),
        },
        ToolDef {
            name: "list_tables".into(),
            description: "List the tables inside a schema. Use to resolve a table name before \
                          granting on a table."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "catalog": {
                        "type": "string",
                        "description": "Catalog the schema belongs to."
                    },
                    "schema": {
                        "type": "string",
                        "description": "Schema to list tables for."
                    }
                },
                "required": ["catalog", "schema"]
            }),
        },
        ToolDef {
            name: "create_schema".into(),
            description: "Create a new schema inside an existing catalog. Only call this when \
                          the user explicitly asks for a schema to be created."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "catalog": {
                        "type": "string",
                        "description": "Catalog to create the schema in."
                    },
                    "name": {
                        "type": "string",
                        "description": "Schema name."
                    },
                    "comment": {
                        "type": "string",
                        "description": "Optional description of the schema's purpose."
                    }
                },
                "required": ["catalog", "name"]
            }),
        },
        ToolDef {
            name: "list_principals".into(),
            description: "List workspace users and groups. Use to resolve a person or team \
                          name to the principal a grant should target."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: "get_grants".into(),
            description: "Show the current permission assignments on a catalog, schema, or \
                          table."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "securable_type": {
                        "type": "string",
                        "enum": ["catalog", "schema", "table"],
                        "description": "Kind of object."
                    },
                    "full_name": {
                        "type": "string",
                        "description": "Full object name, e.g. 'sales' or 'sales.orders'."
                    }
                },
                "required": ["securable_type", "full_name"]
            }),
        },
        ToolDef {
            name: "grant_privilege".into(),
            description: "Grant a privilege (e.g. SELECT, MODIFY, USE_CATALOG) on a catalog, \
                          schema, or table to a user or group."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "principal": {
                        "type": "string",
                        "description": "User email or group name receiving the privilege."
                    },
                    "privilege": {
                        "type": "string",
                        "description": "Privilege name, e.g. SELECT, MODIFY, USE_CATALOG, ALL_PRIVILEGES."
                    },
                    "securable_type": {
                        "type": "string",
                        "enum": ["catalog", "schema", "table"],
                        "description": "Kind of object."
                    },
                    "full_name": {
                        "type": "string",
                        "description": "Full object name, e.g. 'sales' or 'sales.orders'."
                    }
                },
                "required": ["principal", "privilege", "securable_type", "full_name"]
            }),
        },
        ToolDef {
            name: "revoke_privilege".into(),
            description: "Revoke a privilege from a user or group on a catalog, schema, or \
                          table."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "principal": {
                        "type": "string",
                        "description": "User email or group name losing the privilege."
                    },
                    "privilege": {
                        "type": "string",
                        "description": "Privilege name, e.g. SELECT, MODIFY, USE_CATALOG."
                    },
                    "securable_type": {
                        "type": "string",
                        "enum": ["catalog", "schema", "table"],
                        "description": "Kind of object."
                    },
                    "full_name": {
                        "type": "string",
                        "description": "Full object name."
                    }
                },
                "required": ["principal", "privilege", "securable_type", "full_name"]
            }),
        },
    ]
}

/// Dispatch a tool call by name. Returns `(result_text, is_error)`.
pub async fn dispatch(client: &WorkspaceClient, tool_name: &str, input: &Value) -> (String, bool) {
    debug!(tool = %tool_name, "executing tool");
    match tool_name {
        "list_catalogs" => run_list_catalogs(client).await,
        "create_catalog" => run_create_catalog(client, input).await,
        "list_schemas" => run_list_schemas(client, input).await,
        "list_tables" => run_list_tables(client, input).await,
        "create_schema" => run_create_schema(client, input).await,
        "list_principals" => run_list_principals(client).await,
        "get_grants" => run_get_grants(client, input).await,
        "grant_privilege" => run_change_grants(client, input, true).await,
        "revoke_privilege" => run_change_grants(client, input, false).await,
        _ => (format!("Unknown tool: {tool_name}"), true),
    }
}

fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, String> {
    input[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing '{key}' parameter"))
}

fn parse_securable(input: &Value) -> Result<(SecurableType, &str), String> {
    let securable_type = SecurableType::from_str(required_str(input, "securable_type")?)?;
    let full_name = required_str(input, "full_name")?;
    Ok((securable_type, full_name))
}

fn truncate(s: String) -> String {
    if s.len() <= MAX_RESULT_CHARS {
        return s;
    }
    let mut end = MAX_RESULT_CHARS;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = s[..end].to_string();
    out.push_str("\n... [truncated]");
    out
}

async fn run_list_catalogs(client: &WorkspaceClient) -> (String, bool) {
    match client.list_catalogs().await {
        Ok(catalogs) => (truncate(render_catalogs(&catalogs)), false),
        Err(e) => (e.to_string(), true),
    }
}

async fn run_create_catalog(client: &WorkspaceClient, input: &Value) -> (String, bool) {
    let name = match required_str(input, "name") {
        Ok(n) => n,
        Err(e) => return (e, true),
    };
    let comment = input["comment"].as_str();
    match client.create_catalog(name, comment).await {
        Ok(catalog) => (format!("Created catalog '{}'", catalog.name), false),
        Err(e) => (e.to_string(), true),
    }
}

async fn run_list_schemas(client: &WorkspaceClient, input: &Value) -> (String, bool) {
    let catalog = match required_str(input, "catalog") {
        Ok(c) => c,
        Err(e) => return (e, true),
    };
    match client.list_schemas(catalog).await {
        Ok(schemas) => (truncate(render_schemas(catalog, &schemas)), false),
        Err(e) => (e.to_string(), true),
    }
}

async fn run_list_tables(client: &WorkspaceClient, input: &Value) -> (String, bool) {
    let (catalog, schema) = match (required_str(input, "catalog"), required_str(input, "schema")) {
        (Ok(c), Ok(s)) => (c, s),
        (Err(e), _) | (_, Err(e)) => return (e, true),
    };
    match client.list_tables(catalog, schema).await {
        Ok(tables) => (truncate(render_tables(catalog, schema, &tables)), false),
        Err(e) => (e.to_string(), true),
    }
}

async fn run_create_schema(client: &WorkspaceClient, input: &Value) -> (String, bool) {
    let (catalog, name) = match (required_str(input, "catalog"), required_str(input, "name")) {
        (Ok(c), Ok(n)) => (c, n),
        (Err(e), _) | (_, Err(e)) => return (e, true),
    };
    let comment = input["comment"].as_str();
    match client.create_schema(catalog, name, comment).await {
        Ok(schema) => (
            format!("Created schema '{catalog}.{}'", schema.name),
            false,
        ),
        Err(e) => (e.to_string(), true),
    }
}

async fn run_list_principals(client: &WorkspaceClient) -> (String, bool) {
    let users = match client.list_users().await {
        Ok(u) => u,
        Err(e) => return (e.to_string(), true),
    };
    let groups = match client.list_groups().await {
        Ok(g) => g,
        Err(e) => return (e.to_string(), true),
    };
    (truncate(render_principals(&users, &groups)), false)
}

async fn run_get_grants(client: &WorkspaceClient, input: &Value) -> (String, bool) {
    let (securable_type, full_name) = match parse_securable(input) {
        Ok(p) => p,
        Err(e) => return (e, true),
    };
    match client.get_grants(securable_type, full_name).await {
        Ok(perms) => (
            truncate(render_grants(securable_type, full_name, &perms)),
            false,
        ),
        Err(e) => (e.to_string(), true),
    }
}

async fn run_change_grants(client: &WorkspaceClient, input: &Value, grant: bool) -> (String, bool) {
    let principal = match required_str(input, "principal") {
        Ok(p) => p,
        Err(e) => return (e, true),
    };
    let privilege = match required_str(input, "privilege").and_then(|p| Privilege::from_str(p)) {
        Ok(p) => p,
        Err(e) => return (e, true),
    };
    let (securable_type, full_name) = match parse_securable(input) {
        Ok(p) => p,
        Err(e) => return (e, true),
    };

    let change = if grant {
        PermissionsChange::grant(principal, privilege)
    } else {
        PermissionsChange::revoke(principal, privilege)
    };

    match client
        .update_grants(securable_type, full_name, vec![change])
        .await
    {
        Ok(_) => {
            let verb = if grant { "Granted" } else { "Revoked" };
            let preposition = if grant { "to" } else { "from" };
            (
                format!(
                    "{verb} {privilege} on {securable_type} {full_name} {preposition} {principal}"
                ),
                false,
            )
        }
        Err(e) => (e.to_string(), true),
    }
}

// -- Rendering, shared with the one-shot intent path --

fn format_created_at(created_at: Option<i64>) -> String {
    created_at
        .and_then(DateTime::from_timestamp_millis)
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn render_catalogs(catalogs: &[CatalogInfo]) -> String {
    if catalogs.is_empty() {
        return "No catalogs found".into();
    }
    let mut lines = vec![format!("{} catalog(s):", catalogs.len())];
    for c in catalogs {
        lines.push(format!(
            "- {} (owner: {}, created: {})",
            c.name,
            c.owner.as_deref().unwrap_or("-"),
            format_created_at(c.created_at),
        ));
    }
    lines.join("\n")
}

pub fn render_schemas(catalog: &str, schemas: &[SchemaInfo]) -> String {
    if schemas.is_empty() {
        return format!("No schemas found in catalog '{catalog}'");
    }
    let mut lines = vec![format!("{} schema(s) in '{catalog}':", schemas.len())];
    for s in schemas {
        lines.push(format!(
            "- {} (owner: {}, created: {})",
            s.name,
            s.owner.as_deref().unwrap_or("-"),
            format_created_at(s.created_at),
        ));
    }
    lines.join("\n")
}

pub fn render_tables(catalog: &str, schema: &str, tables: &[TableInfo]) -> String {
    if tables.is_empty() {
        return format!("No tables found in '{catalog}.{schema}'");
    }
    let mut lines = vec![format!("{} table(s) in '{catalog}.{schema}':", tables.len())];
    for t in tables {
        lines.push(format!(
            "- {} ({}, owner: {}, created: {})",
            t.name,
            t.table_type.as_deref().unwrap_or("TABLE"),
            t.owner.as_deref().unwrap_or("-"),
            format_created_at(t.created_at),
        ));
    }
    lines.join("\n")
}

pub fn render_principals(users: &[UserInfo], groups: &[GroupInfo]) -> String {
    let mut lines = vec![format!("{} user(s):", users.len())];
    for u in users {
        let status = if u.active { "" } else { " [inactive]" };
        match &u.display_name {
            Some(display) => lines.push(format!("- {} ({display}){status}", u.user_name)),
            None => lines.push(format!("- {}{status}", u.user_name)),
        }
    }
    lines.push(format!("{} group(s):", groups.len()));
    for g in groups {
        lines.push(format!("- {}", g.display_name));
    }
    lines.join("\n")
}

pub fn render_grants(
    securable_type: SecurableType,
    full_name: &str,
    perms: &PermissionsList,
) -> String {
    if perms.privilege_assignments.is_empty() {
        return format!("No grants on {securable_type} {full_name}");
    }
    let mut lines = vec![format!("Grants on {securable_type} {full_name}:")];
    for assignment in &perms.privilege_assignments {
        let privileges: Vec<String> = assignment
            .privileges
            .iter()
            .map(|p| p.to_string())
            .collect();
        lines.push(format!(
            "- {}: {}",
            assignment.principal,
            privileges.join(", ")
        ));
    }
    lines.join("\n")
}
