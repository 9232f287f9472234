use serde_json::json;
use uc_steward::agent::tools;
use uc_steward::config::WorkspaceConfig;
use uc_steward::workspace::WorkspaceClient;

fn offline_client() -> WorkspaceClient {
    // Argument validation happens before any request is sent, so a client
    // pointed at an unreachable host is enough for these tests.
    WorkspaceClient::new(&WorkspaceConfig {
        host: "http://127.0.0.1:1".into(),
        token: "dapi-test".into(),
    })
    .unwrap()
}

#[test]
fn tool_definitions_cover_every_operation() {
    let tools = tools::tool_definitions();
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "list_catalogs",
            "create_catalog",
            "list_schemas",
            "list_tables",
            "create_schema",
            "list_principals",
            "get_grants",
            "grant_privilege",
            "revoke_privilege",
        ]
    );
}

#[test]
fn tool_schemas_declare_required_params() {
    for tool in tools::tool_definitions() {
        assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        if let Some(required) = tool.input_schema.get("required") {
            for param in required.as_array().unwrap() {
                let name = param.as_str().unwrap();
                assert!(
                    tool.input_schema["properties"][name].is_object(),
                    "{}: required param '{name}' missing from properties",
                    tool.name
                );
            }
        }
    }
}

#[tokio::test]
async fn unknown_tool_returns_error() {
    let client = offline_client();
    let (result, is_error) = tools::dispatch(&client, "drop_metastore", &json!({})).await;
    assert!(is_error);
    assert!(result.contains("Unknown tool"), "got: {result}");
}

#[tokio::test]
async fn create_catalog_requires_name() {
    let client = offline_client();
    let (result, is_error) = tools::dispatch(&client, "create_catalog", &json!({})).await;
    assert!(is_error);
    assert!(result.contains("'name'"), "got: {result}");
}

#[tokio::test]
async fn list_schemas_requires_catalog() {
    let client = offline_client();
    let (result, is_error) = tools::dispatch(&client, "list_schemas", &json!({})).await;
    assert!(is_error);
    assert!(result.contains("'catalog'"), "got: {result}");
}

#[tokio::test]
async fn list_tables_requires_both_names() {
    let client = offline_client();
    let (result, is_error) =
        tools::dispatch(&client, "list_tables", &json!({"catalog": "sales"})).await;
    assert!(is_error);
    assert!(result.contains("'schema'"), "got: {result}");
}

#[tokio::test]
async fn grant_rejects_unknown_privilege() {
    let client = offline_client();
    let input = json!({
        "principal": "alice@corp.com",
        "privilege": "TELEPORT",
        "securable_type": "catalog",
        "full_name": "sales",
    });
    let (result, is_error) = tools::dispatch(&client, "grant_privilege", &input).await;
    assert!(is_error);
    assert!(result.contains("unknown privilege"), "got: {result}");
}

#[tokio::test]
async fn grant_rejects_bad_securable_type() {
    let client = offline_client();
    let input = json!({
        "principal": "alice@corp.com",
        "privilege": "SELECT",
        "securable_type": "warehouse",
        "full_name": "sales",
    });
    let (result, is_error) = tools::dispatch(&client, "grant_privilege", &input).await;
    assert!(is_error);
    assert!(result.contains("unknown securable type"), "got: {result}");
}

#[tokio::test]
async fn revoke_requires_principal() {
    let client = offline_client();
    let input = json!({
        "privilege": "SELECT",
        "securable_type": "catalog",
        "full_name": "sales",
    });
    let (result, is_error) = tools::dispatch(&client, "revoke_privilege", &input).await;
    assert!(is_error);
    assert!(result.contains("'principal'"), "got: {result}");
}

#[tokio::test]
async fn empty_string_param_is_missing() {
    let client = offline_client();
    let (result, is_error) =
        tools::dispatch(&client, "create_catalog", &json!({"name": ""})).await;
    assert!(is_error);
    assert!(result.contains("'name'"), "got: {result}");
}
