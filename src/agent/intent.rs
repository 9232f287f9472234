//! Single-shot intent routing: one LLM call maps a natural-language request
//! to a typed workspace operation, which is then executed directly. This is
//! the path behind `uc-steward ask` — no tool loop, one decision, one call.

use super::tools;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::workspace::{PermissionsChange, Privilege, SecurableType, WorkspaceClient};
use serde::Deserialize;
use tracing::info;

const SYSTEM_PROMPT: &str = r#"You are the request router for a Databricks Unity Catalog access manager. Map the user's request to exactly one action and respond with a single JSON object, nothing else.

Actions:
- {"action": "list_catalogs"}
- {"action": "list_schemas", "catalog": "<catalog name>"}
- {"action": "list_tables", "catalog": "<catalog>", "schema": "<schema>"}
- {"action": "list_principals"}
- {"action": "show_grants", "securable_type": "catalog|schema|table", "full_name": "<name>"}
- {"action": "create_catalog", "name": "<name>", "comment": "<optional>"}
- {"action": "create_schema", "catalog": "<catalog>", "name": "<name>", "comment": "<optional>"}
- {"action": "grant", "principal": "<user email or group>", "privilege": "<PRIVILEGE>", "securable_type": "catalog|schema|table", "full_name": "<name>"}
- {"action": "revoke", "principal": "<user email or group>", "privilege": "<PRIVILEGE>", "securable_type": "catalog|schema|table", "full_name": "<name>"}
- {"action": "answer", "reply": "<short reply>"}

Rules:
- Privileges use the vendor spelling: SELECT, MODIFY, USE_CATALOG, USE_SCHEMA, CREATE_SCHEMA, CREATE_TABLE, ALL_PRIVILEGES.
- A schema's full_name is "catalog.schema"; a table's is "catalog.schema.table".
- Use "answer" for greetings, capability questions, or anything that maps to no catalog/permission operation — and explain briefly what you can do.
- Never invent names. If the request is ambiguous about which object or principal it means, use "answer" and ask for the missing detail.
"#;

/// One workspace operation, as decided by the router LLM.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    ListCatalogs,
    ListSchemas {
        catalog: String,
    },
    ListTables {
        catalog: String,
        schema: String,
    },
    ListPrincipals,
    ShowGrants {
        securable_type: SecurableType,
        full_name: String,
    },
    CreateCatalog {
        name: String,
        comment: Option<String>,
    },
    CreateSchema {
        catalog: String,
        name: String,
        comment: Option<String>,
    },
    Grant {
        principal: String,
        privilege: Privilege,
        securable_type: SecurableType,
        full_name: String,
    },
    Revoke {
        principal: String,
        privilege: Privilege,
        securable_type: SecurableType,
        full_name: String,
    },
    Answer {
        reply: String,
    },
}

/// Ask the LLM which operation the request maps to.
pub async fn classify(llm: &LlmClient, request: &str) -> Result<Intent> {
    let intent: Intent = llm.complete_json(SYSTEM_PROMPT, request).await?;
    info!(?intent, "request classified");
    Ok(intent)
}

/// Execute a classified intent against the workspace and render the result.
pub async fn execute(client: &WorkspaceClient, intent: Intent) -> Result<String> {
    match intent {
        Intent::ListCatalogs => {
            let catalogs = client.list_catalogs().await?;
            Ok(tools::render_catalogs(&catalogs))
        }
        Intent::ListSchemas { catalog } => {
            let schemas = client.list_schemas(&catalog).await?;
            Ok(tools::render_schemas(&catalog, &schemas))
        }
        Intent::ListTables { catalog, schema } => {
            let tables = client.list_tables(&catalog, &schema).await?;
            Ok(tools::render_tables(&catalog, &schema, &tables))
        }
        Intent::ListPrincipals => {
            let users = client.list_users().await?;
            let groups = client.list_groups().await?;
            Ok(tools::render_principals(&users, &groups))
        }
        Intent::ShowGrants {
            securable_type,
            full_name,
        } => {
            let perms = client.get_grants(securable_type, &full_name).await?;
            Ok(tools::render_grants(securable_type, &full_name, &perms))
        }
        Intent::CreateCatalog { name, comment } => {
            let catalog = client.create_catalog(&name, comment.as_deref()).await?;
            Ok(format!("Created catalog '{}'", catalog.name))
        }
        Intent::CreateSchema {
            catalog,
            name,
            comment,
        } => {
            let schema = client
                .create_schema(&catalog, &name, comment.as_deref())
                .await?;
            Ok(format!("Created schema '{catalog}.{}'", schema.name))
        }
        Intent::Grant {
            principal,
            privilege,
            securable_type,
            full_name,
        } => {
            reject_unknown_privilege(privilege)?;
            client
                .update_grants(
                    securable_type,
                    &full_name,
                    vec![PermissionsChange::grant(&principal, privilege)],
                )
                .await?;
            Ok(format!(
                "Granted {privilege} on {securable_type} {full_name} to {principal}"
            ))
        }
        Intent::Revoke {
            principal,
            privilege,
            securable_type,
            full_name,
        } => {
            reject_unknown_privilege(privilege)?;
            client
                .update_grants(
                    securable_type,
                    &full_name,
                    vec![PermissionsChange::revoke(&principal, privilege)],
                )
                .await?;
            Ok(format!(
                "Revoked {privilege} on {securable_type} {full_name} from {principal}"
            ))
        }
        Intent::Answer { reply } => Ok(reply),
    }
}

fn reject_unknown_privilege(privilege: Privilege) -> Result<()> {
    if privilege == Privilege::Unknown {
        return Err(crate::error::Error::parse(
            "the router produced a privilege this workspace does not recognize",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::extract_json;

    fn parse(text: &str) -> Intent {
        serde_json::from_str(extract_json(text)).unwrap()
    }

    #[test]
    fn grant_intent_parses() {
        let intent = parse(
            r#"{"action": "grant", "principal": "alice@corp.com", "privilege": "SELECT",
                "securable_type": "catalog", "full_name": "sales"}"#,
        );
        assert_eq!(
            intent,
            Intent::Grant {
                principal: "alice@corp.com".into(),
                privilege: Privilege::Select,
                securable_type: SecurableType::Catalog,
                full_name: "sales".into(),
            }
        );
    }

    #[test]
    fn fenced_intent_parses() {
        let intent = parse(
            "```json\n{\"action\": \"list_schemas\", \"catalog\": \"sales\"}\n```",
        );
        assert_eq!(
            intent,
            Intent::ListSchemas {
                catalog: "sales".into()
            }
        );
    }

    #[test]
    fn list_tables_intent_parses() {
        let intent = parse(r#"{"action": "list_tables", "catalog": "sales", "schema": "core"}"#);
        assert_eq!(
            intent,
            Intent::ListTables {
                catalog: "sales".into(),
                schema: "core".into(),
            }
        );
    }

    #[test]
    fn create_schema_without_comment_parses() {
        let intent = parse(
            r#"{"action": "create_schema", "catalog": "sales", "name": "orders"}"#,
        );
        assert_eq!(
            intent,
            Intent::CreateSchema {
                catalog: "sales".into(),
                name: "orders".into(),
                comment: None,
            }
        );
    }

    #[test]
    fn answer_intent_carries_reply() {
        let intent = parse(r#"{"action": "answer", "reply": "I manage catalog access."}"#);
        assert_eq!(
            intent,
            Intent::Answer {
                reply: "I manage catalog access.".into()
            }
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = serde_json::from_str::<Intent>(r#"{"action": "drop_catalog", "name": "sales"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unrecognized_privilege_parses_as_unknown() {
        let intent = parse(
            r#"{"action": "grant", "principal": "a", "privilege": "FLY",
                "securable_type": "catalog", "full_name": "sales"}"#,
        );
        let Intent::Grant { privilege, .. } = intent else {
            panic!("expected grant intent");
        };
        assert_eq!(privilege, Privilege::Unknown);
        assert!(reject_unknown_privilege(privilege).is_err());
    }
}
