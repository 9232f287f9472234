//! Conversation-driven access management: the LLM reads the chat, calls
//! workspace tools, and replies with the outcome.
//!
//! The session loop sends the conversation to the LLM, executes tool calls,
//! appends results, and repeats until the LLM produces a final answer or a
//! hard stop is hit (max turns, cost limit).

pub mod intent;
pub mod tools;

use crate::config::AgentConfig;
use crate::llm::{
    ContentBlock, ConversationMessage, LlmClient, Role, StopReason, Usage, estimate_cost_usd,
};
use crate::workspace::WorkspaceClient;
use anyhow::Result;
use tracing::{debug, info, warn};

/// Cumulative cost and usage stats for a chat session.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub turns: u32,
    pub total_input_tokens: u32,
    pub total_output_tokens: u32,
    pub total_cost_usd: f64,
    pub tool_calls: u32,
}

impl SessionStats {
    fn accumulate(&mut self, usage: &Usage, model: &str) {
        self.turns += 1;
        self.total_input_tokens += usage.input_tokens;
        self.total_output_tokens += usage.output_tokens;
        self.total_cost_usd += estimate_cost_usd(usage, model);
    }
}

const SYSTEM_PROMPT: &str = r#"You are the access manager for a Databricks Unity Catalog workspace. Users ask you in plain language to inspect or change data access; you have tools that list catalogs, schemas, tables, users, and groups, show current grants, create catalogs and schemas, and grant or revoke privileges.

## How to work

- Resolve before you act. If a request names a person, team, or object loosely ("give marketing access to sales data"), use list_principals / list_catalogs / list_schemas / list_tables to find the exact principal and securable first.
- Grants and revokes change real permissions. Only call grant_privilege, revoke_privilege, create_catalog, or create_schema when the user clearly asked for that change. If the request is ambiguous about which object, principal, or privilege it means, ask instead of guessing.
- Privileges use the vendor spelling: SELECT, MODIFY, USE_CATALOG, USE_SCHEMA, CREATE_SCHEMA, CREATE_TABLE, ALL_PRIVILEGES. Granting SELECT on a schema is only useful with USE_CATALOG on its catalog and USE_SCHEMA on the schema — mention this when relevant.
- A tool error is information, not a dead end: report what the workspace said and suggest what to fix.

## Replies

End your reply with what actually happened: the objects listed, the grant applied, or the error the workspace returned. Keep replies short and concrete — names, privileges, principals. Never claim a change succeeded unless the tool result says so.
"#;

/// Run one user turn of a chat session.
///
/// `history` carries the prior conversation and is extended in place with
/// this turn's messages (user text, assistant tool calls, tool results,
/// final reply), so the caller can keep a session going across turns.
pub async fn run_turn(
    llm: &LlmClient,
    client: &WorkspaceClient,
    config: &AgentConfig,
    history: &mut Vec<ConversationMessage>,
    user_text: &str,
) -> Result<(String, SessionStats)> {
    let tools = tools::tool_definitions();
    let mut stats = SessionStats::default();

    history.push(ConversationMessage {
        role: Role::User,
        content: vec![ContentBlock::Text {
            text: user_text.to_string(),
        }],
    });
    // Everything from here on belongs to this turn; the fallback reply below
    // must not reach back into earlier turns.
    let turn_start = history.len();

    info!(
        max_turns = config.max_turns,
        cost_limit = config.cost_limit_usd,
        "starting chat turn"
    );

    loop {
        if stats.turns >= config.max_turns {
            warn!(turns = stats.turns, "hit max turns limit, stopping turn");
            break;
        }
        if stats.total_cost_usd >= config.cost_limit_usd {
            warn!(
                cost = stats.total_cost_usd,
                limit = config.cost_limit_usd,
                "hit cost limit, stopping turn"
            );
            break;
        }

        let response = match llm.converse(SYSTEM_PROMPT, history, &tools).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "LLM converse failed");
                if stats.turns > 0 {
                    break;
                }
                return Err(e.into());
            }
        };

        stats.accumulate(&response.usage, llm.model());

        debug!(
            turn = stats.turns,
            stop = ?response.stop_reason,
            cost = format!("${:.4}", stats.total_cost_usd),
            "agent turn"
        );

        let tool_uses: Vec<_> = response
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.clone(), name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect();

        history.push(ConversationMessage {
            role: Role::Assistant,
            content: response.content,
        });

        if response.stop_reason == StopReason::EndTurn || tool_uses.is_empty() {
            break;
        }

        let mut tool_results = Vec::new();
        for (id, name, input) in &tool_uses {
            stats.tool_calls += 1;
            let (result, is_error) = tools::dispatch(client, name, input).await;
            tool_results.push(ContentBlock::ToolResult {
                tool_use_id: id.clone(),
                content: result,
                is_error,
            });
        }

        history.push(ConversationMessage {
            role: Role::User,
            content: tool_results,
        });
    }

    let reply = last_assistant_text(&history[turn_start..])
        .unwrap_or_else(|| "The session ended before a reply was produced.".into());

    info!(
        turns = stats.turns,
        tool_calls = stats.tool_calls,
        cost = format!("${:.4}", stats.total_cost_usd),
        "chat turn complete"
    );

    Ok((reply, stats))
}

/// The text of the most recent assistant message, if any.
fn last_assistant_text(messages: &[ConversationMessage]) -> Option<String> {
    for msg in messages.iter().rev() {
        if msg.role != Role::Assistant {
            continue;
        }
        let text: Vec<&str> = msg
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if !text.is_empty() {
            return Some(text.join("\n"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_assistant_text_skips_tool_only_messages() {
        let messages = vec![
            ConversationMessage {
                role: Role::User,
                content: vec![ContentBlock::Text {
                    text: "list catalogs".into(),
                }],
            },
            ConversationMessage {
                role: Role::Assistant,
                content: vec![ContentBlock::Text {
                    text: "Here are the catalogs: main, sales.".into(),
                }],
            },
            ConversationMessage {
                role: Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "list_catalogs".into(),
                    input: json!({}),
                }],
            },
        ];
        assert_eq!(
            last_assistant_text(&messages).as_deref(),
            Some("Here are the catalogs: main, sales.")
        );
    }

    #[test]
    fn last_assistant_text_empty_history() {
        assert!(last_assistant_text(&[]).is_none());
    }

    #[test]
    fn hard_stop_does_not_reuse_an_earlier_turns_reply() {
        // A grant request that ends in tool calls only (limit fired before the
        // model replied) must not fall back to the previous turn's answer.
        let history = vec![
            ConversationMessage {
                role: Role::User,
                content: vec![ContentBlock::Text {
                    text: "list catalogs".into(),
                }],
            },
            ConversationMessage {
                role: Role::Assistant,
                content: vec![ContentBlock::Text {
                    text: "Catalogs: main, sales.".into(),
                }],
            },
            ConversationMessage {
                role: Role::User,
                content: vec![ContentBlock::Text {
                    text: "grant SELECT on catalog sales to alice@corp.com".into(),
                }],
            },
            ConversationMessage {
                role: Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "grant_privilege".into(),
                    input: json!({}),
                }],
            },
        ];
        // The grant turn starts at index 3, right after its user message.
        assert!(last_assistant_text(&history[3..]).is_none());
        // Scanning the whole history is exactly what produced the stale reply.
        assert_eq!(
            last_assistant_text(&history).as_deref(),
            Some("Catalogs: main, sales.")
        );
    }

    #[test]
    fn stats_accumulate_usage() {
        let mut stats = SessionStats::default();
        stats.accumulate(
            &Usage {
                input_tokens: 100,
                output_tokens: 50,
            },
            "gpt-4.1-nano",
        );
        stats.accumulate(
            &Usage {
                input_tokens: 200,
                output_tokens: 10,
            },
            "gpt-4.1-nano",
        );
        assert_eq!(stats.turns, 2);
        assert_eq!(stats.total_input_tokens, 300);
        assert_eq!(stats.total_output_tokens, 60);
        assert!(stats.total_cost_usd > 0.0);
    }
}
