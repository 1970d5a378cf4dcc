// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wagent agents` and `wagent encrypt-key` command implementations.

use std::str::FromStr;

use clap::Subcommand;
use secrecy::SecretString;
use wagent_config::WagentConfig;
use wagent_core::{PermissionEntry, PermissionScope, Store, WagentError};
use wagent_storage::SqliteStore;
use wagent_storage::queries::permissions::ListKind;
use wagent_vault::ApiKeyCipher;

#[derive(Subcommand, Debug)]
pub enum AgentsCommand {
    /// List agents with their last known state.
    List,
    /// Register a new agent.
    Add {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Assistant that answers this agent's conversations.
        #[arg(long)]
        assistant_id: String,
        /// Agent id (generated when omitted).
        #[arg(long)]
        id: Option<String>,
    },
    /// Add an identifier to the agent's whitelist.
    Allow {
        agent_id: String,
        /// Phone number or group id; omit with `--scope all`.
        identifier: Option<String>,
        #[arg(long, default_value = "contact", value_parser = parse_scope)]
        scope: PermissionScope,
    },
    /// Add an identifier to the agent's blacklist.
    Deny {
        agent_id: String,
        identifier: String,
        #[arg(long, default_value = "contact", value_parser = parse_scope)]
        scope: PermissionScope,
    },
    /// Remove an identifier from one of the lists.
    Revoke {
        agent_id: String,
        identifier: String,
        /// `whitelist` or `blacklist`.
        #[arg(long, default_value = "whitelist", value_parser = parse_list)]
        list: ListKind,
    },
    /// Prompt for the agent's API key and store it encrypted.
    SetKey {
        agent_id: String,
        /// Key name (defaults to `openai.api_key_name`).
        #[arg(long)]
        name: Option<String>,
    },
    /// Print replies sent in one conversation.
    History { agent_id: String, chat_id: String },
}

fn parse_scope(s: &str) -> Result<PermissionScope, String> {
    PermissionScope::from_str(&s.to_ascii_uppercase())
        .map_err(|_| format!("unknown scope `{s}` (expected group, contact or all)"))
}

fn parse_list(s: &str) -> Result<ListKind, String> {
    ListKind::from_str(&s.to_ascii_lowercase())
        .map_err(|_| format!("unknown list `{s}` (expected whitelist or blacklist)"))
}

pub async fn run(config: &WagentConfig, command: AgentsCommand) -> Result<(), WagentError> {
    let store = SqliteStore::open(&config.storage).await?;
    let result = execute(config, &store, command).await;
    store.close().await?;
    result
}

async fn execute(
    config: &WagentConfig,
    store: &SqliteStore,
    command: AgentsCommand,
) -> Result<(), WagentError> {
    match command {
        AgentsCommand::List => {
            for agent in store.list_agents().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    agent.id,
                    agent.name,
                    agent.state,
                    agent.phone_number.as_deref().unwrap_or("-"),
                    agent
                        .last_state_change_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }
        AgentsCommand::Add {
            name,
            assistant_id,
            id,
        } => {
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            store.create_agent(&id, &name, &assistant_id).await?;
            println!("{id}");
        }
        AgentsCommand::Allow {
            agent_id,
            identifier,
            scope,
        } => {
            let identifier = match (scope, identifier) {
                (_, Some(identifier)) => identifier,
                (PermissionScope::All, None) => String::new(),
                (_, None) => {
                    return Err(WagentError::Config(
                        "an identifier is required unless --scope all".into(),
                    ));
                }
            };
            ensure_agent(store, &agent_id).await?;
            store
                .allow(&agent_id, &PermissionEntry::new(scope, identifier))
                .await?;
        }
        AgentsCommand::Deny {
            agent_id,
            identifier,
            scope,
        } => {
            ensure_agent(store, &agent_id).await?;
            store
                .deny(&agent_id, &PermissionEntry::new(scope, identifier))
                .await?;
        }
        AgentsCommand::Revoke {
            agent_id,
            identifier,
            list,
        } => {
            if !store.remove_permission(&agent_id, list, &identifier).await? {
                eprintln!("{identifier} was not on the {list} of {agent_id}");
            }
        }
        AgentsCommand::SetKey { agent_id, name } => {
            ensure_agent(store, &agent_id).await?;
            let cipher = ApiKeyCipher::from_config(&config.vault)?;
            let encrypted = cipher.encrypt(&read_api_key()?)?;
            let name = name.unwrap_or_else(|| config.openai.api_key_name.clone());
            store.set_api_key(&agent_id, &name, &encrypted).await?;
            println!("stored {name} for {agent_id}");
        }
        AgentsCommand::History { agent_id, chat_id } => {
            for record in store.conversation_history(&agent_id, &chat_id).await? {
                println!(
                    "{}\t{}\t{}",
                    record.created_at.to_rfc3339(),
                    record.sender,
                    record.message
                );
            }
        }
    }
    Ok(())
}

async fn ensure_agent(store: &SqliteStore, agent_id: &str) -> Result<(), WagentError> {
    match store.get_agent(agent_id).await? {
        Some(_) => Ok(()),
        None => Err(WagentError::AgentNotFound(agent_id.to_string())),
    }
}

/// Runs `wagent encrypt-key`.
pub fn encrypt_key(config: &WagentConfig) -> Result<(), WagentError> {
    let cipher = ApiKeyCipher::from_config(&config.vault)?;
    println!("{}", cipher.encrypt(&read_api_key()?)?);
    Ok(())
}

fn read_api_key() -> Result<SecretString, WagentError> {
    eprint!("API key: ");
    let key = rpassword::read_password()
        .map_err(|e| WagentError::Vault(format!("failed to read API key: {e}")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(WagentError::Vault("empty API key not allowed".to_string()));
    }
    Ok(SecretString::from(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parsing_is_case_insensitive() {
        assert_eq!(parse_scope("contact").unwrap(), PermissionScope::Contact);
        assert_eq!(parse_scope("ALL").unwrap(), PermissionScope::All);
        assert!(parse_scope("everyone").is_err());
    }

    #[test]
    fn list_parsing() {
        assert_eq!(parse_list("Blacklist").unwrap(), ListKind::Blacklist);
        assert!(parse_list("greylist").is_err());
    }

    #[tokio::test]
    async fn provisioning_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WagentConfig::default();
        config.storage.database_path = dir.path().join("w.db").display().to_string();

        let store = SqliteStore::open(&config.storage).await.unwrap();
        execute(
            &config,
            &store,
            AgentsCommand::Add {
                name: "Support".into(),
                assistant_id: "asst_1".into(),
                id: Some("a1".into()),
            },
        )
        .await
        .unwrap();
        execute(
            &config,
            &store,
            AgentsCommand::Allow {
                agent_id: "a1".into(),
                identifier: None,
                scope: PermissionScope::All,
            },
        )
        .await
        .unwrap();

        let lists = store.permission_lists("a1").await.unwrap().unwrap();
        assert_eq!(lists.whitelist[0].scope, PermissionScope::All);

        let err = execute(
            &config,
            &store,
            AgentsCommand::Deny {
                agent_id: "ghost".into(),
                identifier: "1555".into(),
                scope: PermissionScope::Contact,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WagentError::AgentNotFound(_)));
    }
}
