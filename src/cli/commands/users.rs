//! User command handlers

use crate::cli::AddUserArgs;
use crate::config::Config;
use crate::domain::User;
use crate::services::{AddUserInput, LinkedAccountInput, RegistrationBackend};

use super::{open_service, parse_user_id};

pub async fn cmd_add_user(config: &Config, args: AddUserArgs) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    let linked_account = args.account_id.map(|account_id| LinkedAccountInput {
        account_type: args.account_type,
        account_id,
        first_name: args.first_name,
        last_name: args.last_name,
        token: args.activation_token,
    });

    let input = AddUserInput {
        username: args.username,
        email: args.email,
        password: args.password,
        linked_account,
    };

    let id = service.add_user(input).await?;
    let user = service
        .get_user(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User {id} vanished after insert"))?;

    println!("✓ Created user {} (ID: {})", user.username, user.id);
    Ok(())
}

pub async fn cmd_activate(config: &Config, token: &str) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    service.activate(token).await?;
    println!("✓ Activation processed");
    Ok(())
}

pub async fn cmd_show_user(config: &Config, user: &str, json: bool) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    let id = match parse_user_id(user) {
        Ok(id) => Some(id),
        Err(_) => service.lookup_username(user).await?,
    };

    let Some(user) = (match id {
        Some(id) => service.get_user(id).await?,
        None => None,
    }) else {
        println!("User not found: {user}");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        print_user(&user);
    }
    Ok(())
}

pub async fn cmd_login(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    match service.authenticate(username, password).await? {
        Some(id) => println!("✓ Credentials valid (ID: {id})"),
        None => println!("✗ Invalid credentials"),
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} (ID: {})", user.username, user.id);
    println!("{:-<50}", "");
    println!("  Email:      {}", user.email.as_deref().unwrap_or("-"));
    println!("  Password:   {}", if user.has_password { "set" } else { "none" });
    println!("  Created:    {}", user.created_at.to_rfc3339());
    match user.activated_timestamp {
        Some(at) => println!("  Activated:  {}", at.to_rfc3339()),
        None => println!("  Activated:  no"),
    }

    if !user.linked_accounts.is_empty() {
        println!("  Linked accounts:");
        for account in &user.linked_accounts {
            let name = [account.first_name.as_deref(), account.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            println!("    [{}] {} {}", account.account_type, account.account_id, name);
        }
    }

    println!("  Access tokens: {}", user.access_tokens.len());
    for token in &user.access_tokens {
        let prefix = token.token.get(..8).unwrap_or(&token.token);
        println!("    {prefix}…  issued {}", token.timestamp.to_rfc3339());
    }
}
