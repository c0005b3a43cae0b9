//! List accounts command handler

use crate::config::Config;
use crate::db::Store;
use crate::domain::Account;
use crate::services::{AccountService, SeaOrmAccountService};

pub async fn cmd_list_accounts(config: &Config, email: Option<&str>) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let service = SeaOrmAccountService::new(store, config.security.clone());

    if let Some(email) = email {
        match service.find_by_email(email).await? {
            Some(account) => print_account(&account),
            None => println!("No account with email {email}."),
        }
        return Ok(());
    }

    let accounts = service.list().await?;

    if accounts.is_empty() {
        println!("No accounts yet.");
        println!();
        println!(
            "Create one with: accounts create-superuser --email <email> --password <password>"
        );
        return Ok(());
    }

    println!("Accounts ({} total)", accounts.len());
    println!("{:-<70}", "");

    for account in &accounts {
        print_account(account);
    }

    Ok(())
}

fn print_account(account: &Account) {
    let role = if account.is_superuser {
        "superuser"
    } else if account.is_staff {
        "staff"
    } else {
        "user"
    };
    let status = if account.is_active { "active" } else { "inactive" };

    println!("{} {} [{}]", account.id, account.email, role);
    println!(
        "  Name: {} | Status: {} | Last login: {}",
        if account.name.is_empty() { "-" } else { &account.name },
        status,
        account.last_login.as_deref().unwrap_or("never")
    );
}
