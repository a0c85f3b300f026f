use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use bank_ledger_api::{
    client::{BankClient, ClientError, DEFAULT_BASE_URL},
    entities::AccountModel,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let client = BankClient::new(cli.base_url.clone())?;

    let succeeded = match cli.command {
        Commands::Accounts => handle_accounts(&client, cli.json).await?,
        Commands::Transfer(args) => handle_transfer(&client, args, cli.json).await?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[derive(Parser)]
#[command(name = "bank-cli", about = "List accounts and transfer cash between them", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "BANK_API_URL",
        default_value = DEFAULT_BASE_URL,
        help = "Base URL of the ledger API"
    )]
    base_url: String,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every account with its balance
    Accounts,
    /// Move cash from one account to another
    Transfer(TransferArgs),
}

#[derive(Args)]
struct TransferArgs {
    #[arg(long = "from", help = "Source account id")]
    from: i32,
    #[arg(long = "to", help = "Destination account id")]
    to: i32,
    #[arg(long, help = "Amount to move")]
    amount: f64,
}

/// Returns whether the listing succeeded.
async fn handle_accounts(client: &BankClient, json: bool) -> Result<bool> {
    match client.list_accounts().await {
        Ok(accounts) if json => print_json(&accounts)?,
        Ok(accounts) => render_accounts(&accounts),
        Err(err) => {
            report_error(client, &err, json)?;
            return Ok(false);
        }
    }
    Ok(true)
}

/// Returns whether the transfer went through.
async fn handle_transfer(client: &BankClient, args: TransferArgs, json: bool) -> Result<bool> {
    let outcome = client.transfer(args.from, args.to, args.amount).await;

    // The account list is refreshed whether or not the transfer went through.
    let accounts = client.list_accounts().await;

    if json {
        let transfer = match &outcome {
            Ok(response) => serde_json::to_value(response)?,
            Err(err) => json!({ "error": err.to_string() }),
        };
        let accounts = match &accounts {
            Ok(accounts) => serde_json::to_value(accounts)?,
            Err(err) => json!({ "error": err.to_string() }),
        };
        print_json(&json!({ "transfer": transfer, "accounts": accounts }))?;
        return Ok(outcome.is_ok());
    }

    match &outcome {
        Ok(response) => println!("Transaction successful! ID: {}", response.transaction.id),
        Err(err) => println!("Error: {}", error_message(client, err)),
    }

    match accounts {
        Ok(accounts) => render_accounts(&accounts),
        Err(err) => println!("Error fetching accounts: {}", error_message(client, &err)),
    }

    Ok(outcome.is_ok())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_accounts(accounts: &[AccountModel]) {
    println!("Account Balances");
    for account in accounts {
        println!("{}", account_line(account));
    }
}

/// The id prefix is what `transfer --from/--to` expects.
fn account_line(account: &AccountModel) -> String {
    format!(
        "[{}] {}: ${:.2}",
        account.id, account.name, account.available_cash
    )
}

fn error_message(client: &BankClient, err: &ClientError) -> String {
    match err {
        ClientError::Api { message, .. } => message.clone(),
        ClientError::Http(e) if e.is_connect() || e.is_timeout() => {
            format!("Unable to reach the ledger API at {}", client.base_url())
        }
        ClientError::Http(_) => "Unknown error occurred".to_string(),
    }
}

fn report_error(client: &BankClient, err: &ClientError, json: bool) -> Result<()> {
    if json {
        print_json(&json!({ "error": err.to_string() }))
    } else {
        println!("Error: {}", error_message(client, err));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn server_with_accounts() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Sanna", "availableCash": 5000.0 }
            ])))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn account_line_shows_the_id_used_by_transfer() {
        let account = AccountModel {
            id: 3,
            name: "Investment Account".to_string(),
            available_cash: 10000.5,
        };
        assert_eq!(account_line(&account), "[3] Investment Account: $10000.50");
    }

    #[tokio::test]
    async fn rejected_transfer_is_reported_as_failure() {
        let server = server_with_accounts().await;
        Mock::given(method("POST"))
            .and(path("/api/transactions"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "Insufficient funds" })),
            )
            .mount(&server)
            .await;
        let client = BankClient::new(server.uri()).unwrap();

        let args = TransferArgs {
            from: 1,
            to: 2,
            amount: 9000.0,
        };
        assert!(!handle_transfer(&client, args, false).await.unwrap());
    }

    #[tokio::test]
    async fn accepted_transfer_is_reported_as_success() {
        let server = server_with_accounts().await;
        Mock::given(method("POST"))
            .and(path("/api/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Transaction successful",
                "transaction": {
                    "id": 1,
                    "registeredTime": 0,
                    "executedTime": 0,
                    "success": true,
                    "cashAmount": 10.0,
                    "sourceAccountId": 1,
                    "destinationAccountId": 2
                }
            })))
            .mount(&server)
            .await;
        let client = BankClient::new(server.uri()).unwrap();

        let args = TransferArgs {
            from: 1,
            to: 2,
            amount: 10.0,
        };
        assert!(handle_transfer(&client, args, true).await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_server_fails_the_listing() {
        let client = BankClient::new("http://127.0.0.1:9").unwrap();

        assert!(!handle_accounts(&client, false).await.unwrap());
        let err = client.list_accounts().await.unwrap_err();
        assert_eq!(
            error_message(&client, &err),
            "Unable to reach the ledger API at http://127.0.0.1:9"
        );
    }
}
