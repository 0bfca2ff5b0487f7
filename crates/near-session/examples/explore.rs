//! Testnet Explorer
//!
//! Walks every endpoint on testnet through a session, then queries an
//! account and connects a wallet from a simulated login callback.
//!
//! Run: cargo run --example explore
//!
//! Logging: RUST_LOG=near_session=debug cargo run --example explore

use near_session::*;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Helpers
// ============================================================================

fn print_outcome(session: &Session) {
    let state = session.state();
    let label = state.ui.last_endpoint.unwrap_or_default();
    match state.result {
        NearResult::Success(value) => {
            let text = value.to_string();
            let preview: String = text.chars().take(120).collect();
            println!("{label:<36} ok   {preview}");
        }
        NearResult::Error(err) => println!("{label:<36} err  {err}"),
        NearResult::Loading => println!("{label:<36} ..."),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let session = Session::testnet().build();
    println!("RPC: {}\n", session.rpc_url());

    println!("=== Endpoints ===\n");
    for endpoint in RpcEndpoint::ALL {
        session.select_endpoint(endpoint);
        session.fetch_endpoint(endpoint).wait().await;
        print_outcome(&session);
    }

    println!("\n=== Queries ===\n");
    if let Ok(ticket) = session.call_view_method("guestbook.near-examples.testnet", "total_messages", "{}") {
        ticket.wait().await;
        print_outcome(&session);
    }

    if let Err(err) = session.query_account("") {
        println!("{:<36} err  {err}", "Account Query (blank)");
    }

    println!("\n=== Wallet ===\n");
    let login = session.wallet_login().default_login_url();
    println!("Login URL: {login}");

    let callback: WalletCallback = match "myapp://callback?account_id=guest-book.testnet".parse() {
        Ok(callback) => callback,
        Err(err) => {
            eprintln!("bad callback: {err}");
            return;
        }
    };
    match session.handle_wallet_callback(&callback) {
        Ok(Some(ticket)) => {
            ticket.wait().await;
            print_outcome(&session);
        }
        Ok(None) => {}
        Err(err) => eprintln!("{err}"),
    }

    let wallet = session.wallet();
    println!(
        "Wallet: {} balance={}",
        wallet.account_id.as_deref().unwrap_or("-"),
        wallet.balance.as_deref().unwrap_or("unknown")
    );

    session.disconnect_wallet();
    session.shutdown().await;
}
