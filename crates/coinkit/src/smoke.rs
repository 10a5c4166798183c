//! Manual smoke runs against a locally running backend server.

use std::io::Write;
use std::time::Duration;

use coinkit_core::backend::{BackendClient, Discussion, NewToken};
use coinkit_core::ws::{self, SessionConfig, SessionReport};

/// Wallet and amount used by the stake check.
const SMOKE_WALLET: &str = "test_wallet_123";
const SMOKE_STAKE_AMOUNT: f64 = 50.0;

/// Socket path exercised at the end of the API smoke run.
const API_SMOKE_WS_PATH: &str = "/ws";

// ==============================================================================
// WebSocket Smoke
// ==============================================================================

pub(crate) async fn run_ws_smoke(
    config: &SessionConfig,
    out: &mut dyn Write,
) -> eyre::Result<SessionReport> {
    writeln!(out, "Community Coin Server WebSocket Test Client")?;
    writeln!(out, "{}", "=".repeat(50))?;

    let report = match ws::run_session(config).await {
        Ok(report) => report,
        Err(err) => {
            if let Some(partial) = err.partial_report() {
                writeln!(out, "Connected to {}", config.url)?;
                print_replies(out, partial)?;
                for event in &partial.events {
                    writeln!(out, "Transaction event: {event}")?;
                }
            }
            writeln!(out, "\n❌ {}", err.failure())?;
            return Err(err.into());
        }
    };
    writeln!(out, "Connected to {}", config.url)?;
    print_replies(out, &report)?;

    writeln!(
        out,
        "\n{}. Listened for transaction events for {} ms",
        report.replies.len() + 1,
        config.listen_window.as_millis()
    )?;
    for event in &report.events {
        writeln!(out, "Transaction event: {event}")?;
    }
    if report.closed_by_peer {
        writeln!(out, "Server closed the connection")?;
    } else if report.events.is_empty() {
        writeln!(out, "Timeout reached, no events")?;
    }

    Ok(report)
}

fn print_replies(out: &mut dyn Write, report: &SessionReport) -> std::io::Result<()> {
    for (step, reply) in report.replies.iter().enumerate() {
        writeln!(out, "\n{}. `{}` command", step + 1, reply.command)?;
        writeln!(out, "Response: {}", reply.reply)?;
    }
    Ok(())
}

// ==============================================================================
// API Smoke
// ==============================================================================

#[derive(Debug, Default)]
pub(crate) struct ApiSmokeSummary {
    checks: Vec<(&'static str, bool)>,
}

impl ApiSmokeSummary {
    fn record(&mut self, name: &'static str, passed: bool) -> bool {
        self.checks.push((name, passed));
        passed
    }

    pub(crate) fn all_passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|(_, passed)| *passed)
    }

    pub(crate) fn checks(&self) -> &[(&'static str, bool)] {
        &self.checks
    }

    fn print(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "\n{}", "=".repeat(50))?;
        writeln!(out, "📊 Test Results Summary:")?;
        for (name, passed) in &self.checks {
            writeln!(out, "  {name}: {}", if *passed { "✅" } else { "❌" })?;
        }
        if self.all_passed() {
            writeln!(out, "\n🎉 All tests passed! The backend is working correctly.")
        } else {
            writeln!(out, "\n⚠️  Some tests failed. Check the server logs for more details.")
        }
    }
}

/// Run the REST checks in order, then a short socket session.
///
/// Health, listing, and creation gate the rest of the run: if any of them
/// fails there is nothing meaningful left to check.
pub(crate) async fn run_api_smoke(
    backend: &BackendClient,
    reply_timeout: Duration,
    listen_window: Duration,
    out: &mut dyn Write,
) -> eyre::Result<ApiSmokeSummary> {
    let mut summary = ApiSmokeSummary::default();
    writeln!(out, "🚀 Starting Community Coin Server API Tests")?;
    writeln!(out, "{}", "=".repeat(50))?;

    writeln!(out, "Testing health endpoint...")?;
    let healthy = match backend.health().await {
        Ok(body) => {
            writeln!(out, "✅ Health check passed: {body}")?;
            true
        }
        Err(err) => {
            writeln!(out, "❌ Health check failed: {err}")?;
            false
        }
    };
    if !summary.record("Health Check", healthy) {
        writeln!(out, "❌ Health check failed. Is the server running?")?;
        summary.print(out)?;
        return Ok(summary);
    }

    writeln!(out, "\nTesting get tokens endpoint...")?;
    let listed = match backend.list_tokens().await {
        Ok(list) => {
            writeln!(out, "✅ Get tokens successful: {} tokens found", list.tokens.len())?;
            for token in list.tokens.iter().take(2) {
                writeln!(
                    out,
                    "  - {} ({})",
                    token.name.as_deref().unwrap_or("Unknown"),
                    token.category.as_deref().unwrap_or("Unknown")
                )?;
            }
            true
        }
        Err(err) => {
            writeln!(out, "❌ Get tokens failed: {err}")?;
            false
        }
    };
    if !summary.record("Get Tokens", listed) {
        summary.print(out)?;
        return Ok(summary);
    }

    writeln!(out, "\nTesting create token endpoint...")?;
    let pub_address = match backend.create_token(&NewToken::smoke_sample()).await {
        Ok(created) => {
            writeln!(
                out,
                "✅ Create token successful: {}",
                created.token.name.as_deref().unwrap_or("Unknown")
            )?;
            writeln!(
                out,
                "  Transaction hash: {}",
                created.transaction_hash.as_deref().unwrap_or("Unknown")
            )?;
            created.token.pub_address
        }
        Err(err) => {
            writeln!(out, "❌ Create token failed: {err}")?;
            None
        }
    };
    let Some(pub_address) = pub_address else {
        summary.record("Create Token", false);
        writeln!(out, "❌ Token creation failed")?;
        summary.print(out)?;
        return Ok(summary);
    };
    summary.record("Create Token", true);

    writeln!(out, "\nTesting get token by address: {pub_address}")?;
    let fetched = match backend.get_token(&pub_address).await {
        Ok(token) => {
            writeln!(
                out,
                "✅ Get token by address successful: {}",
                token.name.as_deref().unwrap_or("Unknown")
            )?;
            writeln!(out, "  Market cap: ${:.2}", token.market_cap.unwrap_or(0.0))?;
            writeln!(out, "  Involvement: {}", token.involvement.unwrap_or(0.0))?;
            true
        }
        Err(err) => {
            writeln!(out, "❌ Get token by address failed: {err}")?;
            false
        }
    };
    summary.record("Get Token by Address", fetched);

    writeln!(out, "\nTesting add discussion to token: {pub_address}")?;
    let discussed = report_unit(
        out,
        "Add discussion",
        backend
            .add_discussion(&pub_address, &Discussion::smoke_sample())
            .await,
    )?;
    summary.record("Add Discussion", discussed);

    writeln!(out, "\nTesting stake tokens for token: {pub_address}")?;
    let staked = report_unit(
        out,
        "Stake tokens",
        backend
            .stake(&pub_address, SMOKE_WALLET, SMOKE_STAKE_AMOUNT)
            .await,
    )?;
    summary.record("Stake Tokens", staked);

    writeln!(out, "\nTesting get reward pool for token: {pub_address}")?;
    let pooled = match backend.reward_pool(&pub_address).await {
        Ok(Some(pool)) => {
            writeln!(out, "✅ Get reward pool successful")?;
            writeln!(out, "  Total staked: {}", pool.total_staked.unwrap_or(0.0))?;
            writeln!(out, "  Contributors: {}", pool.contributors.len())?;
            true
        }
        Ok(None) => {
            writeln!(out, "ℹ️  No reward pool found (expected for Tier1 tokens)")?;
            true
        }
        Err(err) => {
            writeln!(out, "❌ Get reward pool failed: {err}")?;
            false
        }
    };
    summary.record("Get Reward Pool", pooled);

    writeln!(out, "\nTesting WebSocket connection...")?;
    let socket_ok = match backend.websocket_url(API_SMOKE_WS_PATH) {
        Ok(url) => {
            let config = SessionConfig {
                url: url.to_string(),
                commands: vec!["subscribe".to_owned(), "create".to_owned()],
                reply_timeout,
                listen_window,
            };
            match ws::run_session(&config).await {
                Ok(report) => {
                    for reply in &report.replies {
                        writeln!(out, "✅ {} response: {}", reply.command, reply.reply)?;
                    }
                    for event in &report.events {
                        writeln!(out, "📡 Received event: {event}")?;
                    }
                    writeln!(out, "✅ WebSocket test completed")?;
                    true
                }
                Err(err) => {
                    if let Some(partial) = err.partial_report() {
                        for reply in &partial.replies {
                            writeln!(out, "✅ {} response: {}", reply.command, reply.reply)?;
                        }
                    }
                    writeln!(out, "❌ WebSocket test error: {}", err.failure())?;
                    false
                }
            }
        }
        Err(err) => {
            writeln!(out, "❌ WebSocket test error: {err}")?;
            false
        }
    };
    summary.record("WebSocket", socket_ok);

    summary.print(out)?;
    Ok(summary)
}

fn report_unit<E: std::fmt::Display>(
    out: &mut dyn Write,
    what: &str,
    result: Result<(), E>,
) -> std::io::Result<bool> {
    match result {
        Ok(()) => {
            writeln!(out, "✅ {what} successful")?;
            Ok(true)
        }
        Err(err) => {
            writeln!(out, "❌ {what} failed: {err}")?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use httpmock::prelude::*;
    use serde_json::json;
    use tokio_tungstenite::tungstenite::Message;

    use super::*;

    #[tokio::test]
    async fn failed_health_check_stops_the_run() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(503).body("starting");
            })
            .await;
        let tokens = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200).json_body(json!({"tokens": []}));
            })
            .await;

        let backend =
            BackendClient::new(&server.base_url(), Duration::from_secs(2)).expect("client");
        let mut out = Vec::new();
        let summary = run_api_smoke(
            &backend,
            Duration::from_secs(1),
            Duration::from_millis(10),
            &mut out,
        )
        .await
        .expect("smoke run must complete");

        assert!(!summary.all_passed());
        assert_eq!(summary.checks(), &[("Health Check", false)]);
        tokens.assert_hits_async(0).await;
        assert!(String::from_utf8(out).expect("utf8").contains("Is the server running?"));
    }

    #[tokio::test]
    async fn missing_pub_address_fails_creation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(200).json_body(json!({"status": "ok"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200)
                    .json_body(json!({"tokens": [{"name": "Alpha", "category": "Wild"}]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/tokens");
                then.status(200).json_body(json!({"token": {"name": "Test Token"}}));
            })
            .await;

        let backend =
            BackendClient::new(&server.base_url(), Duration::from_secs(2)).expect("client");
        let mut out = Vec::new();
        let summary = run_api_smoke(
            &backend,
            Duration::from_secs(1),
            Duration::from_millis(10),
            &mut out,
        )
        .await
        .expect("smoke run must complete");

        assert_eq!(
            summary.checks(),
            &[("Health Check", true), ("Get Tokens", true), ("Create Token", false)]
        );
        assert!(String::from_utf8(out).expect("utf8").contains("  - Alpha (Wild)"));
    }

    #[tokio::test]
    async fn ws_smoke_prints_replies_received_before_a_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(tcp)
                .await
                .expect("handshake");
            for _ in 0..2 {
                if let Some(Ok(Message::Text(cmd))) = ws.next().await {
                    ws.send(Message::Text(format!("ok:{cmd}")))
                        .await
                        .expect("send reply");
                }
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = SessionConfig {
            url: format!("ws://{addr}/api/ws"),
            reply_timeout: Duration::from_millis(300),
            listen_window: Duration::from_millis(100),
            ..SessionConfig::default()
        };
        let mut out = Vec::new();
        let err = run_ws_smoke(&config, &mut out)
            .await
            .expect_err("third command is never answered");

        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.contains("Response: ok:subscribe"));
        assert!(printed.contains("Response: ok:create"));
        assert!(printed.contains("❌ no reply to `buy` within 300 ms"));
        assert!(err.to_string().contains("after 2 replies"));
    }
}
