//! Serves the demo scene over stdin/stdout, one JSON request per line
//!
//! A request is `{"tool": "<name>", "arguments": {...}}` and gets one response line back.
//! `{"tool": "tools/list"}` lists the published tools. Completion notices of two-phase operations
//! arrive as separate `{"notice": {...}}` lines.

use std::error::Error;
use std::sync::Arc;

use reflect_mcp::BridgeConfig;
use reflect_mcp::HostThread;
use reflect_mcp::Tools;
use reflect_mcp::log_tools::init_file_tracing;
use reflect_mcp::tools::tool_definitions;
use reflect_mcp_test_app::SceneHost;
use reflect_mcp_test_app::scene_reflector;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

const LIST_TOOLS: &str = "tools/list";

#[derive(Deserialize)]
struct Request {
    tool:      String,
    #[serde(default)]
    arguments: Value,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = BridgeConfig::from_env();
    init_file_tracing(config.trace_level);

    let reflector = Arc::new(scene_reflector(config));
    let host = HostThread::spawn(|| SceneHost::demo().0).map_err(|report| format!("{report:?}"))?;
    let tools = Tools::new(reflector, host);
    info!("Scene server started");

    let (outgoing, mut lines) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines.recv().await {
            if stdout.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut notices = tools.operations().subscribe();
    let notice_lines = outgoing.clone();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            if notice_lines.send(json!({ "notice": notice }).to_string()).is_err() {
                break;
            }
        }
    });

    let shutdown = CancellationToken::new();
    let mut requests = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = requests.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) if request.tool == LIST_TOOLS => serde_json::to_value(tool_definitions())?,
            Ok(request) => {
                let response = tools
                    .handle_named(&request.tool, request.arguments, shutdown.child_token())
                    .await;
                serde_json::to_value(response)?
            },
            Err(e) => json!({ "status": "error", "message": format!("[Error] Invalid request: {e}") }),
        };
        outgoing.send(response.to_string())?;
    }

    shutdown.cancel();
    drop(outgoing);
    drop(tools);
    let _ = writer.await;
    info!("Scene server stopped");
    Ok(())
}
