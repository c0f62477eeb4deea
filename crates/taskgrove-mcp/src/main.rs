mod tools;
mod version;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rust_mcp_sdk::error::SdkResult;
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ProtocolVersion, ServerCapabilities, ServerCapabilitiesTools,
};
use rust_mcp_sdk::{
    mcp_server::{server_runtime, McpServerOptions},
    McpServer, StdioTransport, ToMcpServerHandler, TransportOptions,
};

use taskgrove_core::store::{FileStore, MemoryStore, SnapshotStore};

use crate::tools::{McpContext, TaskgroveServerHandler};

#[derive(Parser)]
#[command(name = "taskgrove-mcp", version = version::FULL)]
struct Args {
    /// Path to the JSON task snapshot.
    #[arg(long, default_value = "taskgrove/tasks.json")]
    data_file: PathBuf,
    /// Serve from a fresh in-memory snapshot instead of a file.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> SdkResult<()> {
    let args = Args::parse();

    let server_details = InitializeResult {
        server_info: Implementation {
            name: "taskgrove".into(),
            version: version::FULL.into(),
            title: Some("TaskGrove MCP Server".into()),
            description: Some("MCP server for hierarchical agent task trees".into()),
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some("TaskGrove MCP server".into()),
        protocol_version: ProtocolVersion::V2025_11_25.into(),
    };

    let store: Arc<dyn SnapshotStore + Send + Sync> = if args.in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::new(args.data_file))
    };

    let transport = StdioTransport::new(TransportOptions::default())?;
    let handler = TaskgroveServerHandler {
        context: McpContext { store },
    };

    let server = server_runtime::create_server(McpServerOptions {
        server_details,
        transport,
        handler: handler.to_mcp_server_handler(),
        task_store: None,
        client_task_store: None,
    });

    server.start().await
}
