use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::macros::{mcp_tool, JsonSchema};
use rust_mcp_sdk::schema::{
    schema_utils::CallToolError, CallToolRequestParams, CallToolResult, ListToolsResult,
    PaginatedRequestParams, RpcError, TextContent,
};
use rust_mcp_sdk::tool_box;
use rust_mcp_sdk::{mcp_server::ServerHandler, McpServer};
use serde::{Deserialize, Serialize};

use crate::version;

use taskgrove_core::engine::{self, NewTask, UpdateTask};
use taskgrove_core::error::EngineError;
use taskgrove_core::store::SnapshotStore;
use taskgrove_core::task::{TaskStatus, TaskTree};

#[derive(Clone)]
pub struct McpContext {
    pub store: Arc<dyn SnapshotStore + Send + Sync>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ListInput {
    String(String),
    List(Vec<String>),
}

fn parse_list_input(value: Option<&ListInput>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(ListInput::List(values)) => values
            .iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect(),
        Some(ListInput::String(value)) => parse_list_string(value),
    }
}

fn parse_list_string(value: &str) -> Vec<String> {
    let raw = value.trim();
    if raw.is_empty() || raw == "[]" {
        return Vec::new();
    }
    let inner = if raw.starts_with('[') && raw.ends_with(']') {
        raw[1..raw.len() - 1].trim()
    } else {
        raw
    };
    if inner.is_empty() {
        return Vec::new();
    }
    inner
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn ok_text(content: String) -> Result<CallToolResult, CallToolError> {
    Ok(CallToolResult::text_content(vec![TextContent::from(
        content,
    )]))
}

fn ok_json(value: serde_json::Value) -> Result<CallToolResult, CallToolError> {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    ok_text(text)
}

/// Engine failures become structured `{code, message}` payloads so callers
/// can branch on the code instead of parsing prose.
fn engine_error(err: EngineError) -> Result<CallToolResult, CallToolError> {
    let mut payload = serde_json::json!({
        "ok": false,
        "error": {
            "code": err.code(),
            "message": err.to_string(),
        }
    });
    if let EngineError::OrderViolation { blockers, .. } = &err {
        if let Ok(value) = serde_json::to_value(blockers) {
            payload["error"]["blockers"] = value;
        }
    }
    ok_json(payload)
}

fn load_tree(context: &McpContext) -> Result<TaskTree, CallToolError> {
    context.store.load().map_err(CallToolError::new)
}

fn save_tree(context: &McpContext, tree: &TaskTree) -> Result<(), CallToolError> {
    context.store.save(tree).map_err(CallToolError::new)
}

#[mcp_tool(name = "version", description = "Return TaskGrove version information.")]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct VersionTool {}

#[mcp_tool(
    name = "create_task",
    description = "Create a task, optionally nested under a parent at a given position."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateTaskTool {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    /// Insertion index in the parent's child sequence; appended when omitted.
    pub position: Option<u32>,
    pub completion_criteria: Option<ListInput>,
    pub constraints: Option<ListInput>,
}

#[mcp_tool(name = "get_task", description = "Show a single task (with its subtree) by id.")]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetTaskTool {
    pub task_id: String,
}

#[mcp_tool(
    name = "list_tasks",
    description = "List top-level tasks, or the children of a parent task."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListTasksTool {
    pub parent_id: Option<String>,
}

#[mcp_tool(
    name = "update_task",
    description = "Update task fields (name, description, status, resolution, completion criteria, constraints). Unlike start/complete, a status update is unrestricted and can move a done task back to todo."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateTaskTool {
    pub task_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// One of "todo", "in_progress", "done".
    pub status: Option<String>,
    pub resolution: Option<String>,
    pub completion_criteria: Option<ListInput>,
    pub constraints: Option<ListInput>,
}

#[mcp_tool(
    name = "delete_task",
    description = "Delete a task. Tasks that still have subtasks cannot be deleted."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DeleteTaskTool {
    pub task_id: String,
}

#[mcp_tool(
    name = "start_task",
    description = "Start a task. Enforces execution order, auto-starts the first incomplete descent, and returns the hierarchy summary."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct StartTaskTool {
    pub task_id: String,
}

#[mcp_tool(
    name = "complete_task",
    description = "Complete a task with a resolution. Auto-completes satisfied ancestors and reports the next workable task."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CompleteTaskTool {
    pub task_id: String,
    pub resolution: String,
}

// Generates enum TaskgroveTools with variants for each tool
tool_box!(
    TaskgroveTools,
    [
        VersionTool,
        CreateTaskTool,
        GetTaskTool,
        ListTasksTool,
        UpdateTaskTool,
        DeleteTaskTool,
        StartTaskTool,
        CompleteTaskTool
    ]
);

pub struct TaskgroveServerHandler {
    pub context: McpContext,
}

#[async_trait]
impl ServerHandler for TaskgroveServerHandler {
    async fn handle_list_tools_request(
        &self,
        _params: Option<PaginatedRequestParams>,
        _runtime: std::sync::Arc<dyn McpServer>,
    ) -> Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: TaskgroveTools::tools(),
        })
    }

    async fn handle_call_tool_request(
        &self,
        params: CallToolRequestParams,
        _runtime: std::sync::Arc<dyn McpServer>,
    ) -> Result<CallToolResult, CallToolError> {
        let tool = TaskgroveTools::try_from(params).map_err(CallToolError::new)?;
        match tool {
            TaskgroveTools::VersionTool(tool) => tool.call(&self.context),
            TaskgroveTools::CreateTaskTool(tool) => tool.call(&self.context),
            TaskgroveTools::GetTaskTool(tool) => tool.call(&self.context),
            TaskgroveTools::ListTasksTool(tool) => tool.call(&self.context),
            TaskgroveTools::UpdateTaskTool(tool) => tool.call(&self.context),
            TaskgroveTools::DeleteTaskTool(tool) => tool.call(&self.context),
            TaskgroveTools::StartTaskTool(tool) => tool.call(&self.context),
            TaskgroveTools::CompleteTaskTool(tool) => tool.call(&self.context),
        }
    }
}

impl VersionTool {
    pub fn call(&self, _context: &McpContext) -> Result<CallToolResult, CallToolError> {
        ok_json(serde_json::json!({
            "name": "taskgrove",
            "version": env!("CARGO_PKG_VERSION"),
            "core": taskgrove_core::version(),
            "full": version::FULL,
        }))
    }
}

impl CreateTaskTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let mut tree = load_tree(context)?;
        let new = NewTask {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            parent_id: self.parent_id.clone(),
            position: self.position.map(|p| p as usize),
            completion_criteria: parse_list_input(self.completion_criteria.as_ref()),
            constraints: parse_list_input(self.constraints.as_ref()),
        };
        match engine::create(&mut tree, new) {
            Ok(task) => {
                save_tree(context, &tree)?;
                ok_json(serde_json::json!({"ok": true, "task": task}))
            }
            Err(err) => engine_error(err),
        }
    }
}

impl GetTaskTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let tree = load_tree(context)?;
        match engine::get(&tree, &self.task_id) {
            Ok(task) => ok_json(serde_json::json!({"ok": true, "task": task})),
            Err(err) => engine_error(err),
        }
    }
}

impl ListTasksTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let tree = load_tree(context)?;
        match engine::list(&tree, self.parent_id.as_deref()) {
            Ok(tasks) => ok_json(serde_json::json!({
                "ok": true,
                "count": tasks.len(),
                "tasks": tasks,
            })),
            Err(err) => engine_error(err),
        }
    }
}

impl UpdateTaskTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let status = match self.status.as_deref() {
            Some(value) => match value.parse::<TaskStatus>() {
                Ok(status) => Some(status),
                Err(err) => return engine_error(err),
            },
            None => None,
        };
        let mut tree = load_tree(context)?;
        let fields = UpdateTask {
            name: self.name.clone(),
            description: self.description.clone(),
            status,
            resolution: self.resolution.clone(),
            completion_criteria: self
                .completion_criteria
                .as_ref()
                .map(|value| parse_list_input(Some(value))),
            constraints: self
                .constraints
                .as_ref()
                .map(|value| parse_list_input(Some(value))),
        };
        match engine::update(&mut tree, &self.task_id, fields) {
            Ok(task) => {
                save_tree(context, &tree)?;
                ok_json(serde_json::json!({"ok": true, "task": task}))
            }
            Err(err) => engine_error(err),
        }
    }
}

impl DeleteTaskTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let mut tree = load_tree(context)?;
        match engine::delete(&mut tree, &self.task_id) {
            Ok(task) => {
                save_tree(context, &tree)?;
                ok_json(serde_json::json!({"ok": true, "deleted": task}))
            }
            Err(err) => engine_error(err),
        }
    }
}

impl StartTaskTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let mut tree = load_tree(context)?;
        match engine::start(&mut tree, &self.task_id) {
            Ok(outcome) => {
                save_tree(context, &tree)?;
                ok_json(serde_json::json!({
                    "ok": true,
                    "task": outcome.task,
                    "started": outcome.started,
                    "message": outcome.message,
                    "hierarchy": outcome.hierarchy,
                }))
            }
            Err(err) => engine_error(err),
        }
    }
}

impl CompleteTaskTool {
    pub fn call(&self, context: &McpContext) -> Result<CallToolResult, CallToolError> {
        let mut tree = load_tree(context)?;
        match engine::complete(&mut tree, &self.task_id, &self.resolution) {
            Ok(outcome) => {
                save_tree(context, &tree)?;
                ok_json(serde_json::json!({
                    "ok": true,
                    "task": outcome.task,
                    "auto_completed": outcome.auto_completed,
                    "next_task_id": outcome.next_task_id,
                    "message": outcome.message,
                    "progress": outcome.progress,
                }))
            }
            Err(err) => engine_error(err),
        }
    }
}
