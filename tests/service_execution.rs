//! Service-level execution against the built-in catalog.

use std::io::Write;

use dispatch_tree::catalog::builtin_service;
use dispatch_tree::config::{load_config, ServiceConfig};
use dispatch_tree::context::ContextError;
use dispatch_tree::service::{DispatchTool, Response, Service, ServiceError};
use dispatch_tree::TreeBuilder;
use serde_json::json;

mod common;
use common::data;

fn service_with_timeout(timeout_ms: u64) -> dispatch_tree::Service {
    let mut config = ServiceConfig::default();
    config.execution.async_timeout_ms = timeout_ms;
    builtin_service(config)
}

#[tokio::test]
async fn test_sync_tool_execution() {
    let service = service_with_timeout(1000);
    let execution = service
        .execute_tool("echo", data(json!({"action": "upper", "message": "hello"})))
        .await
        .unwrap();

    assert_eq!(execution.tool, "echo");
    assert_eq!(execution.result, json!({"echo": "HELLO"}));
    assert!(!execution.asynchronous);
}

#[tokio::test]
async fn test_async_tool_execution() {
    let service = service_with_timeout(1000);
    let execution = service
        .execute_tool("echo", data(json!({"delay_ms": 10, "message": "later"})))
        .await
        .unwrap();

    assert!(execution.asynchronous);
    assert_eq!(execution.result, json!({"echo": "later", "delayedMs": 10}));
}

#[tokio::test]
async fn test_async_deadline_exceeded() {
    let service = service_with_timeout(10);
    let err = service
        .execute_tool("echo", data(json!({"delay_ms": 500, "message": "too slow"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::AsyncTimeout { timeout_ms: 10, .. }));
    assert_eq!(err.to_string(), "tool 'echo' did not complete within 10ms");
}

#[tokio::test]
async fn test_no_branch_surfaces_diagnostic() {
    let service = service_with_timeout(1000);
    let err = service
        .execute_tool("geometry", data(json!({"shape": "cube"})))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid value 'cube' for key 'shape'. Supported values: [circle, square, polygon]"
    );
    let response = Response::from_execution(Err(err));
    assert!(!response.success);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn test_handler_and_lookup_errors() {
    let service = service_with_timeout(1000);

    let err = service
        .execute_tool("echo", data(json!({"action": "upper"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Handler { ref tool, .. } if tool == "echo"));

    let err = service.execute_tool("nope", data(json!({}))).await.unwrap_err();
    assert!(matches!(err, ServiceError::ToolNotFound(_)));
}

#[tokio::test]
async fn test_execution_envelope_shape() {
    let service = service_with_timeout(1000);
    let result = service
        .execute_tool("geometry", data(json!({"shape": "square", "side": 3})))
        .await;
    let value = serde_json::to_value(Response::from_execution(result)).unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["tool"], "geometry");
    assert_eq!(value["data"]["result"], json!({"area": 9.0}));
    assert_eq!(value["data"]["asynchronous"], false);
    assert!(value["data"]["contextId"].is_string());
}

#[test]
fn test_listings_are_sorted() {
    let service = service_with_timeout(1000);
    let names: Vec<String> = service.tools().infos().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["echo", "geometry"]);

    let schema = &service.tools().infos()[1].input_schema;
    assert_eq!(
        schema["properties"]["shape"]["enum"],
        json!(["circle", "square", "polygon"])
    );
    assert!(schema["properties"]["sides"].get("enum").is_none());
}

#[test]
fn test_config_file_drives_server_info() {
    let path = std::env::temp_dir().join(format!("dispatch-tree-{}.toml", uuid::Uuid::new_v4()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "[server]\nname = \"Scenario Service\"\n\n[execution]\nasync_timeout_ms = 250"
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let service = builtin_service(config);
    let info = service.server_info();
    assert_eq!(info.name, "Scenario Service");
    assert_eq!(info.status, "running");
    assert_eq!(service.config().execution.async_timeout_ms, 250);
}

#[tokio::test]
async fn test_handler_holding_wait_handle() {
    let service = Service::new(ServiceConfig::default());
    let tree = TreeBuilder::new()
        .handler(|ctx| {
            let handle = ctx.wait_handle();
            assert!(handle.is_some());
            Ok(ctx.trigger_async(json!("unseen")))
        })
        .build();
    service
        .tools()
        .register(DispatchTool::new("greedy", "Keeps its own wait handle", tree));

    let err = service.execute_tool("greedy", data(json!({}))).await.unwrap_err();
    assert!(matches!(err, ServiceError::Context(ContextError::HandleTaken)));
}

#[test]
fn test_read_builtin_resource() {
    let service = service_with_timeout(1000);
    let contents = service.read_resource("file://example.txt").unwrap();
    assert_eq!(contents.name, "Example Resource");
    assert_eq!(contents.mime_type, "text/plain");
    assert_eq!(contents.contents, "This is an example resource.");

    let value = serde_json::to_value(Response::success("Resource retrieved", contents)).unwrap();
    assert_eq!(value["data"]["url"], "file://example.txt");
    assert_eq!(value["data"]["mimeType"], "text/plain");

    assert!(matches!(
        service.read_resource("file://missing.txt"),
        Err(ServiceError::ResourceNotFound(_))
    ));
}
