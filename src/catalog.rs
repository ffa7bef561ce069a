//! Built-in tools, resources and prompts served by the CLI.

use std::time::Duration;

use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::context::ExecutionContext;
use crate::service::{DispatchTool, PromptKey, Service, StaticPrompt, StaticResource};
use crate::tree::{DispatchNode, HandlerError, HandlerResult, TreeBuilder};

/// A service preloaded with the example catalog.
pub fn builtin_service(config: ServiceConfig) -> Service {
    let service = Service::new(config);

    service.tools().register(DispatchTool::new(
        "echo",
        "Echoes a message, optionally transformed or delayed",
        echo_tree(),
    ));
    service.tools().register(DispatchTool::new(
        "geometry",
        "Computes areas and names of simple shapes",
        geometry_tree(),
    ));

    service.resources().register(StaticResource::new(
        "file://example.txt",
        "Example Resource",
        "An example plain-text resource",
        "This is an example resource.",
    ));

    service.prompts().register(
        StaticPrompt::new(
            "example_prompt",
            "Greets someone with a chosen action",
            "Hello {{name}}, I would like to {{action}} you.",
        )
        .key(
            PromptKey::new("name", "The name to use in the prompt")
                .required()
                .with_examples(["Alice", "Bob", "Charlie"]),
        )
        .key(
            PromptKey::new("action", "The action to perform")
                .with_default("greet")
                .with_enum(["greet", "farewell", "thank"]),
        ),
    );

    service
}

/// Dispatches on `action`; a bare `delay_ms` answers asynchronously.
pub fn echo_tree() -> DispatchNode {
    TreeBuilder::new()
        .field("action")
        .leaf("upper", |ctx| {
            let message = required_message(ctx)?;
            Ok(json!({ "echo": message.to_uppercase() }))
        })
        .leaf_data("length", |data| {
            let message = data.get("message").and_then(Value::as_str).unwrap_or_default();
            Ok(json!({ "length": message.chars().count() }))
        })
        .optional("delay_ms", delayed_echo)
        .default_leaf(|ctx| {
            let message = required_message(ctx)?;
            Ok(json!({ "echo": message }))
        })
        .build()
}

/// Dispatches on `shape`, then on the integer `sides` for polygons.
pub fn geometry_tree() -> DispatchNode {
    TreeBuilder::new()
        .field("shape")
        .leaf("circle", |ctx| {
            let radius = ctx.float("radius");
            Ok(json!({ "area": std::f64::consts::PI * radius * radius }))
        })
        .leaf("square", |ctx| {
            let side = ctx.float("side");
            Ok(json!({ "area": side * side }))
        })
        .branch(
            "polygon",
            TreeBuilder::new()
                .field("sides")
                .leaf(3, |_| Ok(json!({ "name": "triangle" })))
                .leaf(4, |_| Ok(json!({ "name": "quadrilateral" })))
                .leaf(6, |_| Ok(json!({ "name": "hexagon" })))
                .default_leaf(|ctx| Ok(json!({ "name": format!("{}-gon", ctx.int("sides")) }))),
        )
        .build()
}

fn required_message(ctx: &ExecutionContext) -> Result<&str, HandlerError> {
    match ctx.string("message") {
        "" => Err(HandlerError::invalid("message", "must be a non-empty string")),
        message => Ok(message),
    }
}

fn delayed_echo(ctx: &ExecutionContext) -> HandlerResult {
    let message = required_message(ctx)?.to_string();
    let delay_ms = u64::try_from(ctx.int("delay_ms")).unwrap_or(0);
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| HandlerError::failed("delayed echo requires an async runtime"))?;

    let completer = ctx.completer();
    runtime.spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        completer.complete(json!({ "echo": message, "delayedMs": delay_ms }));
    });
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Outcome;
    use serde_json::Map;

    fn ctx(value: Value) -> ExecutionContext {
        ExecutionContext::from_value(value)
    }

    #[test]
    fn test_echo_branches() {
        let tree = echo_tree();
        let outcome = tree
            .evaluate(&ctx(json!({"action": "upper", "message": "hi"})))
            .unwrap();
        assert_eq!(outcome, Outcome::Matched(json!({"echo": "HI"})));

        let outcome = tree
            .evaluate(&ctx(json!({"action": "length", "message": "héllo"})))
            .unwrap();
        assert_eq!(outcome, Outcome::Matched(json!({"length": 5})));

        let outcome = tree.evaluate(&ctx(json!({"message": "plain"}))).unwrap();
        assert_eq!(outcome, Outcome::Matched(json!({"echo": "plain"})));
    }

    #[test]
    fn test_echo_requires_message() {
        let err = echo_tree().evaluate(&ExecutionContext::new(Map::new())).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { ref name, .. } if name == "message"));
    }

    #[test]
    fn test_delayed_echo_without_runtime() {
        let err = echo_tree()
            .evaluate(&ctx(json!({"delay_ms": 5, "message": "later"})))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Failed(_)));
    }

    #[test]
    fn test_geometry_polygon_sides() {
        let tree = geometry_tree();
        let name = |sides: Value| {
            tree.evaluate(&ctx(json!({"shape": "polygon", "sides": sides})))
                .unwrap()
                .into_result()
                .unwrap()["name"]
                .clone()
        };
        assert_eq!(name(json!(3)), json!("triangle"));
        assert_eq!(name(json!(6.0)), json!("hexagon"));
        assert_eq!(name(json!(8)), json!("8-gon"));
    }

    #[test]
    fn test_builtin_service_catalog() {
        let service = builtin_service(ServiceConfig::default());
        assert_eq!(service.tools().len(), 2);
        assert_eq!(service.resources().len(), 1);
        let text = service
            .execute_prompt("example_prompt", json!({"name": "Ada"}).as_object().unwrap())
            .unwrap();
        assert_eq!(text, "Hello Ada, I would like to greet you.");
    }
}
