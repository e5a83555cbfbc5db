//! Tool definitions and the registry adapters consult during streaming.
//!
//! A tool is a named local function with a JSON Schema parameter
//! description. The registry maps names to handlers; when a streamed
//! turn ends in tool use, the adapter looks each call up by name and
//! invokes it synchronously on the consumer's thread, in the order the
//! model declared the calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON Schema value describing a tool's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSchema(Value);

impl JsonSchema {
    /// Wraps a schema value.
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    /// Borrows the underlying schema value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// The schema of one tool, as offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name, unique within a request.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the argument object, including required fields.
    pub parameters: JsonSchema,
}

/// Error returned by tool execution.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    /// Human-readable error description.
    pub message: String,
}

impl ToolError {
    /// Creates a new tool error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A tool implementation: its definition plus a synchronous invoke.
///
/// Handlers run on the consumer's thread while the outer stream is
/// paused, so they should be quick or deliberately blocking.
pub trait ToolHandler: Send + Sync {
    /// The schema offered to the model for this tool.
    fn definition(&self) -> &ToolDefinition;

    /// Executes the tool with the decoded argument object.
    fn invoke(&self, arguments: &Map<String, Value>) -> Result<String, ToolError>;
}

/// Wraps a closure as a [`ToolHandler`].
///
/// # Example
///
/// ```rust
/// use rivulet_core::{tool_fn, JsonSchema, ToolDefinition, ToolRegistry};
/// use serde_json::json;
///
/// let mut registry = ToolRegistry::new();
/// registry.register(tool_fn(
///     ToolDefinition {
///         name: "weather".into(),
///         description: "Get the weather for a city".into(),
///         parameters: JsonSchema::new(json!({
///             "type": "object",
///             "properties": { "city": { "type": "string" } },
///             "required": ["city"]
///         })),
///     },
///     |args| {
///         let city = args["city"].as_str().unwrap_or("somewhere");
///         Ok(format!("It is sunny in {city}."))
///     },
/// ));
/// ```
pub fn tool_fn<F>(definition: ToolDefinition, invoke: F) -> impl ToolHandler
where
    F: Fn(&Map<String, Value>) -> Result<String, ToolError> + Send + Sync + 'static,
{
    struct FnHandler<F> {
        definition: ToolDefinition,
        invoke: F,
    }

    impl<F> ToolHandler for FnHandler<F>
    where
        F: Fn(&Map<String, Value>) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        fn invoke(&self, arguments: &Map<String, Value>) -> Result<String, ToolError> {
            (self.invoke)(arguments)
        }
    }

    FnHandler { definition, invoke }
}

/// A registry of tool handlers, indexed by name.
///
/// Read-only during a streaming call; the adapter holds an `Arc` to it
/// for the lifetime of the stream.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl Clone for ToolRegistry {
    /// Clones `Arc` pointers to the handlers, not the handlers themselves.
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool handler.
    ///
    /// If a handler with the same name already exists, it is replaced.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> &mut Self {
        let name = handler.definition().name.clone();
        self.handlers.insert(name, Arc::new(handler));
        self
    }

    /// Registers a shared tool handler.
    pub fn register_shared(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        let name = handler.definition().name.clone();
        self.handlers.insert(name, handler);
        self
    }

    /// Returns the handler for the given tool name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Returns whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the definitions of all registered tools.
    ///
    /// Pass this as [`ChatRequest::tools`](crate::ChatRequest::tools) to
    /// offer the registered tools to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.handlers
            .values()
            .map(|h| h.definition().clone())
            .collect()
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
