pub mod documents;
pub mod highlights;
pub mod outcome;
pub mod validate;
mod registry;

pub use documents::{
    DeleteDocumentTool, ListDocumentsTool, ListTagsTool, SaveDocumentTool, TopicSearchTool,
    UpdateDocumentTool,
};
pub use highlights::{
    BookHighlightsTool, CreateHighlightTool, DailyReviewTool, ExportHighlightsTool, ListBooksTool,
    ListHighlightsTool, SearchHighlightsTool,
};
pub use registry::{
    json_schema_array, json_schema_boolean, json_schema_integer, json_schema_object,
    json_schema_string, Tool, ToolRegistry,
};

use readwise_mcp_client::ReadwiseClient;
use readwise_mcp_core::shape::ShapeConfig;
use std::sync::Arc;

/// Build a registry holding every gateway tool.
pub fn default_registry(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SaveDocumentTool::new(client.clone())));
    registry.register(Arc::new(ListDocumentsTool::new(
        client.clone(),
        shape.clone(),
    )));
    registry.register(Arc::new(UpdateDocumentTool::new(client.clone())));
    registry.register(Arc::new(DeleteDocumentTool::new(client.clone())));
    registry.register(Arc::new(ListTagsTool::new(client.clone())));
    registry.register(Arc::new(TopicSearchTool::new(client.clone(), shape.clone())));
    registry.register(Arc::new(ListHighlightsTool::new(
        client.clone(),
        shape.clone(),
    )));
    registry.register(Arc::new(DailyReviewTool::new(client.clone(), shape.clone())));
    registry.register(Arc::new(SearchHighlightsTool::new(
        client.clone(),
        shape.clone(),
    )));
    registry.register(Arc::new(ListBooksTool::new(client.clone())));
    registry.register(Arc::new(BookHighlightsTool::new(
        client.clone(),
        shape.clone(),
    )));
    registry.register(Arc::new(ExportHighlightsTool::new(client.clone(), shape)));
    registry.register(Arc::new(CreateHighlightTool::new(client)));
    registry
}
