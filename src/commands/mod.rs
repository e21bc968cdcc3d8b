pub mod chart;
pub mod help;

use std::path::Path;
use tracing::error;

use crate::services::fetch_service::BlockSource;
use crate::services::intent_service::CompletionClient;
use crate::services::pipeline_service::ChartPipeline;
use crate::utils::one_line;

/// What the session should do after one line of input
#[derive(Debug, PartialEq)]
pub enum Reply {
    Print(String),
    Quit,
}

pub async fn handle_line<C: CompletionClient, S: BlockSource>(
    pipeline: &ChartPipeline<C, S>,
    output_dir: &Path,
    line: &str,
) -> Reply {
    let request = line.trim();

    match request.to_ascii_lowercase().as_str() {
        "" => return Reply::Print(String::new()),
        "quit" | "exit" => return Reply::Quit,
        "help" | "?" => return Reply::Print(help::execute()),
        _ => {}
    }

    match chart::execute(pipeline, output_dir, request).await {
        Ok(output) => Reply::Print(output),
        Err(e) => {
            error!("Chart request failed: {}", e);
            Reply::Print(format!("❌ {}", one_line(&e)))
        }
    }
}
