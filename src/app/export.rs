use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::engine::RunSummary;
use crate::pipeline::IterationResult;

pub(crate) async fn export_json(
    path: &Path,
    summary: &RunSummary,
    failures: &[IterationResult],
) -> Result<(), std::io::Error> {
    let payload = serde_json::json!({
        "stopped_early": summary.stopped_early,
        "report": summary.report,
        "trend": summary.trend,
        "failures": failures,
    });

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    let json = serde_json::to_vec_pretty(&payload).map_err(std::io::Error::other)?;
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}
