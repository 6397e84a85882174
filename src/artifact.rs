//! Artifact persistence
//!
//! Trained pipelines and reports are stored as pretty-printed JSON so they
//! can be diffed across runs. The segment error table additionally exports
//! to CSV for spreadsheet review.

use crate::error::Result;
use crate::evaluation::{EvaluationReport, SegmentError};
use crate::training::{TrainedPipeline, TrainingReport};
use std::path::Path;
use tracing::info;

/// Serialize a trained pipeline, including all frozen preprocessing
/// statistics, to a JSON file.
pub fn save_pipeline(pipeline: &TrainedPipeline, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(pipeline)?;
    std::fs::write(path.as_ref(), json)?;
    info!(path = %path.as_ref().display(), "saved pipeline");
    Ok(())
}

/// Load a pipeline saved by [`save_pipeline`]. The result predicts
/// identically to the original.
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<TrainedPipeline> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn save_training_report(report: &TrainingReport, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn save_evaluation_report(report: &EvaluationReport, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Export the segment error table as CSV with a header row. String values
/// are quoted; embedded quotes are doubled.
pub fn save_segments_csv(segments: &[SegmentError], path: impl AsRef<Path>) -> Result<()> {
    let mut out = String::from("segment_column,segment_value,sample_count,error\n");
    for segment in segments {
        out.push_str(&format!(
            "\"{}\",\"{}\",{},{}\n",
            segment.segment_column.replace('"', "\"\""),
            segment.segment_value.replace('"', "\"\""),
            segment.sample_count,
            segment.error
        ));
    }
    std::fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_csv_format() {
        let segments = vec![SegmentError {
            segment_column: "plan".to_string(),
            segment_value: "pro".to_string(),
            sample_count: 42,
            error: 0.125,
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.csv");
        save_segments_csv(&segments, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("segment_column,segment_value,sample_count,error")
        );
        assert_eq!(lines.next(), Some("\"plan\",\"pro\",42,0.125"));
    }
}
