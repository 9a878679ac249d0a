// src/task/file_provider.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use super::{RunContext, Task, TaskFuture};
use crate::fs::normalize_path;

/// Writes generated contents (a header, a glue source file...) to one path.
///
/// The contents are produced in memory by an earlier compiler stage, so the
/// task has no inputs: it runs when its file is missing and is skipped
/// otherwise. A relative path is resolved against the run's output
/// directory during `prepare`.
#[derive(Debug, Clone)]
pub struct FileProviderTask {
    label: String,
    outputs: Vec<PathBuf>,
    contents: Vec<u8>,
}

impl FileProviderTask {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        Self {
            label: format!("provide {}", path.display()),
            outputs: vec![path],
            contents: contents.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Task for FileProviderTask {
    fn inputs(&self) -> &[PathBuf] {
        &[]
    }

    fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn prepare(&mut self, ctx: &RunContext) -> Result<()> {
        for path in self.outputs.iter_mut() {
            if path.is_relative() {
                *path = normalize_path(&ctx.output_dir().join(&*path));
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !ctx.fs().exists(parent) {
                    ctx.fs().create_dir_all(parent)?;
                }
            }
        }
        Ok(())
    }

    fn execute<'a>(&'a self, ctx: &'a RunContext) -> TaskFuture<'a> {
        Box::pin(async move {
            for path in &self.outputs {
                debug!(task = %self.label, path = ?path, "writing generated file");
                ctx.fs()
                    .write(path, &self.contents)
                    .with_context(|| format!("task '{}' writing {:?}", self.label, path))?;
            }
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::config::ExecConfig;
    use crate::diagnostics::MemorySink;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;

    #[tokio::test]
    async fn writes_contents_through_the_context_fs() {
        let fs = MockFileSystem::new();
        let ctx = RunContext::new(
            ExecConfig::default(),
            Arc::new(MemorySink::new()),
            Arc::new(fs.clone()),
        );
        let task = FileProviderTask::new("gen/glue.h", "#pragma once\n");

        assert!(!task.force_execute());
        assert_eq!(task.label(), "provide gen/glue.h");
        assert!(task.execute(&ctx).await.unwrap());
        assert_eq!(
            fs.read_to_string(Path::new("gen/glue.h")).unwrap(),
            "#pragma once\n"
        );
    }

    #[test]
    fn relative_path_lands_under_output_dir() {
        let fs = MockFileSystem::new();
        let ctx = RunContext::new(
            ExecConfig::default().with_output_dir("build/gen"),
            Arc::new(MemorySink::new()),
            Arc::new(fs.clone()),
        );
        let mut relative = FileProviderTask::new("include/glue.h", "");
        let mut absolute = FileProviderTask::new("/opt/glue.h", "");

        relative.prepare(&ctx).unwrap();
        absolute.prepare(&ctx).unwrap();

        assert_eq!(relative.outputs(), [PathBuf::from("build/gen/include/glue.h")]);
        assert_eq!(relative.label(), "provide include/glue.h");
        assert!(fs.exists(Path::new("build/gen/include")));
        assert_eq!(absolute.outputs(), [PathBuf::from("/opt/glue.h")]);
    }
}
