//! Copying selected attachment files into a per-record directory.

use std::io;
use std::path::{Path, PathBuf};

use projhis_core::types::DbId;

/// Attachment files staged for one submission.
///
/// Built from the form's selection before the insert; copied once the new
/// record id is known. Only the file names are persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentPlan {
    files: Vec<(PathBuf, String)>,
}

impl AttachmentPlan {
    /// Stage every selected path that is an existing regular file.
    ///
    /// Missing files are skipped. When two paths share a file name only the
    /// first is kept, since both would land on the same destination.
    pub fn from_selection(paths: &[PathBuf]) -> Self {
        let mut files: Vec<(PathBuf, String)> = Vec::new();
        for path in paths {
            if !path.is_file() {
                tracing::warn!(path = %path.display(), "Attachment not found, skipping");
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!(path = %path.display(), "Attachment has no usable file name, skipping");
                continue;
            };
            if files.iter().any(|(_, existing)| existing == name) {
                tracing::warn!(path = %path.display(), "Duplicate attachment file name, skipping");
                continue;
            }
            files.push((path.clone(), name.to_string()));
        }
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names as they will be stored.
    pub fn names(&self) -> Vec<String> {
        self.files.iter().map(|(_, name)| name.clone()).collect()
    }

    /// The directory attachments for record `id` are copied into.
    pub fn target_dir(save_root: &Path, id: DbId) -> PathBuf {
        save_root.join(id.to_string())
    }

    /// Copy every staged file into `<save_root>/<id>/`.
    ///
    /// Does nothing for an empty plan. On failure everything this call wrote
    /// is removed again; files that were already in the directory are left
    /// in place. The returned [`CopiedAttachments`] can undo a successful
    /// copy if the record is later rolled back.
    pub fn copy_into(&self, save_root: &Path, id: DbId) -> io::Result<CopiedAttachments> {
        let dir = Self::target_dir(save_root, id);
        let mut copied = CopiedAttachments {
            created_dir: !dir.exists(),
            dir,
            files: Vec::new(),
        };
        if self.is_empty() {
            copied.created_dir = false;
            return Ok(copied);
        }
        if let Err(e) = self.copy_all(&mut copied) {
            copied.remove();
            return Err(e);
        }
        tracing::info!(id, count = self.files.len(), dir = %copied.dir.display(), "Copied attachments");
        Ok(copied)
    }

    fn copy_all(&self, copied: &mut CopiedAttachments) -> io::Result<()> {
        std::fs::create_dir_all(&copied.dir)?;
        for (source, name) in &self.files {
            let target = copied.dir.join(name);
            let existed = target.exists();
            std::fs::copy(source, &target)?;
            if !existed {
                copied.files.push(target);
            }
        }
        Ok(())
    }
}

/// What one [`AttachmentPlan::copy_into`] call wrote to disk.
#[derive(Debug)]
#[must_use]
pub struct CopiedAttachments {
    dir: PathBuf,
    created_dir: bool,
    files: Vec<PathBuf>,
}

impl CopiedAttachments {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete what was written: the whole directory if this copy created it,
    /// otherwise only the files it added. Failures are logged.
    pub fn remove(self) {
        if self.created_dir {
            match std::fs::remove_dir_all(&self.dir) {
                Ok(()) => {
                    tracing::info!(dir = %self.dir.display(), "Removed attachment directory");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to remove attachment directory");
                }
            }
            return;
        }
        for file in &self.files {
            if let Err(e) = std::fs::remove_file(file) {
                tracing::warn!(path = %file.display(), error = %e, "Failed to remove copied attachment");
            }
        }
    }
}
