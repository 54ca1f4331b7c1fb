//! Local path ↔ remote path translation.

use crate::tree::PageDictionary;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

const PUBLIC_SEGMENT: &str = "public";
const PAGES_SEGMENT: &str = "pages";

/// Translates local files under the base directory into remote addresses.
///
/// Files under `public/` whose name is in the page dictionary are addressed by
/// page id; everything else keeps its relative path.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    base: PathBuf,
    dictionary: Arc<PageDictionary>,
}

impl PathTranslator {
    pub fn new(base: impl Into<PathBuf>, dictionary: Arc<PageDictionary>) -> Self {
        Self {
            base: base.into(),
            dictionary,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Relative `/`-separated form of `path`, or `None` if it is not under the base.
    ///
    /// Relative inputs are taken as already relative to the base.
    pub fn relative(&self, path: &Path) -> Option<String> {
        if path.is_absolute() {
            relative_to(&self.base, path)
        } else {
            join_segments(path)
        }
    }

    /// Absolute path of a relative local path.
    pub fn absolute(&self, rel: &str) -> PathBuf {
        rel.split('/').fold(self.base.clone(), |acc, seg| acc.join(seg))
    }

    /// Page id of a page-addressed file.
    pub fn to_remote_id(&self, rel: &str) -> Option<&str> {
        let mut segments = rel.split('/');
        if segments.next() != Some(PUBLIC_SEGMENT) {
            return None;
        }
        let file_name = rel.rsplit('/').next()?;
        self.dictionary.get(file_name)
    }

    /// Remote path for a relative local path.
    pub fn to_remote_path(&self, rel: &str) -> String {
        match self.to_remote_id(rel) {
            Some(page_id) => {
                let in_pages = rel.split('/').any(|seg| seg == PAGES_SEGMENT);
                if in_pages {
                    format!("{}/{}/{}.js", PUBLIC_SEGMENT, PAGES_SEGMENT, page_id)
                } else {
                    format!("{}/{}.js", PUBLIC_SEGMENT, page_id)
                }
            }
            None => rel.to_string(),
        }
    }
}

/// `path` relative to `root`, joined with `/`.
///
/// `None` when `path` lies outside `root`, is `root` itself, or climbs out
/// through `..`.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    join_segments(path.strip_prefix(root).ok()?)
}

fn join_segments(rel: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
