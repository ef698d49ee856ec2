//! View Resolution Loop
//!
//! Walks a candidate list in order and renders the first view that exists.
//! A "view not found" result moves on to the next candidate; any other
//! failure stops the loop. When every candidate is missing the configured
//! default view is rendered, and if that is missing too the request fails
//! with `DefaultViewMissing`.
//!
//! Existence is answered either by the renderer itself (through
//! [`ViewResolver::resolve_and_render`]) or by a [`ViewOracle`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PressError, Result};

/// Answers whether a named view exists
pub trait ViewOracle: Send + Sync {
    fn exists(&self, view: &str) -> bool;
}

/// Fixed set of view names
#[derive(Debug, Clone, Default)]
pub struct StaticViews {
    views: HashSet<String>,
}

impl StaticViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, view: impl Into<String>) {
        self.views.insert(view.into());
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StaticViews {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            views: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ViewOracle for StaticViews {
    fn exists(&self, view: &str) -> bool {
        self.views.contains(view)
    }
}

/// Views found as files under a theme directory
///
/// `theme/single-post.html` is the view `single-post`;
/// `theme/templates/wide.html` is `templates/wide`.
#[derive(Debug, Clone)]
pub struct DirectoryViews {
    root: PathBuf,
    extension: String,
    views: StaticViews,
}

impl DirectoryViews {
    /// Scan `root` recursively for files ending in `.{extension}`
    pub fn scan<P: AsRef<Path>>(root: P, extension: &str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(PressError::LoadError {
                path: root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let pattern = format!(
            "{}/**/*.{}",
            glob::Pattern::escape(&root.display().to_string()),
            extension
        );
        let entries = glob::glob(&pattern).map_err(|e| PressError::InternalError {
            reason: format!("view glob '{}': {}", pattern, e),
        })?;

        let mut views = StaticViews::new();
        for entry in entries {
            let path = entry.map_err(|e| PressError::IoError {
                message: e.to_string(),
            })?;
            if let Some(name) = view_name(&root, &path) {
                views.insert(name);
            }
        }

        tracing::debug!("Found {} view(s) under {}", views.len(), root.display());
        Ok(Self {
            root,
            extension: extension.to_string(),
            views,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `view`
    pub fn path_of(&self, view: &str) -> PathBuf {
        self.root.join(format!("{}.{}", view, self.extension))
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl ViewOracle for DirectoryViews {
    fn exists(&self, view: &str) -> bool {
        self.views.exists(view)
    }
}

fn view_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// A successful render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendered<T> {
    /// View that produced the output
    pub view: String,

    pub output: T,

    /// Whether every candidate was missing and the default view was used
    pub used_default: bool,

    /// Candidates tried and found missing, in order
    pub skipped: Vec<String>,
}

/// Runs the fallback loop
#[derive(Debug, Clone)]
pub struct ViewResolver {
    default_view: String,
}

impl ViewResolver {
    pub fn new(default_view: impl Into<String>) -> Self {
        Self {
            default_view: default_view.into(),
        }
    }

    pub fn default_view(&self) -> &str {
        &self.default_view
    }

    /// Render the first candidate `render` does not report as missing
    ///
    /// `render` signals a missing view with [`PressError::ViewNotFound`].
    pub fn resolve_and_render<I, S, T, F>(&self, candidates: I, mut render: F) -> Result<Rendered<T>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str) -> Result<T>,
    {
        let mut skipped = Vec::new();

        for candidate in candidates {
            let view = candidate.as_ref();
            match render(view) {
                Ok(output) => {
                    tracing::debug!("Rendered view '{}' after {} miss(es)", view, skipped.len());
                    return Ok(Rendered {
                        view: view.to_string(),
                        output,
                        used_default: false,
                        skipped,
                    });
                }
                Err(e) if e.is_view_not_found() => skipped.push(view.to_string()),
                Err(e) => {
                    tracing::warn!("Rendering view '{}' failed: {}", view, e);
                    return Err(e);
                }
            }
        }

        tracing::debug!(
            "No candidate view exists ({}); using default '{}'",
            skipped.join(", "),
            self.default_view
        );
        match render(self.default_view.as_str()) {
            Ok(output) => Ok(Rendered {
                view: self.default_view.clone(),
                output,
                used_default: true,
                skipped,
            }),
            Err(e) if e.is_view_not_found() => Err(PressError::DefaultViewMissing {
                view: self.default_view.clone(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Pick the first candidate `oracle` knows about
    pub fn select<I, S>(&self, candidates: I, oracle: &dyn ViewOracle) -> Result<Rendered<()>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolve_and_render(candidates, |view| {
            if oracle.exists(view) {
                Ok(())
            } else {
                Err(PressError::ViewNotFound {
                    view: view.to_string(),
                })
            }
        })
    }
}

impl Default for ViewResolver {
    fn default() -> Self {
        Self::new("index")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn missing(view: &str) -> PressError {
        PressError::ViewNotFound {
            view: view.to_string(),
        }
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let views: StaticViews = ["single", "index"].into_iter().collect();
        let rendered = ViewResolver::default()
            .select(["single-post-hello", "single-post", "single"], &views)
            .unwrap();

        assert_eq!(rendered.view, "single");
        assert!(!rendered.used_default);
        assert_eq!(rendered.skipped, vec!["single-post-hello", "single-post"]);
    }

    #[test]
    fn test_falls_back_to_default_view() {
        let views: StaticViews = ["index"].into_iter().collect();
        let rendered = ViewResolver::new("index")
            .select(["category-news", "category", "archive"], &views)
            .unwrap();

        assert_eq!(rendered.view, "index");
        assert!(rendered.used_default);
        assert_eq!(rendered.skipped.len(), 3);
    }

    #[test]
    fn test_missing_default_is_fatal() {
        let views = StaticViews::new();
        let err = ViewResolver::new("index").select(["page"], &views).unwrap_err();
        assert_eq!(err.error_code(), "DEFAULT_VIEW_MISSING");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_render_failure_stops_the_loop() {
        let mut calls = Vec::new();
        let err = ViewResolver::default()
            .resolve_and_render(["a", "b", "c"], |view| {
                calls.push(view.to_string());
                match view {
                    "a" => Err(missing(view)),
                    "b" => Err(PressError::RenderFailed {
                        view: view.to_string(),
                        reason: "template syntax".to_string(),
                    }),
                    _ => Ok(view.len()),
                }
            })
            .unwrap_err();

        assert_eq!(err.error_code(), "RENDER_FAILED");
        assert_eq!(calls, vec!["a", "b"]);
    }

    #[test]
    fn test_renderer_output_is_returned() {
        let rendered = ViewResolver::default()
            .resolve_and_render(vec!["page-about".to_string(), "page".to_string()], |view| {
                if view == "page" {
                    Ok(format!("<main>{}</main>", view))
                } else {
                    Err(missing(view))
                }
            })
            .unwrap();
        assert_eq!(rendered.output, "<main>page</main>");
    }

    #[test]
    fn test_directory_views_scan() {
        let root = std::env::temp_dir().join(format!("press-views-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("index.html"), "").unwrap();
        fs::write(root.join("single-post.html"), "").unwrap();
        fs::write(root.join("templates").join("wide.html"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let views = DirectoryViews::scan(&root, "html").unwrap();
        assert_eq!(views.len(), 3);
        assert!(views.exists("index"));
        assert!(views.exists("single-post"));
        assert!(views.exists("templates/wide"));
        assert!(!views.exists("notes"));
        assert_eq!(views.path_of("index"), root.join("index.html"));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_directory_views_requires_directory() {
        let err = DirectoryViews::scan("/definitely/not/here", "html").unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }
}
