use thiserror::Error;

const EXECUTABLE_EXTENSION: &str = ".exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("archive entries span multiple top-level directories and none of the root entries is an executable")]
    AmbiguousStructure,
    #[error("no executable found at the archive root or one level below its single top-level directory")]
    NoExecutableFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionConfidence {
    Certain,
    Uncertain,
}

/// Where the application's real file tree begins inside the archive, and
/// which executable anchors it. Immutable once computed from an entry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Empty string for archives rooted at depth 0, otherwise the single
    /// top-level directory name.
    pub root: String,
    /// Executable candidates, relative to `root`, sorted.
    pub candidates: Vec<String>,
    /// The selected candidate, relative to `root`.
    pub chosen: String,
    pub confidence: ResolutionConfidence,
}

impl ArchiveLayout {
    /// Entry name of the chosen executable as recorded in the archive,
    /// root prefix included.
    pub fn chosen_entry_name(&self) -> String {
        if self.root.is_empty() {
            self.chosen.clone()
        } else {
            format!("{}/{}", self.root, self.chosen)
        }
    }
}

/// Locates the install root and executable candidates from an archive's
/// entry list. `archive_stem` is the archive file name without extension and
/// breaks ties among candidates.
pub fn resolve_layout(entry_names: &[String], archive_stem: &str) -> Result<ArchiveLayout, LayoutError> {
    let normalized: Vec<String> = entry_names
        .iter()
        .map(|name| name.replace('\\', "/"))
        .filter(|name| !name.is_empty())
        .collect();

    let mut root_candidates: Vec<String> = normalized
        .iter()
        .filter(|name| !name.contains('/') && is_executable_name(name))
        .cloned()
        .collect();
    if !root_candidates.is_empty() {
        root_candidates.sort();
        return Ok(select_candidate(String::new(), root_candidates, archive_stem));
    }

    let mut top_segments: Vec<&str> = normalized
        .iter()
        .map(|name| name.split('/').next().unwrap_or(name.as_str()))
        .collect();
    top_segments.sort_unstable();
    top_segments.dedup();

    match top_segments.as_slice() {
        [] => Err(LayoutError::NoExecutableFound),
        [single] => {
            let root = single.to_string();
            let mut nested: Vec<String> = normalized
                .iter()
                .filter_map(|name| {
                    let mut parts = name.splitn(3, '/');
                    let first = parts.next()?;
                    let second = parts.next()?;
                    if parts.next().is_some() || first != root || second.is_empty() {
                        return None;
                    }
                    is_executable_name(second).then(|| second.to_string())
                })
                .collect();
            if nested.is_empty() {
                return Err(LayoutError::NoExecutableFound);
            }
            nested.sort();
            nested.dedup();
            Ok(select_candidate(root, nested, archive_stem))
        }
        _ => Err(LayoutError::AmbiguousStructure),
    }
}

fn select_candidate(root: String, candidates: Vec<String>, archive_stem: &str) -> ArchiveLayout {
    if candidates.len() == 1 {
        let chosen = candidates[0].clone();
        return ArchiveLayout {
            root,
            candidates,
            chosen,
            confidence: ResolutionConfidence::Certain,
        };
    }

    let stem_match = candidates
        .iter()
        .find(|candidate| executable_stem(candidate).eq_ignore_ascii_case(archive_stem))
        .cloned();
    match stem_match {
        Some(chosen) => ArchiveLayout {
            root,
            candidates,
            chosen,
            confidence: ResolutionConfidence::Certain,
        },
        None => {
            let chosen = candidates[0].clone();
            ArchiveLayout {
                root,
                candidates,
                chosen,
                confidence: ResolutionConfidence::Uncertain,
            }
        }
    }
}

fn is_executable_name(name: &str) -> bool {
    name.len() > EXECUTABLE_EXTENSION.len()
        && name
            .get(name.len() - EXECUTABLE_EXTENSION.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(EXECUTABLE_EXTENSION))
}

fn executable_stem(name: &str) -> &str {
    &name[..name.len() - EXECUTABLE_EXTENSION.len()]
}
