use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::ps_error::SearchError;
use crate::ps_interface::NodeId;

// ============================================================================
// Categories
// ============================================================================

/// Dominant content theme of a peer. Most of a peer's files come from its
/// own category, the rest from the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Music,
    Sports,
    Movies,
    Tech,
    Games,
}

impl Category {
    /// Fixed order; `from_index` and off-category sampling depend on it.
    pub const ALL: [Category; 5] = [
        Category::Music,
        Category::Sports,
        Category::Movies,
        Category::Tech,
        Category::Games,
    ];

    /// Uniform mapping from node identity to category.
    pub fn from_index(id: NodeId) -> Category {
        Self::ALL[(id % Self::ALL.len() as u64) as usize]
    }

    pub fn keywords(&self) -> &'static [&'static str; 8] {
        match self {
            Category::Music => &[
                "guitar", "piano", "drum", "song", "album", "jazz", "rock", "concert",
            ],
            Category::Sports => &[
                "soccer", "nba", "tennis", "baseball", "stats", "team", "coach", "league",
            ],
            Category::Movies => &[
                "cinema", "actor", "director", "trailer", "drama", "comedy", "scene", "film",
            ],
            Category::Tech => &[
                "java", "linux", "ai", "network", "database", "cloud", "security", "api",
            ],
            Category::Games => &[
                "rpg", "fps", "mario", "chess", "strategy", "quest", "level", "puzzle",
            ],
        }
    }

    /// Lowercase name, used as the filename prefix.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Sports => "sports",
            Category::Movies => "movies",
            Category::Tech => "tech",
            Category::Games => "games",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_uppercase())
    }
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SearchError::UnknownCategory(s.to_string()))
    }
}

// ============================================================================
// Local store
// ============================================================================

/// Files held by one peer plus the keyword index over them.
///
/// Built once per node and never modified afterwards.
#[derive(Debug, Clone)]
pub struct Peer {
    pub category: Category,
    pub files: Vec<String>,
    pub index: IndexMap<String, Vec<String>>,
}

impl Peer {
    pub fn new(category: Category, files: Vec<String>) -> Self {
        let index = build_index(&files);
        Self {
            category,
            files,
            index,
        }
    }

    /// Files indexed under `keyword`; empty on a miss.
    pub fn search(&self, keyword: &str) -> &[String] {
        self.index.get(keyword).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First few files, for debug output.
    pub fn sample(&self, n: usize) -> &[String] {
        &self.files[..n.min(self.files.len())]
    }
}

/// Keyword of a `category_keyword_number.txt` name. Names with fewer than
/// two `_` tokens are their own keyword.
pub fn extract_keyword(filename: &str) -> &str {
    let mut parts = filename.split('_');
    match (parts.next(), parts.next()) {
        (Some(_), Some(keyword)) => keyword,
        _ => filename,
    }
}

/// keyword -> files, buckets in insertion order. Duplicate names are kept.
pub fn build_index(files: &[String]) -> IndexMap<String, Vec<String>> {
    let mut index: IndexMap<String, Vec<String>> = IndexMap::new();
    for file in files {
        index
            .entry(extract_keyword(file).to_string())
            .or_default()
            .push(file.clone());
    }
    index
}
