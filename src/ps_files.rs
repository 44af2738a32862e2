//! Synthetic file sets
//!
//! Deterministic generation of each peer's files from the simulation RNG.
//! The same seeded stream and the same call order always produce identical
//! peers, so experiments can be repeated exactly.

use rand::rngs::StdRng;
use rand::Rng;

use crate::ps_error::{Result, SearchError};
use crate::ps_interface::NodeId;
use crate::ps_peer::{Category, Peer};

/// Configuration for file generation
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FileGenConfig {
    /// Files per peer (default: 10)
    pub files_per_peer: usize,

    /// Share of files taken from the peer's own category (default: 0.8)
    pub in_category_fraction: f64,
}

impl Default for FileGenConfig {
    fn default() -> Self {
        Self {
            files_per_peer: 10,
            in_category_fraction: 0.8,
        }
    }
}

impl FileGenConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.in_category_fraction) {
            return Err(SearchError::InvalidConfig(format!(
                "in_category_fraction must be within [0, 1], got {}",
                self.in_category_fraction
            )));
        }
        Ok(())
    }

    /// e.g. 10 files at 0.8 -> 8 in-category + 2 from other categories
    pub fn in_category_count(&self) -> usize {
        ((self.files_per_peer as f64 * self.in_category_fraction) as usize).min(self.files_per_peer)
    }
}

/// Files for a peer of `category`: in-category files first, then the rest.
pub fn generate_files(category: Category, rng: &mut StdRng, config: &FileGenConfig) -> Vec<String> {
    let in_category = config.in_category_count();
    let mut out = Vec::with_capacity(config.files_per_peer);

    for _ in 0..in_category {
        let keyword = pick_keyword(category, rng);
        out.push(make_filename(category, keyword, rng));
    }
    for _ in in_category..config.files_per_peer {
        let other = pick_other(category, rng);
        let keyword = pick_keyword(other, rng);
        out.push(make_filename(other, keyword, rng));
    }
    out
}

/// Category, files and index for node `id`.
pub fn generate_peer(id: NodeId, rng: &mut StdRng, config: &FileGenConfig) -> Peer {
    let category = Category::from_index(id);
    let files = generate_files(category, rng, config);
    Peer::new(category, files)
}

fn pick_keyword(category: Category, rng: &mut StdRng) -> &'static str {
    let pool = category.keywords();
    pool[rng.gen_range(0..pool.len())]
}

// rejection sampling keeps the draw uniform over the other categories
fn pick_other(category: Category, rng: &mut StdRng) -> Category {
    loop {
        let other = Category::ALL[rng.gen_range(0..Category::ALL.len())];
        if other != category {
            return other;
        }
    }
}

fn make_filename(category: Category, keyword: &str, rng: &mut StdRng) -> String {
    format!("{}_{}_{}.txt", category.label(), keyword, rng.gen_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ps_peer::extract_keyword;
    use rand::SeedableRng;

    #[test]
    fn test_generation_deterministic() {
        let config = FileGenConfig::default();

        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        for id in 0..20 {
            let a = generate_peer(id, &mut rng1, &config);
            let b = generate_peer(id, &mut rng2, &config);
            assert_eq!(a.files, b.files);
            assert_eq!(a.category, b.category);
        }
    }

    #[test]
    fn test_category_split() {
        let config = FileGenConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let files = generate_files(Category::Sports, &mut rng, &config);
        assert_eq!(files.len(), 10);

        // first 8 from own category, last 2 from others
        for f in &files[..8] {
            assert!(f.starts_with("sports_"), "{}", f);
            assert!(Category::Sports.keywords().contains(&extract_keyword(f)));
        }
        for f in &files[8..] {
            assert!(!f.starts_with("sports_"), "{}", f);
        }
    }

    #[test]
    fn test_filename_format() {
        let config = FileGenConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        for f in generate_files(Category::Games, &mut rng, &config) {
            let stem = f.strip_suffix(".txt").expect("txt suffix");
            let parts: Vec<&str> = stem.split('_').collect();
            assert_eq!(parts.len(), 3);
            let category: Category = parts[0].parse().unwrap();
            assert!(category.keywords().contains(&parts[1]));
            let n: u32 = parts[2].parse().unwrap();
            assert!(n < 1000);
        }
    }

    #[test]
    fn test_index_round_trip() {
        let config = FileGenConfig {
            files_per_peer: 40,
            in_category_fraction: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(99);

        for id in 0..10 {
            let peer = generate_peer(id, &mut rng, &config);
            assert_eq!(peer.category, Category::from_index(id));

            let indexed: usize = peer.index.values().map(Vec::len).sum();
            assert_eq!(indexed, peer.files.len());

            for f in &peer.files {
                let kw = extract_keyword(f);
                assert!(peer.index[kw].contains(f));
                for (other_kw, bucket) in &peer.index {
                    if other_kw != kw {
                        assert!(!bucket.contains(f));
                    }
                }
            }
        }
    }

    #[test]
    fn test_fraction_edges() {
        let mut rng = StdRng::seed_from_u64(3);

        let all_own = FileGenConfig {
            files_per_peer: 5,
            in_category_fraction: 1.0,
        };
        assert!(generate_files(Category::Tech, &mut rng, &all_own)
            .iter()
            .all(|f| f.starts_with("tech_")));

        let none_own = FileGenConfig {
            files_per_peer: 5,
            in_category_fraction: 0.0,
        };
        assert!(generate_files(Category::Tech, &mut rng, &none_own)
            .iter()
            .all(|f| !f.starts_with("tech_")));

        let empty = FileGenConfig {
            files_per_peer: 0,
            in_category_fraction: 0.8,
        };
        assert!(generate_files(Category::Tech, &mut rng, &empty).is_empty());
    }

    #[test]
    fn test_validate_fraction() {
        let bad = FileGenConfig {
            files_per_peer: 10,
            in_category_fraction: 1.5,
        };
        assert!(matches!(bad.validate(), Err(SearchError::InvalidConfig(_))));
        assert!(FileGenConfig::default().validate().is_ok());
    }
}
