//! Library layout: a series directory holding season directories, each
//! holding one directory per ripped disc image.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

static SEASON_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[Ss]eason\s+(\d+)").expect("season regex should compile"));

/// Error type for library traversal
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Directory could not be listed
    #[error("Failed to list {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Directory name carries no usable season number
    #[error("Unable to determine season number from directory: {}", path.display())]
    UnresolvedSeason { path: PathBuf },
}

/// Series title used in episode file names: the source root's last component.
pub fn series_title(source_root: &Path) -> String {
    source_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_root.display().to_string())
}

/// Extracts the season number from a directory name such as `Season 02`.
///
/// Season 0 is treated as no season.
pub fn season_number(dir_name: &str) -> Option<u32> {
    SEASON_NUMBER_PATTERN
        .captures(dir_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&season| season >= 1)
}

/// Season number of a season directory, from its final path component.
pub fn resolve_season(season_dir: &Path) -> Result<u32, LibraryError> {
    season_dir
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(season_number)
        .ok_or_else(|| LibraryError::UnresolvedSeason {
            path: season_dir.to_path_buf(),
        })
}

/// Immediate subdirectories of `dir`, sorted by name.
///
/// Hidden directories (names starting with `.`) are skipped. Symlinks to
/// directories are followed.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut dirs = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| LibraryError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
        {
            continue;
        }

        dirs.push(entry.into_path());
    }

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn test_season_number_variants() {
        assert_eq!(season_number("Season 1"), Some(1));
        assert_eq!(season_number("season 12"), Some(12));
        assert_eq!(season_number("Show Season  03 (Blu-ray)"), Some(3));
        assert_eq!(season_number("Season\t4"), Some(4));
    }

    #[test]
    fn test_season_number_unresolved() {
        assert_eq!(season_number("Extras"), None);
        assert_eq!(season_number("Season1"), None);
        assert_eq!(season_number("SEASON 1"), None);
        assert_eq!(season_number("Season 0"), None);
        assert_eq!(season_number("Season 99999999999"), None);
    }

    #[test]
    fn test_resolve_season_uses_final_component() {
        let path = Path::new("/rips/Season 9 Collection/Season 2");
        assert_eq!(resolve_season(path).unwrap(), 2);

        let err = resolve_season(Path::new("/rips/Season 9/Specials")).unwrap_err();
        assert!(matches!(err, LibraryError::UnresolvedSeason { .. }));
        assert!(err.to_string().contains("Specials"));
    }

    #[test]
    fn test_series_title_from_root() {
        assert_eq!(series_title(Path::new("/rips/The Show")), "The Show");
        assert_eq!(series_title(Path::new("/rips/The Show/")), "The Show");
    }

    #[test]
    fn test_list_subdirectories_sorted_dirs_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in ["DISC_3", "DISC_1", "DISC_2", ".hidden"] {
            fs::create_dir(root.join(name)).unwrap();
        }
        File::create(root.join("notes.txt")).unwrap();
        fs::create_dir(root.join("DISC_1").join("VIDEO_TS")).unwrap();

        let dirs = list_subdirectories(root).unwrap();
        let names: Vec<_> = dirs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["DISC_1", "DISC_2", "DISC_3"]);
    }

    #[test]
    fn test_list_subdirectories_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_subdirectories(&temp_dir.path().join("absent"));
        assert!(matches!(result, Err(LibraryError::Walk { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_season_number_round_trips(
            season in 1u32..1000,
            prefix in "[A-Za-z ]{0,10}",
            padding in 0usize..3,
        ) {
            let name = format!("{}Season {:0width$}", prefix, season, width = padding + 1);
            prop_assert_eq!(season_number(&name), Some(season));
        }
    }
}
