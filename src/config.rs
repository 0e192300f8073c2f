//! Catalog configuration loading.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, NumberToken, Song, Stage};

/// Default location on disk where the catalog file is looked up.
const DEFAULT_CATALOG_PATH: &str = "config/catalog.json";
/// Environment variable that overrides [`DEFAULT_CATALOG_PATH`].
const CATALOG_PATH_ENV: &str = "ALBUM_CHAIN_CATALOG_PATH";

/// Errors raised while loading the catalog file.
///
/// Unlike cosmetic settings there is no sensible built-in fallback for quiz
/// reference data, so every failure here is fatal to startup.
#[derive(Debug, Error)]
pub enum CatalogConfigError {
    /// The file could not be read.
    #[error("failed to read catalog file `{path}`")]
    Read {
        /// Path that was attempted.
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid catalog JSON.
    #[error("failed to parse catalog file `{path}`")]
    Parse {
        /// Path that was attempted.
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The file parsed but describes an unplayable catalog.
    #[error("catalog is invalid: {0}")]
    Invalid(String),
}

/// Load the catalog from the configured path (environment override first).
pub fn load_catalog() -> Result<Catalog, CatalogConfigError> {
    load_catalog_from_path(&resolve_catalog_path())
}

/// Load the catalog from an explicit file path.
pub fn load_catalog_from_path(path: &Path) -> Result<Catalog, CatalogConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw: RawCatalog =
        serde_json::from_str(&contents).map_err(|source| CatalogConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    let catalog = build_catalog(raw)?;
    info!(
        path = %path.display(),
        stages = catalog.stage_count(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// JSON representation of the catalog file.
#[derive(Debug, Deserialize)]
struct RawCatalog {
    albums: Vec<RawAlbum>,
    numbers: Vec<RawNumber>,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    name: String,
    #[serde(default)]
    variants: Vec<String>,
    songs: Vec<RawSong>,
}

#[derive(Debug, Deserialize)]
struct RawSong {
    name: String,
    #[serde(default)]
    variants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawNumber {
    display: String,
    #[serde(default)]
    variants: Vec<String>,
}

fn build_catalog(raw: RawCatalog) -> Result<Catalog, CatalogConfigError> {
    if raw.albums.is_empty() {
        return Err(CatalogConfigError::Invalid("catalog has no albums".into()));
    }
    if raw.numbers.len() != raw.albums.len() {
        return Err(CatalogConfigError::Invalid(format!(
            "{} number tokens for {} albums",
            raw.numbers.len(),
            raw.albums.len()
        )));
    }

    let stage_count = raw.albums.len();
    let mut stages = Vec::with_capacity(stage_count);
    for (index, album) in raw.albums.into_iter().enumerate() {
        if album.songs.is_empty() {
            return Err(CatalogConfigError::Invalid(format!(
                "album `{}` has no songs",
                album.name
            )));
        }

        // A stage sits at position index+1 forward and stage_count-index after
        // a reversal; the song subsection needs as many distinct songs as the
        // position is deep.
        let deepest_position = (index + 1).max(stage_count - index);
        if album.songs.len() < deepest_position {
            warn!(
                album = %album.name,
                songs = album.songs.len(),
                required = deepest_position,
                "album has fewer songs than its deepest catalog position needs"
            );
        }

        let songs = album
            .songs
            .into_iter()
            .map(|song| Song {
                variants: fallback_variants(song.variants, &song.name),
                name: song.name,
            })
            .collect();
        stages.push(Stage {
            album_variants: fallback_variants(album.variants, &album.name),
            album: album.name,
            songs,
        });
    }

    let numbers = raw
        .numbers
        .into_iter()
        .map(|number| NumberToken {
            variants: fallback_variants(number.variants, &number.display),
            display: number.display,
        })
        .collect();

    Ok(Catalog::new(stages, numbers))
}

/// Answers arrive lower-cased, so a name-only entry accepts its own lowercase
/// rendering.
fn fallback_variants(variants: Vec<String>, name: &str) -> Vec<String> {
    if variants.is_empty() {
        vec![name.to_lowercase()]
    } else {
        variants
    }
}

/// Resolve the catalog path taking the environment override into account.
fn resolve_catalog_path() -> PathBuf {
    env::var_os(CATALOG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Catalog, CatalogConfigError> {
        let raw: RawCatalog = serde_json::from_str(json).expect("test JSON parses");
        build_catalog(raw)
    }

    #[test]
    fn builds_a_catalog_with_fallback_variants() {
        let catalog = parse(
            r#"{
                "albums": [
                    { "name": "Debut", "songs": [ { "name": "Tim McGraw" } ] }
                ],
                "numbers": [ { "display": "1", "variants": ["1", "one"] } ]
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.stage_count(), 1);
        assert!(catalog.stage(1).matches_album("debut"));
        assert_eq!(catalog.stage(1).resolve_song("tim mcgraw"), Some("Tim McGraw"));
        assert!(catalog.number(1).matches("one"));
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = parse(r#"{ "albums": [], "numbers": [] }"#).unwrap_err();
        assert!(matches!(err, CatalogConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_number_album_length_mismatch() {
        let err = parse(
            r#"{
                "albums": [
                    { "name": "Debut", "songs": [ { "name": "Tim McGraw" } ] }
                ],
                "numbers": []
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_album_without_songs() {
        let err = parse(
            r#"{
                "albums": [ { "name": "Debut", "songs": [] } ],
                "numbers": [ { "display": "1" } ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_catalog_from_path(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, CatalogConfigError::Read { .. }));
    }
}
