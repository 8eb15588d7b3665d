use std::rc::Rc;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::state::TileImage;

const TILES_FILE_NAME: &str = "tiles.json";
const STORE_VERSION: u8 = 1;

/// On-disk form of the tile library: one document holding the flat list
/// of encoded image blobs.
#[derive(Serialize, Deserialize)]
struct TileManifest {
    version: u8,
    tiles: Vec<String>,
}

fn store_path() -> PathBuf {
    glib::user_config_dir().join("pairshot").join(TILES_FILE_NAME)
}

fn encode_manifest(tiles: &[Rc<TileImage>]) -> TileManifest {
    TileManifest {
        version: STORE_VERSION,
        tiles: tiles
            .iter()
            .map(|tile| glib::base64_encode(&tile.png).to_string())
            .collect(),
    }
}

fn decode_manifest(raw: &str) -> Option<Vec<Vec<u8>>> {
    let manifest: TileManifest = serde_json::from_str(raw).ok()?;
    if manifest.version != STORE_VERSION {
        return None;
    }
    Some(
        manifest
            .tiles
            .iter()
            .map(|blob| glib::base64_decode(blob))
            .collect(),
    )
}

fn write_atomic(path: &PathBuf, data: &str) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp_path = path.with_extension("tmp");
    if fs::write(&tmp_path, data).is_ok() {
        let _ = fs::rename(&tmp_path, path);
    }
}

/// Loads the persisted tile library. Blobs that no longer decode to an
/// image are skipped with a warning; everything else survives.
pub fn load_tiles() -> Vec<Rc<TileImage>> {
    let path = store_path();
    let Ok(raw) = fs::read_to_string(&path) else {
        return Vec::new();
    };
    let Some(blobs) = decode_manifest(&raw) else {
        glib::g_warning!("pairshot", "ignoring unreadable {}", path.display());
        return Vec::new();
    };

    let mut tiles = Vec::with_capacity(blobs.len());
    for blob in blobs {
        match TileImage::from_png_bytes(blob) {
            Ok(tile) => tiles.push(Rc::new(tile)),
            Err(err) => {
                glib::g_warning!("pairshot", "skipping undecodable tile: {err}");
            }
        }
    }
    tiles
}

pub fn save_tiles(tiles: &[Rc<TileImage>]) {
    match serde_json::to_string(&encode_manifest(tiles)) {
        Ok(raw) => write_atomic(&store_path(), &raw),
        Err(err) => glib::g_warning!("pairshot", "failed to encode tile store: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdk_pixbuf::{Colorspace, Pixbuf};

    fn tile(png: Vec<u8>) -> Rc<TileImage> {
        let pixbuf = Pixbuf::new(Colorspace::Rgb, false, 8, 1, 1).unwrap();
        Rc::new(TileImage { png, pixbuf })
    }

    #[test]
    fn manifest_round_trips_blobs() {
        let tiles = vec![tile(vec![1, 2, 3]), tile(vec![0xff, 0x00, 0x7f, 0x10])];
        let raw = serde_json::to_string(&encode_manifest(&tiles)).unwrap();
        let blobs = decode_manifest(&raw).unwrap();
        assert_eq!(blobs, vec![vec![1, 2, 3], vec![0xff, 0x00, 0x7f, 0x10]]);
    }

    #[test]
    fn empty_library_round_trips() {
        let raw = serde_json::to_string(&encode_manifest(&[])).unwrap();
        assert_eq!(decode_manifest(&raw), Some(Vec::new()));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let raw = r#"{"version":9,"tiles":[]}"#;
        assert_eq!(decode_manifest(raw), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(decode_manifest("not json"), None);
        assert_eq!(decode_manifest(r#"{"tiles":[]}"#), None);
    }
}
