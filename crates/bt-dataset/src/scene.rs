//! JSON scene files, enabled with the `scene` Cargo feature.
//!
//! A scene is the minimal on-disk form of a [`MemoryDataset`]:
//!
//! ```json
//! {
//!   "nodes": [{ "id": 1, "lat": 36.9906, "lon": -85.9022 }],
//!   "ways":  [{ "id": 10, "nodes": [1, 2, 3], "tags": { "highway": "primary" } }]
//! }
//! ```
//!
//! Selection is not persisted.  Way node references are validated on load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use bt_core::{Coordinate, NodeId, WayId};

use crate::dataset::{Dataset, MemoryDataset};
use crate::model::{Node, Tags, Way};
use crate::{DatasetError, DatasetResult};

// ── File records ──────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct SceneFile {
    nodes: Vec<SceneNode>,
    ways:  Vec<SceneWay>,
}

#[derive(Serialize, Deserialize)]
struct SceneNode {
    id:  NodeId,
    lat: f64,
    lon: f64,
}

#[derive(Serialize, Deserialize)]
struct SceneWay {
    id:    WayId,
    nodes: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    tags:  Tags,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a scene file into a fresh [`MemoryDataset`].
pub fn load_scene(path: &Path) -> DatasetResult<MemoryDataset> {
    let file = File::open(path)?;
    load_scene_reader(BufReader::new(file))
}

/// Like [`load_scene`] but accepts any `Read` source.
///
/// # Errors
///
/// - [`DatasetError::Json`] on malformed input.
/// - [`DatasetError::InvalidCoordinate`] for out-of-range positions.
/// - [`DatasetError::NodeNotFound`] for a way referencing an unknown node.
pub fn load_scene_reader<R: Read>(reader: R) -> DatasetResult<MemoryDataset> {
    let scene: SceneFile = serde_json::from_reader(reader)?;
    let mut dataset = MemoryDataset::new();

    for n in scene.nodes {
        let coord = Coordinate::checked(n.lat, n.lon)
            .map_err(|_| DatasetError::InvalidCoordinate { node: n.id })?;
        dataset.add_node(Node::new(n.id, coord));
    }

    for w in scene.ways {
        if let Some(&missing) = w.nodes.iter().find(|&&id| dataset.node(id).is_none()) {
            return Err(DatasetError::NodeNotFound(missing));
        }
        dataset.add_way(Way { id: w.id, nodes: w.nodes, tags: w.tags });
    }

    log::info!(
        "loaded scene: {} nodes, {} ways",
        dataset.node_count(),
        dataset.way_count()
    );
    Ok(dataset)
}

/// Write `dataset` as a scene file at `path`.
pub fn save_scene(dataset: &MemoryDataset, path: &Path) -> DatasetResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_scene(dataset, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Serialize `dataset` as pretty-printed scene JSON.
pub fn write_scene<W: Write>(dataset: &MemoryDataset, writer: W) -> DatasetResult<()> {
    let scene = SceneFile {
        nodes: dataset
            .nodes()
            .map(|n| SceneNode { id: n.id, lat: n.coord.lat, lon: n.coord.lon })
            .collect(),
        ways: dataset
            .ways()
            .into_iter()
            .map(|w| SceneWay { id: w.id, nodes: w.nodes.clone(), tags: w.tags.clone() })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &scene)?;
    Ok(())
}
