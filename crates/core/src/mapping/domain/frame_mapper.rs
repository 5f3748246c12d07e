use crate::clustering::domain::closest_centroid::closest_centroid;
use crate::mapping::domain::cluster::Cluster;
use crate::mapping::domain::frame_record::FrameRecord;
use crate::shared::embedding::Embedding;

/// Assigns every face to its nearest centroid and groups frames by cluster.
///
/// Each face in `frames` gets its `cluster_id` set. Cluster `i` corresponds
/// to `centroids[i]`; its frame list keeps the original frame order and
/// holds only frames with at least one face of that cluster, each trimmed
/// to those faces. With no centroids there is nothing to map.
pub fn map_frames_to_clusters(frames: &mut [FrameRecord], centroids: &[Embedding]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = centroids
        .iter()
        .enumerate()
        .map(|(id, c)| Cluster::new(id, Some(c.clone())))
        .collect();
    if clusters.is_empty() {
        return clusters;
    }

    for record in frames.iter_mut() {
        for face in record.faces.iter_mut() {
            face.cluster_id = closest_centroid(centroids, &face.embedding).map(|(id, _)| id);
        }

        for cluster in clusters.iter_mut() {
            let faces: Vec<_> = record
                .faces
                .iter()
                .filter(|f| f.cluster_id == Some(cluster.id))
                .cloned()
                .collect();
            if !faces.is_empty() {
                cluster
                    .frames
                    .push(FrameRecord::new(record.index, record.path.clone(), faces));
            }
        }
    }

    clusters
}
