use crate::mapping::domain::mapping_table::MappingTable;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::temp_workspace::TempWorkspace;

/// Writes every face of every cluster as `<workspace>/<id>/<frame>_<n>.png`
/// for manual review. Each cluster directory is recreated from scratch.
///
/// Unreadable frames and empty crops are skipped. Returns the number of
/// crops written.
pub fn dump_faces(
    table: &MappingTable,
    workspace: &TempWorkspace,
    frames: &dyn FrameSource,
    writer: &dyn ImageWriter,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut written = 0;

    for cluster in table.clusters() {
        let dir = workspace.cluster_dir(cluster.id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;

        for record in &cluster.frames {
            let image = match frames.load(&record.path) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("Skipping {} in face dump: {e}", record.path.display());
                    continue;
                }
            };
            for (n, face) in record.faces.iter().enumerate() {
                let crop = image.crop(&face.bbox.to_pixel_rect(image.width(), image.height()));
                if crop.is_empty() {
                    continue;
                }
                writer.write(&dir.join(format!("{}_{n}.png", record.index)), &crop)?;
                written += 1;
            }
        }
    }

    log::info!(
        "Dumped {written} face crops for {} clusters to {}",
        table.len(),
        workspace.root().display()
    );
    Ok(written)
}
