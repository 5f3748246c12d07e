pub mod centroid_finder;
pub mod closest_centroid;
mod kmeans;
