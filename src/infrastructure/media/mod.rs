//! Local storage for fetched images.

mod file_image_repository;

pub use file_image_repository::FileImageRepository;
