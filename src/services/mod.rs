pub mod gallery_service;
pub mod image_service;
