pub mod profile;
pub mod profile_image_url;
