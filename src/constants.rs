//! Application constants

/// Service name reported by the root endpoint
pub const SERVICE_NAME: &str = "VerifiAI API";

/// API version reported by the root endpoint
pub const SERVICE_VERSION: &str = "1.0.0";

/// Maximum accepted image upload (20 MB)
pub const MAX_IMAGE_UPLOAD_SIZE: usize = 20 * 1024 * 1024;

/// Maximum accepted video upload (100 MB)
pub const MAX_VIDEO_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Headroom on top of the largest upload for multipart framing
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Number of frames sampled from a video
pub const DEFAULT_MAX_FRAMES: usize = 10;

/// URL prefix under which the upload tree is served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Upload sub-directories created at start-up
pub const IMAGES_DIR: &str = "images";
pub const VIDEOS_DIR: &str = "videos";
pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const TEST_DIR: &str = "test";

/// Placeholder model location; only its existence is reported
pub const DEFAULT_MODEL_PATH: &str = "models/deepfake_model.h5";
