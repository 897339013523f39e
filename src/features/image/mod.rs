pub mod composer;
pub mod encoder;
pub mod fonts;
pub mod handler;
pub mod palette;
pub mod rng;
mod service;
pub mod text;
pub mod types;

pub use composer::{Canvas, Scene};
pub use encoder::EncodedImage;
pub use fonts::{FontBook, FontMeasurer};
pub use handler::create_image_router;
pub use palette::{ColorScheme, derive_colors};
pub use service::ImageService;
pub use types::{GenerationRequest, ImageFormat, ImageKind};
