use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, ImageResult};
use ndarray::Array4;

use crate::config::ModelConfig;

/// How an image is turned into the graph's input tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct InputSpec {
    pub size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl InputSpec {
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.size as usize, self.size as usize]
    }
}

impl From<&ModelConfig> for InputSpec {
    fn from(config: &ModelConfig) -> Self {
        Self {
            size: config.input_size,
            mean: config.mean,
            std: config.std,
        }
    }
}

/// Decode uploaded bytes, guessing the format from their content.
pub fn decode(bytes: &[u8]) -> ImageResult<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
}

/// Resize to the model's input size and normalise into an NCHW tensor.
pub fn preprocess(image: &DynamicImage, spec: &InputSpec) -> Array4<f32> {
    let resized = image
        .resize_exact(spec.size, spec.size, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros(spec.shape());
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - spec.mean[c]) / spec.std[c];
        }
    }
    tensor
}
