//! Composite grid assembly.
//!
//! N generated images become one near-square grid: columns = ceil(sqrt(n)),
//! rows = ceil(n / columns), reading order left-to-right, top-to-bottom.
//! Images are never resized: each cell is the maximum input width by height,
//! and smaller images leave transparent padding.

use std::path::{Path, PathBuf};

use image::RgbaImage;

/// Composite `paths` into a grid saved next to the inputs as `{seed}.0.png`,
/// where the seed stem is taken from the first input's filename.
pub fn composite(paths: &[PathBuf]) -> Result<PathBuf, GridError> {
    if paths.is_empty() {
        return Err(GridError::EmptyInput);
    }

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let img = image::open(path)
            .map_err(|source| GridError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        images.push(img);
    }

    let (columns, rows) = layout(images.len());
    let cell_width = images.iter().map(RgbaImage::width).max().unwrap_or(0);
    let cell_height = images.iter().map(RgbaImage::height).max().unwrap_or(0);

    let mut canvas = RgbaImage::new(columns as u32 * cell_width, rows as u32 * cell_height);
    for (index, img) in images.iter().enumerate() {
        let row = index / columns;
        let col = index % columns;
        image::imageops::overlay(
            &mut canvas,
            img,
            i64::from(col as u32 * cell_width),
            i64::from(row as u32 * cell_height),
        );
    }

    let out = paths[0].with_file_name(format!("{}.0.png", seed_stem(&paths[0])));
    canvas.save(&out).map_err(|source| GridError::Save {
        path: out.clone(),
        source,
    })?;

    tracing::info!(count = images.len(), grid = %out.display(), "Composite grid saved");
    Ok(out)
}

/// Near-square layout: columns = ceil(sqrt(n)), rows = ceil(n / columns).
pub(crate) fn layout(n: usize) -> (usize, usize) {
    let columns = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(columns);
    (columns, rows)
}

/// The seed part of a `{seed}_{NNN}.png` filename.
fn seed_stem(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .split(['_', '.'])
        .next()
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("no images to composite")]
    EmptyInput,
    #[error("could not decode {} as an image", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not save composite to {}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
