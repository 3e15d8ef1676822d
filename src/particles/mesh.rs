use crate::constants::ParticleVertex;
use crate::error::{Error, Result};

/// The largest grid whose vertex buffer fits in `max_buffer_size` under wgpu's default limits.
pub fn max_resolution() -> u32 {
    let points = wgpu::Limits::default().max_buffer_size / size_of::<ParticleVertex>() as u64;
    u32::try_from(points.isqrt()).unwrap_or(u32::MAX)
}

/// Rejects grid sizes that are empty or would not fit in a single vertex buffer.
pub fn checked_resolution(resolution: u32) -> Result<u32> {
    let max = max_resolution();
    if (1..=max).contains(&resolution) {
        Ok(resolution)
    } else {
        Err(Error::Resolution {
            requested: resolution,
            max,
        })
    }
}

/// A regular grid of sample points spanning a square plane centred on the origin. The grid does
/// not depend on the image; a fresh one is built for every render session and never modified.
pub struct ParticleMesh {
    resolution: u32,
    vertices: Vec<ParticleVertex>,
}

impl ParticleMesh {
    /// Builds a `resolution` x `resolution` grid over an `extent` x `extent` plane. Row 0 is the
    /// top edge (v = 1), column 0 the left edge (u = 0).
    pub fn new(resolution: u32, extent: f32) -> Self {
        let last = resolution.saturating_sub(1) as f32;
        let to_unit = |i: u32| {
            if resolution > 1 {
                i as f32 / last
            } else {
                0.5
            }
        };

        let vertices = (0..resolution)
            .flat_map(|row| (0..resolution).map(move |column| (row, column)))
            .map(|(row, column)| {
                let u = to_unit(column);
                let v = 1.0 - to_unit(row);
                ParticleVertex {
                    uv: [u, v],
                    position: [(u - 0.5) * extent, (v - 0.5) * extent, 0.0],
                }
            })
            .collect();

        Self {
            resolution,
            vertices,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }
}
