//! Command Line Options

use clap::Parser;

/// Options of a render.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Renders path length resolved images of a fog scene.", long_about = None)]
pub struct Options {
    /// Number of threads to use for rendering; 0 uses every logical CPU.
    #[arg(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 0,
        help = "Use specified number of threads for rendering."
    )]
    n_threads: usize,

    /// Suppress all text output other than error messages.
    #[arg(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,

    /// Path to the image file.
    #[arg(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "tof.exr",
        help = "Write the final image to the given filename. Transient renders write one file per frame."
    )]
    pub image_file: String,

    /// Tile size.
    #[arg(
        long = "tilesize",
        short = 'p',
        value_name = "NUM",
        default_value_t = 16,
        help = "Size in pixels of square tiles rendered per thread."
    )]
    pub tile_size: usize,

    /// Sampler seed.
    #[arg(long, value_name = "NUM", default_value_t = 0, help = "Seed of the random sampler.")]
    pub seed: u64,

    /// Render parameters.
    #[arg(
        short = 'D',
        value_name = "NAME=VALUE",
        help = "Set a scene, decomposition or integrator parameter, e.g. -D decomposition=transient."
    )]
    pub params: Vec<String>,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => max_threads,
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }
}

// ---- Tests ----
