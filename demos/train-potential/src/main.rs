#[macro_use]
extern crate log;

use std::{
    error::Error,
    path::{Path, PathBuf},
    time::Instant,
};

use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Select};
use resnap::{CvParams, ModelKind, NormKind, NullSink, PlotMode, PngSink, PotentialTrainer};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cross validate a penalized linear model on bispectrum descriptors and write the fitted potential"
)]
struct Cli {
    /// Training data, a .mat file holding the arrays X and y or a csv file with a y column
    #[arg(value_name = "PATH")]
    data: PathBuf,

    /// Penalized model, LASSO or RIDGE. Selected interactively when omitted
    #[arg(short, long, value_name = "KIND")]
    model: Option<ModelKind>,

    /// Normalize the descriptor columns with this norm (l1, l2 or max)
    #[arg(short, long, value_name = "NORM")]
    norm: Option<NormKind>,

    /// Regularization strengths to cross validate
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.0, 0.01, 0.1, 1.0])]
    alphas: Vec<f64>,

    /// Parity plots of fold 0, with energies per atom or per structure (atom or sample)
    #[arg(short, long, value_name = "MODE")]
    plot: Option<PlotMode>,

    /// Also render density heatmaps for per atom parity plots
    #[arg(long)]
    heatmap: bool,

    /// Skip writing any images
    #[arg(long, conflicts_with_all = ["plot", "heatmap"])]
    no_images: bool,

    /// Regularization strength of the final fit, defaults to the best one of the sweep
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Directory receiving the potential file, defaults to the directory of the data
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Directory receiving the images
    #[arg(long, value_name = "DIR", default_value = "img")]
    img_dir: PathBuf,

    /// Seed of the fold assignment
    #[arg(long, default_value_t = 2020)]
    seed: u64,

    /// Iteration cap of the lasso solver
    #[arg(long, default_value_t = 1_000_000)]
    max_iter: usize,

    /// Convergence tolerance of the lasso solver
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let cli = Cli::parse();

    let kind = match cli.model {
        Some(kind) => kind,
        None => select_model()?,
    };
    let trainer = PotentialTrainer::load(&cli.data, kind, cli.norm)?;

    let params = CvParams {
        max_iter: cli.max_iter,
        tol: cli.tol,
        seed: cli.seed,
        capture_parity: cli.plot.is_some(),
    };
    let t0 = Instant::now();
    let report = trainer.cross_validation(&cli.alphas, &params)?;
    info!("cross validation took {}ms", t0.elapsed().as_millis());

    if cli.no_images {
        report.render(&mut NullSink, None)?;
    } else {
        let mut sink = PngSink::new(&cli.img_dir)?.with_heatmap(cli.heatmap);
        report.render(&mut sink, cli.plot)?;
    }

    let alpha = cli
        .alpha
        .or_else(|| report.best_alpha())
        .ok_or("no alpha given and the sweep is empty")?;
    let out_dir = cli.out_dir.clone().unwrap_or_else(|| {
        cli.data
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    info!("fitting the final {} potential with alpha = {}", kind, alpha);
    trainer.make_potential(&out_dir, alpha, cli.max_iter, cli.tol)?;

    Ok(())
}

fn select_model() -> Result<ModelKind, Box<dyn Error>> {
    let kinds = [ModelKind::Ridge, ModelKind::Lasso];

    let e = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select model")
        .items(&kinds)
        .default(0)
        .interact()?;

    Ok(kinds[e])
}
