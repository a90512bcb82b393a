//! Quantile calibration
//!
//! Fits a quantile regression of a target variable on a set of input
//! variables, saves the model and stores it as a lookup grid binned along the
//! inputs.
//!
//! ```bash
//! quantile-calib --inputfile tree.csv --inputs "abs(ieta),et" --target iso \
//!     --eff 0.9 --outputfile results.json --name iso_eff90 --test
//! ```
//!
//! Set `RUST_LOG=debug` to also print the efficiency along each input.
use clap::Parser;
use quantile_calib::{run, BinningRegistry, RunConfig};
use std::error::Error;
use std::path::PathBuf;

/// Calibrate a working point with quantile regression
#[derive(Parser, Debug)]
#[command(name = "quantile-calib")]
struct Args {
    /// Input file, a csv file or a container holding the sample table
    #[arg(long = "inputfile", default_value = "tree.root")]
    input_file: PathBuf,

    /// Name of the sample table inside the input container
    #[arg(long, default_value = "tree")]
    tree: String,

    /// Comma separated list of input variables
    #[arg(long, default_value = "x,y", value_delimiter = ',', value_parser = parse_input)]
    inputs: Vec<String>,

    /// Target variable
    #[arg(long, default_value = "target")]
    target: String,

    /// Working point, the quantile of the target to fit
    #[arg(long, default_value_t = 0.9)]
    eff: f64,

    /// Output container, `.json` is appended to other extensions
    #[arg(long = "outputfile", default_value = "results.root")]
    output_file: PathBuf,

    /// Name of the saved model and of its grid
    #[arg(long, default_value = "regression")]
    name: String,

    /// Hold out 40% of the rows and print the efficiency on them
    #[arg(long)]
    test: bool,
}

fn parse_input(s: &str) -> Result<String, String> {
    let name = s.replace(' ', "");
    if name.is_empty() {
        Err("empty input variable name".to_string())
    } else {
        Ok(name)
    }
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        RunConfig {
            input_file: args.input_file,
            tree: args.tree,
            inputs: args.inputs,
            target: args.target,
            eff: args.eff,
            output_file: args.output_file,
            name: args.name,
            test: args.test,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = RunConfig::from(Args::parse());
    run(&config, &BinningRegistry::default())?;
    Ok(())
}
