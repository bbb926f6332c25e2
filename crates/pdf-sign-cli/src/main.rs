use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_sign::{BoundsPolicy, PlacementRequest, SignOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdfsign", about = "Sign PDFs and stamp signature placements", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign the lowest-page placement and stamp all others
    Sign {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// JSON file with the placement list
        #[arg(short, long)]
        placements: PathBuf,

        /// PKCS#12 key store (.p12 / .pfx)
        #[arg(long)]
        cert: PathBuf,

        /// Key store password
        #[arg(long)]
        password: String,

        /// Stamp image (PNG, JPEG, ...)
        #[arg(long)]
        stamp: Option<PathBuf>,

        /// Signing reason
        #[arg(long)]
        reason: Option<String>,

        /// Signing location
        #[arg(long)]
        location: Option<String>,

        /// JSON options file (overridden by the flags above)
        #[arg(long)]
        options: Option<PathBuf>,

        /// What to do with placements that leave the page
        #[arg(long, value_enum)]
        bounds: Option<BoundsArg>,
    },

    /// Add empty signature fields for later signing
    Placeholders {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// JSON file with the placement list
        #[arg(short, long)]
        placements: PathBuf,

        /// What to do with placements that leave the page
        #[arg(long, default_value = "reject", value_enum)]
        bounds: BoundsArg,
    },

    /// List signature fields
    Fields {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BoundsArg {
    Reject,
    Allow,
}

impl From<BoundsArg> for BoundsPolicy {
    fn from(arg: BoundsArg) -> Self {
        match arg {
            BoundsArg::Reject => Self::Reject,
            BoundsArg::Allow => Self::Allow,
        }
    }
}

async fn load_placements(path: &Path) -> Result<Vec<PlacementRequest>> {
    let bytes = pdf_sign::load_file(path).await?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid placement list in {}", path.display()))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()).await {
        log::error!("{:#}", err);
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sign {
            input,
            output,
            placements,
            cert,
            password,
            stamp,
            reason,
            location,
            options,
            bounds,
        } => {
            let mut sign_options = match options {
                Some(path) => SignOptions::load(&path).await?,
                None => SignOptions::default(),
            };
            if reason.is_some() {
                sign_options.reason = reason;
            }
            if location.is_some() {
                sign_options.location = location;
            }
            if let Some(bounds) = bounds {
                sign_options.reject_out_of_bounds =
                    BoundsPolicy::from(bounds) == BoundsPolicy::Reject;
            }

            let placements = load_placements(&placements).await?;
            let document = pdf_sign::load_file(&input).await?;
            let certificate = pdf_sign::load_file(&cert).await?;
            let stamp = match stamp {
                Some(path) => Some(pdf_sign::load_file(&path).await?),
                None => None,
            };

            let signed = pdf_sign::sign_with_credentials(
                document,
                placements,
                certificate,
                password,
                stamp,
                sign_options,
            )
            .await?;
            pdf_sign::save_file(&signed.bytes, &output).await?;

            println!(
                "Signed field {} with {} decorative stamp(s) → {}",
                signed.field_name,
                signed.decorative_stamps,
                output.display()
            );
        }

        Commands::Placeholders {
            input,
            output,
            placements,
            bounds,
        } => {
            let options = SignOptions {
                reject_out_of_bounds: BoundsPolicy::from(bounds) == BoundsPolicy::Reject,
                ..Default::default()
            };

            let placements = load_placements(&placements).await?;
            let document = pdf_sign::load_file(&input).await?;
            let prepared = pdf_sign::add_placeholders(document, placements, options).await?;
            pdf_sign::save_file(&prepared.bytes, &output).await?;

            println!(
                "Added {} field(s): {} → {}",
                prepared.field_names.len(),
                prepared.field_names.join(", "),
                output.display()
            );
        }

        Commands::Fields { input } => {
            let document = pdf_sign::load_file(&input).await?;
            let fields = pdf_sign::list_signature_fields(document)?;

            if fields.is_empty() {
                println!("No signature fields");
            }
            for field in fields {
                let state = if field.signed { "signed" } else { "empty" };
                println!("  {} ({})", field.name, state);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_flag() {
        let cli = Cli::try_parse_from([
            "pdfsign", "sign", "-i", "in.pdf", "-o", "out.pdf", "-p", "places.json", "--cert",
            "id.p12", "--password", "pw", "--bounds", "allow",
        ])
        .unwrap();
        let Commands::Sign { bounds, .. } = cli.command else {
            panic!("expected the sign command");
        };
        assert!(matches!(bounds, Some(BoundsArg::Allow)));

        let cli = Cli::try_parse_from([
            "pdfsign", "placeholders", "-i", "in.pdf", "-o", "out.pdf", "-p", "places.json",
        ])
        .unwrap();
        let Commands::Placeholders { bounds, .. } = cli.command else {
            panic!("expected the placeholders command");
        };
        assert!(BoundsPolicy::from(bounds) == BoundsPolicy::Reject);

        let result = Cli::try_parse_from([
            "pdfsign", "placeholders", "-i", "in.pdf", "-o", "out.pdf", "-p", "places.json",
            "--bounds", "sometimes",
        ]);
        assert!(result.is_err());
    }
}
