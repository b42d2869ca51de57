use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tfgen::core::app::{exit_code_for, App, DestroyRequest, GenerateRequest};
use tfgen::shared::logging::{self, LogLevel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "tfgen",
    about = "Generate a Terraform project from a YAML module description and run terraform against it.",
    version = APP_VERSION,
    disable_version_flag(true)
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        long,
        short = 'c',
        global = true,
        value_name = "PATH",
        help = "Path to the tfgen settings file"
    )]
    pub config: Option<String>,

    #[arg(long, short = 'V', help = "Print version")]
    pub version: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "generate",
        about = "Generate the project, then run terraform init and plan (or apply)"
    )]
    Generate(GenerateArgs),

    #[command(name = "destroy", about = "Run terraform destroy on a generated project")]
    Destroy(DestroyArgs),

    #[command(name = "show", about = "Print the parsed YAML configuration as JSON")]
    Show {
        #[arg(value_name = "YAML")]
        yaml: PathBuf,
    },
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(value_name = "YAML", help = "Path to the YAML module description")]
    yaml: PathBuf,

    #[arg(long, help = "Run terraform apply -auto-approve instead of plan")]
    apply: bool,

    #[arg(long, help = "Only write the project, do not run terraform")]
    no_terraform: bool,

    #[arg(long, short = 'o', value_name = "DIR", help = "Directory to create the project in")]
    output_dir: Option<PathBuf>,

    #[arg(long, help = "Do not require AWS credentials in the environment")]
    skip_credential_check: bool,

    #[arg(long, help = "Synthesize placeholder modules for modules without a source")]
    allow_missing_source: bool,
}

#[derive(Args)]
struct DestroyArgs {
    #[arg(value_name = "YAML", help = "YAML file the project was generated from")]
    yaml: PathBuf,

    #[arg(long, short = 'o', value_name = "DIR", help = "Directory the project was created in")]
    output_dir: Option<PathBuf>,

    #[arg(long, help = "Do not require AWS credentials in the environment")]
    skip_credential_check: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    if cli.version {
        println!("{}", APP_VERSION);
        std::process::exit(0);
    }

    let Some(command) = cli.command else {
        println!("No command specified. Use --help for usage information.");
        return;
    };

    let app = match App::new(cli.config.clone()) {
        Ok(app) => app,
        Err(e) => {
            logging::error(&format!("Failed to initialize tfgen: {:#}", e));
            std::process::exit(1);
        }
    };

    let result = match command {
        Commands::Generate(args) => {
            let request = GenerateRequest {
                config_path: args.yaml,
                apply: args.apply,
                skip_terraform: args.no_terraform,
                output_dir: args.output_dir,
                skip_credential_check: args.skip_credential_check,
                allow_missing_source: args.allow_missing_source,
            };
            app.generate(&request).await.map(|project| {
                println!("{}", project.root.display());
            })
        }
        Commands::Destroy(args) => {
            let request = DestroyRequest {
                config_path: args.yaml,
                output_dir: args.output_dir,
                skip_credential_check: args.skip_credential_check,
            };
            app.destroy(&request).await
        }
        Commands::Show { yaml } => app.show(&yaml).map(|json| println!("{}", json)),
    };

    if let Err(err) = result {
        logging::error(&format!("{:#}", err));
        std::process::exit(exit_code_for(&err));
    }
}

fn init_logging() {
    let log_level = std::env::var("TFGEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = LogLevel::directive(&log_level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tfgen={}", filter).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
