use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use padimage::{parse_fill, parse_size, parse_size_strict, PadMode, PadRequest};


#[derive(Debug, Parser)]
#[command(name = "padimage", version)]
#[command(bin_name = "padimage")]
struct PadImageCLI {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: PadImageCommands,
}


#[derive(Debug, Subcommand)]
enum PadImageCommands {
    /// Write OUTPUT with exactly SIZE bytes
    ///
    /// With --input, the input is copied and the rest is filled. Without
    /// it, an existing OUTPUT is grown to SIZE.
    Pad {
        output: PathBuf,
        #[arg(value_parser = parse_size_strict)]
        size: u64,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long, default_value = "0", value_parser = parse_fill)]
        fill: u8,
        /// Write after existing content instead of truncating OUTPUT
        #[arg(short, long)]
        append: bool,
    },
    /// Print the byte count of a size such as 512K or 0x10M
    Size {
        text: String,
        #[arg(short, long, default_value_t = 0)]
        base: u32,
    },
}


fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}


fn main() {
    let args = PadImageCLI::parse();
    init_logging(&args.log_level);

    match args.command {
        PadImageCommands::Pad { output, size, input, fill, append } => {
            let mode = if append { PadMode::Append } else { PadMode::Overwrite };
            let mut request = PadRequest::new(&output, size).fill(fill).mode(mode);
            if let Some(input) = input {
                request = request.input(input);
            }
            match request.run() {
                Ok(()) => println!("Sized {} to {} bytes", output.display(), size),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        },
        PadImageCommands::Size { text, base } => {
            let (value, consumed) = parse_size(&text, base);
            if consumed < text.len() {
                warn!("ignoring trailing {:?}", &text[consumed..]);
            }
            println!("{}", value);
        },
    }
}
