// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use pico_args::Arguments;

const HELP: &str = "\
svg2drawing converts an SVG image into a pixel-art drawing document.

USAGE:
  svg2drawing [OPTIONS] <in-svg> <out-json>  # from file to file
  svg2drawing [OPTIONS] <in-svg> -c          # from file to stdout
  svg2drawing [OPTIONS] - <out-json>         # from stdin to file

OPTIONS:
  -h, --help            Prints help information
  -V, --version         Prints version information
  -c                    Prints the drawing JSON to the stdout

  --tolerance NUM       Sets the curve approximation tolerance
                        in drawing units [default: 0.05]
  --palette PATH        Sets a palette file with one hex color per line,
                        64 entries max [default: AAP-64]
  --pretty              Pretty-prints the output JSON
  --quiet               Disables warnings

ARGS:
  <in-svg>              Input file
  <out-json>            Output file
";

#[derive(Debug)]
struct Args {
    tolerance: f64,
    palette: Option<std::path::PathBuf>,
    pretty: bool,
    quiet: bool,

    input: String,
    output: String,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    Ok(Args {
        tolerance: input.opt_value_from_str("--tolerance")?.unwrap_or(0.05),
        palette: input.opt_value_from_str("--palette")?,
        pretty: input.contains("--pretty"),
        quiet: input.contains("--quiet"),
        input: input.free_from_str()?,
        output: input.free_from_str()?,
    })
}

fn main() {
    let args = match collect_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    };

    if !args.quiet && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Warn);
    }

    if let Err(e) = process(args) {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}

fn process(args: Args) -> Result<(), String> {
    if !(args.tolerance > 0.0) {
        return Err("tolerance must be above zero".to_string());
    }

    let input_svg = if args.input == "-" {
        load_stdin()
    } else {
        std::fs::read_to_string(&args.input).map_err(|e| e.to_string())
    }?;

    let palette = match args.palette {
        Some(ref path) => load_palette(path)?,
        None => svg2drawing::Palette::aap64(),
    };

    let opt = svg2drawing::Options {
        palette,
        tolerance: args.tolerance,
        ..svg2drawing::Options::default()
    };

    let conversion =
        svg2drawing::Conversion::from_str(&input_svg, &opt).map_err(|e| e.to_string())?;

    if !args.quiet {
        for warning in &conversion.warnings {
            eprintln!("Warning: {}", warning);
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&conversion.drawing)
    } else {
        serde_json::to_string(&conversion.drawing)
    }
    .map_err(|e| e.to_string())?;

    if args.output == "-c" {
        io::stdout()
            .write_all(json.as_bytes())
            .map_err(|_| "failed to write to the stdout".to_string())?;
    } else {
        let mut f =
            File::create(&args.output).map_err(|_| "failed to create the output file".to_string())?;
        f.write_all(json.as_bytes())
            .map_err(|_| "failed to write to the output file".to_string())?;
    }

    Ok(())
}

fn load_palette(path: &std::path::Path) -> Result<svg2drawing::Palette, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;

    let hex: Vec<String> = text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(|line| {
            if line.starts_with('#') {
                line.to_string()
            } else {
                format!("#{}", line)
            }
        })
        .collect();

    svg2drawing::Palette::from_hex(hex)
        .ok_or_else(|| "palette file must contain 1..=64 hex colors".to_string())
}

fn load_stdin() -> Result<String, String> {
    let mut buf = String::new();
    let stdin = io::stdin();
    let mut handle = stdin.lock();

    handle
        .read_to_string(&mut buf)
        .map_err(|_| "failed to read from stdin".to_string())?;

    Ok(buf)
}

/// Forwards the library's degradation notes to stderr.
///
/// The converter only ever logs at warn level or above, so there is no
/// need for per-level formatting or source locations.
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let prefix = if record.level() == log::Level::Error {
                "Error"
            } else {
                "Warning"
            };
            eprintln!("{}: {}", prefix, record.args());
        }
    }

    fn flush(&self) {}
}
