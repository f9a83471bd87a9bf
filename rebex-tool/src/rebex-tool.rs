#![allow(clippy::uninlined_format_args)]

use rebex::{Error, Regex, SyntaxFlags};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "rebex-tool")]
struct Opt {
    /// The regular expression.
    pattern: String,

    /// The flags of the regular expression, like "imu".
    #[structopt(long, short, default_value = "")]
    flags: String,

    /// Dump the compiled bytecode to stdout.
    #[structopt(long)]
    dump_bytecode: bool,

    /// Match the inputs as UTF-16 code units.
    #[structopt(long)]
    utf16: bool,

    /// The input values to match against.
    #[structopt(conflicts_with_all = &["bench", "file"])]
    inputs: Vec<String>,

    /// Match against the contents of a specified file.
    #[structopt(long, conflicts_with_all = &["bench", "inputs"])]
    file: Option<PathBuf>,

    /// Benchmark the matches of the specified file.
    #[structopt(long, conflicts_with_all = &["file", "inputs"])]
    bench: Option<PathBuf>,
}

fn format_match(r: &rebex::Match, input: &str) -> String {
    let mut result = String::new();

    result.push_str(&format!(
        "\"{}\" ({}..{})",
        &input[r.range.clone()],
        r.range.start,
        r.range.end
    ));

    if !r.captures.is_empty() {
        result.push_str(", captures: [");
        for (i, cg) in r.captures.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            if let Some(cg_range) = cg {
                result.push_str(&format!(
                    "\"{}\" ({}..{})",
                    &input[cg_range.clone()],
                    cg_range.start,
                    cg_range.end
                ));
            } else {
                result.push_str("None");
            }
        }
        result.push(']');
    }

    result
}

fn exec_re_on_string(re: &Regex, input: &str) {
    let mut matches = re.find_iter(input);
    if let Some(res) = matches.next() {
        let count = 1 + matches.count();
        println!("Match: {}, total: {}", format_match(&res, input), count);
    } else {
        println!("No match");
    }
}

fn exec_re_on_utf16(re: &Regex, input: &str) {
    let units: Vec<u16> = input.encode_utf16().collect();
    if let Some(res) = re.find_utf16(&units) {
        let text = String::from_utf16_lossy(&units[res.range.clone()]);
        println!(
            "Match: \"{}\" ({}..{})",
            text, res.range.start, res.range.end
        );
    } else {
        println!("No match");
    }
}

fn bench_re_on_path(re: &Regex, path: &Path) {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("{}: {}", err, path.display());
            return;
        }
    };
    let input = contents.as_str();
    // Warmup
    re.find_iter(input).count();
    let start = Instant::now();
    for _ in 0..25 {
        re.find_iter(input).count();
    }
    let duration = start.elapsed();
    println!("{} ms", duration.as_millis());
}

fn main() -> Result<(), Error> {
    let args = Opt::from_args();

    let flags: SyntaxFlags = args.flags.parse()?;
    let re = Regex::compile(&args.pattern, flags)?;

    if args.dump_bytecode {
        println!("Bytecode:\n{}", re.disassemble());
    }

    if let Some(ref path) = args.file {
        match fs::read_to_string(path) {
            Ok(contents) => exec_re_on_string(&re, contents.as_str()),
            Err(err) => println!("{}: {}", err, path.display()),
        };
    } else if let Some(ref path) = args.bench {
        bench_re_on_path(&re, path);
    } else {
        for input in args.inputs {
            if args.utf16 {
                exec_re_on_utf16(&re, &input);
            } else {
                exec_re_on_string(&re, &input);
            }
        }
    }
    Ok(())
}
