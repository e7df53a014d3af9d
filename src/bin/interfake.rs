// src/bin/interfake.rs

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use interfake::resolver::absolute_dir;
use interfake::walker::guess_package_name;
use interfake::{
    find_interface, GoEnv, GoEnvResolver, Located, PackageDir, PackageTable, Walker,
};
use tracing_subscriber::EnvFilter;

/// Extracts a Go interface's method set for fake generation.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Interface to look up
    #[arg(short, long)]
    target: String,

    /// Package directory to read
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Package name of the generated code (default: fake_<package>)
    #[arg(short, long)]
    package: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("INTERFAKE_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("interfake: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let env = GoEnv::from_env();
    let pkg = PackageDir::import_with(&cli.dir, &env)
        .with_context(|| format!("failed importing {}", cli.dir.display()))?;
    let files = Walker::new(GoEnvResolver::new(&cli.dir, &env))
        .walk(&pkg.go_files, &pkg.import_path)
        .context("failed parsing source files")?;
    let located = find_interface(&files, &cli.target, &pkg.import_path)?;

    let out_package = match &cli.package {
        Some(name) => name.clone(),
        None => format!("fake_{}", located.package_name),
    };
    let out_path = match &cli.output {
        Some(file) => output_import_path(file, &env),
        None => String::new(),
    };
    let text = report(&located, &out_package, &out_path).context("failed formatting report")?;

    match &cli.output {
        Some(file) => write_output(file, &text),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

/// Import path of the directory the output file lands in.
fn output_import_path(file: &Path, env: &GoEnv) -> String {
    let dir = absolute_dir(file);
    env.import_path_of(&dir)
}

fn write_output(file: &Path, text: &str) -> Result<()> {
    let dir = absolute_dir(file);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed making output parent directory {}", dir.display()))?;
    fs::write(file, text).with_context(|| format!("failed writing {}", file.display()))
}

fn report(located: &Located<'_>, out_package: &str, out_path: &str) -> Result<String, fmt::Error> {
    let intf = located.interface;
    let paths = intf.referenced_package_paths();
    let table: PackageTable = paths
        .iter()
        .map(|p| (p.clone(), guess_package_name(p).to_string()))
        .collect();

    let mut out = String::new();
    writeln!(out, "source package: {}", located.package_name)?;
    writeln!(out, "source import path: {}", or_local(located.import_path))?;
    writeln!(out, "output package: {out_package}")?;
    writeln!(out, "output import path: {}", or_local(out_path))?;
    writeln!(out, "referenced packages:")?;
    for p in &paths {
        writeln!(out, "  - {p}")?;
    }
    writeln!(out, "signatures:")?;
    for m in &intf.methods {
        let sig = interfake::TypeExpr::Func {
            args: m.args.clone(),
            results: m.results.clone(),
        }
        .render(&table);
        writeln!(out, "  {}{}", m.name, sig.trim_start_matches("func"))?;
    }
    write!(out, "{intf}")?;
    Ok(out)
}

fn or_local(path: &str) -> &str {
    if path.is_empty() {
        "(local)"
    } else {
        path
    }
}
